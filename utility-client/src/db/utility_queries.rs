use serde::Serialize;

use super::{parse_object_id, AnalyticsStore, QueryError};
use crate::domain::{SystemComponent, SystemType, Utility};

/// Descriptive profile of a utility as returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityInfo {
    pub id: String,
    pub name: String,
    pub acronym: String,
    pub country: String,
    pub system_type: SystemType,
    pub system_description: String,
    pub system_components: Vec<SystemComponent>,
    #[serde(rename = "totalInstalledCapacitykW", skip_serializing_if = "Option::is_none")]
    pub total_installed_capacity_kw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_customers: Option<u64>,
    pub is_active: bool,
}

impl From<Utility> for UtilityInfo {
    fn from(u: Utility) -> Self {
        UtilityInfo {
            id: u.id.to_hex(),
            name: u.name,
            acronym: u.acronym,
            country: u.country,
            system_type: u.system_type,
            system_description: u.system_description,
            system_components: u.system_components,
            total_installed_capacity_kw: u.total_installed_capacity_kw,
            number_of_customers: u.number_of_customers,
            is_active: u.is_active,
        }
    }
}

/// Look up a utility's profile; `Ok(None)` when no utility has that id.
pub async fn find_utility_info(
    store: &dyn AnalyticsStore,
    utility_id: &str,
) -> Result<Option<UtilityInfo>, QueryError> {
    let id = parse_object_id(utility_id)?;
    Ok(store.find_utility(id).await?.map(UtilityInfo::from))
}

pub async fn utility_info(
    store: &dyn AnalyticsStore,
    utility_id: &str,
) -> Result<UtilityInfo, QueryError> {
    find_utility_info(store, utility_id)
        .await?
        .ok_or_else(|| QueryError::UtilityNotFound(utility_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_utility, FixtureStore};
    use mongodb::bson::oid::ObjectId;

    #[tokio::test]
    async fn returns_profile_for_known_utility() {
        let id = ObjectId::new();
        let store = FixtureStore::default().with_utility(sample_utility(id));

        let info = utility_info(&store, &id.to_hex()).await.unwrap();
        assert_eq!(info.id, id.to_hex());
        assert_eq!(info.acronym, "KRP");
        assert_eq!(info.system_components.len(), 1);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["systemType"], "lv-off-grid");
        assert!(json.get("totalInstalledCapacitykW").is_none());
    }

    #[tokio::test]
    async fn absent_utility_is_a_lookup_failure() {
        let store = FixtureStore::default();
        let err = utility_info(&store, &ObjectId::new().to_hex()).await.unwrap_err();
        assert!(matches!(err, QueryError::UtilityNotFound(_)));
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_querying() {
        let store = FixtureStore::default();
        let err = utility_info(&store, "zzzzzzzzzzzzzzzzzzzzzzzz").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidObjectId { .. }));
    }
}
