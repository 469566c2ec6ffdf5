use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Customer codes look like `prefix:type:suffix`.
pub const CUSTOMER_CODE_DELIMITER: &str = ":";
pub const CUSTOMER_CODE_TYPE_INDEX: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryValue {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCredit {
    pub credit: MonetaryValue,
    #[serde(default)]
    pub plan: Option<MonetaryValue>,
    #[serde(default)]
    pub technical_debt: Option<MonetaryValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub service_area_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub balances: Option<BalanceCredit>,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub energy_limited: Option<bool>,
    #[serde(default)]
    pub last_heartbeat: Option<DateTime>,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn customer(code: &str) -> Customer {
        mongodb::bson::from_document(doc! {
            "id": "c-1",
            "name": "Amina",
            "code": code,
            "service_area_id": "65a1f0c2e4b0a1b2c3d4e5f6",
        })
        .unwrap()
    }

    #[test]
    fn decodes_stored_customer() {
        let c = customer("NR:Commercial:0042");
        assert_eq!(c.code, "NR:Commercial:0042");
        assert_eq!(c.object_id, None);
        assert!(c.balances.is_none());
    }

    #[test]
    fn active_defaults_to_true() {
        assert!(customer("NR:Other:1").active);
    }
}
