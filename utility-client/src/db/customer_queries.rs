use mongodb::bson::{doc, Document};
use serde::Serialize;

use super::{
    rows,
    utility_queries::{find_utility_info, UtilityInfo},
    AnalyticsStore, CollectionName, QueryError,
};
use crate::domain::{
    customer::{CUSTOMER_CODE_DELIMITER, CUSTOMER_CODE_TYPE_INDEX},
    CustomerTypeBreakdown, TypeTally, UnrecognizedTypePolicy,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCount {
    pub total_customers: u64,
    pub customer_type: CustomerTypeBreakdown<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility: Option<UtilityInfo>,
}

/// Count customers of a service area per type tag. Inactive customers are
/// filtered out unless `all_customers` is set.
pub fn customers_count_pipeline(utility_id: &str, all_customers: bool) -> Vec<Document> {
    let mut filter = doc! { "service_area_id": utility_id };
    if !all_customers {
        filter.insert("active", true);
    }

    vec![
        doc! { "$match": filter },
        doc! {
            "$group": {
                "_id": {
                    "$arrayElemAt": [
                        { "$split": ["$code", CUSTOMER_CODE_DELIMITER] },
                        CUSTOMER_CODE_TYPE_INDEX
                    ]
                },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$project": { "_id": 0, "customer_type": "$_id", "count": 1 } },
    ]
}

pub fn tally_customer_counts(
    grouped: &[Document],
    policy: UnrecognizedTypePolicy,
) -> Result<TypeTally<u64>, QueryError> {
    let mut tally = TypeTally::new(policy);
    for row in grouped {
        tally.record(rows::opt_str(row, "customer_type")?, rows::count(row, "count")?);
    }
    Ok(tally)
}

/// Customer counts per type for one utility, merged with the utility's
/// profile. Both reads run concurrently and independently.
pub async fn customers_count(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    all_customers: bool,
    policy: UnrecognizedTypePolicy,
) -> Result<CustomerCount, QueryError> {
    let (grouped, utility) = tokio::try_join!(
        store.aggregate(
            CollectionName::Customers,
            customers_count_pipeline(utility_id, all_customers),
        ),
        find_utility_info(store, utility_id),
    )?;

    let tally = tally_customer_counts(&grouped, policy)?;
    if tally.unrecognized_rows > 0 {
        tracing::debug!(
            utility_id,
            groups = tally.unrecognized_rows,
            "customer codes without a recognised type tag"
        );
    }

    Ok(CustomerCount {
        total_customers: tally.total,
        customer_type: tally.by_type,
        utility,
    })
}
