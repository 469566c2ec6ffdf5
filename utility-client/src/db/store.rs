use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Database,
};

use super::QueryError;
use crate::domain::Utility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Utilities,
    Customers,
    Payments,
    DailyEnergySummary,
    Meters,
}

impl CollectionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utilities => "utilities",
            Self::Customers => "customers",
            Self::Payments => "payments",
            Self::DailyEnergySummary => "daily_energy_summary",
            Self::Meters => "meters",
        }
    }
}

/// Read-only access to the collections the analytics operations aggregate
/// over. Every query in [`crate::db`] goes through this seam.
#[async_trait::async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn aggregate(
        &self,
        collection: CollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, QueryError>;

    async fn find_utility(&self, id: ObjectId) -> Result<Option<Utility>, QueryError>;
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AnalyticsStore for MongoStore {
    async fn aggregate(
        &self,
        collection: CollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, QueryError> {
        let stages = pipeline.len();
        let cursor = self
            .db
            .collection::<Document>(collection.as_str())
            .aggregate(pipeline)
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        tracing::debug!(
            collection = collection.as_str(),
            stages,
            rows = rows.len(),
            "aggregation completed"
        );
        Ok(rows)
    }

    async fn find_utility(&self, id: ObjectId) -> Result<Option<Utility>, QueryError> {
        let utility = self
            .db
            .collection::<Utility>(CollectionName::Utilities.as_str())
            .find_one(doc! { "_id": id })
            .await?;
        Ok(utility)
    }
}
