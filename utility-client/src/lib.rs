pub mod db;
pub mod domain;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use db::{AnalyticsStore, CollectionName, MongoStore, QueryError};
