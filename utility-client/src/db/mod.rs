pub mod customer_queries;
pub mod energy_queries;
mod error;
pub mod payment_queries;
mod rows;
pub mod store;
pub mod utility_queries;

pub use error::{parse_object_id, QueryError};
pub use store::{AnalyticsStore, CollectionName, MongoStore};
