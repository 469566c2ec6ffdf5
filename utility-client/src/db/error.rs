use mongodb::bson::oid;

use crate::domain::PeriodError;

#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("invalid ObjectId '{value}': {source}")]
    InvalidObjectId {
        value: String,
        #[source]
        source: oid::Error,
    },
    #[error("utility not found: {0}")]
    UtilityNotFound(String),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error("unexpected aggregation result: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}

pub fn parse_object_id(value: &str) -> Result<oid::ObjectId, QueryError> {
    oid::ObjectId::parse_str(value).map_err(|source| QueryError::InvalidObjectId {
        value: value.to_string(),
        source,
    })
}
