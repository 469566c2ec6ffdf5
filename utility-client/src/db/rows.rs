//! Field access for aggregation output rows. Grouped sums come back as
//! Int32, Int64 or Double depending on the stored values, so numbers are read
//! leniently; a missing or null number counts as zero.

use mongodb::bson::{Bson, DateTime, Document};
use time::OffsetDateTime;

use super::QueryError;

pub(crate) fn number(row: &Document, key: &str) -> Result<f64, QueryError> {
    match row.get(key) {
        None | Some(Bson::Null) => Ok(0.0),
        Some(Bson::Double(v)) => Ok(*v),
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        Some(other) => Err(QueryError::Decode(format!(
            "field '{key}' is not a number: {other}"
        ))),
    }
}

pub(crate) fn count(row: &Document, key: &str) -> Result<u64, QueryError> {
    match row.get(key) {
        Some(Bson::Int32(v)) if *v >= 0 => Ok(*v as u64),
        Some(Bson::Int64(v)) if *v >= 0 => Ok(*v as u64),
        other => Err(QueryError::Decode(format!(
            "field '{key}' is not a count: {other:?}"
        ))),
    }
}

/// String field that may legitimately be absent, e.g. a group key taken from
/// a malformed code.
pub(crate) fn opt_str<'a>(row: &'a Document, key: &str) -> Result<Option<&'a str>, QueryError> {
    match row.get(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(QueryError::Decode(format!(
            "field '{key}' is not a string: {other}"
        ))),
    }
}

pub(crate) fn string(row: &Document, key: &str) -> Result<String, QueryError> {
    opt_str(row, key)?
        .map(str::to_string)
        .ok_or_else(|| QueryError::Decode(format!("field '{key}' is missing")))
}

/// Sub-pipeline output of a `$facet` stage. An aggregation over no documents
/// still yields one facet document, but tolerate none at all.
pub(crate) fn facet<'a>(rows: &'a [Document], key: &str) -> Result<Vec<&'a Document>, QueryError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    match first.get(key) {
        None => Ok(Vec::new()),
        Some(Bson::Array(items)) => items
            .iter()
            .map(|item| match item {
                Bson::Document(d) => Ok(d),
                other => Err(QueryError::Decode(format!(
                    "facet '{key}' holds a non-document entry: {other}"
                ))),
            })
            .collect(),
        Some(other) => Err(QueryError::Decode(format!("facet '{key}' is not an array: {other}"))),
    }
}

pub(crate) fn to_bson_datetime(ts: OffsetDateTime) -> DateTime {
    DateTime::from_millis((ts.unix_timestamp_nanos() / 1_000_000) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use time::macros::datetime;

    #[test]
    fn numbers_accept_every_numeric_encoding() {
        let row = doc! { "a": 1_i32, "b": 2_i64, "c": 2.5, "d": Bson::Null };
        assert_eq!(number(&row, "a").unwrap(), 1.0);
        assert_eq!(number(&row, "b").unwrap(), 2.0);
        assert_eq!(number(&row, "c").unwrap(), 2.5);
        assert_eq!(number(&row, "d").unwrap(), 0.0);
        assert_eq!(number(&row, "missing").unwrap(), 0.0);
    }

    #[test]
    fn wrong_types_are_decode_errors() {
        let row = doc! { "a": "12", "n": -1_i32 };
        assert!(matches!(number(&row, "a"), Err(QueryError::Decode(_))));
        assert!(matches!(count(&row, "n"), Err(QueryError::Decode(_))));
        assert!(matches!(string(&row, "missing"), Err(QueryError::Decode(_))));
    }

    #[test]
    fn facet_of_empty_result_is_empty() {
        assert!(facet(&[], "byType").unwrap().is_empty());
        let rows = vec![doc! { "byType": [] }];
        assert!(facet(&rows, "byType").unwrap().is_empty());
    }

    #[test]
    fn datetime_conversion_keeps_milliseconds() {
        let ts = datetime!(2024-03-31 23:59:59.250 UTC);
        assert_eq!(to_bson_datetime(ts).timestamp_millis(), 1_711_929_599_250);
    }
}
