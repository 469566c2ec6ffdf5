use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Serialize;
use time::OffsetDateTime;

use super::{parse_object_id, rows, AnalyticsStore, CollectionName, QueryError};
use crate::domain::{
    payment::{EXTERNAL_ID_DELIMITER, EXTERNAL_ID_TYPE_INDEX},
    MonthPeriod, YearPeriod,
};

/// Payment totals for one customer-type tag as observed in external ids.
/// Tags outside the known customer types are reported as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentTotal {
    pub customer_type: String,
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPaymentEntry {
    /// `YYYY-MM`
    pub month: String,
    pub total_amount: f64,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    /// First currency seen this month, or carried over from the latest
    /// earlier month that had payments.
    pub currency: Option<String>,
    pub by_customer_type: Vec<PaymentTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyPaymentTotals {
    pub year: String,
    pub total_amount: f64,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub currency: Option<String>,
    pub months: Vec<MonthlyPaymentEntry>,
}

fn window_match(service_area: ObjectId, start: OffsetDateTime, end: OffsetDateTime) -> Document {
    doc! {
        "$match": {
            "service_area_id": service_area,
            "timestamp": {
                "$gte": rows::to_bson_datetime(start),
                "$lt": rows::to_bson_datetime(end),
            },
        }
    }
}

fn external_id_type_tag() -> Document {
    doc! {
        "$arrayElemAt": [
            { "$split": ["$external_id", EXTERNAL_ID_DELIMITER] },
            EXTERNAL_ID_TYPE_INDEX
        ]
    }
}

fn payment_sums() -> Document {
    doc! {
        "totalAmount": { "$sum": { "$toDouble": "$amount.value" } },
        "totalKWh": { "$sum": "$amount.kWh" },
        "currency": { "$first": "$amount.currency" },
    }
}

fn group_stage(id: Document) -> Document {
    let mut group = doc! { "_id": id };
    group.extend(payment_sums());
    doc! { "$group": group }
}

pub fn monthly_payment_totals_pipeline(
    service_area: ObjectId,
    month: &MonthPeriod,
) -> Result<Vec<Document>, QueryError> {
    Ok(vec![
        window_match(service_area, month.start()?, month.end()?),
        doc! { "$sort": { "timestamp": 1 } },
        group_stage(doc! { "customer_type": external_id_type_tag() }),
        doc! {
            "$project": {
                "_id": 0,
                "customer_type": "$_id.customer_type",
                "totalAmount": 1,
                "totalKWh": 1,
                "currency": 1,
            }
        },
        doc! { "$sort": { "customer_type": 1 } },
    ])
}

pub fn yearly_payment_totals_pipeline(
    service_area: ObjectId,
    year: &YearPeriod,
) -> Result<Vec<Document>, QueryError> {
    Ok(vec![
        window_match(service_area, year.start()?, year.end()?),
        doc! { "$sort": { "timestamp": 1 } },
        group_stage(doc! {
            "month": {
                "$dateToString": { "format": "%Y-%m", "date": "$timestamp", "timezone": "UTC" }
            },
            "customer_type": external_id_type_tag(),
        }),
        doc! {
            "$project": {
                "_id": 0,
                "month": "$_id.month",
                "customer_type": "$_id.customer_type",
                "totalAmount": 1,
                "totalKWh": 1,
                "currency": 1,
            }
        },
        doc! { "$sort": { "month": 1, "customer_type": 1 } },
    ])
}

fn payment_total(row: &Document) -> Result<PaymentTotal, QueryError> {
    Ok(PaymentTotal {
        customer_type: rows::opt_str(row, "customer_type")?.unwrap_or_default().to_string(),
        total_amount: rows::number(row, "totalAmount")?,
        total_kwh: rows::number(row, "totalKWh")?,
        currency: rows::opt_str(row, "currency")?.unwrap_or_default().to_string(),
    })
}

pub fn fold_yearly_payment_rows(
    year: &YearPeriod,
    grouped: &[Document],
) -> Result<YearlyPaymentTotals, QueryError> {
    let mut months: Vec<MonthlyPaymentEntry> = year
        .months()
        .map(|m| MonthlyPaymentEntry {
            month: m.to_string(),
            total_amount: 0.0,
            total_kwh: 0.0,
            currency: None,
            by_customer_type: Vec::new(),
        })
        .collect();

    for row in grouped {
        let label = rows::string(row, "month")?;
        let Some(entry) = months.iter_mut().find(|e| e.month == label) else {
            tracing::debug!(month = %label, "payment row outside the requested year");
            continue;
        };
        let total = payment_total(row)?;
        entry.total_amount += total.total_amount;
        entry.total_kwh += total.total_kwh;
        if entry.currency.is_none() && !total.currency.is_empty() {
            entry.currency = Some(total.currency.clone());
        }
        entry.by_customer_type.push(total);
    }

    let mut carried: Option<String> = None;
    for entry in &mut months {
        match &entry.currency {
            Some(c) => carried = Some(c.clone()),
            None => entry.currency = carried.clone(),
        }
    }

    Ok(YearlyPaymentTotals {
        year: year.to_string(),
        total_amount: months.iter().map(|m| m.total_amount).sum(),
        total_kwh: months.iter().map(|m| m.total_kwh).sum(),
        currency: carried,
        months,
    })
}

/// Payment totals per external-id type tag for one UTC calendar month.
pub async fn monthly_payment_totals(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    month: &MonthPeriod,
) -> Result<Vec<PaymentTotal>, QueryError> {
    let service_area = parse_object_id(utility_id)?;
    let grouped = store
        .aggregate(
            CollectionName::Payments,
            monthly_payment_totals_pipeline(service_area, month)?,
        )
        .await?;

    grouped.iter().map(payment_total).collect()
}

/// Payment totals for every month of a UTC calendar year.
pub async fn yearly_payment_totals(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    year: &YearPeriod,
) -> Result<YearlyPaymentTotals, QueryError> {
    let service_area = parse_object_id(utility_id)?;
    let grouped = store
        .aggregate(
            CollectionName::Payments,
            yearly_payment_totals_pipeline(service_area, year)?,
        )
        .await?;

    fold_yearly_payment_rows(year, &grouped)
}
