//! Consumption summaries over `daily_energy_summary`.
//!
//! Every summary zero-fills the five known customer types. Monthly and yearly
//! summaries also rank customers by summed kWh and resolve their display
//! names through a `$lookup` on `customers`.

use std::cmp::Ordering;

use mongodb::bson::{doc, Document};
use serde::Serialize;

use super::{rows, AnalyticsStore, CollectionName, QueryError};
use crate::domain::{
    CustomerTypeBreakdown, DailyEnergySummary, DayPeriod, MonthPeriod, TypeTally,
    UnrecognizedTypePolicy, YearPeriod, HOURS,
};

pub const TOP_CONSUMERS_LIMIT: usize = 10;
pub const UNKNOWN_CUSTOMER_NAME: &str = "Unknown customer";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopConsumer {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    pub name: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyConsumption {
    pub hour: String,
    #[serde(rename = "energyKWh")]
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEnergyReport {
    pub date: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub consumption_by_customer_type: CustomerTypeBreakdown<f64>,
    pub hourly_consumption: Vec<HourlyConsumption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEnergyReport {
    pub month: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub consumption_by_customer_type: CustomerTypeBreakdown<f64>,
    pub top_consumers: Vec<TopConsumer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEnergyEntry {
    pub month: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub consumption_by_customer_type: CustomerTypeBreakdown<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyEnergyReport {
    pub year: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub consumption_by_customer_type: CustomerTypeBreakdown<f64>,
    /// Always twelve entries, January first.
    pub months: Vec<MonthlyEnergyEntry>,
    pub top_consumers: Vec<TopConsumer>,
}

fn by_type_stages() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$customerType", "totalKWh": { "$sum": "$totalKWh" } } },
        doc! { "$project": { "_id": 0, "customer_type": "$_id", "totalKWh": 1 } },
    ]
}

fn top_consumer_stages() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$customerId", "totalKWh": { "$sum": "$totalKWh" } } },
        doc! { "$sort": { "totalKWh": -1, "_id": 1 } },
        doc! { "$limit": (TOP_CONSUMERS_LIMIT as i64) },
        doc! {
            "$lookup": {
                "from": CollectionName::Customers.as_str(),
                "localField": "_id",
                "foreignField": "_id",
                "as": "customer",
            }
        },
        doc! { "$unwind": { "path": "$customer", "preserveNullAndEmptyArrays": true } },
        doc! {
            "$project": {
                "_id": 0,
                "customerId": { "$toString": "$_id" },
                "name": { "$ifNull": ["$customer.name", UNKNOWN_CUSTOMER_NAME] },
                "totalKWh": 1,
            }
        },
    ]
}

pub fn daily_energy_pipeline(utility_id: &str, day: &DayPeriod) -> Vec<Document> {
    vec![
        doc! { "$match": { "service_area_id": utility_id, "date": day.to_string() } },
        doc! {
            "$facet": {
                "byType": by_type_stages(),
                "hourly": [
                    { "$unwind": "$readings" },
                    {
                        "$group": {
                            "_id": "$readings.hour",
                            "energyKWh": { "$sum": "$readings.energy_consumption" },
                        }
                    },
                    { "$project": { "_id": 0, "hour": "$_id", "energyKWh": 1 } },
                ],
            }
        },
    ]
}

pub fn monthly_energy_pipeline(utility_id: &str, month: &MonthPeriod) -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "service_area_id": utility_id,
                "date": { "$regex": format!("^{month}") },
            }
        },
        doc! {
            "$facet": {
                "byType": by_type_stages(),
                "topConsumers": top_consumer_stages(),
            }
        },
    ]
}

pub fn yearly_energy_pipeline(utility_id: &str, year: &YearPeriod) -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "service_area_id": utility_id,
                "date": { "$regex": format!("^{year}-") },
            }
        },
        doc! {
            "$facet": {
                "byMonth": [
                    {
                        "$group": {
                            "_id": {
                                "month": { "$substrBytes": ["$date", 0, 7] },
                                "customer_type": "$customerType",
                            },
                            "totalKWh": { "$sum": "$totalKWh" },
                        }
                    },
                    {
                        "$project": {
                            "_id": 0,
                            "month": "$_id.month",
                            "customer_type": "$_id.customer_type",
                            "totalKWh": 1,
                        }
                    },
                ],
                "topConsumers": top_consumer_stages(),
            }
        },
    ]
}

fn tally_by_type(
    grouped: &[&Document],
    policy: UnrecognizedTypePolicy,
) -> Result<TypeTally<f64>, QueryError> {
    let mut tally = TypeTally::new(policy);
    for row in grouped {
        tally.record(rows::opt_str(row, "customer_type")?, rows::number(row, "totalKWh")?);
    }
    Ok(tally)
}

/// Ranked customers, highest consumption first. The database already sorts
/// and limits; re-applying both keeps the invariant independent of how the
/// join stages order their output.
fn top_consumers(grouped: &[&Document]) -> Result<Vec<TopConsumer>, QueryError> {
    let mut consumers = grouped
        .iter()
        .map(|row| {
            Ok(TopConsumer {
                customer_id: rows::string(row, "customerId")?,
                name: rows::opt_str(row, "name")?
                    .unwrap_or(UNKNOWN_CUSTOMER_NAME)
                    .to_string(),
                total_kwh: rows::number(row, "totalKWh")?,
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    consumers.sort_by(|a, b| b.total_kwh.partial_cmp(&a.total_kwh).unwrap_or(Ordering::Equal));
    consumers.truncate(TOP_CONSUMERS_LIMIT);
    Ok(consumers)
}

fn hourly_profile(grouped: &[&Document]) -> Result<Vec<HourlyConsumption>, QueryError> {
    let mut slots = [0.0_f64; 24];
    for row in grouped {
        let Some(hour) = rows::opt_str(row, "hour")? else {
            continue;
        };
        match DailyEnergySummary::hour_index(hour) {
            Some(i) => slots[i] += rows::number(row, "energyKWh")?,
            None => tracing::debug!(hour, "reading with an hour outside 00-23"),
        }
    }

    Ok(HOURS
        .iter()
        .zip(slots)
        .map(|(hour, energy_kwh)| HourlyConsumption { hour: hour.to_string(), energy_kwh })
        .collect())
}

pub fn shape_daily_report(
    day: &DayPeriod,
    facets: &[Document],
    policy: UnrecognizedTypePolicy,
) -> Result<DailyEnergyReport, QueryError> {
    let tally = tally_by_type(&rows::facet(facets, "byType")?, policy)?;
    Ok(DailyEnergyReport {
        date: day.to_string(),
        total_kwh: tally.total,
        consumption_by_customer_type: tally.by_type,
        hourly_consumption: hourly_profile(&rows::facet(facets, "hourly")?)?,
    })
}

pub fn shape_monthly_report(
    month: &MonthPeriod,
    facets: &[Document],
    policy: UnrecognizedTypePolicy,
) -> Result<MonthlyEnergyReport, QueryError> {
    let tally = tally_by_type(&rows::facet(facets, "byType")?, policy)?;
    Ok(MonthlyEnergyReport {
        month: month.to_string(),
        total_kwh: tally.total,
        consumption_by_customer_type: tally.by_type,
        top_consumers: top_consumers(&rows::facet(facets, "topConsumers")?)?,
    })
}

pub fn shape_yearly_report(
    year: &YearPeriod,
    facets: &[Document],
    policy: UnrecognizedTypePolicy,
) -> Result<YearlyEnergyReport, QueryError> {
    let mut monthly: Vec<(String, TypeTally<f64>)> = year
        .months()
        .map(|m| (m.to_string(), TypeTally::new(policy)))
        .collect();

    for row in rows::facet(facets, "byMonth")? {
        let label = rows::string(row, "month")?;
        let Some((_, tally)) = monthly.iter_mut().find(|(m, _)| *m == label) else {
            tracing::debug!(month = %label, "energy row outside the requested year");
            continue;
        };
        tally.record(rows::opt_str(row, "customer_type")?, rows::number(row, "totalKWh")?);
    }

    let mut year_tally = TypeTally::new(policy);
    for (_, tally) in &monthly {
        year_tally.merge(tally);
    }

    Ok(YearlyEnergyReport {
        year: year.to_string(),
        total_kwh: year_tally.total,
        consumption_by_customer_type: year_tally.by_type,
        months: monthly
            .into_iter()
            .map(|(month, tally)| MonthlyEnergyEntry {
                month,
                total_kwh: tally.total,
                consumption_by_customer_type: tally.by_type,
            })
            .collect(),
        top_consumers: top_consumers(&rows::facet(facets, "topConsumers")?)?,
    })
}

pub async fn daily_energy_summary(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    day: &DayPeriod,
    policy: UnrecognizedTypePolicy,
) -> Result<DailyEnergyReport, QueryError> {
    let facets = store
        .aggregate(CollectionName::DailyEnergySummary, daily_energy_pipeline(utility_id, day))
        .await?;
    shape_daily_report(day, &facets, policy)
}

pub async fn monthly_energy_summary(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    month: &MonthPeriod,
    policy: UnrecognizedTypePolicy,
) -> Result<MonthlyEnergyReport, QueryError> {
    let facets = store
        .aggregate(
            CollectionName::DailyEnergySummary,
            monthly_energy_pipeline(utility_id, month),
        )
        .await?;
    shape_monthly_report(month, &facets, policy)
}

pub async fn yearly_energy_summary(
    store: &dyn AnalyticsStore,
    utility_id: &str,
    year: &YearPeriod,
    policy: UnrecognizedTypePolicy,
) -> Result<YearlyEnergyReport, QueryError> {
    let facets = store
        .aggregate(
            CollectionName::DailyEnergySummary,
            yearly_energy_pipeline(utility_id, year),
        )
        .await?;
    shape_yearly_report(year, &facets, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureStore;
    use crate::domain::CustomerType;
    use mongodb::bson::{oid::ObjectId, Bson};

    const UTILITY: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    fn consumer(kwh: f64) -> Bson {
        Bson::Document(doc! {
            "customerId": ObjectId::new().to_hex(),
            "name": format!("Customer {kwh}"),
            "totalKWh": kwh,
        })
    }

    #[test]
    fn monthly_pipeline_matches_month_prefix() {
        let month: MonthPeriod = "2024-03".parse().unwrap();
        let pipeline = monthly_energy_pipeline(UTILITY, &month);
        let date = pipeline[0]
            .get_document("$match")
            .unwrap()
            .get_document("date")
            .unwrap();
        assert_eq!(date.get_str("$regex").unwrap(), "^2024-03");
    }

    #[test]
    fn top_consumer_stages_limit_and_join_customers() {
        let stages = top_consumer_stages();
        assert_eq!(stages[2].get_i64("$limit").unwrap(), 10);
        let lookup = stages[3].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "customers");
    }

    #[test]
    fn daily_report_zero_fills_types_and_hours() {
        let day: DayPeriod = "2024-03-05".parse().unwrap();
        let facets = vec![doc! {
            "byType": [ { "customer_type": "Industrial", "totalKWh": 80.25 } ],
            "hourly": [
                { "hour": "07", "energyKWh": 3.5 },
                { "hour": "23", "energyKWh": 1 },
            ],
        }];

        let report = shape_daily_report(&day, &facets, UnrecognizedTypePolicy::Include).unwrap();

        assert_eq!(report.date, "2024-03-05");
        assert_eq!(report.total_kwh, 80.25);
        assert_eq!(report.consumption_by_customer_type.get(CustomerType::Industrial), 80.25);
        assert_eq!(report.consumption_by_customer_type.get(CustomerType::Residential), 0.0);
        assert_eq!(report.hourly_consumption.len(), 24);
        assert_eq!(report.hourly_consumption[7].energy_kwh, 3.5);
        assert_eq!(report.hourly_consumption[23].energy_kwh, 1.0);
        assert_eq!(report.hourly_consumption[0].hour, "00");
    }

    #[test]
    fn top_consumers_are_capped_and_descending() {
        let month: MonthPeriod = "2024-03".parse().unwrap();
        let unsorted: Vec<Bson> = [4.0, 19.5, 1.0, 7.0, 12.0, 3.0, 30.0, 2.0, 9.0, 11.0, 15.0, 0.5]
            .into_iter()
            .map(consumer)
            .collect();
        let facets = vec![doc! { "byType": [], "topConsumers": unsorted }];

        let report = shape_monthly_report(&month, &facets, UnrecognizedTypePolicy::Include).unwrap();

        assert_eq!(report.top_consumers.len(), TOP_CONSUMERS_LIMIT);
        assert_eq!(report.top_consumers[0].total_kwh, 30.0);
        assert!(report
            .top_consumers
            .windows(2)
            .all(|w| w[0].total_kwh > w[1].total_kwh));
    }

    #[test]
    fn yearly_report_always_has_twelve_months() {
        let year: YearPeriod = "2023".parse().unwrap();
        let facets = vec![doc! {
            "byMonth": [
                { "month": "2023-02", "customer_type": "Residential", "totalKWh": 10.0 },
                { "month": "2023-02", "customer_type": "Commercial", "totalKWh": 5.0 },
                { "month": "2023-11", "customer_type": Bson::Null, "totalKWh": 2.0 },
            ],
            "topConsumers": [],
        }];

        let report = shape_yearly_report(&year, &facets, UnrecognizedTypePolicy::Include).unwrap();

        let labels: Vec<&str> = report.months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "2023-01");
        assert_eq!(labels[11], "2023-12");
        assert_eq!(report.months[0].total_kwh, 0.0);
        assert_eq!(report.months[1].total_kwh, 15.0);
        assert_eq!(report.months[10].total_kwh, 2.0);
        assert_eq!(report.total_kwh, 17.0);
        assert_eq!(report.consumption_by_customer_type.sum(), 15.0);
    }

    #[test]
    fn yearly_report_for_an_empty_year_is_all_zero() {
        let year: YearPeriod = "2021".parse().unwrap();
        let report = shape_yearly_report(&year, &[], UnrecognizedTypePolicy::Exclude).unwrap();
        assert_eq!(report.months.len(), 12);
        assert!(report.months.iter().all(|m| m.total_kwh == 0.0));
        assert!(report.top_consumers.is_empty());
    }

    #[tokio::test]
    async fn monthly_summary_runs_against_daily_summaries() {
        let store = FixtureStore::default().with_rows(
            CollectionName::DailyEnergySummary,
            vec![doc! {
                "byType": [ { "customer_type": "Other", "totalKWh": 6 } ],
                "topConsumers": [ { "customerId": "65a1f0c2e4b0a1b2c3d4e5f7", "totalKWh": 6 } ],
            }],
        );
        let month: MonthPeriod = "2024-01".parse().unwrap();

        let report = monthly_energy_summary(&store, UTILITY, &month, UnrecognizedTypePolicy::Include)
            .await
            .unwrap();

        assert_eq!(report.total_kwh, 6.0);
        assert_eq!(report.top_consumers[0].name, UNKNOWN_CUSTOMER_NAME);
        let pipeline = store.pipeline(CollectionName::DailyEnergySummary).unwrap();
        assert_eq!(
            pipeline[0].get_document("$match").unwrap().get_str("service_area_id").unwrap(),
            UTILITY
        );
    }
}
