use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Hour slots carried by every daily summary, in order.
pub const HOURS: [&str; 24] = [
    "00", "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14", "15",
    "16", "17", "18", "19", "20", "21", "22", "23",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEnergyReading {
    pub cumulative_energy: f64,
    pub energy_consumption: f64,
    pub hour: String,
    pub average_power: f64,
}

/// One customer's consumption for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergySummary {
    #[serde(rename = "customerId")]
    pub customer_id: ObjectId,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(rename = "totalKWh")]
    pub total_kwh: f64,
    pub service_area_id: String,
    #[serde(default)]
    pub last_heartbeat_end: Option<String>,
    #[serde(rename = "customerType", default)]
    pub customer_type: Option<String>,
    #[serde(rename = "meterSerial", default)]
    pub meter_serial: Option<String>,
    #[serde(default)]
    pub readings: Vec<HourlyEnergyReading>,
}

impl DailyEnergySummary {
    pub fn hour_index(hour: &str) -> Option<usize> {
        HOURS.iter().position(|h| *h == hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn decodes_summary_with_readings() {
        let summary: DailyEnergySummary = mongodb::bson::from_document(doc! {
            "customerId": ObjectId::new(),
            "date": "2024-03-05",
            "totalKWh": 3,
            "service_area_id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "customerType": "Residential",
            "readings": [
                { "cumulative_energy": 10.0, "energy_consumption": 1.5, "hour": "07", "average_power": 0.2 }
            ],
        })
        .unwrap();

        assert_eq!(summary.total_kwh, 3.0);
        assert_eq!(summary.readings.len(), 1);
        assert_eq!(DailyEnergySummary::hour_index(&summary.readings[0].hour), Some(7));
    }

    #[test]
    fn unknown_hour_has_no_slot() {
        assert_eq!(DailyEnergySummary::hour_index("24"), None);
        assert_eq!(DailyEnergySummary::hour_index("7"), None);
    }
}
