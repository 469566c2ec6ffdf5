use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Auto,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterPhase {
    #[serde(rename = "1")]
    Single,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "N/A")]
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Meter record; ids and tariff references are stored with mixed types
/// upstream, so they stay as raw BSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    pub id: Bson,
    pub serial: String,
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub tariff_id: Bson,
    #[serde(default)]
    pub pole_id: Option<String>,
    #[serde(default)]
    pub tariff: Option<Bson>,
    pub operating_mode: OperatingMode,
    #[serde(default)]
    pub meter_phase: Option<MeterPhase>,
    #[serde(rename = "utilityId")]
    pub utility_id: String,
}
