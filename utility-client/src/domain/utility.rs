use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemType {
    #[serde(rename = "lv-off-grid")]
    LvOffGrid,
    #[serde(rename = "mv-off-grid")]
    MvOffGrid,
    #[serde(rename = "grid-connected")]
    GridConnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemComponent {
    pub component: String,
    pub capacity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationServed {
    #[serde(default)]
    pub males: Option<u64>,
    #[serde(default)]
    pub females: Option<u64>,
}

/// GeoJSON point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utility {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default = "default_acronym")]
    pub acronym: String,
    pub country: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(rename = "totalInstalledCapacitykW", default)]
    pub total_installed_capacity_kw: Option<f64>,
    #[serde(default)]
    pub system_components: Vec<SystemComponent>,
    pub system_type: SystemType,
    #[serde(default)]
    pub system_description: String,
    #[serde(default)]
    pub number_of_customers: Option<u64>,
    #[serde(default)]
    pub population_served: Option<PopulationServed>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub is_active: bool,
}

fn default_acronym() -> String {
    "-".to_string()
}
