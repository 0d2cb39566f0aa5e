use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    /// `[lon, lat]`, the order routing engines expect.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub stop_id: String,
    pub departure_time: DateTime<Utc>,
    pub status: Option<String>,
    pub route_id: String,
    pub route_type: Option<i32>,
    pub route_color: Option<String>,
    pub direction_id: Option<usize>,
    pub headsign: String,
}

// JSON:API documents returned by api-v3.mbta.com

#[derive(Debug, Deserialize)]
pub(crate) struct StopResponse {
    #[serde(default)]
    pub data: Vec<StopResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StopResource {
    pub id: String,
    pub attributes: StopAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StopAttributes {
    #[serde(default)]
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionResponse {
    #[serde(default)]
    pub data: Vec<PredictionResource>,
    #[serde(default)]
    pub included: Vec<IncludedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionResource {
    pub attributes: PredictionAttributes,
    #[serde(default)]
    pub relationships: PredictionRelationships,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionAttributes {
    pub departure_time: Option<String>,
    pub status: Option<String>,
    pub direction_id: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictionRelationships {
    #[serde(default)]
    pub route: Relationship,
    #[serde(default)]
    pub stop: Relationship,
    #[serde(default)]
    pub trip: Relationship,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Relationship {
    pub data: Option<ResourceIdentifier>,
}

impl Relationship {
    pub fn id(&self) -> &str {
        self.data.as_ref().map(|d| d.id.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceIdentifier {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IncludedResource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub attributes: IncludedAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IncludedAttributes {
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub route_type: Option<i32>,
    pub headsign: Option<String>,
    #[serde(default)]
    pub direction_names: Vec<Option<String>>,
}
