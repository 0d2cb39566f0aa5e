use crate::mbta::types::{PredictionResponse, StopResponse};
use crate::mbta::{Prediction, Stop};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const MBTA_BASE_URL: &str = "https://api-v3.mbta.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const STOP_SEARCH_RADIUS: &str = "0.02";
const STOP_LIMIT: &str = "40";
// light rail, subway, commuter rail, bus, ferry
const STOP_ROUTE_TYPES: &str = "0,1,2,3,4";
const PREDICTION_LIMIT: &str = "100";

#[derive(Debug, Error)]
pub enum MbtaError {
    #[error("MBTA API returned status: {0}")]
    Status(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub struct MbtaClient {
    api_key: Option<String>,
    client: reqwest::Client,
    base_url: String,
}

impl MbtaClient {
    pub fn new(api_key: Option<String>) -> Result<Self, MbtaError> {
        Self::with_base_url(api_key, MBTA_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self, MbtaError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MbtaError> {
        let mut request = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(query);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MbtaError::Status(response.status().as_u16()));
        }
        Ok(response.json::<T>().await?)
    }

    /// Stops around a point, nearest first.
    pub async fn get_nearest_stops(&self, lat: f64, lon: f64) -> Result<Vec<Stop>, MbtaError> {
        let query = [
            ("filter[latitude]", format!("{:.6}", lat)),
            ("filter[longitude]", format!("{:.6}", lon)),
            ("filter[radius]", STOP_SEARCH_RADIUS.to_string()),
            ("sort", "distance".to_string()),
            ("page[limit]", STOP_LIMIT.to_string()),
            ("filter[route_type]", STOP_ROUTE_TYPES.to_string()),
        ];
        let response: StopResponse = self.get_json("stops", &query).await?;
        Ok(stops_from_response(response))
    }

    /// Upcoming departures keyed by stop id, each list in departure order.
    pub async fn get_predictions(
        &self,
        stop_ids: &[String],
    ) -> Result<HashMap<String, Vec<Prediction>>, MbtaError> {
        if stop_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = [
            ("filter[stop]", stop_ids.join(",")),
            ("sort", "departure_time".to_string()),
            ("page[limit]", PREDICTION_LIMIT.to_string()),
            ("include", "route,trip".to_string()),
        ];
        let response: PredictionResponse = self.get_json("predictions", &query).await?;
        Ok(predictions_from_response(response))
    }
}

pub(crate) fn stops_from_response(response: StopResponse) -> Vec<Stop> {
    response
        .data
        .into_iter()
        .filter_map(|item| {
            Some(Stop {
                id: item.id,
                name: item.attributes.name,
                latitude: item.attributes.latitude?,
                longitude: item.attributes.longitude?,
            })
        })
        .collect()
}

pub(crate) fn predictions_from_response(
    response: PredictionResponse,
) -> HashMap<String, Vec<Prediction>> {
    let mut route_colors: HashMap<&str, &str> = HashMap::new();
    let mut route_types: HashMap<&str, i32> = HashMap::new();
    let mut route_directions: HashMap<&str, &[Option<String>]> = HashMap::new();
    let mut trip_headsigns: HashMap<&str, &str> = HashMap::new();

    for inc in &response.included {
        match inc.kind.as_str() {
            "route" => {
                if let Some(color) = &inc.attributes.color {
                    route_colors.insert(&inc.id, color);
                }
                if let Some(route_type) = inc.attributes.route_type {
                    route_types.insert(&inc.id, route_type);
                }
                route_directions.insert(&inc.id, &inc.attributes.direction_names);
            }
            "trip" => {
                if let Some(headsign) = &inc.attributes.headsign {
                    trip_headsigns.insert(&inc.id, headsign);
                }
            }
            _ => {}
        }
    }

    let mut predictions: HashMap<String, Vec<Prediction>> = HashMap::new();
    for item in &response.data {
        let Some(raw_time) = item.attributes.departure_time.as_deref() else {
            continue;
        };
        let departure_time = match DateTime::parse_from_rfc3339(raw_time) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                debug!("Skipping prediction with departure time {:?}: {}", raw_time, e);
                continue;
            }
        };

        let stop_id = item.relationships.stop.id();
        let route_id = item.relationships.route.id();
        let trip_id = item.relationships.trip.id();
        let direction_id = item.attributes.direction_id;

        let headsign = trip_headsigns
            .get(trip_id)
            .filter(|h| !h.is_empty())
            .map(|h| h.to_string())
            .or_else(|| {
                let names = route_directions.get(route_id)?;
                names.get(direction_id?)?.clone()
            })
            .unwrap_or_default();

        predictions
            .entry(stop_id.to_string())
            .or_default()
            .push(Prediction {
                stop_id: stop_id.to_string(),
                departure_time,
                status: item.attributes.status.clone(),
                route_id: route_id.to_string(),
                route_type: route_types.get(route_id).copied(),
                route_color: route_colors.get(route_id).map(|c| c.to_string()),
                direction_id,
                headsign,
            });
    }

    for list in predictions.values_mut() {
        list.sort_by_key(|p| p.departure_time);
    }

    predictions
}
