use crate::commute::cache::TtlCache;
use crate::lines::line_code;
use crate::mbta::{MbtaClient, MbtaError, Prediction, Stop};
use crate::ors::{OrsClient, OrsError};
use crate::ranker::DepartureOption;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const STOPS_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(5 * 60);
const WALK_TIMES_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(30 * 60);
const PREDICTIONS_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(15);

/// Departures whose leave time passed longer ago than this are dropped.
const LEAVE_GRACE_MINUTES: i64 = 5;

pub type PredictionsByStop = HashMap<String, Vec<Prediction>>;

#[derive(Debug, Error)]
pub enum CommuteError {
    #[error("Failed to get stops: {0}")]
    Stops(#[source] MbtaError),
    #[error("Failed to get walk times: {0}")]
    WalkTimes(#[source] OrsError),
    #[error("Failed to get predictions: {0}")]
    Predictions(#[source] MbtaError),
}

/// Where stops and live predictions come from.
pub trait TransitFeed: Send + Sync {
    fn nearest_stops(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<Vec<Stop>, MbtaError>> + Send;

    fn predictions(
        &self,
        stop_ids: &[String],
    ) -> impl Future<Output = Result<PredictionsByStop, MbtaError>> + Send;
}

/// Where walking durations come from.
pub trait WalkingMatrix: Send + Sync {
    fn walking_times(
        &self,
        origin: [f64; 2],
        destinations: &[[f64; 2]],
    ) -> impl Future<Output = Result<Vec<f64>, OrsError>> + Send;
}

impl TransitFeed for MbtaClient {
    fn nearest_stops(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<Vec<Stop>, MbtaError>> + Send {
        self.get_nearest_stops(lat, lon)
    }

    fn predictions(
        &self,
        stop_ids: &[String],
    ) -> impl Future<Output = Result<PredictionsByStop, MbtaError>> + Send {
        self.get_predictions(stop_ids)
    }
}

impl WalkingMatrix for OrsClient {
    fn walking_times(
        &self,
        origin: [f64; 2],
        destinations: &[[f64; 2]],
    ) -> impl Future<Output = Result<Vec<f64>, OrsError>> + Send {
        self.get_walking_times(origin, destinations)
    }
}

#[derive(Default)]
struct CommuteCaches {
    stops: TtlCache<Vec<Stop>>,
    walk_times: TtlCache<Vec<f64>>,
    predictions: TtlCache<Arc<PredictionsByStop>>,
}

/// Turns a location into the flat list of departures worth showing.
pub struct CommuteService<T, W> {
    transit: T,
    walking: W,
    caches: CommuteCaches,
}

impl<T: TransitFeed, W: WalkingMatrix> CommuteService<T, W> {
    pub fn new(transit: T, walking: W) -> Self {
        Self {
            transit,
            walking,
            caches: CommuteCaches::default(),
        }
    }

    pub async fn commute_options(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<DepartureOption>, CommuteError> {
        let location_key = format!("loc:{:.4},{:.4}", lat, lon);

        let stops_key = format!("stops:{}", location_key);
        let stops = match self.caches.stops.get(&stops_key).await {
            Some(stops) => {
                debug!("Cache HIT: {} stops for {}", stops.len(), location_key);
                stops
            }
            None => {
                let stops = self
                    .transit
                    .nearest_stops(lat, lon)
                    .await
                    .map_err(CommuteError::Stops)?;
                self.caches
                    .stops
                    .insert(stops_key, stops.clone(), STOPS_CACHE_TTL)
                    .await;
                debug!(
                    "Cache MISS: {} stops from API, {} locations cached",
                    stops.len(),
                    self.caches.stops.len().await
                );
                stops
            }
        };

        if stops.is_empty() {
            return Ok(Vec::new());
        }

        let walk_key = format!("walk:{}", location_key);
        let walk_times = match self.caches.walk_times.get(&walk_key).await {
            Some(times) => {
                debug!("Cache HIT: walk times for {}", location_key);
                times
            }
            None => {
                let destinations: Vec<[f64; 2]> = stops.iter().map(Stop::lon_lat).collect();
                let times = self
                    .walking
                    .walking_times([lon, lat], &destinations)
                    .await
                    .map_err(CommuteError::WalkTimes)?;
                self.caches
                    .walk_times
                    .insert(walk_key, times.clone(), WALK_TIMES_CACHE_TTL)
                    .await;
                debug!("Cache MISS: walk times from API");
                times
            }
        };

        let stop_ids: Vec<String> = stops.iter().map(|s| s.id.clone()).collect();
        let predictions_key = format!("preds:{}", stop_ids.join(","));
        let predictions = match self.caches.predictions.get(&predictions_key).await {
            Some(predictions) => {
                debug!("Cache HIT: predictions for {} stops", stop_ids.len());
                predictions
            }
            None => {
                let predictions = Arc::new(
                    self.transit
                        .predictions(&stop_ids)
                        .await
                        .map_err(CommuteError::Predictions)?,
                );
                self.caches
                    .predictions
                    .insert(predictions_key, predictions.clone(), PREDICTIONS_CACHE_TTL)
                    .await;
                debug!("Cache MISS: predictions from API ({} stops)", predictions.len());
                predictions
            }
        };

        let options = assemble_options(&stops, &walk_times, &predictions, Utc::now());
        info!("Returning {} options", options.len());
        Ok(options)
    }
}

/// Joins stops, walk times and predictions into departure options.
///
/// Stops keep their distance order. Departures already gone are dropped, as
/// are ones the rider would have had to leave for more than
/// `LEAVE_GRACE_MINUTES` ago.
pub fn assemble_options(
    stops: &[Stop],
    walk_times: &[f64],
    predictions: &PredictionsByStop,
    now: DateTime<Utc>,
) -> Vec<DepartureOption> {
    let mut options = Vec::new();
    let cutoff = now - Duration::minutes(LEAVE_GRACE_MINUTES);

    for (i, stop) in stops.iter().enumerate() {
        let Some(preds) = predictions.get(&stop.id).filter(|p| !p.is_empty()) else {
            debug!("No predictions for stop {}", stop.id);
            continue;
        };

        let walk_sec = walk_times.get(i).copied().unwrap_or(0.0);

        for p in preds {
            if p.departure_time < now {
                continue;
            }

            let Some(time_to_leave) = Duration::try_seconds(walk_sec as i64)
                .and_then(|walk| p.departure_time.checked_sub_signed(walk))
            else {
                debug!("Skipping {} {}: walk of {}s is out of range", stop.name, p.route_id, walk_sec);
                continue;
            };
            if time_to_leave < cutoff {
                debug!(
                    "Skipping {} {}: leave time {} is too late (walk: {:.0}s)",
                    stop.name, p.route_id, time_to_leave, walk_sec
                );
                continue;
            }

            options.push(DepartureOption {
                stop_name: stop.name.clone(),
                line: line_code(&p.route_id),
                headsign: p.headsign.clone(),
                route_color: p.route_color.clone(),
                route_type: p.route_type,
                departure_time: p.departure_time,
                walk_time_sec: walk_sec,
                time_to_leave,
                status: p.status.clone(),
            });
        }
    }

    options
}
