use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// How long a position fix may take before the session gives up.
pub const LOCATE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied. Please enable location access.")]
    PermissionDenied,
    #[error("Location information unavailable. Please try again.")]
    PositionUnavailable,
    #[error("Location request timed out. Please try again.")]
    Timeout,
}

pub trait LocationProvider {
    fn locate(&self) -> impl Future<Output = Result<Position, LocationError>> + Send;
}

/// A position handed in from configuration.
pub struct FixedLocation {
    position: Option<Position>,
}

impl FixedLocation {
    pub fn new(lat: Option<f64>, lon: Option<f64>) -> Self {
        let position = match (lat, lon) {
            (Some(lat), Some(lon)) if is_valid(lat, lon) => Some(Position { lat, lon }),
            _ => None,
        };
        Self { position }
    }
}

fn is_valid(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Position, LocationError> {
        self.position.ok_or(LocationError::PositionUnavailable)
    }
}

/// Asks `provider` for a fix once, bounded by `timeout`.
pub async fn acquire_position<L: LocationProvider>(
    provider: &L,
    timeout: Duration,
) -> Result<Position, LocationError> {
    tokio::time::timeout(timeout, provider.locate())
        .await
        .map_err(|_| LocationError::Timeout)?
}
