//! OpenRouteService foot-walking duration matrix.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org/v2/matrix";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum OrsError {
    #[error("ORS API returned status: {0}")]
    Status(u16),
    #[error("unexpected response format from ORS")]
    UnexpectedShape,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>,
    sources: Vec<usize>,
    destinations: Vec<usize>,
    metrics: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    durations: Vec<Vec<Option<f64>>>,
}

pub struct OrsClient {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OrsClient {
    pub fn new(api_key: Option<String>) -> Result<Self, OrsError> {
        Self::with_base_url(api_key, ORS_BASE_URL)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self, OrsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.unwrap_or_default(),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Walking seconds from `origin` to each destination, all `[lon, lat]`.
    pub async fn get_walking_times(
        &self,
        origin: [f64; 2],
        destinations: &[[f64; 2]],
    ) -> Result<Vec<f64>, OrsError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/foot-walking", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&matrix_request(origin, destinations))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OrsError::Status(response.status().as_u16()));
        }

        let matrix: MatrixResponse = response.json().await?;
        walking_times_from_matrix(matrix, destinations.len())
    }
}

fn matrix_request(origin: [f64; 2], destinations: &[[f64; 2]]) -> MatrixRequest {
    let mut locations = Vec::with_capacity(destinations.len() + 1);
    locations.push(origin);
    locations.extend_from_slice(destinations);

    MatrixRequest {
        locations,
        sources: vec![0],
        destinations: (1..=destinations.len()).collect(),
        metrics: vec!["duration"],
    }
}

/// Unroutable destinations come back as null and count as no walk at all.
fn walking_times_from_matrix(
    matrix: MatrixResponse,
    expected: usize,
) -> Result<Vec<f64>, OrsError> {
    let row = matrix
        .durations
        .into_iter()
        .next()
        .filter(|row| row.len() == expected)
        .ok_or(OrsError::UnexpectedShape)?;
    Ok(row.into_iter().map(|d| d.unwrap_or(0.0)).collect())
}
