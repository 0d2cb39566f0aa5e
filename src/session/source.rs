use crate::ranker::{DataQualityIssue, DepartureOption, RankError, parse_payload};
use crate::session::location::Position;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Server error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Payload(#[from] RankError),
}

/// One poll's worth of departures plus whatever had to be thrown away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommuteBatch {
    pub options: Vec<DepartureOption>,
    pub issues: Vec<DataQualityIssue>,
}

impl CommuteBatch {
    pub fn from_payload(payload: &Value) -> Result<Self, RankError> {
        let (options, issues) = parse_payload(payload)?;
        for issue in &issues {
            warn!("Dropped departure #{}: {}", issue.index, issue.defect);
        }
        Ok(Self { options, issues })
    }
}

pub trait CommuteSource: Send + Sync {
    fn fetch(
        &self,
        position: Position,
    ) -> impl Future<Output = Result<CommuteBatch, FetchError>> + Send;
}

/// Talks to a ttimes server's `/api/commute`.
pub struct HttpCommuteSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCommuteSource {
    pub fn new(server_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/commute", server_url.trim_end_matches('/')),
        })
    }
}

impl CommuteSource for HttpCommuteSource {
    async fn fetch(&self, position: Position) -> Result<CommuteBatch, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&position)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(CommuteBatch::from_payload(&payload)?)
    }
}
