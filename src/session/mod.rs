pub mod location;
pub mod source;

use crate::preferences::Preferences;
use crate::ranker::{RankerConfig, algorithm::rank_with_issues};
use crate::render::{self, RenderOptions};
use chrono::{DateTime, Utc};
use location::Position;
use source::{CommuteBatch, CommuteSource, FetchError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Ready,
    Failed(String),
}

/// What the dashboard currently knows about nearby departures.
///
/// A failed refresh never discards a good batch; it is only reported.
#[derive(Debug)]
pub struct Session {
    pub position: Position,
    batch: Option<Arc<CommuteBatch>>,
    state: SessionState,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            batch: None,
            state: SessionState::Loading,
            last_updated: None,
            last_error: None,
        }
    }

    pub fn apply(&mut self, result: Result<CommuteBatch, FetchError>, at: DateTime<Utc>) {
        match result {
            Ok(batch) => {
                self.batch = Some(Arc::new(batch));
                self.state = SessionState::Ready;
                self.last_updated = Some(at);
                self.last_error = None;
            }
            Err(e) => {
                let message = e.to_string();
                if self.batch.is_none() {
                    self.state = SessionState::Failed(message.clone());
                }
                self.last_error = Some(message);
            }
        }
    }

    pub fn batch(&self) -> Option<Arc<CommuteBatch>> {
        self.batch.clone()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

/// Fetches once for the session's position and records the result.
pub async fn refresh<S: CommuteSource>(source: &S, session: &RwLock<Session>) {
    let position = session.read().await.position;
    let result = source.fetch(position).await;
    match &result {
        Ok(batch) => info!("Fetched {} departures", batch.options.len()),
        Err(e) => warn!("Refresh failed: {}", e),
    }
    session.write().await.apply(result, Utc::now());
}

pub async fn run_poller<S: CommuteSource>(
    source: Arc<S>,
    session: Arc<RwLock<Session>>,
    every: Duration,
) {
    info!("Polling for departures every {}s", every.as_secs());
    loop {
        refresh(source.as_ref(), &session).await;
        tokio::time::sleep(every).await;
    }
}

/// Display settings for the redraw loop.
pub struct View {
    pub preferences: Preferences,
    pub ranker: RankerConfig,
    pub render: RenderOptions,
    /// Line to open in the detail panel, matched against card labels.
    pub detail: Option<String>,
}

/// Re-ranks the held batch against the wall clock; never triggers a fetch.
pub async fn run_redraw(session: Arc<RwLock<Session>>, view: View, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let text = {
            let session = session.read().await;
            frame(&session, &view, Utc::now())
        };
        print!("\x1b[2J\x1b[H{}", text);
    }
}

pub fn frame(session: &Session, view: &View, now: DateTime<Utc>) -> String {
    let batch = match (&session.state, &session.batch) {
        (SessionState::Loading, _) => return "Finding nearby commutes...\n".to_string(),
        (SessionState::Failed(message), _) => return format!("Error: {}\n", message),
        (SessionState::Ready, None) => return "Finding nearby commutes...\n".to_string(),
        (SessionState::Ready, Some(batch)) => batch,
    };

    let outcome = rank_with_issues(
        &batch.options,
        batch.issues.clone(),
        &view.preferences,
        now,
        &view.ranker,
    );
    let mut out = render::render_dashboard(&outcome, &view.render);

    if let Some(line) = &view.detail {
        match render::select_departure(&outcome, line) {
            Some(option) => {
                let detail =
                    render::detail_view(option, &view.preferences, now, &view.ranker, &view.render);
                out.push_str(&format!("\n{}\n", detail));
            }
            None => out.push_str(&format!("\nNo departures for {}\n", line)),
        }
    }

    if let Some(updated) = session.last_updated {
        out.push_str(&format!(
            "\nUpdated {}",
            updated.with_timezone(&view.render.timezone).format("%H:%M:%S")
        ));
    }
    if let Some(error) = &session.last_error {
        out.push_str(&format!(" (refresh failed: {})", error));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::DepartureOption;
    use chrono::Duration as ChronoDuration;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<CommuteBatch, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<CommuteBatch, FetchError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    impl CommuteSource for ScriptedSource {
        async fn fetch(&self, _position: Position) -> Result<CommuteBatch, FetchError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CommuteBatch::default()))
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-10-19T16:00:00Z".parse().unwrap()
    }

    fn server_error() -> FetchError {
        FetchError::Status {
            status: 500,
            body: "{\"error\":\"Failed to get stops: timeout\"}".to_string(),
        }
    }

    fn batch() -> CommuteBatch {
        let departure_time = Utc::now() + ChronoDuration::minutes(20);
        CommuteBatch {
            options: vec![DepartureOption {
                stop_name: "Kendall/MIT".to_string(),
                line: "RL".to_string(),
                headsign: "Ashmont".to_string(),
                route_color: None,
                route_type: Some(1),
                departure_time,
                walk_time_sec: 300.0,
                time_to_leave: departure_time - ChronoDuration::seconds(300),
                status: None,
            }],
            issues: vec![],
        }
    }

    fn view(detail: Option<&str>) -> View {
        View {
            preferences: Preferences::default(),
            ranker: RankerConfig::default(),
            render: RenderOptions::default(),
            detail: detail.map(str::to_string),
        }
    }

    fn session() -> RwLock<Session> {
        RwLock::new(Session::new(Position {
            lat: 42.3625,
            lon: -71.0862,
        }))
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_batch() {
        let source = ScriptedSource::new(vec![Ok(batch()), Err(server_error())]);
        let session = session();

        refresh(&source, &session).await;
        assert_eq!(session.read().await.state(), &SessionState::Ready);

        refresh(&source, &session).await;
        let session = session.read().await;
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.batch().unwrap().options.len(), 1);

        let text = frame(&session, &view(None), Utc::now());
        assert!(text.contains("Kendall/MIT"));
        assert!(text.contains("refresh failed: Server error (500)"));
    }

    #[tokio::test]
    async fn test_first_failure_is_error_state() {
        let source = ScriptedSource::new(vec![Err(server_error())]);
        let session = session();
        refresh(&source, &session).await;

        let session = session.read().await;
        assert!(matches!(session.state(), SessionState::Failed(msg) if msg.starts_with("Server error (500)")));
        assert!(session.batch().is_none());
        assert!(frame(&session, &view(None), now()).starts_with("Error: Server error (500)"));
    }

    #[tokio::test]
    async fn test_recovery_clears_error() {
        let source = ScriptedSource::new(vec![Err(server_error()), Ok(batch())]);
        let session = session();
        refresh(&source, &session).await;
        refresh(&source, &session).await;

        let session = session.read().await;
        assert_eq!(session.state(), &SessionState::Ready);
        assert!(!frame(&session, &view(None), Utc::now()).contains("refresh failed"));
    }

    #[test]
    fn test_loading_frame() {
        let session = Session::new(Position { lat: 0.0, lon: 0.0 });
        assert_eq!(frame(&session, &view(None), now()), "Finding nearby commutes...\n");
    }

    #[test]
    fn test_frame_with_detail() {
        let mut session = Session::new(Position { lat: 0.0, lon: 0.0 });
        session.apply(Ok(batch()), Utc::now());

        let text = frame(&session, &view(Some("RL")), Utc::now());
        assert!(text.contains("[RL] Red Line"));
        assert!(text.contains("To Ashmont"));

        let text = frame(&session, &view(Some("OL")), Utc::now());
        assert!(text.contains("No departures for OL"));
    }

    #[test]
    fn test_frame_reranks_against_clock() {
        let mut session = Session::new(Position { lat: 0.0, lon: 0.0 });
        session.apply(Ok(batch()), Utc::now());

        let early = frame(&session, &view(None), Utc::now());
        let late = frame(&session, &view(None), Utc::now() + ChronoDuration::minutes(30));
        assert!(!early.contains("NOW"));
        assert!(late.contains("NOW"));
    }
}
