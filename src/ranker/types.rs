use crate::lines;
use crate::ranker::status::Urgency;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ROUTE_COLOR: &str = "FFC72C";

/// Longest walk a record may claim; anything above is treated as bad data.
pub const MAX_WALK_TIME_SEC: f64 = 24.0 * 60.0 * 60.0;

/// One predicted departure, as served by `/api/commute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureOption {
    pub stop_name: String,
    pub line: String,
    pub headsign: String,
    pub route_color: Option<String>,
    pub route_type: Option<i32>,
    pub departure_time: DateTime<Utc>,
    pub walk_time_sec: f64,
    pub time_to_leave: DateTime<Utc>,
    pub status: Option<String>,
}

impl DepartureOption {
    pub fn color(&self) -> &str {
        match self.route_color.as_deref() {
            Some(color) if !color.is_empty() => color,
            _ => DEFAULT_ROUTE_COLOR,
        }
    }

    pub fn display_line(&self) -> &str {
        lines::display_line(&self.line)
    }

    /// Leave time once the walk is scaled by the rider's pace, `None` when
    /// the walk does not fit in a timestamp.
    pub fn leave_time(&self, multiplier: f64) -> Option<DateTime<Utc>> {
        let walk_ms = self.walk_time_sec * multiplier * 1000.0;
        if !walk_ms.is_finite() {
            return None;
        }
        let walk = Duration::try_milliseconds(walk_ms as i64)?;
        self.departure_time.checked_sub_signed(walk)
    }

    /// Milliseconds from `now` until the rider has to leave; negative once late.
    pub fn millis_until_leave(&self, multiplier: f64, now: DateTime<Utc>) -> f64 {
        self.departure_time.timestamp_millis() as f64
            - self.walk_time_sec * multiplier * 1000.0
            - now.timestamp_millis() as f64
    }

    pub fn minutes_until_leave(&self, multiplier: f64, now: DateTime<Utc>) -> i64 {
        (self.millis_until_leave(multiplier, now) / 60_000.0).floor() as i64
    }
}

/// A departure record as it arrives off the wire, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDepartureOption {
    pub stop_name: Option<String>,
    pub line: Option<String>,
    pub headsign: Option<String>,
    pub route_color: Option<String>,
    pub route_type: Option<i32>,
    pub departure_time: Option<String>,
    pub walk_time_sec: Option<f64>,
    pub time_to_leave: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<RawDepartureOption> for DepartureOption {
    type Error = RecordDefect;

    fn try_from(raw: RawDepartureOption) -> Result<Self, Self::Error> {
        let line = non_empty(raw.line).ok_or(RecordDefect::MissingField("line"))?;
        let stop_name = non_empty(raw.stop_name).ok_or(RecordDefect::MissingField("stop_name"))?;
        let departure_raw = raw
            .departure_time
            .ok_or(RecordDefect::MissingField("departure_time"))?;
        let departure_time = parse_timestamp("departure_time", departure_raw)?;

        let walk_time_sec = raw
            .walk_time_sec
            .ok_or(RecordDefect::MissingField("walk_time_sec"))?;
        if !walk_time_sec.is_finite() || !(0.0..=MAX_WALK_TIME_SEC).contains(&walk_time_sec) {
            return Err(RecordDefect::InvalidWalkTime(walk_time_sec));
        }

        let time_to_leave = match raw.time_to_leave {
            Some(value) => parse_timestamp("time_to_leave", value)?,
            None => Duration::try_seconds(walk_time_sec as i64)
                .and_then(|walk| departure_time.checked_sub_signed(walk))
                .ok_or(RecordDefect::InvalidWalkTime(walk_time_sec))?,
        };

        Ok(DepartureOption {
            stop_name,
            line,
            headsign: raw.headsign.unwrap_or_default(),
            route_color: raw.route_color,
            route_type: raw.route_type,
            departure_time,
            walk_time_sec,
            time_to_leave,
            status: raw.status.filter(|s| !s.is_empty()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(field: &'static str, value: String) -> Result<DateTime<Utc>, RecordDefect> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| RecordDefect::MalformedTimestamp { field, value })
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RecordDefect {
    #[error("record is not a departure option: {0}")]
    Malformed(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unparsable timestamp in `{field}`: {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },
    #[error("invalid walk time {0}")]
    InvalidWalkTime(f64),
}

/// A record dropped from a batch, surfaced to whoever fetched it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityIssue {
    pub index: usize,
    pub defect: RecordDefect,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("commute payload is not a list of departure options")]
    InvalidInput,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RouteKey {
    pub line: String,
    pub headsign: String,
}

impl RouteKey {
    pub fn of(option: &DepartureOption) -> Self {
        Self {
            line: option.line.clone(),
            headsign: option.headsign.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopBucket {
    pub stop_name: String,
    pub walk_time_sec: f64,
    /// Ordered by time to leave, earliest first.
    pub options: Vec<DepartureOption>,
    #[serde(skip)]
    pub(crate) first_seen: usize,
}

impl StopBucket {
    pub fn next_option(&self) -> Option<&DepartureOption> {
        self.options.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGroup {
    pub key: RouteKey,
    pub label: String,
    pub color: String,
    pub pinned: bool,
    /// Ordered by walk time, nearest first.
    pub stops: Vec<StopBucket>,
    #[serde(skip)]
    pub(crate) first_seen: usize,
}

impl RouteGroup {
    pub fn nearest_stop(&self) -> Option<&StopBucket> {
        self.stops.first()
    }

    pub fn option_count(&self) -> usize {
        self.stops.iter().map(|s| s.options.len()).sum()
    }
}

/// A route group reduced to the one departure worth catching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCard {
    /// Always holds at least one stop; only the ranker builds cards.
    pub(crate) group: RouteGroup,
    pub next: DepartureOption,
    /// Later departures from the same stop.
    pub upcoming: Vec<DepartureOption>,
    pub walk_minutes: i64,
    pub minutes_until_leave: i64,
    pub urgency: Urgency,
}

impl RankedCard {
    pub fn group(&self) -> &RouteGroup {
        &self.group
    }

    pub fn stop(&self) -> &StopBucket {
        // a card is only built from a group with a stop
        &self.group.stops[0]
    }

    pub fn walk_time_sec(&self) -> f64 {
        self.stop().walk_time_sec
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub pinned: Vec<RankedCard>,
    pub close: Vec<RankedCard>,
    pub medium: Vec<RankedCard>,
    pub far: Vec<RankedCard>,
    pub issues: Vec<DataQualityIssue>,
}

impl Ranking {
    pub fn card_count(&self) -> usize {
        self.pinned.len() + self.close.len() + self.medium.len() + self.far.len()
    }

    pub fn cards(&self) -> impl Iterator<Item = &RankedCard> {
        self.pinned
            .iter()
            .chain(&self.close)
            .chain(&self.medium)
            .chain(&self.far)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RankOutcome {
    NoCommutes { issues: Vec<DataQualityIssue> },
    Ranked(Ranking),
}

impl RankOutcome {
    pub fn issues(&self) -> &[DataQualityIssue] {
        match self {
            RankOutcome::NoCommutes { issues } => issues,
            RankOutcome::Ranked(ranking) => &ranking.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawDepartureOption {
        RawDepartureOption {
            stop_name: Some("Park Street".to_string()),
            line: Some("RL".to_string()),
            headsign: Some("Alewife".to_string()),
            route_color: Some("DA291C".to_string()),
            route_type: Some(1),
            departure_time: Some("2026-10-19T12:10:00Z".to_string()),
            walk_time_sec: Some(240.0),
            time_to_leave: Some("2026-10-19T12:06:00Z".to_string()),
            status: None,
        }
    }

    #[test]
    fn test_valid_record_converts() {
        let option = DepartureOption::try_from(raw()).unwrap();
        assert_eq!(option.line, "RL");
        assert_eq!(option.color(), "DA291C");
        assert_eq!(option.time_to_leave.to_rfc3339(), "2026-10-19T12:06:00+00:00");
    }

    #[test]
    fn test_malformed_departure_fails_closed() {
        let mut record = raw();
        record.departure_time = Some("soon".to_string());
        assert_eq!(
            DepartureOption::try_from(record).unwrap_err(),
            RecordDefect::MalformedTimestamp {
                field: "departure_time",
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_leave_time_fails_closed() {
        let mut record = raw();
        record.time_to_leave = Some("12:06".to_string());
        assert_eq!(
            DepartureOption::try_from(record).unwrap_err(),
            RecordDefect::MalformedTimestamp {
                field: "time_to_leave",
                value: "12:06".to_string()
            }
        );
    }

    #[test]
    fn test_implausible_walk_is_rejected() {
        let mut record = raw();
        record.time_to_leave = None;
        record.walk_time_sec = Some(1e17);
        assert_eq!(
            DepartureOption::try_from(record).unwrap_err(),
            RecordDefect::InvalidWalkTime(1e17)
        );

        let mut record = raw();
        record.walk_time_sec = Some(MAX_WALK_TIME_SEC + 1.0);
        assert!(DepartureOption::try_from(record).is_err());
    }

    #[test]
    fn test_leave_time_out_of_range_is_none() {
        let mut option = DepartureOption::try_from(raw()).unwrap();
        assert_eq!(
            option.leave_time(1.0).unwrap().to_rfc3339(),
            "2026-10-19T12:06:00+00:00"
        );
        option.walk_time_sec = 1e13;
        assert_eq!(option.leave_time(1.0), None);
        option.walk_time_sec = f64::INFINITY;
        assert_eq!(option.leave_time(0.7), None);
    }

    #[test]
    fn test_missing_leave_time_is_derived() {
        let mut record = raw();
        record.time_to_leave = None;
        let option = DepartureOption::try_from(record).unwrap();
        assert_eq!(option.time_to_leave.to_rfc3339(), "2026-10-19T12:06:00+00:00");
    }

    #[test]
    fn test_negative_walk_is_rejected() {
        let mut record = raw();
        record.walk_time_sec = Some(-1.0);
        assert_eq!(
            DepartureOption::try_from(record).unwrap_err(),
            RecordDefect::InvalidWalkTime(-1.0)
        );
    }

    #[test]
    fn test_empty_color_falls_back() {
        let mut record = raw();
        record.route_color = Some(String::new());
        let option = DepartureOption::try_from(record).unwrap();
        assert_eq!(option.color(), DEFAULT_ROUTE_COLOR);
    }

    #[test]
    fn test_minutes_until_leave_floors() {
        let option = DepartureOption::try_from(raw()).unwrap();
        let now = "2026-10-19T12:05:30Z".parse::<DateTime<Utc>>().unwrap();
        // 12:10 - 4 min walk = 12:06, 30s away
        assert_eq!(option.minutes_until_leave(1.0, now), 0);
        let late = "2026-10-19T12:06:30Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(option.minutes_until_leave(1.0, late), -1);
        // running shaves 72s off the walk
        assert_eq!(option.minutes_until_leave(0.7, now), 1);
    }
}
