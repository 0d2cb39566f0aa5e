//! Commute option ranking.
//!
//! A flat batch of departures goes in, a display-ready partition comes out:
//! pinned routes first, then close/medium/far tiers by walking distance, each
//! route and destination reduced to the soonest departure at its nearest stop.
//! Everything here is a pure function of (options, preferences, now).

pub mod algorithm;
pub mod status;
pub mod types;

pub use algorithm::{effective_walk_minutes, rank, rank_payload};
pub use status::{Urgency, UrgencyThresholds};
pub use types::{
    DataQualityIssue, DepartureOption, RankError, RankOutcome, RankedCard, Ranking,
    RawDepartureOption, RecordDefect, RouteGroup, RouteKey, StopBucket,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Walk-minute edges of the distance tiers, inclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkBuckets {
    pub close: i64,
    pub medium: i64,
}

impl Default for WalkBuckets {
    fn default() -> Self {
        Self {
            close: 5,
            medium: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankerConfig {
    pub walk_buckets: WalkBuckets,
    pub urgency: UrgencyThresholds,
    /// Later departures kept on each card besides the next one.
    pub upcoming_alternatives: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            walk_buckets: WalkBuckets::default(),
            urgency: UrgencyThresholds::default(),
            upcoming_alternatives: 3,
        }
    }
}

/// Splits a commute payload into valid options and the records it dropped.
///
/// Accepts the `{"options": [...]}` envelope, a bare list, or null (no
/// commutes). Anything else is structurally unusable.
pub fn parse_payload(
    payload: &Value,
) -> Result<(Vec<DepartureOption>, Vec<DataQualityIssue>), RankError> {
    match payload {
        Value::Null => Ok((Vec::new(), Vec::new())),
        Value::Array(records) => Ok(validate_records(records)),
        Value::Object(envelope) => match envelope.get("options") {
            Some(Value::Null) | None => Ok((Vec::new(), Vec::new())),
            Some(Value::Array(records)) => Ok(validate_records(records)),
            Some(_) => Err(RankError::InvalidInput),
        },
        _ => Err(RankError::InvalidInput),
    }
}

fn validate_records(records: &[Value]) -> (Vec<DepartureOption>, Vec<DataQualityIssue>) {
    let mut options = Vec::with_capacity(records.len());
    let mut issues = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let converted = serde_json::from_value::<RawDepartureOption>(record.clone())
            .map_err(|e| RecordDefect::Malformed(e.to_string()))
            .and_then(DepartureOption::try_from);

        match converted {
            Ok(option) => options.push(option),
            Err(defect) => issues.push(DataQualityIssue { index, defect }),
        }
    }

    (options, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(departure: &str) -> Value {
        json!({
            "stop_name": "Park Street",
            "line": "RL",
            "headsign": "Alewife",
            "route_color": "DA291C",
            "route_type": 1,
            "departure_time": departure,
            "walk_time_sec": 120.0,
            "time_to_leave": "2026-10-19T12:08:00Z",
            "status": ""
        })
    }

    #[test]
    fn test_envelope_and_bare_list_accepted() {
        let envelope = json!({ "options": [record("2026-10-19T12:10:00Z")] });
        let (options, issues) = parse_payload(&envelope).unwrap();
        assert_eq!(options.len(), 1);
        assert!(issues.is_empty());
        assert_eq!(options[0].status, None);

        let bare = json!([record("2026-10-19T12:10:00Z")]);
        assert_eq!(parse_payload(&bare).unwrap().0.len(), 1);
    }

    #[test]
    fn test_null_and_missing_options_are_empty() {
        assert_eq!(parse_payload(&Value::Null).unwrap().0.len(), 0);
        assert_eq!(parse_payload(&json!({ "options": null })).unwrap().0.len(), 0);
        assert_eq!(parse_payload(&json!({})).unwrap().0.len(), 0);
    }

    #[test]
    fn test_non_list_payload_is_invalid() {
        assert_eq!(parse_payload(&json!("nope")), Err(RankError::InvalidInput));
        assert_eq!(parse_payload(&json!(42)), Err(RankError::InvalidInput));
        assert_eq!(
            parse_payload(&json!({ "options": "x" })),
            Err(RankError::InvalidInput)
        );
    }

    #[test]
    fn test_bad_records_dropped_rest_kept() {
        let payload = json!([
            record("2026-10-19T12:10:00Z"),
            record("not a time"),
            "garbage",
            record("2026-10-19T12:20:00Z"),
        ]);
        let (options, issues) = parse_payload(&payload).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].index, 1);
        assert!(matches!(
            issues[0].defect,
            RecordDefect::MalformedTimestamp { field: "departure_time", .. }
        ));
        assert_eq!(issues[1].index, 2);
        assert!(matches!(issues[1].defect, RecordDefect::Malformed(_)));
    }

    #[test]
    fn test_huge_walk_time_is_an_issue() {
        let mut huge = record("2026-10-19T12:10:00Z");
        huge["walk_time_sec"] = json!(1e17);
        huge.as_object_mut().unwrap().remove("time_to_leave");
        let payload = json!([huge, record("2026-10-19T12:12:00Z")]);

        let (options, issues) = parse_payload(&payload).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 0);
        assert!(matches!(issues[0].defect, RecordDefect::InvalidWalkTime(_)));
    }
}
