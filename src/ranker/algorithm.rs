use crate::preferences::Preferences;
use crate::ranker::types::{
    DataQualityIssue, DepartureOption, RankError, RankOutcome, RankedCard, Ranking, RouteGroup,
    RouteKey, StopBucket,
};
use crate::ranker::{RankerConfig, parse_payload};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Walk minutes after scaling by pace, rounded up.
pub fn effective_walk_minutes(walk_time_sec: f64, multiplier: f64) -> i64 {
    (walk_time_sec * multiplier / 60.0).ceil() as i64
}

pub fn rank(
    options: &[DepartureOption],
    prefs: &Preferences,
    now: DateTime<Utc>,
    config: &RankerConfig,
) -> RankOutcome {
    rank_with_issues(options, Vec::new(), prefs, now, config)
}

/// Validates a raw commute payload and ranks whatever survives.
pub fn rank_payload(
    payload: &Value,
    prefs: &Preferences,
    now: DateTime<Utc>,
    config: &RankerConfig,
) -> Result<RankOutcome, RankError> {
    let (options, issues) = parse_payload(payload)?;
    Ok(rank_with_issues(&options, issues, prefs, now, config))
}

pub(crate) fn rank_with_issues(
    options: &[DepartureOption],
    issues: Vec<DataQualityIssue>,
    prefs: &Preferences,
    now: DateTime<Utc>,
    config: &RankerConfig,
) -> RankOutcome {
    if options.is_empty() {
        return RankOutcome::NoCommutes { issues };
    }

    let multiplier = prefs.speed_multiplier();
    let mut cards: Vec<RankedCard> = build_groups(options, prefs)
        .into_iter()
        .filter_map(|group| make_card(group, multiplier, now, config))
        .collect();

    cards.sort_by(|a, b| {
        by_walk_then_appearance(
            a.walk_time_sec(),
            a.group.first_seen,
            b.walk_time_sec(),
            b.group.first_seen,
        )
    });

    let mut ranking = Ranking {
        issues,
        ..Ranking::default()
    };

    for card in cards {
        if card.group.pinned {
            ranking.pinned.push(card);
        } else if card.walk_minutes <= config.walk_buckets.close {
            ranking.close.push(card);
        } else if card.walk_minutes <= config.walk_buckets.medium {
            ranking.medium.push(card);
        } else {
            ranking.far.push(card);
        }
    }

    RankOutcome::Ranked(ranking)
}

fn by_walk_then_appearance(walk_a: f64, seen_a: usize, walk_b: f64, seen_b: usize) -> Ordering {
    walk_a.total_cmp(&walk_b).then(seen_a.cmp(&seen_b))
}

/// Groups by (route, destination) and, within that, by stop.
///
/// Groups come back in order of first appearance in `options`; stops within a
/// group nearest first, departures within a stop by time to leave.
fn build_groups(options: &[DepartureOption], prefs: &Preferences) -> Vec<RouteGroup> {
    let mut groups: BTreeMap<RouteKey, RouteGroup> = BTreeMap::new();

    for (index, option) in options.iter().enumerate() {
        let key = RouteKey::of(option);
        let group = groups.entry(key.clone()).or_insert_with(|| RouteGroup {
            label: option.display_line().to_string(),
            color: option.color().to_string(),
            pinned: prefs.is_pinned(&key.line),
            key,
            stops: Vec::new(),
            first_seen: index,
        });

        match group
            .stops
            .iter_mut()
            .find(|stop| stop.stop_name == option.stop_name)
        {
            Some(stop) => stop.options.push(option.clone()),
            None => group.stops.push(StopBucket {
                stop_name: option.stop_name.clone(),
                walk_time_sec: option.walk_time_sec,
                options: vec![option.clone()],
                first_seen: index,
            }),
        }
    }

    let mut groups: Vec<RouteGroup> = groups.into_values().collect();
    for group in &mut groups {
        for stop in &mut group.stops {
            stop.options.sort_by_key(|o| o.time_to_leave);
        }
        group.stops.sort_by(|a, b| {
            by_walk_then_appearance(a.walk_time_sec, a.first_seen, b.walk_time_sec, b.first_seen)
        });
    }
    groups.sort_by_key(|g| g.first_seen);
    groups
}

fn make_card(
    group: RouteGroup,
    multiplier: f64,
    now: DateTime<Utc>,
    config: &RankerConfig,
) -> Option<RankedCard> {
    let stop = group.nearest_stop()?;
    let next = stop.next_option()?.clone();
    let upcoming = stop
        .options
        .iter()
        .skip(1)
        .take(config.upcoming_alternatives)
        .cloned()
        .collect();
    let walk_minutes = effective_walk_minutes(stop.walk_time_sec, multiplier);
    let minutes_until_leave = next.minutes_until_leave(multiplier, now);

    Some(RankedCard {
        urgency: config.urgency.classify(minutes_until_leave),
        group,
        next,
        upcoming,
        walk_minutes,
        minutes_until_leave,
    })
}
