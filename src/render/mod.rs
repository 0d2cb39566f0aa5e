//! Plain-text presentation of a ranking and of a single departure.

use crate::lines;
use crate::preferences::Preferences;
use crate::ranker::status::{clock_parts, format_chip, format_countdown};
use crate::ranker::{DepartureOption, RankOutcome, RankedCard, RankerConfig, Ranking, Urgency};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::{self, Write};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const EMPTY_STATE: &str = "No commutes nearby";
const UNKNOWN_CLOCK: &str = "--:--";

pub struct RenderOptions {
    pub timezone: Tz,
    /// Appended to stop names when searching a map for them.
    pub map_region: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            map_region: "Boston, MA".to_string(),
        }
    }
}

impl RenderOptions {
    fn clock(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone).format("%H:%M").to_string()
    }
}

pub fn render_dashboard(outcome: &RankOutcome, opts: &RenderOptions) -> String {
    let mut out = String::new();
    match outcome {
        RankOutcome::NoCommutes { .. } => out.push_str(EMPTY_STATE),
        RankOutcome::Ranked(ranking) => render_ranking(&mut out, ranking, opts),
    }

    let dropped = outcome.issues().len();
    if dropped > 0 {
        let _ = write!(out, "\n({} departures skipped: unreadable data)", dropped);
    }
    out.push('\n');
    out
}

fn render_ranking(out: &mut String, ranking: &Ranking, opts: &RenderOptions) {
    if let Some(nearest) = ranking
        .cards()
        .min_by(|a, b| a.walk_time_sec().total_cmp(&b.walk_time_sec()))
    {
        let _ = writeln!(out, "Near {}", nearest.stop().stop_name);
    }

    if !ranking.pinned.is_empty() {
        let chips: Vec<String> = ranking.pinned.iter().map(render_saved_chip).collect();
        let _ = writeln!(out, "\nSaved\n  {}", chips.join("   "));
    }

    for (title, cards) in [
        ("Immediate", &ranking.close),
        ("Nearby", &ranking.medium),
        ("Further", &ranking.far),
    ] {
        if cards.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}", title);
        for card in cards {
            render_card(out, card, opts);
        }
    }
}

fn render_saved_chip(card: &RankedCard) -> String {
    format!(
        "[{}] {} {}",
        card.group.label,
        card.group.key.headsign,
        format_chip(card.minutes_until_leave)
    )
}

fn render_card(out: &mut String, card: &RankedCard, opts: &RenderOptions) {
    let _ = writeln!(
        out,
        "  [{:>3}] {:<28} {:>8}  {}",
        card.group.label,
        card.group.key.headsign,
        format_countdown(card.minutes_until_leave),
        card.urgency.label()
    );
    let _ = write!(
        out,
        "        {} min walk · {}",
        card.walk_minutes,
        card.stop().stop_name
    );
    if !card.upcoming.is_empty() {
        let later: Vec<String> = card
            .upcoming
            .iter()
            .map(|o| opts.clock(o.departure_time))
            .collect();
        let _ = write!(out, " · then {}", later.join(", "));
    }
    out.push('\n');
}

/// Everything shown for one selected departure.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub line_label: String,
    pub line_name: String,
    pub color: String,
    pub stop_name: String,
    pub headsign: String,
    pub walk_minutes: i64,
    pub departs_at: String,
    pub leave_at: String,
    pub countdown: (i64, i64),
    pub urgency: Urgency,
    pub pinned: bool,
    pub navigation_url: String,
}

pub fn detail_view(
    option: &DepartureOption,
    prefs: &Preferences,
    now: DateTime<Utc>,
    config: &RankerConfig,
    opts: &RenderOptions,
) -> DetailView {
    let multiplier = prefs.speed_multiplier();
    let countdown = clock_parts(option.millis_until_leave(multiplier, now));

    DetailView {
        line_label: option.display_line().to_string(),
        line_name: lines::full_line_name(&option.line),
        color: option.color().to_string(),
        stop_name: option.stop_name.clone(),
        headsign: option.headsign.clone(),
        walk_minutes: crate::ranker::effective_walk_minutes(option.walk_time_sec, multiplier),
        departs_at: opts.clock(option.departure_time),
        leave_at: option
            .leave_time(multiplier)
            .map(|at| opts.clock(at))
            .unwrap_or_else(|| UNKNOWN_CLOCK.to_string()),
        countdown,
        urgency: config.urgency.classify(countdown.0),
        pinned: prefs.is_pinned(&option.line),
        navigation_url: navigation_url(&option.stop_name, &opts.map_region),
    }
}

/// Next departure of the first card whose label or line matches `line`.
pub fn select_departure<'a>(outcome: &'a RankOutcome, line: &str) -> Option<&'a DepartureOption> {
    let RankOutcome::Ranked(ranking) = outcome else {
        return None;
    };
    ranking
        .cards()
        .find(|card| card.group.label.eq_ignore_ascii_case(line) || card.next.line.eq_ignore_ascii_case(line))
        .map(|card| &card.next)
}

pub fn navigation_url(stop_name: &str, region: &str) -> String {
    let query = format!("{}, {}", stop_name, region);
    format!("{}{}", MAPS_SEARCH_URL, urlencoding::encode(&query))
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {} (#{})", self.line_label, self.line_name, self.color)?;
        writeln!(f, "{}", self.stop_name)?;
        writeln!(f, "To {}", self.headsign)?;
        writeln!(f, "{} min walk · Departs {} · Leave by {}", self.walk_minutes, self.departs_at, self.leave_at)?;
        writeln!(
            f,
            "Leave in {:02}:{:02}  {} ({})",
            self.countdown.0,
            self.countdown.1,
            self.urgency.label(),
            self.urgency.indicator()
        )?;
        writeln!(
            f,
            "{}",
            if self.pinned {
                "Saved to favorites"
            } else {
                "Not in favorites"
            }
        )?;
        write!(f, "Directions: {}", self.navigation_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::rank;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-10-19T16:00:00Z".parse().unwrap()
    }

    fn option(line: &str, headsign: &str, walk_sec: f64, departs_in: i64) -> DepartureOption {
        let departure_time = now() + Duration::minutes(departs_in);
        DepartureOption {
            stop_name: "Park Street".to_string(),
            line: line.to_string(),
            headsign: headsign.to_string(),
            route_color: Some("DA291C".to_string()),
            route_type: Some(1),
            departure_time,
            walk_time_sec: walk_sec,
            time_to_leave: departure_time - Duration::seconds(walk_sec as i64),
            status: None,
        }
    }

    #[test]
    fn test_navigation_url_encodes_query() {
        assert_eq!(
            navigation_url("Park Street", "Boston, MA"),
            "https://www.google.com/maps/search/?api=1&query=Park%20Street%2C%20Boston%2C%20MA"
        );
    }

    #[test]
    fn test_detail_view_fields() {
        let opt = option("RL", "Alewife", 240.0, 10);
        let mut prefs = Preferences::default();
        prefs.toggle_pin("RL");
        let view = detail_view(&opt, &prefs, now(), &RankerConfig::default(), &RenderOptions::default());

        assert_eq!(view.line_name, "Red Line");
        assert_eq!(view.departs_at, "12:10");
        assert_eq!(view.leave_at, "12:06");
        assert_eq!(view.countdown, (6, 0));
        assert_eq!(view.urgency, Urgency::Neutral);
        assert!(view.pinned);
        assert_eq!(view.walk_minutes, 4);

        let text = view.to_string();
        assert!(text.contains("To Alewife"));
        assert!(text.contains("Leave in 06:00"));
    }

    #[test]
    fn test_detail_countdown_holds_at_zero() {
        let opt = option("BL", "Wonderland", 600.0, 5);
        let view = detail_view(&opt, &Preferences::default(), now(), &RankerConfig::default(), &RenderOptions::default());
        assert_eq!(view.countdown, (0, 0));
        assert_eq!(view.urgency, Urgency::Urgent);
        assert_eq!(view.line_name, "Blue Line");
    }

    #[test]
    fn test_detail_with_unrepresentable_walk() {
        let mut opt = option("OL", "Forest Hills", 60.0, 10);
        opt.walk_time_sec = 1e13;
        let view = detail_view(&opt, &Preferences::default(), now(), &RankerConfig::default(), &RenderOptions::default());
        assert_eq!(view.leave_at, "--:--");
        assert_eq!(view.departs_at, "12:10");
        assert_eq!(view.countdown, (0, 0));
        assert!(view.to_string().contains("Leave by --:--"));
    }

    #[test]
    fn test_dashboard_sections() {
        let options = vec![
            option("RL", "Alewife", 240.0, 12),
            option("OL", "Oak Grove", 540.0, 30),
            option("B", "Boston College", 240.0, 3),
        ];
        let mut prefs = Preferences::default();
        prefs.toggle_pin("B");
        let outcome = rank(&options, &prefs, now(), &RankerConfig::default());
        let text = render_dashboard(&outcome, &RenderOptions::default());

        assert!(text.starts_with("Near Park Street"));
        assert!(text.contains("Saved\n  [B] Boston College 0m"));
        assert!(text.contains("Immediate\n  [ RL] Alewife"));
        assert!(text.contains("08 min"));
        assert!(text.contains("Nearby\n  [ OL] Oak Grove"));
        assert!(!text.contains("Further"));
    }

    #[test]
    fn test_empty_dashboard() {
        let outcome = RankOutcome::NoCommutes { issues: vec![] };
        assert_eq!(render_dashboard(&outcome, &RenderOptions::default()), "No commutes nearby\n");
    }
}
