use serde::{Deserialize, Serialize};

/// How pressed the rider is to leave for a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Warning,
    Neutral,
    Comfortable,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Urgent => "HURRY",
            Urgency::Warning => "MIGHT MISS",
            Urgency::Neutral => "ON TIME",
            Urgency::Comfortable => "COMFORTABLE",
        }
    }

    /// Indicator color of the live countdown; on time reads as green there.
    pub fn indicator(self) -> &'static str {
        match self {
            Urgency::Urgent => "red",
            Urgency::Warning => "orange",
            Urgency::Neutral | Urgency::Comfortable => "green",
        }
    }
}

/// Minutes-until-leave breakpoints, inclusive upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyThresholds {
    pub urgent: i64,
    pub warning: i64,
    pub neutral: i64,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            urgent: 2,
            warning: 5,
            neutral: 10,
        }
    }
}

impl UrgencyThresholds {
    pub fn classify(&self, minutes_until_leave: i64) -> Urgency {
        if minutes_until_leave <= self.urgent {
            Urgency::Urgent
        } else if minutes_until_leave <= self.warning {
            Urgency::Warning
        } else if minutes_until_leave <= self.neutral {
            Urgency::Neutral
        } else {
            Urgency::Comfortable
        }
    }
}

/// Card countdown: `NOW` once it is time to go, `1h 05m` past the hour.
pub fn format_countdown(minutes_until_leave: i64) -> String {
    if minutes_until_leave <= 0 {
        "NOW".to_string()
    } else if minutes_until_leave > 60 {
        format!("{}h {}m", minutes_until_leave / 60, minutes_until_leave % 60)
    } else {
        format!("{:02} min", minutes_until_leave)
    }
}

/// Compact countdown for saved-route chips.
pub fn format_chip(minutes_until_leave: i64) -> String {
    format!("{}m", minutes_until_leave.max(0))
}

/// `MM:SS` split of a millisecond countdown, held at zero once late.
pub fn clock_parts(millis_until_leave: f64) -> (i64, i64) {
    if millis_until_leave <= 0.0 {
        return (0, 0);
    }
    let millis = millis_until_leave.floor() as i64;
    (millis / 60_000, (millis % 60_000) / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_breakpoints() {
        let thresholds = UrgencyThresholds::default();
        assert_eq!(thresholds.classify(-4), Urgency::Urgent);
        assert_eq!(thresholds.classify(2), Urgency::Urgent);
        assert_eq!(thresholds.classify(3), Urgency::Warning);
        assert_eq!(thresholds.classify(5), Urgency::Warning);
        assert_eq!(thresholds.classify(6), Urgency::Neutral);
        assert_eq!(thresholds.classify(10), Urgency::Neutral);
        assert_eq!(thresholds.classify(11), Urgency::Comfortable);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = UrgencyThresholds {
            urgent: 0,
            warning: 1,
            neutral: 2,
        };
        assert_eq!(thresholds.classify(1), Urgency::Warning);
        assert_eq!(thresholds.classify(3), Urgency::Comfortable);
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(-3), "NOW");
        assert_eq!(format_countdown(0), "NOW");
        assert_eq!(format_countdown(7), "07 min");
        assert_eq!(format_countdown(60), "60 min");
        assert_eq!(format_countdown(75), "1h 15m");
    }

    #[test]
    fn test_format_chip_clamps() {
        assert_eq!(format_chip(-2), "0m");
        assert_eq!(format_chip(12), "12m");
    }

    #[test]
    fn test_clock_parts() {
        assert_eq!(clock_parts(-500.0), (0, 0));
        assert_eq!(clock_parts(125_400.0), (2, 5));
    }
}
