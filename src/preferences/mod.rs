pub mod store;

pub use store::{JsonFileStore, MemoryStore, PreferenceStore, PreferencesError, PreferencesManager};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const WALK_MULTIPLIER: f64 = 1.0;
const RUN_MULTIPLIER: f64 = 0.7;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    #[default]
    Walk,
    Run,
}

impl Pace {
    pub fn multiplier(self) -> f64 {
        match self {
            Pace::Walk => WALK_MULTIPLIER,
            Pace::Run => RUN_MULTIPLIER,
        }
    }
}

/// What the rider asked for: routes to keep on top and how fast they move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub pinned_routes: BTreeSet<String>,
    #[serde(default)]
    pub pace: Pace,
}

impl Preferences {
    pub fn is_pinned(&self, route: &str) -> bool {
        self.pinned_routes.contains(route)
    }

    /// Flips the pin on `route` and returns whether it is pinned afterwards.
    pub fn toggle_pin(&mut self, route: &str) -> bool {
        if self.pinned_routes.remove(route) {
            false
        } else {
            self.pinned_routes.insert(route.to_string());
            true
        }
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.pace.multiplier()
    }
}
