//! Worker lifecycle phases.

use serde::{Deserialize, Serialize};

/// Where a worker version is in its lifecycle.
///
/// ```text
/// Parsed -> Installing -> Installed -> Activating -> Activated
///               |                                       |
///               +--> Redundant         (re-activate) <--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Constructed, no lifecycle event delivered yet.
    Parsed,
    /// Pre-caching the asset manifest.
    Installing,
    /// Manifest stored; eligible to activate.
    Installed,
    /// Pruning stale cache generations.
    Activating,
    /// Serving requests.
    Activated,
    /// Installation failed; this version never becomes active.
    Redundant,
}

impl LifecyclePhase {
    /// An install may start unless another lifecycle step is in flight.
    pub fn can_install(self) -> bool {
        !self.is_busy()
    }

    /// Activation requires a completed install. Activating again is allowed.
    pub fn can_activate(self) -> bool {
        matches!(self, LifecyclePhase::Installed | LifecyclePhase::Activated)
    }

    /// Only an activated worker controls pages and intercepts fetches.
    pub fn is_serving(self) -> bool {
        self == LifecyclePhase::Activated
    }

    pub fn is_busy(self) -> bool {
        matches!(self, LifecyclePhase::Installing | LifecyclePhase::Activating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Parsed => "parsed",
            LifecyclePhase::Installing => "installing",
            LifecyclePhase::Installed => "installed",
            LifecyclePhase::Activating => "activating",
            LifecyclePhase::Activated => "activated",
            LifecyclePhase::Redundant => "redundant",
        }
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
