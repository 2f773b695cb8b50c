use serde::{Deserialize, Serialize};

/// Why a run was invoked. Informational only; never consulted by `plan`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Schedule,
    Manual,
    Other(String),
}

impl Trigger {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "schedule" | "scheduled" => Trigger::Schedule,
            "manual" => Trigger::Manual,
            other => Trigger::Other(other.to_string()),
        }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Manual
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Schedule => f.write_str("schedule"),
            Trigger::Manual => f.write_str("manual"),
            Trigger::Other(s) => f.write_str(s),
        }
    }
}

/// Reason an entry is carried into the next snapshot untouched.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// Still in the feed, `updated_at` not newer than the stored record.
    Unchanged,
    /// Gone from the feed, but every window already ended.
    Concluded,
}
