use chrono::{DateTime, FixedOffset};

use crate::{ids::*, model::*, types::*};

/// One reconciliation decision. Produced by `plan`, applied by the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// New alert: one resource per window, in window order.
    Create { record: AlertRecord },
    /// Newer revision: delete every stale id, then create fresh resources.
    Update { record: AlertRecord, stale: Vec<ResourceId> },
    /// A previous create stopped part-way: create only the windows still missing.
    Resume { record: AlertRecord, existing: Vec<ResourceId> },
    /// Pulled from the feed while still active: delete downstream and drop the entry.
    Expire {
        key: AlertKey,
        resource_ids: Vec<ResourceId>,
        latest_end: DateTime<FixedOffset>,
    },
    Keep { key: AlertKey, reason: KeepReason },
}

impl Action {
    pub fn key(&self) -> &AlertKey {
        match self {
            Action::Create { record } | Action::Update { record, .. } | Action::Resume { record, .. } => &record.key,
            Action::Expire { key, .. } | Action::Keep { key, .. } => key,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Action::Keep { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create { record } => {
                write!(f, "create {} ({} windows)", record.key, record.active_windows.len())
            }
            Action::Update { record, stale } => write!(
                f,
                "update {} (delete {}, create {})",
                record.key,
                stale.len(),
                record.active_windows.len()
            ),
            Action::Resume { record, existing } => write!(
                f,
                "resume {} (have {}, create {})",
                record.key,
                existing.len(),
                record.active_windows.len().saturating_sub(existing.len())
            ),
            Action::Expire { key, resource_ids, latest_end } => write!(
                f,
                "expire {} (delete {}, ends {})",
                key,
                resource_ids.len(),
                latest_end.to_rfc3339()
            ),
            Action::Keep { key, reason } => write!(f, "keep {} ({:?})", key, reason),
        }
    }
}
