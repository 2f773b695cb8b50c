use std::ops::Range;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::{AlertKey, InputError, ResourceId};

/// Contiguous interval during which a disruption is in effect.
/// Bounds carry the reporting-zone offset that applied at that instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl ActiveWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// Plain and HTML renditions of one translated field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub plain: String,
    pub html: String,
}

/// One planned service disruption, as normalized from the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub key: AlertKey,
    pub kind: String,
    pub route: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub active_windows: Vec<ActiveWindow>,
    pub title: LocalizedText,
    pub body: LocalizedText,
}

impl AlertRecord {
    /// Rejects records with no windows or with a window whose end precedes its start.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.active_windows.is_empty() {
            return Err(InputError::NoActiveWindows(self.key.clone()));
        }
        for (index, w) in self.active_windows.iter().enumerate() {
            if w.is_inverted() {
                return Err(InputError::InvertedWindow {
                    key: self.key.clone(),
                    index,
                    start: w.start.to_rfc3339(),
                    end: w.end.to_rfc3339(),
                });
            }
        }
        Ok(())
    }

    /// Latest `end` across all windows.
    pub fn latest_end(&self) -> Option<DateTime<FixedOffset>> {
        self.active_windows.iter().map(|w| w.end).max()
    }

    /// True when the source reports a strictly newer modification than `stored`.
    pub fn supersedes(&self, stored: &AlertRecord) -> bool {
        self.updated_at > stored.updated_at
    }
}

/// An alert this system has acted on, with the downstream ids it created (one per window, in order).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledEntry {
    pub record: AlertRecord,
    pub resource_ids: Vec<ResourceId>,
}

impl ReconciledEntry {
    pub fn new(record: AlertRecord, resource_ids: Vec<ResourceId>) -> Self {
        Self { record, resource_ids }
    }

    pub fn is_complete(&self) -> bool {
        !self.resource_ids.is_empty() && self.resource_ids.len() == self.record.active_windows.len()
    }

    /// Window indexes that still lack a downstream resource. Empty for complete entries.
    pub fn missing_windows(&self) -> Range<usize> {
        let total = self.record.active_windows.len();
        self.resource_ids.len().min(total)..total
    }
}
