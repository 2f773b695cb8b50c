use anyhow::{anyhow, Result};
use alertcal_core::{AlertKey, AlertRecord, ResourceId};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Already gone or never existed. Not an error.
    NotFound,
}

/// Downstream calendar entry for one active window of an alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    /// HTML body of the alert.
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub alert_key: AlertKey,
    pub window_index: usize,
}

impl CalendarEvent {
    pub fn for_window(record: &AlertRecord, window_index: usize) -> Result<Self> {
        let window = record.active_windows.get(window_index).ok_or_else(|| {
            anyhow!(
                "alert {} has {} windows, no window {}",
                record.key,
                record.active_windows.len(),
                window_index
            )
        })?;
        Ok(Self {
            summary: record.title.plain.clone(),
            description: record.body.html.clone(),
            start: window.start,
            end: window.end,
            alert_key: record.key.clone(),
            window_index,
        })
    }
}

/// Creates and deletes downstream resources for alert windows.
///
/// Retry and timeout policy belong to the implementation; callers treat each call as blocking.
pub trait ResourceAdapter: Send + Sync {
    /// Create the resource for `record.active_windows[window_index]` and return its id.
    fn create(&self, record: &AlertRecord, window_index: usize) -> Result<ResourceId>;

    /// Delete a resource. Unknown or already-deleted ids report `NotFound`.
    fn delete(&self, id: &ResourceId) -> Result<DeleteOutcome>;
}
