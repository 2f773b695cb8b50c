use std::path::Path;

use alertcal_calendar_fs::FsCalendar;
use alertcal_core::{AlertKey, ResourceId};
use alertcal_storage::SnapshotStore;
use alertcal_storage_sqlite::SqliteSnapshotStore;
use anyhow::{anyhow, Context, Result};

use crate::Config;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoctorReport {
    pub entries: usize,
    /// Entries left behind by an interrupted create; the next run resumes them.
    pub incomplete: Vec<AlertKey>,
    /// Ids the snapshot references that the calendar no longer has.
    pub missing_events: Vec<ResourceId>,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.incomplete.is_empty() && self.missing_events.is_empty()
    }
}

pub fn doctor(base_dir: &Path, cfg: &Config) -> Result<DoctorReport> {
    let filter = cfg.feed_filter().context("feed config")?;
    if filter.route.trim().is_empty() {
        return Err(anyhow!("feed.line must not be empty"));
    }
    if filter.language.trim().is_empty() {
        return Err(anyhow!("feed.language must not be empty"));
    }

    let calendar_root = cfg.calendar_root(base_dir);
    if calendar_root.exists() && !calendar_root.is_dir() {
        return Err(anyhow!("calendar root {} is not a directory", calendar_root.display()));
    }

    let store = SqliteSnapshotStore::open(&cfg.snapshot_path(base_dir))?;
    let snapshot = store.load().context("load snapshot")?;
    let calendar = FsCalendar::new(calendar_root);

    let mut report = DoctorReport { entries: snapshot.len(), ..Default::default() };
    for entry in snapshot.incomplete() {
        report.incomplete.push(entry.record.key.clone());
    }
    for (_, entry) in snapshot.iter() {
        for id in &entry.resource_ids {
            if calendar.read(id)?.is_none() {
                report.missing_events.push(id.clone());
            }
        }
    }
    Ok(report)
}
