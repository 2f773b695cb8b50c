use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alertcal_calendar::{CalendarEvent, DeleteOutcome, ResourceAdapter};
use alertcal_core::{AlertRecord, ResourceId};
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

/// Calendar kept as a directory of JSON files, one per event: `<root>/<resource id>.json`.
#[derive(Clone, Debug)]
pub struct FsCalendar {
    pub root: PathBuf,
}

impl FsCalendar {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn event_path(&self, id: &ResourceId) -> Result<PathBuf> {
        let s = id.as_str();
        if s.is_empty() || s.contains(|c: char| c == '/' || c == '\\') || s.starts_with('.') {
            return Err(anyhow!("resource id {:?} is not a valid event file name", s));
        }
        Ok(self.root.join(format!("{s}.json")))
    }

    pub fn read(&self, id: &ResourceId) -> Result<Option<CalendarEvent>> {
        let path = self.event_path(id)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                let ev = serde_json::from_slice(&bytes).with_context(|| format!("parse event {}", path.display()))?;
                Ok(Some(ev))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read event {}", path.display())),
        }
    }

    /// Every event on disk, ordered by id.
    pub fn list(&self) -> Result<Vec<(ResourceId, CalendarEvent)>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let mut out = vec![];
        for dirent in std::fs::read_dir(&self.root).with_context(|| format!("list {}", self.root.display()))? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = ResourceId::from_str(stem);
            if let Some(ev) = self.read(&id)? {
                out.push((id, ev));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
        Ok(())
    }
}

impl ResourceAdapter for FsCalendar {
    fn create(&self, record: &AlertRecord, window_index: usize) -> Result<ResourceId> {
        let event = CalendarEvent::for_window(record, window_index)?;
        std::fs::create_dir_all(&self.root).with_context(|| format!("create calendar dir {}", self.root.display()))?;

        let id = ResourceId::new();
        let path = self.event_path(&id)?;
        let bytes = serde_json::to_vec_pretty(&event)?;
        Self::write_atomic(&path, &bytes)?;
        info!(%id, key = %record.key, window_index, start = %event.start, "created calendar event");
        Ok(id)
    }

    fn delete(&self, id: &ResourceId) -> Result<DeleteOutcome> {
        let path = self.event_path(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(%id, "deleted calendar event");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%id, "calendar event already gone");
                Ok(DeleteOutcome::NotFound)
            }
            Err(e) => Err(e).with_context(|| format!("delete event {}", path.display())),
        }
    }
}
