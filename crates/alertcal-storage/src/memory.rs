use std::sync::Mutex;

use anyhow::anyhow;
use alertcal_core::Snapshot;

use crate::traits::SnapshotStore;

/// In-memory store for tests. Not durable.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    snapshot: Option<Snapshot>,
    saves: usize,
    fail_next_save: bool,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().snapshot = Some(snapshot);
        store
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap().saves
    }

    /// Make the next `save` fail without touching the stored snapshot.
    pub fn fail_next_save(&self) {
        self.inner.lock().unwrap().fail_next_save = true;
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> anyhow::Result<Snapshot> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.snapshot.clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_save {
            inner.fail_next_save = false;
            return Err(anyhow!("injected save failure"));
        }
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertcal_core::{ActiveWindow, AlertKey, AlertRecord, LocalizedText, ReconciledEntry, ResourceId};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn entry(key: &str) -> ReconciledEntry {
        let at = FixedOffset::west_opt(5 * 3600).unwrap().timestamp_opt(0, 0).unwrap();
        ReconciledEntry::new(
            AlertRecord {
                key: AlertKey::from_str(key),
                kind: "Planned - Part Suspended".into(),
                route: "L".into(),
                created_at: None,
                updated_at: Utc.timestamp_opt(1, 0).unwrap(),
                active_windows: vec![ActiveWindow::new(at, at)],
                title: LocalizedText { plain: "t".into(), html: "t".into() },
                body: LocalizedText { plain: "b".into(), html: "b".into() },
            },
            vec![ResourceId::from_str("r1")],
        )
    }

    #[test]
    fn test_new_store_loads_empty_snapshot() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let store = InMemorySnapshotStore::new();
        let snap: Snapshot = vec![entry("a"), entry("b")].into_iter().collect();
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), snap);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_save_replaces_whole_snapshot() {
        let store = InMemorySnapshotStore::with_snapshot(vec![entry("a")].into_iter().collect());
        store.save(&vec![entry("b")].into_iter().collect()).unwrap();
        let loaded = store.load().unwrap();
        assert!(!loaded.contains(&AlertKey::from_str("a")));
        assert!(loaded.contains(&AlertKey::from_str("b")));
    }

    #[test]
    fn test_injected_failure_keeps_previous_snapshot() {
        let before: Snapshot = vec![entry("a")].into_iter().collect();
        let store = InMemorySnapshotStore::with_snapshot(before.clone());
        store.fail_next_save();
        assert!(store.save(&Snapshot::new()).is_err());
        assert_eq!(store.load().unwrap(), before);
        store.save(&Snapshot::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
