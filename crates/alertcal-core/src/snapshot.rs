use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AlertKey, ReconciledEntry};

/// Every alert previously reconciled, keyed by alert key.
/// The shell loads this before planning and saves the successor after applying actions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: BTreeMap<AlertKey, ReconciledEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AlertKey) -> Option<&ReconciledEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, entry: ReconciledEntry) -> Option<ReconciledEntry> {
        self.entries.insert(entry.record.key.clone(), entry)
    }

    pub fn remove(&mut self, key: &AlertKey) -> Option<ReconciledEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AlertKey, &ReconciledEntry)> {
        self.entries.iter()
    }

    /// Entries left behind by an interrupted create.
    pub fn incomplete(&self) -> impl Iterator<Item = &ReconciledEntry> {
        self.entries.values().filter(|e| !e.is_complete())
    }

    /// SHA-256 over the canonical JSON form. Equal snapshots always hash equal.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl FromIterator<ReconciledEntry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ReconciledEntry>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}
