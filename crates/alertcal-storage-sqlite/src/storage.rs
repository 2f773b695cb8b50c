use std::path::Path;
use std::sync::Mutex;

use alertcal_core::{AlertRecord, ReconciledEntry, ResourceId, Snapshot};
use alertcal_storage::SnapshotStore;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

/// Rows of save history kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    history_limit: usize,
}

/// One row of save history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRecord {
    pub saved_at_unix: i64,
    pub fingerprint: String,
    pub entry_count: usize,
}

impl SqliteSnapshotStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path).with_context(|| format!("open sqlite db {}", db_path.display()))?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)?;
        Ok(Self { conn: Mutex::new(conn), history_limit: DEFAULT_HISTORY_LIMIT })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("../migrations/0001_init.sql"))?;
        Ok(Self { conn: Mutex::new(conn), history_limit: DEFAULT_HISTORY_LIMIT })
    }

    /// Open an existing database without migrating it. Saves through this handle fail.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("open sqlite db {} read-only", db_path.display()))?;
        Ok(Self { conn: Mutex::new(conn), history_limit: DEFAULT_HISTORY_LIMIT })
    }

    /// Keep at most `limit` rows of save history (minimum 1). Older rows are pruned on save.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Most recent saves first.
    pub fn history(&self, limit: usize) -> Result<Vec<SaveRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT saved_at, fingerprint, entry_count FROM saves ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |r| {
            Ok(SaveRecord {
                saved_at_unix: r.get(0)?,
                fingerprint: r.get(1)?,
                entry_count: r.get::<_, i64>(2)? as usize,
            })
        })?;
        let mut out = vec![];
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<Snapshot> {
        let conn = self.conn.lock().unwrap();

        let mut raw = vec![];
        {
            let mut stmt = conn.prepare("SELECT key, record_json, resource_ids_json FROM entries ORDER BY key")?;
            let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?;
            for row in rows {
                raw.push(row?);
            }
        }

        let mut snapshot = Snapshot::new();
        for (key, record_json, ids_json) in raw {
            let record: AlertRecord =
                serde_json::from_str(&record_json).with_context(|| format!("decode record for entry {key}"))?;
            let resource_ids: Vec<ResourceId> =
                serde_json::from_str(&ids_json).with_context(|| format!("decode resource ids for entry {key}"))?;
            if record.key.as_str() != key {
                return Err(anyhow!("entry {} holds a record for {}", key, record.key));
            }
            snapshot.insert(ReconciledEntry::new(record, resource_ids));
        }
        debug!(entries = snapshot.len(), "loaded snapshot");
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let fingerprint = snapshot.fingerprint()?;

        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        for (key, entry) in snapshot.iter() {
            tx.execute(
                "INSERT INTO entries(key, record_json, resource_ids_json) VALUES (?1, ?2, ?3)",
                params![
                    key.as_str(),
                    serde_json::to_string(&entry.record)?,
                    serde_json::to_string(&entry.resource_ids)?
                ],
            )?;
        }
        tx.execute(
            "INSERT INTO saves(saved_at, fingerprint, entry_count) VALUES (?1, ?2, ?3)",
            params![now_unix(), fingerprint, snapshot.len() as i64],
        )?;
        tx.execute(
            "DELETE FROM saves WHERE id NOT IN (SELECT id FROM saves ORDER BY id DESC LIMIT ?1)",
            params![self.history_limit as i64],
        )?;
        tx.commit().with_context(|| "commit snapshot")?;
        debug!(entries = snapshot.len(), %fingerprint, "saved snapshot");
        Ok(())
    }
}

pub fn now_unix() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}
