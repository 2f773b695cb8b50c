use std::path::{Path, PathBuf};

use alertcal_calendar_fs::FsCalendar;
use alertcal_core::{plan, Action, RunReport, Snapshot, Trigger};
use alertcal_feed::{load_feed, normalize, FeedFilter};
use alertcal_storage::SnapshotStore;
use alertcal_storage_sqlite::SqliteSnapshotStore;
use anyhow::Result;

use crate::{doctor::doctor, util::now, Config, DoctorReport, Driver};

/// Local wiring: sqlite snapshot store plus a directory-backed calendar, configured from
/// `.alertcal/alertcal.toml` under `base_dir`.
pub struct Runner {
    pub base_dir: PathBuf,
    pub cfg: Config,
    pub filter: FeedFilter,
    pub store: SqliteSnapshotStore,
    pub calendar: FsCalendar,
}

impl Runner {
    pub fn open(base_dir: PathBuf) -> Result<Self> {
        let cfg_path = Config::config_path(&base_dir);
        let cfg = if cfg_path.exists() {
            Config::load_from(&cfg_path)?
        } else {
            let cfg = Config::default();
            cfg.save_to(&cfg_path)?;
            cfg
        };

        let filter = cfg.feed_filter()?;
        let store = SqliteSnapshotStore::open(&cfg.snapshot_path(&base_dir))?;
        let calendar = FsCalendar::new(cfg.calendar_root(&base_dir));

        Ok(Self { base_dir, cfg, filter, store, calendar })
    }

    pub fn init(base_dir: &Path) -> Result<()> {
        let cfg_path = Config::config_path(base_dir);
        let cfg = if cfg_path.exists() {
            Config::load_from(&cfg_path)?
        } else {
            let cfg = Config::default();
            cfg.save_to(&cfg_path)?;
            cfg
        };
        // create db
        let _ = SqliteSnapshotStore::open(&cfg.snapshot_path(base_dir))?;
        std::fs::create_dir_all(cfg.calendar_root(base_dir))?;
        Ok(())
    }

    pub fn doctor(&self) -> Result<DoctorReport> {
        doctor(&self.base_dir, &self.cfg)
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        self.store.load()
    }

    fn driver(&self) -> Driver<'_> {
        Driver::new(&self.store, &self.calendar).with_checkpoints(self.cfg.run.checkpoint_each_action)
    }

    /// Dry run: what a reconciliation of `feed_path` would do right now.
    ///
    /// Nothing under `base_dir` is created or written. A missing config falls back to the
    /// defaults and a missing database to an empty snapshot.
    pub fn plan_feed(base_dir: &Path, feed_path: &Path) -> Result<Vec<Action>> {
        let cfg_path = Config::config_path(base_dir);
        let cfg = if cfg_path.exists() { Config::load_from(&cfg_path)? } else { Config::default() };

        let db_path = cfg.snapshot_path(base_dir);
        let prior = if db_path.exists() {
            SqliteSnapshotStore::open_read_only(&db_path)?.load()?
        } else {
            Snapshot::new()
        };

        let payload = load_feed(feed_path)?;
        let records = normalize(&payload, &cfg.feed_filter()?)?;
        Ok(plan(&records, &prior, now())?)
    }

    pub fn run_feed(&self, feed_path: &Path, trigger: &Trigger) -> Result<RunReport> {
        let payload = load_feed(feed_path)?;
        self.driver().run_feed(&payload, &self.filter, now(), trigger)
    }
}
