use alertcal_calendar::{DeleteOutcome, ResourceAdapter};
use alertcal_core::{plan, Action, AlertKey, AlertRecord, Outcome, ReconciledEntry, ResourceId, RunReport, Snapshot, Trigger};
use alertcal_feed::{normalize, FeedFilter, FeedPayload};
use alertcal_storage::SnapshotStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A create failed part-way. The snapshot saved before returning holds every completed action
/// plus the ids created so far for `key`.
#[derive(Debug, Error)]
#[error("run aborted at alert {key}: {reason}")]
pub struct RunAborted {
    pub key: AlertKey,
    pub reason: String,
    pub report: RunReport,
}

struct Interrupted {
    key: AlertKey,
    error: anyhow::Error,
}

/// Applies reconciliation plans against a store and an adapter, one run at a time.
pub struct Driver<'a> {
    store: &'a dyn SnapshotStore,
    adapter: &'a dyn ResourceAdapter,
    checkpoint_each_action: bool,
}

impl<'a> Driver<'a> {
    pub fn new(store: &'a dyn SnapshotStore, adapter: &'a dyn ResourceAdapter) -> Self {
        Self { store, adapter, checkpoint_each_action: false }
    }

    pub fn with_checkpoints(mut self, on: bool) -> Self {
        self.checkpoint_each_action = on;
        self
    }

    /// Load the prior snapshot and compute the plan. No side effects.
    pub fn plan(&self, records: &[AlertRecord], now: DateTime<Utc>) -> Result<Vec<Action>> {
        let prior = self.store.load().context("load snapshot")?;
        Ok(plan(records, &prior, now)?)
    }

    /// Normalize a feed payload and reconcile it.
    pub fn run_feed(&self, payload: &FeedPayload, filter: &FeedFilter, now: DateTime<Utc>, trigger: &Trigger) -> Result<RunReport> {
        let records = normalize(payload, filter)?;
        self.run(&records, now, trigger)
    }

    /// One full pass: plan, apply every action, persist the successor snapshot.
    pub fn run(&self, records: &[AlertRecord], now: DateTime<Utc>, trigger: &Trigger) -> Result<RunReport> {
        info!(%trigger, alerts = records.len(), "starting reconciliation run");

        let prior = self.store.load().context("load snapshot")?;
        let actions = plan(records, &prior, now)?;

        let mut next = prior.clone();
        let mut report = RunReport::default();
        for action in &actions {
            match self.apply(action, &mut next) {
                Ok(outcome) => {
                    report.record(&outcome);
                    if self.checkpoint_each_action && !action.is_noop() {
                        self.store.save(&next).context("checkpoint snapshot")?;
                    }
                }
                Err(Interrupted { key, error }) => {
                    warn!(%key, error = %format!("{error:#}"), "create failed, saving partial progress");
                    self.store.save(&next).context("save partial snapshot")?;
                    return Err(RunAborted { key, reason: format!("{error:#}"), report }.into());
                }
            }
        }

        self.store.save(&next).context("save snapshot")?;
        info!(
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            resumed = report.resumed,
            unchanged = report.unchanged,
            retained = report.retained,
            failed_deletes = report.failed_deletes,
            fingerprint = %next.fingerprint()?,
            "reconciliation complete"
        );
        Ok(report)
    }

    fn apply(&self, action: &Action, next: &mut Snapshot) -> Result<Outcome, Interrupted> {
        match action {
            Action::Create { record } => {
                info!(key = %record.key, windows = record.active_windows.len(), "creating");
                let mut ids = Vec::with_capacity(record.active_windows.len());
                let created = self.create_windows(record, &mut ids);
                if !ids.is_empty() {
                    next.insert(ReconciledEntry::new(record.clone(), ids.clone()));
                }
                created?;
                Ok(Outcome::Created { key: record.key.clone(), resource_ids: ids })
            }
            Action::Update { record, stale } => {
                info!(key = %record.key, stale = stale.len(), windows = record.active_windows.len(), "updating");
                let failed_deletes = self.delete_all(&record.key, stale);
                let mut ids = Vec::with_capacity(record.active_windows.len());
                let created = self.create_windows(record, &mut ids);
                // With nothing created yet the prior entry stays, so the next run retries the update.
                if !ids.is_empty() {
                    next.insert(ReconciledEntry::new(record.clone(), ids.clone()));
                }
                created?;
                Ok(Outcome::Updated { key: record.key.clone(), resource_ids: ids, failed_deletes })
            }
            Action::Resume { record, existing } => {
                info!(key = %record.key, have = existing.len(), windows = record.active_windows.len(), "resuming");
                let mut ids = existing.clone();
                let created = self.create_windows(record, &mut ids);
                if !ids.is_empty() {
                    next.insert(ReconciledEntry::new(record.clone(), ids.clone()));
                }
                created?;
                Ok(Outcome::Resumed { key: record.key.clone(), resource_ids: ids })
            }
            Action::Expire { key, resource_ids, latest_end } => {
                info!(%key, %latest_end, "missing from feed while still active, deleting");
                let failed_deletes = self.delete_all(key, resource_ids);
                next.remove(key);
                Ok(Outcome::Expired { key: key.clone(), failed_deletes })
            }
            Action::Keep { key, reason } => {
                debug!(%key, ?reason, "no change");
                Ok(Outcome::Kept { key: key.clone(), reason: *reason })
            }
        }
    }

    /// Create resources for windows `ids.len()..`, in window order, appending each id as it is returned.
    fn create_windows(&self, record: &AlertRecord, ids: &mut Vec<ResourceId>) -> Result<(), Interrupted> {
        for window_index in ids.len()..record.active_windows.len() {
            let id = self.adapter.create(record, window_index).map_err(|error| Interrupted {
                key: record.key.clone(),
                error: error.context(format!("create window {window_index}")),
            })?;
            debug!(key = %record.key, window_index, %id, "created resource");
            ids.push(id);
        }
        Ok(())
    }

    /// Delete every id. Failures are logged and counted, never propagated.
    fn delete_all(&self, key: &AlertKey, ids: &[ResourceId]) -> usize {
        let mut failed = 0;
        for id in ids {
            match self.adapter.delete(id) {
                Ok(DeleteOutcome::Deleted) => debug!(%key, %id, "deleted resource"),
                Ok(DeleteOutcome::NotFound) => debug!(%key, %id, "resource already gone"),
                Err(e) => {
                    failed += 1;
                    warn!(%key, %id, error = %format!("{e:#}"), "failed to delete resource, leaving it behind");
                }
            }
        }
        failed
    }
}
