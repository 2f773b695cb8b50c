use std::collections::BTreeMap;
use std::path::Path;

use alertcal_calendar::{CalendarCall, CalendarEvent, InMemoryCalendar};
use alertcal_core::{RunReport, Snapshot, Trigger};
use alertcal_feed::{load_feed, FeedFilter};
use alertcal_storage::{InMemorySnapshotStore, SnapshotStore};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::{util::from_unix, Driver};

#[derive(Debug, Deserialize)]
pub struct ScenarioExpected {
    pub scenario_id: String,
    pub now_unix: i64,
    pub report: ExpectedCounts,
    pub snapshot: ExpectedSnapshot,
    pub calendar_events: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedSnapshot {
    pub keys: Vec<String>,
    #[serde(default)]
    pub resource_counts: BTreeMap<String, usize>,
    /// The saved snapshot must equal the prior one exactly.
    #[serde(default)]
    pub unchanged: bool,
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub prior: Snapshot,
    pub report: RunReport,
    pub snapshot: Snapshot,
    pub calendar_events: usize,
    pub calls: Vec<CalendarCall>,
}

pub fn load_expected(dir: &Path) -> Result<ScenarioExpected> {
    let p = dir.join("expected.yaml");
    let s = std::fs::read_to_string(&p).with_context(|| format!("read expected.yaml: {}", p.display()))?;
    let exp: ScenarioExpected = serde_yaml::from_str(&s).with_context(|| "parse expected.yaml")?;
    Ok(exp)
}

/// `prior.json` is optional; without it the scenario starts from an empty snapshot.
pub fn load_prior(dir: &Path) -> Result<Snapshot> {
    let p = dir.join("prior.json");
    if !p.exists() {
        return Ok(Snapshot::new());
    }
    let s = std::fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let snap: Snapshot = serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    Ok(snap)
}

/// Fixture-mode run:
/// - seeds an in-memory calendar with one event per prior resource id
/// - runs the driver over `feed.json` at the scenario's `now`
/// - returns what was saved and what the calendar saw
pub fn simulate(dir: &Path) -> Result<ScenarioResult> {
    let exp = load_expected(dir)?;
    let prior = load_prior(dir)?;
    let payload = load_feed(&dir.join("feed.json"))?;
    let now = from_unix(exp.now_unix).ok_or_else(|| anyhow!("now_unix out of range: {}", exp.now_unix))?;

    let calendar = InMemoryCalendar::new();
    for (_, entry) in prior.iter() {
        for (index, id) in entry.resource_ids.iter().enumerate() {
            calendar.insert(id.clone(), CalendarEvent::for_window(&entry.record, index)?);
        }
    }
    let store = InMemorySnapshotStore::with_snapshot(prior.clone());

    let report = Driver::new(&store, &calendar).run_feed(&payload, &FeedFilter::default(), now, &Trigger::Schedule)?;

    Ok(ScenarioResult {
        prior,
        report,
        snapshot: store.load()?,
        calendar_events: calendar.len(),
        calls: calendar.calls(),
    })
}
