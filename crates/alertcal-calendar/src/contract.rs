use anyhow::{anyhow, Result};
use alertcal_core::{ActiveWindow, AlertKey, AlertRecord, LocalizedText, ResourceId};
use chrono::{FixedOffset, TimeZone, Utc};

use crate::types::{DeleteOutcome, ResourceAdapter};

/// Shared adapter contract suite, run against every adapter implementation.
pub fn run_adapter_contract_suite(adapter: &dyn ResourceAdapter) -> Result<()> {
    let record = contract_record();

    let mut ids = Vec::new();
    for index in 0..record.active_windows.len() {
        ids.push(adapter.create(&record, index)?);
    }
    if ids[0] == ids[1] {
        return Err(anyhow!("expected distinct ids per window, got {} twice", ids[0]));
    }

    for id in &ids {
        match adapter.delete(id)? {
            DeleteOutcome::Deleted => {}
            DeleteOutcome::NotFound => return Err(anyhow!("freshly created {} reported not found", id)),
        }
    }

    // idempotent delete
    for id in &ids {
        if adapter.delete(id)? != DeleteOutcome::NotFound {
            return Err(anyhow!("second delete of {} should report not found", id));
        }
    }
    if adapter.delete(&ResourceId::from_str("never-created"))? != DeleteOutcome::NotFound {
        return Err(anyhow!("unknown id should report not found"));
    }

    if adapter.create(&record, record.active_windows.len()).is_ok() {
        return Err(anyhow!("create past the last window should fail"));
    }
    Ok(())
}

/// Two-window alert used by the contract suite.
pub fn contract_record() -> AlertRecord {
    let tz = FixedOffset::west_opt(5 * 3600).expect("valid offset");
    let at = |secs: i64| tz.timestamp_opt(secs, 0).single().expect("in range");
    AlertRecord {
        key: AlertKey::from_str("contract"),
        kind: "Planned - Part Suspended".to_string(),
        route: "L".to_string(),
        created_at: None,
        updated_at: Utc.timestamp_opt(1_700_000_000, 0).single().expect("in range"),
        active_windows: vec![
            ActiveWindow::new(at(1_700_000_000), at(1_700_003_600)),
            ActiveWindow::new(at(1_700_086_400), at(1_700_090_000)),
        ],
        title: LocalizedText { plain: "contract".to_string(), html: "<p>contract</p>".to_string() },
        body: LocalizedText { plain: "body".to_string(), html: "<p>body</p>".to_string() },
    }
}
