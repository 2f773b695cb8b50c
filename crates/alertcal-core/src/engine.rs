use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{Action, AlertRecord, InputError, KeepReason, Snapshot};

/// Pure reconciler: decide what to do for every key in `incoming` and in `prior`.
///
/// - incoming keys come first, in input order (create / update / resume / keep)
/// - keys only in `prior` follow in key order (expire / keep)
///
/// The whole batch is rejected before any action is produced if a record fails validation
/// or a key repeats.
pub fn plan(incoming: &[AlertRecord], prior: &Snapshot, now: DateTime<Utc>) -> Result<Vec<Action>, InputError> {
    let mut seen = HashSet::with_capacity(incoming.len());
    for record in incoming {
        record.validate()?;
        if !seen.insert(&record.key) {
            return Err(InputError::DuplicateKey(record.key.clone()));
        }
    }

    let mut actions = Vec::with_capacity(incoming.len() + prior.len());

    for record in incoming {
        let action = match prior.get(&record.key) {
            None => Action::Create { record: record.clone() },
            Some(entry) if record.supersedes(&entry.record) => Action::Update {
                record: record.clone(),
                stale: entry.resource_ids.clone(),
            },
            // The stored record stays authoritative: its windows are what the existing ids map to.
            Some(entry) if !entry.missing_windows().is_empty() => Action::Resume {
                record: entry.record.clone(),
                existing: entry.resource_ids.clone(),
            },
            Some(_) => Action::Keep { key: record.key.clone(), reason: KeepReason::Unchanged },
        };
        actions.push(action);
    }

    for (key, entry) in prior.iter() {
        if seen.contains(key) {
            continue;
        }
        let action = match entry.record.latest_end() {
            Some(latest_end) if latest_end.with_timezone(&Utc) >= now => Action::Expire {
                key: key.clone(),
                resource_ids: entry.resource_ids.clone(),
                latest_end,
            },
            _ => Action::Keep { key: key.clone(), reason: KeepReason::Concluded },
        };
        actions.push(action);
    }

    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActiveWindow, AlertKey, LocalizedText, ReconciledEntry, ResourceId};
    use chrono::{FixedOffset, TimeZone};

    fn at(secs: i64) -> DateTime<chrono::FixedOffset> {
        FixedOffset::west_opt(5 * 3600).unwrap().timestamp_opt(secs, 0).unwrap()
    }

    fn now(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn rec(key: &str, updated_at: i64, windows: &[(i64, i64)]) -> AlertRecord {
        AlertRecord {
            key: AlertKey::from_str(key),
            kind: "Planned - Part Suspended".into(),
            route: "L".into(),
            created_at: None,
            updated_at: now(updated_at),
            active_windows: windows.iter().map(|(s, e)| ActiveWindow::new(at(*s), at(*e))).collect(),
            title: LocalizedText { plain: key.into(), html: key.into() },
            body: LocalizedText { plain: String::new(), html: String::new() },
        }
    }

    fn ids(n: usize) -> Vec<ResourceId> {
        (0..n).map(|i| ResourceId::from_str(format!("r{i}"))).collect()
    }

    fn prior_with(entries: Vec<ReconciledEntry>) -> Snapshot {
        entries.into_iter().collect()
    }

    #[test]
    fn older_incoming_is_unchanged() {
        let prior = prior_with(vec![ReconciledEntry::new(rec("L1", 200, &[(0, 10)]), ids(1))]);
        let actions = plan(&[rec("L1", 150, &[(0, 99)])], &prior, now(5)).unwrap();
        assert_eq!(
            actions,
            vec![Action::Keep { key: AlertKey::from_str("L1"), reason: KeepReason::Unchanged }]
        );
    }

    #[test]
    fn partial_entry_resumes_with_stored_record() {
        let stored = rec("L1", 100, &[(0, 10), (20, 30), (40, 50)]);
        let prior = prior_with(vec![ReconciledEntry::new(stored.clone(), ids(1))]);
        let actions = plan(&[rec("L1", 100, &[(0, 10), (20, 30), (40, 50)])], &prior, now(5)).unwrap();
        assert_eq!(actions, vec![Action::Resume { record: stored, existing: ids(1) }]);
    }

    #[test]
    fn newer_revision_of_partial_entry_is_a_full_update() {
        let prior = prior_with(vec![ReconciledEntry::new(rec("L1", 100, &[(0, 10), (20, 30)]), ids(1))]);
        let actions = plan(&[rec("L1", 101, &[(0, 10)])], &prior, now(5)).unwrap();
        assert!(matches!(&actions[0], Action::Update { stale, .. } if *stale == ids(1)));
    }

    #[test]
    fn window_ending_exactly_now_is_still_active() {
        let prior = prior_with(vec![ReconciledEntry::new(rec("L3", 100, &[(0, 50)]), ids(1))]);
        let actions = plan(&[], &prior, now(50)).unwrap();
        assert!(matches!(actions[0], Action::Expire { .. }));
    }

    #[test]
    fn expire_uses_latest_window_end() {
        let prior = prior_with(vec![ReconciledEntry::new(rec("L3", 100, &[(0, 500), (600, 700), (10, 20)]), ids(3))]);
        let actions = plan(&[], &prior, now(650)).unwrap();
        assert!(matches!(&actions[0], Action::Expire { resource_ids, latest_end, .. }
            if *resource_ids == ids(3) && *latest_end == at(700)));
    }

    #[test]
    fn duplicate_key_rejects_batch() {
        let err = plan(&[rec("L1", 1, &[(0, 1)]), rec("L2", 1, &[(0, 1)]), rec("L1", 2, &[(0, 1)])], &Snapshot::new(), now(0))
            .unwrap_err();
        assert_eq!(err, InputError::DuplicateKey(AlertKey::from_str("L1")));
    }

    #[test]
    fn inverted_window_rejects_batch() {
        let err = plan(&[rec("L1", 1, &[(10, 5)])], &Snapshot::new(), now(0)).unwrap_err();
        assert!(matches!(err, InputError::InvertedWindow { .. }));
    }

    #[test]
    fn incoming_order_is_preserved_then_prior_keys_sorted() {
        let prior = prior_with(vec![
            ReconciledEntry::new(rec("Z", 1, &[(0, 1)]), ids(1)),
            ReconciledEntry::new(rec("A", 1, &[(0, 1)]), ids(1)),
        ]);
        let actions = plan(&[rec("M", 1, &[(0, 1)]), rec("B", 1, &[(0, 1)])], &prior, now(100)).unwrap();
        let keys: Vec<&str> = actions.iter().map(|a| a.key().as_str()).collect();
        assert_eq!(keys, vec!["M", "B", "A", "Z"]);
    }
}
