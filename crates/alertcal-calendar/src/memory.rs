use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use alertcal_core::{AlertKey, AlertRecord, ResourceId};

use crate::types::{CalendarEvent, DeleteOutcome, ResourceAdapter};

/// Adapter call, in the order it reached the calendar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CalendarCall {
    Create { key: AlertKey, window_index: usize },
    Delete { id: ResourceId },
}

/// In-memory calendar for tests and dry runs. Ids are `evt-<n>` in creation order.
#[derive(Default)]
pub struct InMemoryCalendar {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    events: BTreeMap<ResourceId, CalendarEvent>,
    calls: Vec<CalendarCall>,
    next_id: u64,
    creates: usize,
    fail_create_on: Option<usize>,
    fail_deletes: HashSet<ResourceId>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event as if an earlier run had created it.
    pub fn insert(&self, id: ResourceId, event: CalendarEvent) {
        self.inner.lock().unwrap().events.insert(id, event);
    }

    pub fn get(&self, id: &ResourceId) -> Option<CalendarEvent> {
        self.inner.lock().unwrap().events.get(id).cloned()
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.inner.lock().unwrap().events.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Fail the `n`-th create call from now on (1-based).
    pub fn fail_create_on(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_create_on = Some(inner.creates + n);
    }

    /// Every delete of `id` fails with a non-idempotent error until cleared.
    pub fn fail_delete_of(&self, id: ResourceId) {
        self.inner.lock().unwrap().fail_deletes.insert(id);
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_create_on = None;
        inner.fail_deletes.clear();
    }
}

impl ResourceAdapter for InMemoryCalendar {
    fn create(&self, record: &AlertRecord, window_index: usize) -> Result<ResourceId> {
        let event = CalendarEvent::for_window(record, window_index)?;
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(CalendarCall::Create { key: record.key.clone(), window_index });
        inner.creates += 1;
        if inner.fail_create_on == Some(inner.creates) {
            inner.fail_create_on = None;
            return Err(anyhow!("injected create failure for {} window {}", record.key, window_index));
        }
        inner.next_id += 1;
        let id = ResourceId::from_str(format!("evt-{}", inner.next_id));
        inner.events.insert(id.clone(), event);
        Ok(id)
    }

    fn delete(&self, id: &ResourceId) -> Result<DeleteOutcome> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(CalendarCall::Delete { id: id.clone() });
        if inner.fail_deletes.contains(id) {
            return Err(anyhow!("injected delete failure for {}", id));
        }
        Ok(match inner.events.remove(id) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{contract_record, run_adapter_contract_suite};

    #[test]
    fn memory_calendar_contract() {
        let cal = InMemoryCalendar::new();
        run_adapter_contract_suite(&cal).unwrap();
        assert!(cal.is_empty());
    }

    #[test]
    fn event_mirrors_window_and_text() {
        let cal = InMemoryCalendar::new();
        let record = contract_record();
        let id = cal.create(&record, 1).unwrap();
        let ev = cal.get(&id).unwrap();
        assert_eq!(ev.summary, "contract");
        assert_eq!(ev.description, "<p>body</p>");
        assert_eq!(ev.start, record.active_windows[1].start);
        assert_eq!(ev.window_index, 1);
    }

    #[test]
    fn injected_create_failure_is_one_shot() {
        let cal = InMemoryCalendar::new();
        let record = contract_record();
        cal.fail_create_on(2);
        assert!(cal.create(&record, 0).is_ok());
        assert!(cal.create(&record, 1).is_err());
        assert!(cal.create(&record, 1).is_ok());
        assert_eq!(cal.len(), 2);
        assert_eq!(cal.calls().len(), 3);
    }

    #[test]
    fn injected_delete_failure_until_cleared() {
        let cal = InMemoryCalendar::new();
        let id = cal.create(&contract_record(), 0).unwrap();
        cal.fail_delete_of(id.clone());
        assert!(cal.delete(&id).is_err());
        assert!(cal.contains(&id));
        cal.clear_failures();
        assert_eq!(cal.delete(&id).unwrap(), DeleteOutcome::Deleted);
    }
}
