use serde::{Deserialize, Serialize};

use crate::{ids::*, model::*};

/// What actually happened downstream for one applied action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created { key: AlertKey, resource_ids: Vec<ResourceId> },
    Updated { key: AlertKey, resource_ids: Vec<ResourceId>, failed_deletes: usize },
    Resumed { key: AlertKey, resource_ids: Vec<ResourceId> },
    Expired { key: AlertKey, failed_deletes: usize },
    Kept { key: AlertKey, reason: KeepReason },
}

/// Summary counts for one reconciliation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(rename = "created_count")]
    pub created: usize,
    #[serde(rename = "updated_count")]
    pub updated: usize,
    #[serde(rename = "deleted_count")]
    pub deleted: usize,
    #[serde(rename = "resumed_count")]
    pub resumed: usize,
    /// Still in the feed and not newer.
    pub unchanged: usize,
    /// Gone from the feed after concluding naturally.
    pub retained: usize,
    /// Deletes that failed for a reason other than not-found.
    pub failed_deletes: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created { .. } => self.created += 1,
            Outcome::Updated { failed_deletes, .. } => {
                self.updated += 1;
                self.failed_deletes += failed_deletes;
            }
            Outcome::Resumed { .. } => self.resumed += 1,
            Outcome::Expired { failed_deletes, .. } => {
                self.deleted += 1;
                self.failed_deletes += failed_deletes;
            }
            Outcome::Kept { reason: KeepReason::Unchanged, .. } => self.unchanged += 1,
            Outcome::Kept { reason: KeepReason::Concluded, .. } => self.retained += 1,
        }
    }

    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted + self.resumed
    }
}
