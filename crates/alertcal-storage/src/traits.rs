use alertcal_core::Snapshot;

/// Durable home of the reconciliation snapshot. Exactly one writer at a time is assumed.
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot. A store that was never written yields an empty snapshot.
    fn load(&self) -> anyhow::Result<Snapshot>;

    /// Replace the stored snapshot as a whole. Nothing counts as committed until this returns Ok.
    fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}
