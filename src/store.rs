use crate::error::StoreError;
use crate::models::Task;
use async_trait::async_trait;

/// Persistence port for task records, keyed by integer id.
///
/// The dashboard only ever talks to this trait, so tests can hand it an
/// in-memory implementation instead of a live service.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Persists a new task. The returned task carries the id the store assigned.
    async fn create(&self, task: &Task) -> Result<Task, StoreError>;

    /// Replaces the stored task with the same id.
    async fn update(&self, task: &Task) -> Result<(), StoreError>;

    async fn delete(&self, id: u64) -> Result<(), StoreError>;
}
