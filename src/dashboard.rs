use crate::editor::{EditorSession, EditorState};
use crate::error::{DashboardError, StoreError};
use crate::models::{Section, StatsSnapshot, StatusFilter, Task};
use crate::stats::StatsEmitter;
use crate::store::TaskStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// View-model over the task collection.
///
/// The collection is only ever replaced wholesale by a reload, except for
/// the optimistic completion toggle and the removal after a delete. All
/// projections below are recomputed from the current collection on every
/// call.
pub struct Dashboard<S: TaskStore> {
    store: Arc<S>,
    tasks: Vec<Task>,
    pub search_term: String,
    pub filter: StatusFilter,
    pub editor: EditorSession,
    stats: StatsEmitter,
    // task id -> completion value applied locally, awaiting the store
    toggles_in_flight: HashMap<u64, bool>,
}

impl<S: TaskStore> Dashboard<S> {
    pub fn new(store: Arc<S>, stats: StatsEmitter) -> Dashboard<S> {
        Dashboard {
            store,
            tasks: Vec::new(),
            search_term: String::new(),
            filter: StatusFilter::All,
            editor: EditorSession::new(),
            stats,
            toggles_in_flight: HashMap::new(),
        }
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Replaces the collection with the store's current list. On failure the
    /// previous collection is left untouched.
    pub async fn load(&mut self) -> Result<(), DashboardError> {
        match self.store.list().await {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => {
                error!(%err, "error fetching tasks");
                Err(err.into())
            }
        }
    }

    /// User-initiated reload: replaces the collection and, on success,
    /// emits stats for the new membership.
    pub async fn reload(&mut self) -> Result<(), DashboardError> {
        self.load().await?;
        self.emit_stats();
        Ok(())
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        let needle = self.search_term.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .filter(|t| self.filter.matches(t))
            .collect()
    }

    pub fn filtered_section_tasks(&self, section: &Section) -> Vec<&Task> {
        self.filtered_tasks()
            .into_iter()
            .filter(|t| &t.section == section)
            .collect()
    }

    pub fn filtered_today_tasks(&self) -> Vec<&Task> {
        self.filtered_section_tasks(&Section::Today)
    }

    pub fn filtered_week_tasks(&self) -> Vec<&Task> {
        self.filtered_section_tasks(&Section::Week)
    }

    pub fn filtered_month_tasks(&self) -> Vec<&Task> {
        self.filtered_section_tasks(&Section::Month)
    }

    pub fn section_count(&self, section: &Section) -> usize {
        self.tasks.iter().filter(|t| &t.section == section).count()
    }

    pub fn completed_section_count(&self, section: &Section) -> usize {
        self.tasks
            .iter()
            .filter(|t| &t.section == section && t.completed)
            .count()
    }

    pub fn today_tasks_count(&self) -> usize {
        self.section_count(&Section::Today)
    }

    pub fn completed_today_count(&self) -> usize {
        self.completed_section_count(&Section::Today)
    }

    /// Rounded completion percentage of a section; 0 for an empty section.
    pub fn progress_percent(&self, section: &Section) -> u8 {
        let total = self.section_count(section);
        if total == 0 {
            return 0;
        }
        let done = self.completed_section_count(section);
        (100.0 * done as f64 / total as f64).round() as u8
    }

    pub fn today_progress_percent(&self) -> u8 {
        self.progress_percent(&Section::Today)
    }

    pub fn week_progress_percent(&self) -> u8 {
        self.progress_percent(&Section::Week)
    }

    pub fn month_progress_percent(&self) -> u8 {
        self.progress_percent(&Section::Month)
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            completed_today: self.completed_today_count(),
            total_tasks: self.tasks.len(),
        }
    }

    fn emit_stats(&self) {
        self.stats.emit(self.stats_snapshot());
    }

    pub fn is_toggle_in_flight(&self, id: u64) -> bool {
        self.toggles_in_flight.contains_key(&id)
    }

    /// Flips completion locally and returns the task to persist. A second
    /// toggle on the same id is refused until the first one resolves.
    pub fn begin_toggle(&mut self, id: u64) -> Result<Task, DashboardError> {
        if self.toggles_in_flight.contains_key(&id) {
            warn!(id, "toggle already in flight");
            return Err(DashboardError::ToggleInFlight(id));
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DashboardError::TaskNotFound(id))?;
        task.completed = !task.completed;
        self.toggles_in_flight.insert(id, task.completed);
        debug!(id, completed = task.completed, "toggled locally");
        Ok(task.clone())
    }

    /// Applies the store's answer to an earlier `begin_toggle`. Success
    /// re-emits stats; failure reverts the local flip.
    pub fn finish_toggle(
        &mut self,
        id: u64,
        result: Result<(), StoreError>,
    ) -> Result<(), DashboardError> {
        let Some(applied) = self.toggles_in_flight.remove(&id) else {
            return Ok(());
        };
        match result {
            Ok(()) => {
                self.emit_stats();
                Ok(())
            }
            Err(err) => {
                error!(id, %err, "error updating task, reverting");
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.completed = !applied;
                }
                Err(err.into())
            }
        }
    }

    pub async fn toggle_task(&mut self, id: u64) -> Result<(), DashboardError> {
        let task = self.begin_toggle(id)?;
        let result = self.store.update(&task).await;
        self.finish_toggle(id, result)
    }

    /// Persists the editor's working copy. Validation and store failures
    /// leave the session open with its data intact.
    pub async fn save(&mut self) -> Result<(), DashboardError> {
        if let Err(err) = self.editor.validate() {
            warn!(%err, "save rejected");
            return Err(err);
        }
        let payload = self.editor.payload();

        let result = match self.editor.state() {
            EditorState::OpenEdit => self.store.update(&payload).await,
            EditorState::OpenCreate => self.store.create(&payload).await.map(|created| {
                info!(id = created.id, "created task");
            }),
            EditorState::Closed => return Err(DashboardError::EditorClosed),
        };
        if let Err(err) = result {
            error!(%err, "error saving task");
            return Err(err.into());
        }

        self.editor.close();
        let reloaded = self.load().await;
        self.emit_stats();
        reloaded
    }

    /// Deletes the task open in the editor once `confirm` agrees. Returns
    /// whether the task was deleted.
    pub async fn delete<F>(&mut self, confirm: F) -> Result<bool, DashboardError>
    where
        F: FnOnce(&Task) -> bool,
    {
        match self.editor.state() {
            EditorState::OpenEdit => {}
            EditorState::OpenCreate => return Err(DashboardError::NotEditing),
            EditorState::Closed => return Err(DashboardError::EditorClosed),
        }
        if !self.editor.draft().is_persisted() {
            return Err(DashboardError::NotEditing);
        }
        if !confirm(self.editor.draft()) {
            debug!("delete declined");
            return Ok(false);
        }

        let id = self.editor.draft().id;
        if let Err(err) = self.store.delete(id).await {
            error!(id, %err, "error deleting task");
            return Err(err.into());
        }
        self.tasks.retain(|t| t.id != id);
        self.toggles_in_flight.remove(&id);
        self.emit_stats();
        self.editor.close();
        info!(id, "deleted task");
        Ok(true)
    }
}
