use crate::dashboard::Dashboard;
use crate::editor::EditorField;
use crate::error::{DashboardError, StoreError};
use crate::models::{Section, StatsSnapshot, Task};
use crate::stats::StatsEmitter;
use crate::store::TaskStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, warn};

type ToggleResult = (u64, Result<(), StoreError>);

pub struct App<S: TaskStore + 'static> {
    pub dashboard: Dashboard<S>,
    pub state: ListState,
    pub focus: Section,
    pub input_mode: InputMode,
    pub latest_stats: Option<StatsSnapshot>,
    pub status: Option<String>,
    stats_rx: UnboundedReceiver<StatsSnapshot>,
    toggle_tx: UnboundedSender<ToggleResult>,
    toggle_rx: UnboundedReceiver<ToggleResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Editor,
    ConfirmDelete,
}

impl<S: TaskStore + 'static> App<S> {
    pub fn new(store: Arc<S>) -> App<S> {
        let (emitter, stats_rx) = StatsEmitter::channel();
        let (toggle_tx, toggle_rx) = unbounded_channel();
        let mut state = ListState::default();
        state.select(Some(0));
        App {
            dashboard: Dashboard::new(store, emitter),
            state,
            focus: Section::Today,
            input_mode: InputMode::Normal,
            latest_stats: None,
            status: None,
            stats_rx,
            toggle_tx,
            toggle_rx,
        }
    }

    pub async fn refresh_tasks(&mut self) {
        match self.dashboard.reload().await {
            Ok(()) => self.clamp_selection(),
            Err(err) => self.status = Some(format!("Error fetching tasks: {}", err)),
        }
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.dashboard.filtered_section_tasks(&self.focus)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let idx = self.state.selected()?;
        self.visible_tasks().get(idx).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn focus_section(&mut self, section: Section) {
        self.focus = section;
        self.state.select(Some(0));
        self.clamp_selection();
    }

    /// Flips the selected task right away and persists it in the background.
    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        match self.dashboard.begin_toggle(id) {
            Ok(task) => {
                // The flipped task may no longer pass the status filter.
                self.clamp_selection();
                let store = self.dashboard.store();
                let tx = self.toggle_tx.clone();
                tokio::spawn(async move {
                    let result = store.update(&task).await;
                    let _ = tx.send((task.id, result));
                });
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    /// Applies finished background requests and picks up emitted stats.
    pub fn poll_background(&mut self) {
        while let Ok((id, result)) = self.toggle_rx.try_recv() {
            if let Err(err) = self.dashboard.finish_toggle(id, result) {
                self.status = Some(format!("Could not update task: {}", err));
            }
            self.clamp_selection();
        }
        while let Ok(snapshot) = self.stats_rx.try_recv() {
            self.latest_stats = Some(snapshot);
        }
    }

    async fn save_editor(&mut self) {
        match self.dashboard.save().await {
            Ok(()) => {
                self.status = None;
                self.input_mode = InputMode::Normal;
                self.clamp_selection();
            }
            Err(DashboardError::Store(err)) if !self.dashboard.editor.is_open() => {
                // Saved, but the reload afterwards failed.
                error!(%err, "reload after save failed");
                self.status = Some(format!("Saved, but could not reload tasks: {}", err));
                self.input_mode = InputMode::Normal;
            }
            Err(err) => {
                warn!(%err, "could not save task");
                self.status = Some(err.to_string());
            }
        }
    }

    async fn resolve_delete(&mut self, confirmed: bool) {
        match self.dashboard.delete(|_| confirmed).await {
            Ok(true) => {
                self.status = None;
                self.input_mode = InputMode::Normal;
                self.clamp_selection();
            }
            Ok(false) => self.input_mode = InputMode::Editor,
            Err(err) => {
                self.status = Some(format!("Error deleting task: {}", err));
                self.input_mode = InputMode::Editor;
            }
        }
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('h') | KeyCode::Left => {
                    let prev = self.focus.cycle().cycle();
                    self.focus_section(prev);
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                    let next = self.focus.cycle();
                    self.focus_section(next);
                }
                KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
                KeyCode::Char('a') => {
                    self.dashboard.editor.open_create();
                    self.input_mode = InputMode::Editor;
                }
                KeyCode::Enter | KeyCode::Char('e') => {
                    if let Some(task) = self.selected_task().cloned() {
                        self.dashboard.editor.open_edit(&task);
                        self.input_mode = InputMode::Editor;
                    }
                }
                KeyCode::Char('/') => self.input_mode = InputMode::Search,
                KeyCode::Char('f') => {
                    self.dashboard.filter = self.dashboard.filter.next();
                    self.clamp_selection();
                }
                KeyCode::Char('r') => self.refresh_tasks().await,
                _ => {}
            },

            InputMode::Search => match key.code {
                KeyCode::Char(c) => {
                    self.dashboard.search_term.push(c);
                    self.clamp_selection();
                }
                KeyCode::Backspace => {
                    self.dashboard.search_term.pop();
                    self.clamp_selection();
                }
                KeyCode::Enter | KeyCode::Esc => self.input_mode = InputMode::Normal,
                _ => {}
            },

            InputMode::Editor => {
                let editor = &mut self.dashboard.editor;
                match key.code {
                    KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if editor.is_edit_mode() {
                            self.input_mode = InputMode::ConfirmDelete;
                        } else {
                            self.status = Some("Only saved tasks can be deleted.".to_string());
                        }
                    }
                    KeyCode::Tab | KeyCode::Down => editor.active_field = editor.active_field.next(),
                    KeyCode::BackTab | KeyCode::Up => {
                        editor.active_field = editor.active_field.previous()
                    }
                    KeyCode::Char(c) => editor.push_char(c),
                    KeyCode::Backspace => editor.pop_char(),
                    KeyCode::Enter => self.save_editor().await,
                    KeyCode::Esc => {
                        editor.close();
                        self.status = None;
                        self.input_mode = InputMode::Normal;
                    }
                    _ => {}
                }
            }

            InputMode::ConfirmDelete => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.resolve_delete(true).await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.resolve_delete(false).await
                }
                _ => {}
            },
        }
        Ok(false)
    }

    pub fn active_field(&self) -> EditorField {
        self.dashboard.editor.active_field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{Call, FakeStore};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn press(app: &mut App<FakeStore>, codes: &[KeyCode]) {
        for code in codes {
            app.handle_input(key(*code)).await.unwrap();
        }
    }

    async fn app_with(tasks: Vec<Task>) -> (App<FakeStore>, Arc<FakeStore>) {
        let store = Arc::new(FakeStore::with_tasks(tasks));
        let mut app = App::new(Arc::clone(&store));
        app.refresh_tasks().await;
        (app, store)
    }

    fn today(id: u64, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            ..Task::default()
        }
    }

    #[tokio::test]
    async fn test_quit() {
        let (mut app, _) = app_with(vec![]).await;
        assert!(app.handle_input(key(KeyCode::Char('q'))).await.unwrap());
    }

    #[tokio::test]
    async fn test_navigation_wraps() {
        let (mut app, _) = app_with(vec![today(1, "a"), today(2, "b")]).await;
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
        press(&mut app, &[KeyCode::Char('k')]).await;
        assert_eq!(app.selected_task().map(|t| t.id), Some(2));
        press(&mut app, &[KeyCode::Char('j')]).await;
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
    }

    #[tokio::test]
    async fn test_toggle_flips_then_persists() {
        let (mut app, store) = app_with(vec![today(1, "a")]).await;
        press(&mut app, &[KeyCode::Char(' ')]).await;
        assert!(app.dashboard.task(1).unwrap().completed);

        let (id, result) = app.toggle_rx.recv().await.unwrap();
        assert!(result.is_ok());
        app.toggle_tx.send((id, result)).unwrap();
        app.poll_background();

        assert!(app.dashboard.task(1).unwrap().completed);
        assert_eq!(
            app.latest_stats,
            Some(StatsSnapshot {
                completed_today: 1,
                total_tasks: 1
            })
        );
        assert!(matches!(store.calls().last(), Some(Call::Update(t)) if t.completed));
    }

    #[tokio::test]
    async fn test_toggle_failure_reverts_and_reports() {
        let (mut app, store) = app_with(vec![today(1, "a")]).await;
        app.poll_background();
        app.latest_stats = None;
        store.set_failing(true);
        press(&mut app, &[KeyCode::Char('x')]).await;
        assert!(app.dashboard.task(1).unwrap().completed);

        let (id, result) = app.toggle_rx.recv().await.unwrap();
        app.toggle_tx.send((id, result)).unwrap();
        app.poll_background();

        assert!(!app.dashboard.task(1).unwrap().completed);
        assert!(app.status.is_some());
        assert_eq!(app.latest_stats, None);
    }

    #[tokio::test]
    async fn test_reload_key_updates_stats() {
        let (mut app, store) = app_with(vec![today(1, "a")]).await;
        app.poll_background();
        assert_eq!(app.latest_stats.map(|s| s.total_tasks), Some(1));

        store.tasks.lock().unwrap().push(today(2, "b"));
        press(&mut app, &[KeyCode::Char('r')]).await;
        app.poll_background();
        assert_eq!(
            app.latest_stats,
            Some(StatsSnapshot {
                completed_today: 0,
                total_tasks: 2
            })
        );
    }

    #[tokio::test]
    async fn test_toggle_under_filter_keeps_selection_in_range() {
        let (mut app, _) = app_with(vec![today(1, "a"), today(2, "b")]).await;
        press(&mut app, &[KeyCode::Char('f'), KeyCode::Char('j')]).await;
        assert_eq!(app.state.selected(), Some(1));

        // Completing task 2 hides it from the pending view right away.
        press(&mut app, &[KeyCode::Char(' ')]).await;
        assert_eq!(app.visible_tasks().len(), 1);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
    }

    #[tokio::test]
    async fn test_invalid_time_warns_in_editor() {
        let (mut app, store) = app_with(vec![]).await;
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char('x')]).await;
        for _ in 0..4 {
            press(&mut app, &[KeyCode::Tab]).await;
        }
        assert_eq!(app.active_field(), EditorField::Time);
        press(&mut app, &[KeyCode::Char('9'), KeyCode::Enter]).await;

        assert_eq!(app.input_mode, InputMode::Editor);
        assert!(app.status.as_deref().is_some_and(|s| s.contains("HH:mm")));
        assert_eq!(store.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn test_create_through_editor() {
        let (mut app, _) = app_with(vec![]).await;
        press(&mut app, &[KeyCode::Char('a')]).await;
        assert_eq!(app.input_mode, InputMode::Editor);
        for c in "Stretch".chars() {
            press(&mut app, &[KeyCode::Char(c)]).await;
        }
        press(&mut app, &[KeyCode::Enter]).await;
        app.poll_background();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.dashboard.tasks().len(), 1);
        assert_eq!(app.latest_stats.map(|s| s.total_tasks), Some(1));
    }

    #[tokio::test]
    async fn test_empty_title_keeps_editor_open_with_warning() {
        let (mut app, store) = app_with(vec![]).await;
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char(' '), KeyCode::Enter]).await;
        assert_eq!(app.input_mode, InputMode::Editor);
        assert_eq!(app.status.as_deref(), Some("Task title cannot be empty."));
        assert_eq!(store.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (mut app, store) = app_with(vec![today(1, "a"), today(2, "b")]).await;
        press(&mut app, &[KeyCode::Enter]).await;
        app.handle_input(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert_eq!(app.input_mode, InputMode::ConfirmDelete);

        press(&mut app, &[KeyCode::Char('n')]).await;
        assert_eq!(app.input_mode, InputMode::Editor);
        assert_eq!(app.dashboard.tasks().len(), 2);

        app.handle_input(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        press(&mut app, &[KeyCode::Char('y')]).await;
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.dashboard.task(1).is_none());
        assert_eq!(store.calls().last(), Some(&Call::Delete(1)));
    }

    #[tokio::test]
    async fn test_search_and_filter_keys() {
        let (mut app, _) = app_with(vec![today(1, "Read"), today(2, "Run")]).await;
        press(&mut app, &[KeyCode::Char('/'), KeyCode::Char('u'), KeyCode::Enter]).await;
        assert_eq!(app.dashboard.search_term, "u");
        assert_eq!(app.selected_task().map(|t| t.id), Some(2));

        press(&mut app, &[KeyCode::Char('f'), KeyCode::Char('f')]).await;
        assert!(app.visible_tasks().is_empty());
        assert_eq!(app.state.selected(), None);
    }

    #[tokio::test]
    async fn test_section_focus_cycles() {
        let (mut app, _) = app_with(vec![]).await;
        press(&mut app, &[KeyCode::Char('l')]).await;
        assert_eq!(app.focus, Section::Week);
        press(&mut app, &[KeyCode::Char('h'), KeyCode::Char('h')]).await;
        assert_eq!(app.focus, Section::Month);
    }
}
