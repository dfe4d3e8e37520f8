use crate::error::DashboardError;
use crate::models::Task;
use crate::timefmt::{display_to_raw, raw_to_display};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    OpenCreate,
    OpenEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Description,
    Category,
    Date,
    Time,
    Section,
    Color,
}

impl EditorField {
    pub const ALL: [EditorField; 7] = [
        EditorField::Title,
        EditorField::Description,
        EditorField::Category,
        EditorField::Date,
        EditorField::Time,
        EditorField::Section,
        EditorField::Color,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorField::Title => "Title",
            EditorField::Description => "Description",
            EditorField::Category => "Category",
            EditorField::Date => "Date (YYYY-MM-DD)",
            EditorField::Time => "Time (HH:mm)",
            EditorField::Section => "Section",
            EditorField::Color => "Color",
        }
    }

    pub fn next(self) -> EditorField {
        let idx = EditorField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        EditorField::ALL[(idx + 1) % EditorField::ALL.len()]
    }

    pub fn previous(self) -> EditorField {
        let idx = EditorField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        EditorField::ALL[(idx + EditorField::ALL.len() - 1) % EditorField::ALL.len()]
    }
}

/// Create/edit workflow for a single task. The session works on its own
/// copy, so nothing typed here is visible in the task list until saved.
#[derive(Debug, Clone)]
pub struct EditorSession {
    state: EditorState,
    draft: Task,
    pub active_field: EditorField,
}

impl Default for EditorSession {
    fn default() -> Self {
        EditorSession::new()
    }
}

impl EditorSession {
    pub fn new() -> EditorSession {
        EditorSession {
            state: EditorState::Closed,
            draft: Task::default(),
            active_field: EditorField::Title,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != EditorState::Closed
    }

    /// True while an existing task is being edited.
    pub fn is_edit_mode(&self) -> bool {
        self.state == EditorState::OpenEdit
    }

    pub fn draft(&self) -> &Task {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Task {
        &mut self.draft
    }

    pub fn open_create(&mut self) {
        debug!("editor: open for new task");
        self.draft = Task::default();
        self.state = EditorState::OpenCreate;
        self.active_field = EditorField::Title;
    }

    pub fn open_edit(&mut self, task: &Task) {
        debug!(id = task.id, "editor: open for existing task");
        let mut draft = task.clone();
        draft.time_raw = Some(display_to_raw(task.time.as_deref().unwrap_or_default()));
        self.draft = draft;
        self.state = EditorState::OpenEdit;
        self.active_field = EditorField::Title;
    }

    /// Discards the working copy without persisting anything.
    pub fn close(&mut self) {
        self.draft = Task::default();
        self.state = EditorState::Closed;
        self.active_field = EditorField::Title;
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if !self.is_open() {
            return Err(DashboardError::EditorClosed);
        }
        if self.draft.title.trim().is_empty() {
            return Err(DashboardError::EmptyTitle);
        }
        let raw = self.draft.time_raw.as_deref().unwrap_or_default().trim();
        if !raw.is_empty() && raw_to_display(raw).is_empty() {
            return Err(DashboardError::InvalidTime(raw.to_string()));
        }
        Ok(())
    }

    /// The payload sent to the store: the working copy with its display
    /// time regenerated from the 24-hour editing value. A cleared time
    /// field clears both representations.
    pub fn payload(&self) -> Task {
        let mut task = self.draft.clone();
        let raw = task.time_raw.as_deref().unwrap_or_default().trim().to_string();
        if raw.is_empty() {
            task.time = None;
            task.time_raw = None;
        } else {
            task.time = Some(raw_to_display(&raw));
            task.time_raw = Some(raw);
        }
        task
    }

    pub fn field_value(&self, field: EditorField) -> String {
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        match field {
            EditorField::Title => self.draft.title.clone(),
            EditorField::Description => opt(&self.draft.description),
            EditorField::Category => opt(&self.draft.category),
            EditorField::Date => opt(&self.draft.date),
            EditorField::Time => opt(&self.draft.time_raw),
            EditorField::Section => self.draft.section.label().to_string(),
            EditorField::Color => self.draft.color.clone(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.active_field {
            EditorField::Title => self.draft.title.push(c),
            EditorField::Description => self.draft.description.get_or_insert_with(String::new).push(c),
            EditorField::Category => self.draft.category.get_or_insert_with(String::new).push(c),
            EditorField::Date => self.draft.date.get_or_insert_with(String::new).push(c),
            EditorField::Time => self.draft.time_raw.get_or_insert_with(String::new).push(c),
            EditorField::Section => self.draft.section = self.draft.section.cycle(),
            EditorField::Color => self.draft.color.push(c),
        }
    }

    pub fn pop_char(&mut self) {
        match self.active_field {
            EditorField::Title => {
                self.draft.title.pop();
            }
            EditorField::Description => pop_optional(&mut self.draft.description),
            EditorField::Category => pop_optional(&mut self.draft.category),
            EditorField::Date => pop_optional(&mut self.draft.date),
            EditorField::Time => pop_optional(&mut self.draft.time_raw),
            EditorField::Section => {}
            EditorField::Color => {
                self.draft.color.pop();
            }
        }
    }
}

fn pop_optional(value: &mut Option<String>) {
    if let Some(s) = value {
        s.pop();
    }
}
