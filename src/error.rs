use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to task service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("task service responded with {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Task title cannot be empty.")]
    EmptyTitle,
    #[error("Time must be a 24-hour HH:mm value, got \"{0}\".")]
    InvalidTime(String),
    #[error("no task is open in the editor")]
    EditorClosed,
    #[error("only an existing task can be deleted")]
    NotEditing,
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("task {0} is already being updated")]
    ToggleInFlight(u64),
    #[error(transparent)]
    Store(#[from] StoreError),
}
