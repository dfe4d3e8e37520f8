use serde::{Deserialize, Serialize};
use std::fmt;

// Task struct, as exchanged with the task service
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_raw: Option<String>,
    #[serde(default)]
    pub section: Section,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub completed: bool,
}

fn default_color() -> String {
    "green".to_string()
}

impl Default for Task {
    /// The blank task a new editor session starts from. An id of 0 means
    /// the task has not been persisted yet.
    fn default() -> Self {
        Task {
            id: 0,
            title: String::new(),
            description: None,
            category: None,
            date: None,
            time: None,
            time_raw: None,
            section: Section::Today,
            color: default_color(),
            completed: false,
        }
    }
}

impl Task {
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Time-horizon bucket. Values the service sends that are not one of the
/// three known buckets are kept verbatim and never match a bucket filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Section {
    #[default]
    Today,
    Week,
    Month,
    Other(String),
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Today, Section::Week, Section::Month];

    pub fn as_str(&self) -> &str {
        match self {
            Section::Today => "today",
            Section::Week => "week",
            Section::Month => "month",
            Section::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Section::Today => "Today",
            Section::Week => "This Week",
            Section::Month => "This Month",
            Section::Other(raw) => raw,
        }
    }

    /// Next known bucket, used by the editor to cycle the field.
    pub fn cycle(&self) -> Section {
        match self {
            Section::Today => Section::Week,
            Section::Week => Section::Month,
            Section::Month | Section::Other(_) => Section::Today,
        }
    }
}

impl From<String> for Section {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "today" => Section::Today,
            "week" => Section::Week,
            "month" => Section::Month,
            _ => Section::Other(raw),
        }
    }
}

impl From<Section> for String {
    fn from(section: Section) -> Self {
        section.as_str().to_string()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }

    pub fn next(self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }
}

// Aggregate counters pushed to the stats listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub completed_today: usize,
    pub total_tasks: usize,
}
