//! Task record model and field validation

use crate::error::{TodoError, TodoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum accepted name length, in characters
pub const NAME_MIN_LEN: usize = 3;

/// Maximum accepted name length, in characters
pub const NAME_MAX_LEN: usize = 100;

/// Record priority. Lower rank means more urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    #[default]
    Low = 3,
}

impl Priority {
    /// Numeric rank (HIGH=1, MEDIUM=2, LOW=3)
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Lowercase display name
    pub fn name(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.rank()
    }
}

impl TryFrom<u8> for Priority {
    type Error = TodoError;

    fn try_from(rank: u8) -> TodoResult<Self> {
        match rank {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(TodoError::invalid(
                "priority",
                format!("{} is out of range, expected 1 (high) to 3 (low)", other),
            )),
        }
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> TodoResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "1" => Ok(Priority::High),
            "medium" | "2" => Ok(Priority::Medium),
            "low" | "3" => Ok(Priority::Low),
            _ => Err(TodoError::invalid(
                "priority",
                format!("unknown priority '{}', use high, medium or low", s),
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A task record held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, immutable once assigned
    pub id: u64,

    /// Short name, 3 to 100 characters
    pub name: String,

    /// Free-form description, never empty
    pub description: String,

    /// Priority, LOW unless set
    #[serde(default)]
    pub priority: Priority,
}

/// Fields for a record that does not have an id yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl NewRecord {
    /// Create a new record request with the default priority
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            priority: Priority::default(),
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Validate all fields
    pub fn validate(&self) -> TodoResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)
    }

    pub(crate) fn into_record(self, id: u64) -> Record {
        Record {
            id,
            name: self.name,
            description: self.description,
            priority: self.priority,
        }
    }
}

/// Partial update. `None` leaves the field untouched; `Some("")` is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl RecordPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.priority.is_none()
    }

    /// Validate every supplied field with the same rules as creation
    pub fn validate(&self) -> TodoResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Apply supplied fields. Callers validate first.
    pub(crate) fn apply_to(self, record: &mut Record) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
    }
}

fn validate_name(name: &str) -> TodoResult<()> {
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(TodoError::invalid(
            "name",
            format!(
                "must be between {} and {} characters, got {}",
                NAME_MIN_LEN, NAME_MAX_LEN, len
            ),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> TodoResult<()> {
    if description.is_empty() {
        return Err(TodoError::invalid("description", "must not be empty"));
    }
    Ok(())
}
