//! Item model: the read-only snapshot of one work item.
//!
//! Instances are never mutated by the engine. Every change goes through an
//! [`Action`](super::Action) dispatched to the mutation port, and is only
//! observed on the next run's snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FieldId, ItemId, OptionId, ProjectId, SectionId, StoryId, UserId};

/// A user of the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Does `reference` (a gid or an email) denote this user?
    pub fn matches(&self, reference: &str) -> bool {
        self.id.as_str() == reference || self.email.as_deref() == Some(reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub id: SectionId,
    pub name: String,
}

/// Membership of an item in a project, optionally within one of its sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub project: ProjectRef,
    #[serde(default)]
    pub section: Option<SectionRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumOption {
    pub id: OptionId,
    pub name: String,
}

/// Current value of a custom field on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Enum {
        #[serde(default)]
        value: Option<EnumOption>,
        #[serde(default)]
        options: Vec<EnumOption>,
    },
    Number {
        #[serde(default)]
        value: Option<f64>,
    },
    Text {
        #[serde(default)]
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: FieldId,
    pub name: String,
    #[serde(flatten)]
    pub value: FieldValue,
}

impl CustomField {
    /// Selected enum option, if this is an enum field with a value.
    pub fn enum_value(&self) -> Option<&EnumOption> {
        match &self.value {
            FieldValue::Enum { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    /// Options of an enum field; `None` for other field kinds.
    pub fn enum_options(&self) -> Option<&[EnumOption]> {
        match &self.value {
            FieldValue::Enum { options, .. } => Some(options),
            _ => None,
        }
    }

    pub fn number_value(&self) -> Option<f64> {
        match self.value {
            FieldValue::Number { value } => value,
            _ => None,
        }
    }
}

/// Opaque per-app data attached to an item.
///
/// `data` maps a namespace to any JSON value; workflows backed by external
/// data keep their state under the `"workflows"` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct External {
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// What a story records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryKind {
    Comment { text: String },
    EnumChanged { field: String },
    AddedToProject { project: String },
    SectionChanged { project: String, section: String },
    Other,
}

/// One entry of an item's history, oldest first in [`Item::stories`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(flatten)]
    pub kind: StoryKind,
}

impl Story {
    pub fn comment_text(&self) -> Option<&str> {
        match &self.kind {
            StoryKind::Comment { text } => Some(text),
            _ => None,
        }
    }
}

/// A work item under triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub assignee: Option<User>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<User>,
    /// Due date without a time. Meaningless when `due_at` is set.
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_on: Option<NaiveDate>,
    #[serde(default)]
    pub num_likes: u32,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default)]
    pub external: Option<External>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl Item {
    /// A bare item: incomplete, unassigned, no due date, no fields.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: String::new(),
            completed: false,
            assignee: None,
            created_at,
            created_by: None,
            due_on: None,
            due_at: None,
            start_on: None,
            num_likes: 0,
            custom_fields: Vec::new(),
            memberships: Vec::new(),
            external: None,
            stories: Vec::new(),
        }
    }

    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| f.name == name)
    }

    pub fn membership_in(&self, project_name: &str) -> Option<&Membership> {
        self.memberships
            .iter()
            .find(|m| m.project.name == project_name)
    }

    /// Due date regardless of whether a time was set.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_at.map(|at| at.date_naive()).or(self.due_on)
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.stories.iter().filter_map(Story::comment_text)
    }
}
