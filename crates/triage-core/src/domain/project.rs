//! Project schema: the sections and custom field definitions of a project.
//!
//! Fetched once when the triager is built (to validate registrations) and once
//! per run (to resolve actions that refer to sections or options by name).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{FieldId, ItemId};
use super::item::{EnumOption, ProjectRef, SectionRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Enum,
    Number,
    Text,
}

/// Definition of a custom field attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldDef {
    pub id: FieldId,
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub options: Vec<EnumOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSchema {
    pub project: ProjectRef,
    /// Sections in display order.
    #[serde(default)]
    pub sections: Vec<SectionRef>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDef>,
}

impl ProjectSchema {
    pub fn new(project: ProjectRef) -> Self {
        Self {
            project,
            sections: Vec::new(),
            custom_fields: Vec::new(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionRef> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn custom_field(&self, name: &str) -> Option<&CustomFieldDef> {
        self.custom_fields.iter().find(|f| f.name == name)
    }
}

/// Where to put an item relative to another one in the same section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "insert", content = "reference", rename_all = "snake_case")]
pub enum Placement {
    Before(ItemId),
    After(ItemId),
}

/// One reorder request: put `item` at `placement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub item: ItemId,
    pub placement: Placement,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.placement {
            Placement::Before(reference) => write!(f, "{} before {}", self.item, reference),
            Placement::After(reference) => write!(f, "{} after {}", self.item, reference),
        }
    }
}
