//! Where a workflow keeps each item's current stage.

use crate::domain::{Action, Item, ProjectSchema};

/// Why the current stage of an item could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnreadableStage {
    #[error("item is not in project '{project}'")]
    NotInProject { project: String },

    #[error("item has no custom field '{field}'")]
    MissingField { field: String },

    #[error("custom field '{field}' is not an enum field")]
    NotAnEnumField { field: String },

    #[error("stage '{stage}' is not part of the workflow")]
    UnknownStage { stage: String },

    #[error("external data is malformed: {0}")]
    MalformedExternal(String),
}

/// Reads and writes the stage an item is in.
///
/// Implementations only translate between a stage name and the item; the
/// decision of which stage an item belongs in lives in the workflow.
pub trait StageStore: Send + Sync {
    /// `Ok(None)` when the item has not entered any stage yet.
    fn read_stage(&self, item: &Item) -> Result<Option<String>, UnreadableStage>;

    /// The action that records `stage` as the item's current stage.
    fn write_stage(&self, item: &Item, stage: &str) -> Action;

    /// Check that every stage can be stored in this project. Returns the reason on failure.
    fn validate(&self, schema: &ProjectSchema, stages: &[&str]) -> Result<(), String>;

    /// Short description for logs, e.g. `section(Bugs)`.
    fn describe(&self) -> String;
}
