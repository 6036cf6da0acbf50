//! Domain model (ids, items, project schema, actions, errors, run report).

pub mod action;
pub mod duration;
pub mod errors;
pub mod ids;
pub mod item;
pub mod project;
pub mod report;

pub use action::{Action, Mutation, Resolution};
pub use duration::{DurationParseError, format_duration, parse_duration};
pub use errors::{
    ErrorKind, HandlerError, SchemaError, ServiceError, TriageError, WorkflowError,
};
pub use ids::{FieldId, ItemId, OptionId, ProjectId, RunId, SectionId, StoryId, UserId};
pub use item::{
    CustomField, EnumOption, External, FieldValue, Item, Membership, ProjectRef, SectionRef,
    Story, StoryKind, User,
};
pub use project::{CustomFieldDef, FieldKind, Move, Placement, ProjectSchema};
pub use report::{
    ActionRecord, MoveRecord, Origin, RuleFailure, RunKind, RunReport, RunSummary, SkipReason,
    SkippedAction, SkippedMove, SortWarning, WorkflowNote, WorkflowStatus,
};
