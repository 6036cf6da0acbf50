//! Workflow state machine.
//!
//! A workflow is an ordered list of stages. Each run, an item's target stage
//! is the highest-index stage whose entry predicate holds; stages in between
//! need not hold. Items only move forward:
//!
//! ```text
//!   current  target      decision
//!   -------  ----------  -----------------------------------------
//!   any      none        Undetermined (warn, leave the item alone)
//!   s        s           Unchanged (on-enter actions do not refire)
//!   s        t < s       Held (never moved backwards)
//!   s/None   t > s       Advance: write t, then t's on-enter actions
//! ```
//!
//! Where the current stage lives is a [`StageStore`] strategy: a section of a
//! project, an enum custom field, or the item's external data.

pub mod enum_field;
pub mod external;
pub mod section;
pub mod stage;
pub mod store;

pub use enum_field::EnumFieldStore;
pub use external::ExternalStore;
pub use section::SectionStore;
pub use stage::WorkflowStage;
pub use store::{StageStore, UnreadableStage};

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Action, Item, ProjectSchema, WorkflowError};
use crate::predicates::{EvalContext, Predicate};

/// What the workflow wants to do with one item this run.
#[derive(Debug, Clone, PartialEq)]
pub enum StageDecision {
    Unchanged,
    Advance {
        from: Option<String>,
        to: String,
        /// Records the new stage; dispatched first.
        write: Action,
        /// Dispatched only if `write` succeeds.
        on_enter: Vec<Action>,
    },
    Undetermined {
        current: Option<String>,
    },
    Unreadable {
        reason: UnreadableStage,
    },
    Held {
        current: String,
        target: String,
    },
}

pub struct Workflow {
    name: String,
    stages: Vec<WorkflowStage>,
    store: Arc<dyn StageStore>,
}

impl Workflow {
    /// Fails when `stages` is empty or names a stage twice.
    pub fn new(
        name: impl Into<String>,
        stages: Vec<WorkflowStage>,
        store: impl StageStore + 'static,
    ) -> Result<Self, WorkflowError> {
        let name = name.into();
        if stages.is_empty() {
            return Err(WorkflowError::NoStages { workflow: name });
        }
        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.name()) {
                return Err(WorkflowError::DuplicateStage {
                    workflow: name,
                    stage: stage.name().to_string(),
                });
            }
        }
        Ok(Self {
            name,
            stages,
            store: Arc::new(store),
        })
    }

    /// Stages are the sections (same names) of `project`.
    pub fn sections(
        project: impl Into<String>,
        stages: Vec<WorkflowStage>,
    ) -> Result<Self, WorkflowError> {
        let project = project.into();
        Self::new(project.clone(), stages, SectionStore::new(project))
    }

    /// Stages are the options (same names) of the enum custom field `field`.
    pub fn enum_field(
        field: impl Into<String>,
        stages: Vec<WorkflowStage>,
    ) -> Result<Self, WorkflowError> {
        let field = field.into();
        Self::new(field.clone(), stages, EnumFieldStore::new(field))
    }

    /// Stages are recorded in external data under this workflow's name.
    pub fn external(
        name: impl Into<String>,
        stages: Vec<WorkflowStage>,
    ) -> Result<Self, WorkflowError> {
        let name = name.into();
        Self::new(name.clone(), stages, ExternalStore::new(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[WorkflowStage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn store(&self) -> &dyn StageStore {
        self.store.as_ref()
    }

    /// Check the store can hold every stage in this project.
    pub fn validate(&self, schema: &ProjectSchema) -> Result<(), String> {
        self.store.validate(schema, &self.stage_names())
    }

    /// Index of the item's current stage; `Ok(None)` before the first stage.
    pub fn current_stage(&self, item: &Item) -> Result<Option<usize>, UnreadableStage> {
        match self.store.read_stage(item)? {
            None => Ok(None),
            Some(name) => self
                .stages
                .iter()
                .position(|s| s.name() == name)
                .map(Some)
                .ok_or(UnreadableStage::UnknownStage { stage: name }),
        }
    }

    pub fn decide(&self, item: &Item, ctx: &EvalContext) -> StageDecision {
        let current = match self.current_stage(item) {
            Ok(current) => current,
            Err(reason) => return StageDecision::Unreadable { reason },
        };
        let current_name = current.map(|i| self.stages[i].name().to_string());

        let Some(target) = self
            .stages
            .iter()
            .rposition(|s| s.to_enter().evaluate(item, ctx))
        else {
            return StageDecision::Undetermined {
                current: current_name,
            };
        };
        let target_stage = &self.stages[target];

        match current {
            Some(c) if c == target => StageDecision::Unchanged,
            Some(c) if target < c => {
                debug!(
                    workflow = %self.name,
                    item = %item.id,
                    current = %self.stages[c].name(),
                    target = %target_stage.name(),
                    "stage held"
                );
                StageDecision::Held {
                    current: self.stages[c].name().to_string(),
                    target: target_stage.name().to_string(),
                }
            }
            _ => StageDecision::Advance {
                from: current_name,
                to: target_stage.name().to_string(),
                write: self.store.write_stage(item, target_stage.name()),
                on_enter: target_stage.on_enter_actions().to_vec(),
            },
        }
    }

    /// Predicate: the item has not entered any stage of this workflow yet.
    pub fn unstaged(&self) -> Unstaged {
        Unstaged {
            workflow: self.name.clone(),
            store: self.store.clone(),
        }
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("store", &self.store.describe())
            .field("stages", &self.stages)
            .finish()
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Workflow({})", self.name)
    }
}

/// See [`Workflow::unstaged`].
pub struct Unstaged {
    workflow: String,
    store: Arc<dyn StageStore>,
}

impl Predicate for Unstaged {
    fn evaluate(&self, item: &Item, _: &EvalContext) -> bool {
        matches!(self.store.read_stage(item), Ok(None))
    }
}

impl fmt::Display for Unstaged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unstaged({})", self.workflow)
    }
}
