//! Workflow stages.

use std::fmt;

use crate::domain::Action;
use crate::predicates::{BoxPredicate, Predicate};

/// One step of a workflow: the condition to be in it and what to do on arrival.
pub struct WorkflowStage {
    name: String,
    to_enter: BoxPredicate,
    on_enter: Vec<Action>,
}

impl WorkflowStage {
    pub fn new(name: impl Into<String>, to_enter: impl Predicate + 'static) -> Self {
        Self {
            name: name.into(),
            to_enter: Box::new(to_enter),
            on_enter: Vec::new(),
        }
    }

    /// Actions dispatched once, when an item advances into this stage.
    pub fn on_enter(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.on_enter.extend(actions);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_enter(&self) -> &dyn Predicate {
        self.to_enter.as_ref()
    }

    pub fn on_enter_actions(&self) -> &[Action] {
        &self.on_enter
    }
}

impl fmt::Debug for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStage")
            .field("name", &self.name)
            .field("to_enter", &self.to_enter.to_string())
            .field("on_enter", &self.on_enter)
            .finish()
    }
}
