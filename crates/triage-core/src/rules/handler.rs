//! Rule handlers: turn a matching item into actions.
//!
//! Closures work directly:
//! ```ignore
//! table.register(Overdue, |item: &Item| Ok(vec![Action::add_comment(format!("{} is late", item.name))]));
//! ```
//! Handlers that always return the same actions can use [`StaticActions`].

use crate::domain::{Action, HandlerError, Item};

/// Produces the ordered actions for one item that matched the rule's predicate.
///
/// A handler error only affects this (item, rule) pair; the rest of the run continues.
pub trait RuleHandler: Send + Sync {
    fn handle(&self, item: &Item) -> Result<Vec<Action>, HandlerError>;
}

impl<F> RuleHandler for F
where
    F: Fn(&Item) -> Result<Vec<Action>, HandlerError> + Send + Sync,
{
    fn handle(&self, item: &Item) -> Result<Vec<Action>, HandlerError> {
        self(item)
    }
}

/// Fixed list of actions, cloned for every matching item.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticActions(Vec<Action>);

impl StaticActions {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self(actions.into_iter().collect())
    }
}

impl From<Action> for StaticActions {
    fn from(action: Action) -> Self {
        Self(vec![action])
    }
}

impl RuleHandler for StaticActions {
    fn handle(&self, _: &Item) -> Result<Vec<Action>, HandlerError> {
        Ok(self.0.clone())
    }
}
