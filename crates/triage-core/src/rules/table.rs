//! RuleTable: ordered (predicate, handler) registrations.

use std::fmt;

use tracing::{debug, warn};

use super::handler::RuleHandler;
use crate::domain::{Action, Item, ItemId, RuleFailure};
use crate::predicates::{BoxPredicate, EvalContext, Predicate};

/// Position of a rule in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{}", self.0)
    }
}

struct Rule {
    id: RuleId,
    label: String,
    predicate: BoxPredicate,
    handler: Box<dyn RuleHandler>,
}

/// An action together with the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleAction {
    pub rule: RuleId,
    pub label: String,
    pub action: Action,
}

/// Actions produced for one item, in rule registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemActions {
    pub item: ItemId,
    pub actions: Vec<RuleAction>,
}

/// Result of applying the table to a batch of items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleMatches {
    /// One entry per item that produced at least one action, in input order.
    pub items: Vec<ItemActions>,
    pub failures: Vec<RuleFailure>,
}

impl RuleMatches {
    pub fn actions_for(&self, item: &ItemId) -> &[RuleAction] {
        self.items
            .iter()
            .find(|entry| &entry.item == item)
            .map(|entry| entry.actions.as_slice())
            .unwrap_or(&[])
    }
}

/// Rules in registration order.
///
/// Every rule is checked against every item; all matching rules contribute
/// (there is no "first match wins").
#[derive(Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P, H>(&mut self, predicate: P, handler: H) -> RuleId
    where
        P: Predicate + 'static,
        H: RuleHandler + 'static,
    {
        let id = RuleId(self.rules.len());
        let label = format!("{id} ({predicate})");
        self.rules.push(Rule {
            id,
            label,
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.label.as_str())
    }

    /// Actions for one item. Handler failures are appended to `failures`.
    pub fn evaluate(
        &self,
        item: &Item,
        ctx: &EvalContext,
        failures: &mut Vec<RuleFailure>,
    ) -> Vec<RuleAction> {
        let mut actions = Vec::new();
        for rule in &self.rules {
            if !rule.predicate.evaluate(item, ctx) {
                continue;
            }
            match rule.handler.handle(item) {
                Ok(produced) => {
                    debug!(item = %item.id, rule = %rule.label, count = produced.len(), "rule matched");
                    actions.extend(produced.into_iter().map(|action| RuleAction {
                        rule: rule.id,
                        label: rule.label.clone(),
                        action,
                    }));
                }
                Err(err) => {
                    warn!(item = %item.id, rule = %rule.label, error = %err, "rule handler failed");
                    failures.push(RuleFailure {
                        item: item.id.clone(),
                        rule: rule.id.index(),
                        label: rule.label.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        actions
    }

    pub fn apply(&self, items: &[Item], ctx: &EvalContext) -> RuleMatches {
        let mut matches = RuleMatches::default();
        for item in items {
            let actions = self.evaluate(item, ctx, &mut matches.failures);
            if !actions.is_empty() {
                matches.items.push(ItemActions {
                    item: item.id.clone(),
                    actions,
                });
            }
        }
        matches
    }
}
