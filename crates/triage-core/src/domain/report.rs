//! Run report: what one `triage()` or `sort()` run did, and what it did not.
//!
//! The engine prefers finishing a run over aborting it, so most problems are
//! recorded here instead of being returned as errors. Everything is
//! serializable so a run can be explained after the fact ("what moved and why").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::errors::{ErrorKind, SchemaError};
use super::ids::{ItemId, RunId};
use super::project::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Triage,
    Sort,
}

/// Which part of the configuration produced an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Origin {
    Rule {
        rule: usize,
        label: String,
    },
    Workflow {
        workflow: String,
        stage: String,
        /// `false` for the stage write itself, `true` for the stage's on-enter actions.
        on_enter: bool,
    },
}

impl Origin {
    pub fn is_on_enter(&self) -> bool {
        matches!(self, Origin::Workflow { on_enter: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub item: ItemId,
    pub action: Action,
    pub origin: Origin,
}

/// Why an action (or a move) was not applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The action names something the snapshot does not have.
    Schema { error: SchemaError },
    /// The service rejected the request.
    Service { kind: ErrorKind, message: String },
    /// The workflow stage write failed, so the stage's on-enter actions were dropped.
    TransitionAbandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub item: ItemId,
    pub action: Action,
    pub origin: Origin,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A rule handler failed for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub item: ItemId,
    pub rule: usize,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// The item moved to a new stage.
    Advanced { from: Option<String>, to: String },
    /// No stage predicate holds; the item was left where it was.
    Undetermined { current: Option<String> },
    /// The current stage could not be read from the item.
    Unreadable { reason: String },
    /// The highest satisfied stage is behind the current one; stages never move back.
    Held { current: String, target: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNote {
    pub workflow: String,
    pub item: ItemId,
    #[serde(flatten)]
    pub status: WorkflowStatus,
}

/// Non-fatal observation made while sorting (e.g. an unrecognized enum value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortWarning {
    pub section: String,
    pub item: ItemId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub section: String,
    #[serde(flatten)]
    pub mv: Move,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMove {
    pub section: String,
    #[serde(flatten)]
    pub mv: Move,
    pub kind: ErrorKind,
    pub message: String,
}

/// Counters for the end-of-run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub applied: usize,
    pub planned: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub rule_failures: usize,
    pub transitions: usize,
    pub workflow_warnings: usize,
    pub moves: usize,
    pub skipped_moves: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,

    /// Actions sent to the service and accepted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<ActionRecord>,

    /// Actions that would have been sent (dry run only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<ActionRecord>,

    /// Actions whose desired state already held; nothing was sent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unchanged: Vec<ActionRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_failures: Vec<RuleFailure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowNote>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_warnings: Vec<SortWarning>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<MoveRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_moves: Vec<SkippedMove>,
}

impl RunReport {
    pub fn new(run_id: RunId, kind: RunKind, started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_id,
            kind,
            started_at,
            dry_run,
            applied: Vec::new(),
            planned: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
            rule_failures: Vec::new(),
            workflow: Vec::new(),
            sort_warnings: Vec::new(),
            moves: Vec::new(),
            skipped_moves: Vec::new(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let transitions = self
            .workflow
            .iter()
            .filter(|n| matches!(n.status, WorkflowStatus::Advanced { .. }))
            .count();
        RunSummary {
            applied: self.applied.len(),
            planned: self.planned.len(),
            unchanged: self.unchanged.len(),
            skipped: self.skipped.len(),
            rule_failures: self.rule_failures.len(),
            transitions,
            workflow_warnings: self.workflow.len() - transitions,
            moves: self.moves.len(),
            skipped_moves: self.skipped_moves.len(),
        }
    }

    /// Applied (or planned, in a dry run) actions for one item, in dispatch order.
    pub fn actions_for(&self, item: &ItemId) -> Vec<&ActionRecord> {
        let issued = if self.dry_run { &self.planned } else { &self.applied };
        issued.iter().filter(|r| &r.item == item).collect()
    }

    /// Nothing was skipped, failed or left undetermined.
    pub fn is_clean(&self) -> bool {
        let summary = self.summary();
        summary.skipped == 0
            && summary.rule_failures == 0
            && summary.workflow_warnings == 0
            && summary.skipped_moves == 0
            && self.sort_warnings.is_empty()
    }
}
