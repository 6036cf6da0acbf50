//! Action dispatch: resolve, then apply (or plan), and record the outcome.
//!
//! Outcome per action:
//! - schema error -> skipped, run continues
//! - already satisfied -> unchanged, nothing sent
//! - dry run -> planned, nothing sent
//! - service accepted -> applied
//! - service rejected (permanent / schema) -> skipped, run continues
//! - transient service failure -> the run stops with `TriageError::Dispatch`

use tracing::{debug, warn};

use crate::domain::{
    Action, ActionRecord, Item, Origin, ProjectSchema, Resolution, RunReport, SkipReason,
    SkippedAction, TriageError,
};
use crate::ports::MutationService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatched {
    Applied,
    Planned,
    Unchanged,
    Skipped,
}

impl Dispatched {
    /// The desired state holds (or would hold, in a dry run).
    pub(crate) fn succeeded(self) -> bool {
        !matches!(self, Dispatched::Skipped)
    }
}

pub(crate) struct Dispatcher<'a> {
    mutations: &'a dyn MutationService,
    schema: &'a ProjectSchema,
    dry_run: bool,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(
        mutations: &'a dyn MutationService,
        schema: &'a ProjectSchema,
        dry_run: bool,
    ) -> Self {
        Self {
            mutations,
            schema,
            dry_run,
        }
    }

    pub(crate) async fn dispatch(
        &self,
        item: &Item,
        action: Action,
        origin: Origin,
        report: &mut RunReport,
    ) -> Result<Dispatched, TriageError> {
        let mutation = match action.resolve(item, self.schema) {
            Ok(Resolution::Apply(mutation)) => mutation,
            Ok(Resolution::AlreadySatisfied) => {
                debug!(item = %item.id, %action, "already satisfied");
                report.unchanged.push(ActionRecord {
                    item: item.id.clone(),
                    action,
                    origin,
                });
                return Ok(Dispatched::Unchanged);
            }
            Err(error) => {
                warn!(item = %item.id, %action, %error, "action skipped");
                report.skipped.push(SkippedAction {
                    item: item.id.clone(),
                    action,
                    origin,
                    reason: SkipReason::Schema { error },
                });
                return Ok(Dispatched::Skipped);
            }
        };

        if self.dry_run {
            debug!(item = %item.id, %action, "planned (dry run)");
            report.planned.push(ActionRecord {
                item: item.id.clone(),
                action,
                origin,
            });
            return Ok(Dispatched::Planned);
        }

        match self.mutations.apply(&item.id, &mutation).await {
            Ok(()) => {
                debug!(item = %item.id, %action, "applied");
                report.applied.push(ActionRecord {
                    item: item.id.clone(),
                    action,
                    origin,
                });
                Ok(Dispatched::Applied)
            }
            Err(source) if source.kind().is_transient() => Err(TriageError::Dispatch {
                item: item.id.to_string(),
                source,
            }),
            Err(error) => {
                warn!(item = %item.id, %action, %error, "service rejected action");
                report.skipped.push(SkippedAction {
                    item: item.id.clone(),
                    action,
                    origin,
                    reason: SkipReason::Service {
                        kind: error.kind(),
                        message: error.message().to_string(),
                    },
                });
                Ok(Dispatched::Skipped)
            }
        }
    }

    /// Record actions dropped because the stage write before them failed.
    pub(crate) fn abandon(
        &self,
        item: &Item,
        actions: Vec<Action>,
        origin: Origin,
        report: &mut RunReport,
    ) {
        for action in actions {
            report.skipped.push(SkippedAction {
                item: item.id.clone(),
                action,
                origin: origin.clone(),
                reason: SkipReason::TransitionAbandoned,
            });
        }
    }
}
