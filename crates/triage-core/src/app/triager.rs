//! Triager: one `triage()` or `sort()` pass over a project.
//!
//! # triage()
//! 1. capture `now` and the acting user into an [`EvalContext`]
//! 2. fetch the schema and the items (the snapshot for the whole pass)
//! 3. drop completed (if configured) and ignored items
//! 4. decide every workflow transition and rule action against the snapshot
//! 5. dispatch item by item: workflow transitions first, then rule actions
//!
//! # sort()
//! For each registered section: list, stable-sort, plan the minimal moves and
//! issue one reorder per move.

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use crate::domain::{
    Action, Item, ItemId, MoveRecord, Origin, ProjectSchema, RunId, RunKind, RunReport,
    SectionRef, SkippedMove, SortWarning, TriageError, User, WorkflowNote, WorkflowStatus,
};
use crate::ports::{Clock, IdGenerator};
use crate::predicates::{BoxPredicate, EvalContext, Predicate};
use crate::rules::{RuleAction, RuleTable};
use crate::sorters::{BoxSorter, Sorter, plan_moves};
use crate::workflow::{StageDecision, Workflow};

use super::builder::{Collaborators, TriagerBuilder};
use super::config::TriagerConfig;
use super::dispatch::Dispatcher;

pub(crate) struct SortTarget {
    pub(crate) section: SectionRef,
    pub(crate) sorter: BoxSorter,
}

/// Everything decided for one item before anything is sent.
struct ItemPlan<'a> {
    item: &'a Item,
    transitions: Vec<(&'a Workflow, StageDecision)>,
    rules: Vec<RuleAction>,
}

pub struct Triager {
    pub(crate) config: TriagerConfig,
    pub(crate) collaborators: Collaborators,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Box<dyn IdGenerator>,
    /// Schema as of `build()`; runs refetch their own.
    pub(crate) schema: ProjectSchema,
    pub(crate) actor: User,
    pub(crate) ignores: Vec<BoxPredicate>,
    pub(crate) rules: RuleTable,
    pub(crate) orders: Vec<SortTarget>,
    pub(crate) workflows: Vec<Workflow>,
}

impl Triager {
    pub fn builder(
        config: TriagerConfig,
        collaborators: Collaborators,
        clock: impl Clock + 'static,
    ) -> TriagerBuilder {
        TriagerBuilder::new(config, collaborators, Arc::new(clock))
    }

    pub fn config(&self) -> &TriagerConfig {
        &self.config
    }

    pub fn actor(&self) -> &User {
        &self.actor
    }

    pub fn rule_labels(&self) -> impl Iterator<Item = &str> {
        self.rules.labels()
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    /// Sections with a sorter, in registration order.
    pub fn sorted_sections(&self) -> impl Iterator<Item = &str> {
        self.orders.iter().map(|t| t.section.name.as_str())
    }

    pub async fn triage(&self) -> Result<RunReport, TriageError> {
        let run_id = self.ids.generate_run_id();
        let span = info_span!("triage", %run_id, project = %self.config.project);
        self.run_triage(run_id).instrument(span).await
    }

    pub async fn sort(&self) -> Result<RunReport, TriageError> {
        let run_id = self.ids.generate_run_id();
        let span = info_span!("sort", %run_id, project = %self.config.project);
        self.run_sort(run_id).instrument(span).await
    }

    async fn run_triage(&self, run_id: RunId) -> Result<RunReport, TriageError> {
        let now = self.clock.now();
        let ctx = EvalContext::new(now, self.config.timezone_offset).with_actor(self.actor.clone());
        let mut report = RunReport::new(run_id, RunKind::Triage, now, self.config.dry_run);
        info!(
            dry_run = self.config.dry_run,
            rules = self.rules.len(),
            workflows = self.workflows.len(),
            "triage started"
        );

        let schema = self
            .collaborators
            .catalog
            .project(&self.config.project)
            .await
            .map_err(|source| TriageError::Fetch {
                what: "project schema",
                source,
            })?;
        let items = self
            .collaborators
            .source
            .fetch_items(&schema.project.id)
            .await
            .map_err(|source| TriageError::Fetch {
                what: "items",
                source,
            })?;
        let fetched = items.len();
        let items: Vec<Item> = items
            .into_iter()
            .filter(|item| self.in_scope(item) && !self.is_ignored(item, &ctx))
            .collect();
        debug!(fetched, eligible = items.len(), "snapshot taken");

        let mut plans = Vec::with_capacity(items.len());
        for item in &items {
            let transitions = self
                .workflows
                .iter()
                .map(|workflow| (workflow, workflow.decide(item, &ctx)))
                .collect();
            let rules = self.rules.evaluate(item, &ctx, &mut report.rule_failures);
            plans.push(ItemPlan {
                item,
                transitions,
                rules,
            });
        }

        let dispatcher = Dispatcher::new(
            self.collaborators.mutations.as_ref(),
            &schema,
            self.config.dry_run,
        );
        for plan in plans {
            // Stage writes land on this copy so later writes build on earlier ones.
            let mut working = plan.item.clone();
            for (workflow, decision) in plan.transitions {
                transition(&dispatcher, &mut working, workflow, decision, &mut report).await?;
            }
            for RuleAction { rule, label, action } in plan.rules {
                let origin = Origin::Rule {
                    rule: rule.index(),
                    label,
                };
                dispatcher.dispatch(&working, action, origin, &mut report).await?;
            }
        }

        let summary = report.summary();
        info!(
            applied = summary.applied,
            planned = summary.planned,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            rule_failures = summary.rule_failures,
            transitions = summary.transitions,
            workflow_warnings = summary.workflow_warnings,
            "triage finished"
        );
        Ok(report)
    }

    async fn run_sort(&self, run_id: RunId) -> Result<RunReport, TriageError> {
        let now = self.clock.now();
        let mut report = RunReport::new(run_id, RunKind::Sort, now, self.config.dry_run);
        info!(sections = self.orders.len(), dry_run = self.config.dry_run, "sort started");

        for target in &self.orders {
            let section = &target.section.name;
            let items: Vec<Item> = self
                .collaborators
                .grouping
                .list_items(&target.section.id)
                .await
                .map_err(|source| TriageError::Fetch {
                    what: "section items",
                    source,
                })?
                .into_iter()
                .filter(|item| self.in_scope(item))
                .collect();

            for item in &items {
                for message in target.sorter.audit(item) {
                    warn!(%section, item = %item.id, %message, "sort warning");
                    report.sort_warnings.push(SortWarning {
                        section: section.clone(),
                        item: item.id.clone(),
                        message,
                    });
                }
            }

            let current: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
            let wanted: Vec<ItemId> = target.sorter.sort(items).into_iter().map(|i| i.id).collect();
            let moves = plan_moves(&current, &wanted);
            debug!(%section, sorter = %target.sorter, items = current.len(), moves = moves.len(), "reorder planned");

            for mv in moves {
                if self.config.dry_run {
                    report.moves.push(MoveRecord {
                        section: section.clone(),
                        mv,
                    });
                    continue;
                }
                match self
                    .collaborators
                    .grouping
                    .reorder(&self.schema.project.id, &mv.item, &mv.placement)
                    .await
                {
                    Ok(()) => {
                        debug!(%section, %mv, "moved");
                        report.moves.push(MoveRecord {
                            section: section.clone(),
                            mv,
                        });
                    }
                    Err(source) if source.kind().is_transient() => {
                        return Err(TriageError::Dispatch {
                            item: mv.item.to_string(),
                            source,
                        });
                    }
                    Err(error) => {
                        warn!(%section, %mv, %error, "reorder rejected");
                        report.skipped_moves.push(SkippedMove {
                            section: section.clone(),
                            mv,
                            kind: error.kind(),
                            message: error.message().to_string(),
                        });
                    }
                }
            }
        }

        let summary = report.summary();
        info!(
            moves = summary.moves,
            skipped_moves = summary.skipped_moves,
            warnings = report.sort_warnings.len(),
            "sort finished"
        );
        Ok(report)
    }

    fn in_scope(&self, item: &Item) -> bool {
        !(self.config.only_incomplete && item.completed)
    }

    fn is_ignored(&self, item: &Item, ctx: &EvalContext) -> bool {
        match self.ignores.iter().find(|p| p.evaluate(item, ctx)) {
            Some(predicate) => {
                debug!(item = %item.id, ignore = %predicate, "item ignored");
                true
            }
            None => false,
        }
    }
}

/// Dispatch one workflow decision and record its note.
///
/// A successful stage write is folded into `item`, so the next workflow's
/// write sees it. External-data stores rely on this: their write replaces the
/// whole blob.
async fn transition(
    dispatcher: &Dispatcher<'_>,
    item: &mut Item,
    workflow: &Workflow,
    decision: StageDecision,
    report: &mut RunReport,
) -> Result<(), TriageError> {
    let name = workflow.name();
    let status = match decision {
        StageDecision::Unchanged => return Ok(()),
        StageDecision::Advance {
            from,
            to,
            write: _,
            on_enter,
        } => {
            let stage_origin = |on_enter| Origin::Workflow {
                workflow: name.to_string(),
                stage: to.clone(),
                on_enter,
            };
            let write = workflow.store().write_stage(item, &to);
            let written = dispatcher
                .dispatch(item, write.clone(), stage_origin(false), report)
                .await?;
            if !written.succeeded() {
                warn!(workflow = %name, item = %item.id, stage = %to, "stage write failed; on-enter actions dropped");
                dispatcher.abandon(item, on_enter, stage_origin(true), report);
                return Ok(());
            }
            if let Action::SetExternal { external } = write {
                item.external = Some(external);
            }
            debug!(workflow = %name, item = %item.id, from = ?from, %to, "stage advanced");
            let origin = stage_origin(true);
            for action in on_enter {
                dispatcher.dispatch(item, action, origin.clone(), report).await?;
            }
            WorkflowStatus::Advanced { from, to }
        }
        StageDecision::Undetermined { current } => {
            warn!(workflow = %name, item = %item.id, current = ?current, "no stage applies");
            WorkflowStatus::Undetermined { current }
        }
        StageDecision::Unreadable { reason } => {
            warn!(workflow = %name, item = %item.id, %reason, "stage unreadable");
            WorkflowStatus::Unreadable {
                reason: reason.to_string(),
            }
        }
        StageDecision::Held { current, target } => WorkflowStatus::Held { current, target },
    };
    report.workflow.push(WorkflowNote {
        workflow: name.to_string(),
        item: item.id.clone(),
        status,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::BuildError;
    use crate::domain::{
        Action, ErrorKind, External, FieldValue, HandlerError, Mutation, SchemaError,
        ServiceError, SkipReason,
    };
    use crate::impls::memory::InMemoryProject;
    use crate::impls::memory::fixture::{ada, item, project};
    use crate::ports::FixedClock;
    use crate::predicates::testing::at;
    use crate::predicates::{AlwaysTrue, Assigned, FnPredicate, IsComplete};
    use crate::rules::StaticActions;
    use crate::sorters::EnumCustomFieldSorter;
    use crate::workflow::WorkflowStage;
    use serde_json::json;

    fn config() -> TriagerConfig {
        TriagerConfig::new("Bugs")
    }

    fn builder(project: &Arc<InMemoryProject>, config: TriagerConfig) -> TriagerBuilder {
        Triager::builder(
            config,
            Collaborators::from_shared(project.clone()),
            FixedClock::new(at()),
        )
    }

    fn bug_workflow() -> Workflow {
        Workflow::external(
            "bugs",
            vec![
                WorkflowStage::new("Inbox", AlwaysTrue),
                WorkflowStage::new("InProgress", Assigned::new())
                    .on_enter([Action::add_comment("started")]),
                WorkflowStage::new("Done", IsComplete).on_enter([Action::add_comment("done")]),
            ],
        )
        .unwrap()
    }

    fn comment(text: &str) -> Action {
        Action::add_comment(text)
    }

    fn issued(report: &RunReport) -> Vec<(String, String)> {
        let records = if report.dry_run { &report.planned } else { &report.applied };
        records
            .iter()
            .map(|r| (r.item.as_str().to_string(), r.action.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn workflow_enters_highest_stage_once() {
        let mut done = item("1", None);
        done.assignee = Some(ada());
        done.completed = true;
        let project = project(vec![done]);
        let triager = builder(&project, config().with_only_incomplete(false))
            .apply(bug_workflow())
            .build()
            .await
            .unwrap();

        let first = triager.triage().await.unwrap();

        assert_eq!(
            issued(&first),
            vec![
                ("1".to_string(), "SetExternal".to_string()),
                ("1".to_string(), "AddComment(done)".to_string()),
            ]
        );
        assert_eq!(
            first.workflow[0].status,
            WorkflowStatus::Advanced {
                from: None,
                to: "Done".to_string()
            }
        );
        assert!(first.applied[1].origin.is_on_enter());

        let second = triager.triage().await.unwrap();

        assert!(second.applied.is_empty());
        assert!(second.workflow.is_empty());
        let comments = project
            .mutations()
            .await
            .into_iter()
            .filter(|m| matches!(m.mutation, Mutation::AddComment { .. }))
            .count();
        assert_eq!(comments, 1);
    }

    #[tokio::test]
    async fn rules_concatenate_and_failures_stay_per_rule() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::from(comment("a")))
            .when(AlwaysTrue, |_: &Item| -> Result<Vec<Action>, HandlerError> {
                Err(HandlerError::new("boom"))
            })
            .when(AlwaysTrue, StaticActions::new([comment("b"), comment("c")]))
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        let texts: Vec<String> = issued(&report).into_iter().map(|(_, a)| a).collect();
        assert_eq!(texts, vec!["AddComment(a)", "AddComment(b)", "AddComment(c)"]);
        assert_eq!(report.rule_failures.len(), 1);
        assert_eq!(report.rule_failures[0].rule, 1);
        assert_eq!(report.rule_failures[0].message, "boom");
    }

    #[tokio::test]
    async fn dispatch_is_item_major_with_workflows_first() {
        let project = project(vec![item("1", None), item("2", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::from(comment("rule")))
            .apply(
                Workflow::external("w", vec![WorkflowStage::new("Inbox", AlwaysTrue).on_enter([comment("enter")])])
                    .unwrap(),
            )
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        let order: Vec<(String, String)> = issued(&report);
        let expected: Vec<(String, String)> = ["1", "2"]
            .iter()
            .flat_map(|id| {
                ["SetExternal", "AddComment(enter)", "AddComment(rule)"]
                    .iter()
                    .map(move |a| (id.to_string(), a.to_string()))
            })
            .collect();
        assert_eq!(order, expected);
    }

    #[tokio::test]
    async fn ignored_and_completed_items_are_left_alone() {
        let mut skip = item("skip", None);
        skip.name = "skip me".to_string();
        let mut finished = item("done", None);
        finished.completed = true;
        let project = project(vec![skip, finished, item("1", None)]);
        let triager = builder(&project, config())
            .ignore(FnPredicate::new("named 'skip me'", |item: &Item, _: &EvalContext| {
                item.name == "skip me"
            }))
            .when(AlwaysTrue, StaticActions::from(comment("hi")))
            .apply(bug_workflow())
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert!(report.actions_for(&"skip".into()).is_empty());
        assert!(report.actions_for(&"done".into()).is_empty());
        assert_eq!(report.actions_for(&"1".into()).len(), 2);
    }

    #[tokio::test]
    async fn dry_run_plans_without_sending() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config().with_dry_run(true))
            .when(AlwaysTrue, StaticActions::from(comment("hi")))
            .apply(bug_workflow())
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert!(report.applied.is_empty());
        assert_eq!(report.planned.len(), 2);
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn satisfied_actions_are_not_sent() {
        let project = project(vec![item("1", Some("High"))]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::from(Action::set_enum_field("Priority", "High")))
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert_eq!(report.unchanged.len(), 1);
        assert!(report.applied.is_empty());
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn schema_errors_skip_one_action() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::new([
                Action::set_enum_field("Priority", "Urgent"),
                Action::set_enum_field("Priority", "Low"),
            ]))
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Schema {
                error: SchemaError::UnknownOption {
                    field: "Priority".to_string(),
                    option: "Urgent".to_string(),
                }
            }
        );
    }

    #[tokio::test]
    async fn permanent_failures_skip_and_continue() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::new([comment("a"), comment("b")]))
            .build()
            .await
            .unwrap();
        project.fail_next_write(ServiceError::permanent("forbidden")).await;

        let report = triager.triage().await.unwrap();

        assert_eq!(issued(&report), vec![("1".to_string(), "AddComment(b)".to_string())]);
        assert_eq!(report.skipped[0].action, comment("a"));
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Service {
                kind: ErrorKind::Permanent,
                message: "forbidden".to_string(),
            }
        );
        assert_eq!(project.mutations().await.len(), 1);
    }

    #[tokio::test]
    async fn transient_failures_abort_the_run() {
        let project = project(vec![item("1", None), item("2", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::from(comment("a")))
            .build()
            .await
            .unwrap();
        project.fail_next_write(ServiceError::transient("timeout")).await;

        let err = triager.triage().await.unwrap_err();

        assert!(matches!(&err, TriageError::Dispatch { item, .. } if item == "Item(1)"));
        assert_eq!(err.service_error().kind(), ErrorKind::Transient);
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn fetch_failures_abort_before_dispatch() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config())
            .when(AlwaysTrue, StaticActions::from(comment("a")))
            .build()
            .await
            .unwrap();
        project.fail_next_read(ServiceError::permanent("gone")).await;

        let err = triager.triage().await.unwrap_err();

        assert!(matches!(err, TriageError::Fetch { what: "project schema", .. }));
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn failed_stage_write_abandons_on_enter_actions() {
        // The item's copy of Priority lacks "High", so the stage write cannot resolve.
        let mut assigned = item("1", None);
        assigned.assignee = Some(ada());
        if let FieldValue::Enum { options, .. } = &mut assigned.custom_fields[0].value {
            options.retain(|o| o.name != "High");
        }
        let project = project(vec![assigned]);
        let triager = builder(&project, config())
            .apply(
                Workflow::enum_field(
                    "Priority",
                    vec![
                        WorkflowStage::new("Low", AlwaysTrue),
                        WorkflowStage::new("High", Assigned::new()).on_enter([comment("escalated")]),
                    ],
                )
                .unwrap(),
            )
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert!(matches!(report.skipped[0].reason, SkipReason::Schema { .. }));
        assert_eq!(report.skipped[1].reason, SkipReason::TransitionAbandoned);
        assert_eq!(report.skipped[1].action, comment("escalated"));
        assert!(report.workflow.is_empty());
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn external_workflows_keep_each_others_stage() {
        let project = project(vec![item("1", None)]);
        let triager = builder(&project, config())
            .apply(
                Workflow::external(
                    "a",
                    vec![WorkflowStage::new("A1", AlwaysTrue).on_enter([comment("entered a")])],
                )
                .unwrap(),
            )
            .apply(Workflow::external("b", vec![WorkflowStage::new("B1", AlwaysTrue)]).unwrap())
            .build()
            .await
            .unwrap();

        let first = triager.triage().await.unwrap();
        assert_eq!(first.workflow.len(), 2);

        let stored = project.item(&"1".into()).await.unwrap().external.unwrap();
        assert_eq!(
            serde_json::Value::Object(stored.data),
            json!({"workflows": {"a": "A1", "b": "B1"}})
        );

        let second = triager.triage().await.unwrap();

        assert!(second.applied.is_empty());
        assert!(second.workflow.is_empty());
        let comments = project
            .mutations()
            .await
            .into_iter()
            .filter(|m| matches!(m.mutation, Mutation::AddComment { .. }))
            .count();
        assert_eq!(comments, 1);
    }

    #[tokio::test]
    async fn stuck_workflows_are_noted_without_writes() {
        let mut stuck = item("1", None);
        stuck.external = Some(External {
            gid: None,
            data: json!({"workflows": {"held": "Done", "broken": 7}})
                .as_object()
                .cloned()
                .unwrap(),
        });
        let project = project(vec![stuck]);
        let triager = builder(&project, config())
            .apply(Workflow::external("waiting", vec![WorkflowStage::new("Done", IsComplete)]).unwrap())
            .apply(Workflow::external("broken", vec![WorkflowStage::new("Inbox", AlwaysTrue)]).unwrap())
            .apply(
                Workflow::external(
                    "held",
                    vec![
                        WorkflowStage::new("Inbox", AlwaysTrue),
                        WorkflowStage::new("Done", IsComplete).on_enter([comment("done")]),
                    ],
                )
                .unwrap(),
            )
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        let notes: Vec<(&str, &WorkflowStatus)> = report
            .workflow
            .iter()
            .map(|n| (n.workflow.as_str(), &n.status))
            .collect();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], ("waiting", &WorkflowStatus::Undetermined { current: None }));
        assert_eq!(notes[1].0, "broken");
        assert!(matches!(notes[1].1, WorkflowStatus::Unreadable { .. }));
        assert_eq!(
            notes[2],
            (
                "held",
                &WorkflowStatus::Held {
                    current: "Done".to_string(),
                    target: "Inbox".to_string()
                }
            )
        );
        assert!(report.applied.is_empty());
        assert!(report.skipped.is_empty());
        assert!(project.mutations().await.is_empty());
    }

    #[tokio::test]
    async fn section_workflow_moves_items() {
        let mut assigned = item("1", None);
        assigned.assignee = Some(ada());
        let project = project(vec![assigned, item("2", None)]);
        let triager = builder(&project, config())
            .apply(
                Workflow::sections(
                    "Bugs",
                    vec![
                        WorkflowStage::new("Inbox", AlwaysTrue),
                        WorkflowStage::new("Doing", Assigned::new()),
                    ],
                )
                .unwrap(),
            )
            .build()
            .await
            .unwrap();

        let report = triager.triage().await.unwrap();

        assert_eq!(project.section_order("Doing").await, vec![ItemId::from("1")]);
        assert_eq!(project.section_order("Inbox").await, vec![ItemId::from("2")]);
        assert_eq!(report.applied.len(), 1);
    }

    #[tokio::test]
    async fn sort_orders_by_enum_and_is_idempotent() {
        let project = project(vec![
            item("m", Some("Medium")),
            item("h", Some("High")),
            item("l", Some("Low")),
            item("u", None),
        ]);
        let triager = builder(&project, config())
            .order("Inbox", EnumCustomFieldSorter::new("Priority", ["High", "Medium", "Low"]))
            .build()
            .await
            .unwrap();

        let first = triager.sort().await.unwrap();

        let order: Vec<String> = project
            .section_order("Inbox")
            .await
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["h", "m", "l", "u"]);
        assert_eq!(first.moves.len(), 1);

        let second = triager.sort().await.unwrap();

        assert!(second.moves.is_empty());
        assert_eq!(project.moves().await.len(), 1);
    }

    #[tokio::test]
    async fn sort_dry_run_leaves_order() {
        let project = project(vec![item("l", Some("Low")), item("h", Some("High"))]);
        let triager = builder(&project, config().with_dry_run(true))
            .order("Inbox", EnumCustomFieldSorter::new("Priority", ["High", "Low"]))
            .build()
            .await
            .unwrap();

        let report = triager.sort().await.unwrap();

        assert_eq!(report.moves.len(), 1);
        assert!(project.moves().await.is_empty());
    }

    #[tokio::test]
    async fn build_rejects_bad_registrations() {
        let project = project(vec![]);

        let unknown_section = builder(&project, config())
            .order("Nowhere", EnumCustomFieldSorter::new("Priority", ["High"]))
            .build()
            .await;
        assert!(matches!(unknown_section, Err(BuildError::UnknownSection { section, .. }) if section == "Nowhere"));

        let unknown_field = builder(&project, config())
            .order("Inbox", EnumCustomFieldSorter::new("Severity", ["High"]))
            .build()
            .await;
        assert!(matches!(unknown_field, Err(BuildError::UnknownSortField { field, .. }) if field == "Severity"));

        let duplicate = builder(&project, config())
            .order("Inbox", EnumCustomFieldSorter::new("Priority", ["High"]))
            .order("Inbox", EnumCustomFieldSorter::new("Priority", ["Low"]))
            .build()
            .await;
        assert!(matches!(duplicate, Err(BuildError::DuplicateSorter { .. })));

        let bad_workflow = builder(&project, config())
            .apply(
                Workflow::enum_field("Priority", vec![WorkflowStage::new("Critical", AlwaysTrue)])
                    .unwrap(),
            )
            .build()
            .await;
        assert!(matches!(bad_workflow, Err(BuildError::InvalidWorkflow { .. })));

        let missing_project = builder(&project, TriagerConfig::new("Elsewhere")).build().await;
        assert!(matches!(missing_project, Err(BuildError::Fetch { what: "project schema", .. })));
    }
}
