//! TriagerBuilder: registration and start-up validation.
//!
//! `build()` fetches the project schema once and rejects registrations that
//! could never work against it (fail fast), so that a run only has to deal
//! with per-item problems.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{ServiceError, User};
use crate::ports::{Catalog, Clock, GroupingService, IdGenerator, ItemSource, MutationService, UlidGenerator};
use crate::predicates::{BoxPredicate, Predicate};
use crate::rules::{RuleHandler, RuleTable};
use crate::sorters::{BoxSorter, Sorter};
use crate::workflow::Workflow;

use super::config::TriagerConfig;
use super::triager::{SortTarget, Triager};

/// The services a triager talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ItemSource>,
    pub mutations: Arc<dyn MutationService>,
    pub grouping: Arc<dyn GroupingService>,
    pub catalog: Arc<dyn Catalog>,
}

impl Collaborators {
    /// One service implementing every port (a client, or `InMemoryProject`).
    pub fn from_shared<S>(service: Arc<S>) -> Self
    where
        S: ItemSource + MutationService + GroupingService + Catalog + 'static,
    {
        Self {
            source: service.clone(),
            mutations: service.clone(),
            grouping: service.clone(),
            catalog: service,
        }
    }
}

/// BuildError is returned by [`TriagerBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to fetch {what} for project '{project}': {source}")]
    Fetch {
        what: &'static str,
        project: String,
        #[source]
        source: ServiceError,
    },

    #[error("project '{project}' has no section '{section}' to sort")]
    UnknownSection { project: String, section: String },

    #[error("section '{section}' already has a sorter")]
    DuplicateSorter { section: String },

    #[error("sorter for section '{section}' uses unknown custom field '{field}'")]
    UnknownSortField { section: String, field: String },

    #[error("workflow '{workflow}' is registered twice")]
    DuplicateWorkflow { workflow: String },

    #[error("workflow '{workflow}' cannot run on this project: {reason}")]
    InvalidWorkflow { workflow: String, reason: String },
}

pub struct TriagerBuilder {
    config: TriagerConfig,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    ids: Option<Box<dyn IdGenerator>>,
    ignores: Vec<BoxPredicate>,
    rules: RuleTable,
    orders: Vec<(String, BoxSorter)>,
    workflows: Vec<Workflow>,
}

impl TriagerBuilder {
    pub(crate) fn new(
        config: TriagerConfig,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            collaborators,
            clock,
            ids: None,
            ignores: Vec::new(),
            rules: RuleTable::new(),
            orders: Vec::new(),
            workflows: Vec::new(),
        }
    }

    /// Items matching `predicate` are left out of rules and workflows.
    pub fn ignore(mut self, predicate: impl Predicate + 'static) -> Self {
        self.ignores.push(Box::new(predicate));
        self
    }

    /// Run `handler` on every item matching `predicate`.
    pub fn when<P, H>(mut self, predicate: P, handler: H) -> Self
    where
        P: Predicate + 'static,
        H: RuleHandler + 'static,
    {
        self.rules.register(predicate, handler);
        self
    }

    /// Keep the items of `section` ordered by `sorter` (see [`Triager::sort`]).
    pub fn order(mut self, section: impl Into<String>, sorter: impl Sorter + 'static) -> Self {
        self.orders.push((section.into(), Box::new(sorter)));
        self
    }

    pub fn apply(mut self, workflow: Workflow) -> Self {
        self.workflows.push(workflow);
        self
    }

    /// Defaults to ULIDs stamped by the builder's clock.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    pub async fn build(self) -> Result<Triager, BuildError> {
        let project = self.config.project.clone();
        let schema = self
            .collaborators
            .catalog
            .project(&project)
            .await
            .map_err(|source| BuildError::Fetch {
                what: "project schema",
                project: project.clone(),
                source,
            })?;
        let actor: User = self
            .collaborators
            .catalog
            .current_user()
            .await
            .map_err(|source| BuildError::Fetch {
                what: "current user",
                project: project.clone(),
                source,
            })?;

        let mut sorted_sections = HashSet::new();
        let mut orders = Vec::with_capacity(self.orders.len());
        for (name, sorter) in self.orders {
            let Some(section) = schema.section(&name) else {
                return Err(BuildError::UnknownSection {
                    project: schema.project.name.clone(),
                    section: name,
                });
            };
            if !sorted_sections.insert(section.id.clone()) {
                return Err(BuildError::DuplicateSorter { section: name });
            }
            if let Some(field) = sorter
                .referenced_fields()
                .into_iter()
                .find(|f| schema.custom_field(f).is_none())
            {
                return Err(BuildError::UnknownSortField {
                    section: name,
                    field: field.to_string(),
                });
            }
            orders.push(SortTarget {
                section: section.clone(),
                sorter,
            });
        }

        let mut workflow_names = HashSet::new();
        for workflow in &self.workflows {
            if !workflow_names.insert(workflow.name()) {
                return Err(BuildError::DuplicateWorkflow {
                    workflow: workflow.name().to_string(),
                });
            }
            workflow
                .validate(&schema)
                .map_err(|reason| BuildError::InvalidWorkflow {
                    workflow: workflow.name().to_string(),
                    reason,
                })?;
        }

        let ids = match self.ids {
            Some(ids) => ids,
            None => Box::new(UlidGenerator::new(self.clock.clone())),
        };

        Ok(Triager {
            config: self.config,
            collaborators: self.collaborators,
            clock: self.clock,
            ids,
            schema,
            actor,
            ignores: self.ignores,
            rules: self.rules,
            orders,
            workflows: self.workflows,
        })
    }
}
