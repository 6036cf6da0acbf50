//! Stages as sections of a project: the item's section is its stage.

use super::store::{StageStore, UnreadableStage};
use crate::domain::{Action, Item, ProjectSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionStore {
    project: String,
}

impl SectionStore {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }
}

impl StageStore for SectionStore {
    fn read_stage(&self, item: &Item) -> Result<Option<String>, UnreadableStage> {
        let membership =
            item.membership_in(&self.project)
                .ok_or_else(|| UnreadableStage::NotInProject {
                    project: self.project.clone(),
                })?;
        Ok(membership.section.as_ref().map(|s| s.name.clone()))
    }

    fn write_stage(&self, _: &Item, stage: &str) -> Action {
        Action::move_to_section(self.project.clone(), stage)
    }

    fn validate(&self, schema: &ProjectSchema, stages: &[&str]) -> Result<(), String> {
        if schema.project.name != self.project {
            return Err(format!(
                "stages live in project '{}' but the triager runs on '{}'",
                self.project, schema.project.name
            ));
        }
        match stages.iter().find(|s| schema.section(s).is_none()) {
            Some(missing) => Err(format!(
                "project '{}' has no section '{missing}'",
                self.project
            )),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("section({})", self.project)
    }
}
