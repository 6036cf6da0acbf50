//! Stages kept in the item's external data, under `data["workflows"][<workflow>]`.
//!
//! Several workflows can share one item's external data; each only touches its
//! own key and every other key is written back unchanged.

use serde_json::{Map, Value};

use super::store::{StageStore, UnreadableStage};
use crate::domain::{Action, External, Item, ProjectSchema};

const WORKFLOWS_KEY: &str = "workflows";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStore {
    workflow: String,
}

impl ExternalStore {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
        }
    }
}

impl StageStore for ExternalStore {
    fn read_stage(&self, item: &Item) -> Result<Option<String>, UnreadableStage> {
        let Some(workflows) = item.external.as_ref().and_then(|e| e.data.get(WORKFLOWS_KEY)) else {
            return Ok(None);
        };
        let workflows = workflows.as_object().ok_or_else(|| {
            UnreadableStage::MalformedExternal(format!("'{WORKFLOWS_KEY}' is not an object"))
        })?;
        match workflows.get(&self.workflow) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(stage)) => Ok(Some(stage.clone())),
            Some(_) => Err(UnreadableStage::MalformedExternal(format!(
                "stage of '{}' is not a string",
                self.workflow
            ))),
        }
    }

    fn write_stage(&self, item: &Item, stage: &str) -> Action {
        let mut external = item.external.clone().unwrap_or_default();
        let mut workflows = match external.data.remove(WORKFLOWS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        workflows.insert(self.workflow.clone(), Value::String(stage.to_string()));
        external
            .data
            .insert(WORKFLOWS_KEY.to_string(), Value::Object(workflows));
        Action::set_external(External {
            gid: external.gid,
            data: external.data,
        })
    }

    fn validate(&self, _: &ProjectSchema, _: &[&str]) -> Result<(), String> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("external({})", self.workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::item;
    use serde_json::json;

    fn with_data(data: Value) -> Item {
        let mut it = item("1");
        it.external = Some(External {
            gid: Some("ext-1".to_string()),
            data: data.as_object().cloned().unwrap_or_default(),
        });
        it
    }

    #[test]
    fn reads_own_key_only() {
        let store = ExternalStore::new("bugs");
        assert_eq!(store.read_stage(&item("1")), Ok(None));

        let it = with_data(json!({"workflows": {"bugs": "Triaged", "features": "New"}}));
        assert_eq!(store.read_stage(&it), Ok(Some("Triaged".to_string())));
        assert_eq!(ExternalStore::new("docs").read_stage(&it), Ok(None));
    }

    #[test]
    fn malformed_data_is_unreadable() {
        let store = ExternalStore::new("bugs");
        assert!(store.read_stage(&with_data(json!({"workflows": 3}))).is_err());
        assert!(store.read_stage(&with_data(json!({"workflows": {"bugs": 1}}))).is_err());
    }

    #[test]
    fn write_preserves_other_data() {
        let store = ExternalStore::new("bugs");
        let it = with_data(json!({"owner": "ops", "workflows": {"features": "New"}}));

        let Action::SetExternal { external } = store.write_stage(&it, "Triaged") else {
            panic!("expected SetExternal");
        };
        assert_eq!(external.gid.as_deref(), Some("ext-1"));
        assert_eq!(
            Value::Object(external.data),
            json!({"owner": "ops", "workflows": {"features": "New", "bugs": "Triaged"}})
        );
    }
}
