//! Stages as options of an enum custom field.

use super::store::{StageStore, UnreadableStage};
use crate::domain::{Action, FieldKind, Item, ProjectSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFieldStore {
    field: String,
}

impl EnumFieldStore {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl StageStore for EnumFieldStore {
    fn read_stage(&self, item: &Item) -> Result<Option<String>, UnreadableStage> {
        let field = item
            .custom_field(&self.field)
            .ok_or_else(|| UnreadableStage::MissingField {
                field: self.field.clone(),
            })?;
        if field.enum_options().is_none() {
            return Err(UnreadableStage::NotAnEnumField {
                field: self.field.clone(),
            });
        }
        Ok(field.enum_value().map(|o| o.name.clone()))
    }

    fn write_stage(&self, _: &Item, stage: &str) -> Action {
        Action::set_enum_field(self.field.clone(), stage)
    }

    fn validate(&self, schema: &ProjectSchema, stages: &[&str]) -> Result<(), String> {
        let def = schema
            .custom_field(&self.field)
            .ok_or_else(|| format!("project has no custom field '{}'", self.field))?;
        if def.kind != FieldKind::Enum {
            return Err(format!("custom field '{}' is not an enum field", self.field));
        }
        match stages
            .iter()
            .find(|s| !def.options.iter().any(|o| o.name == **s))
        {
            Some(missing) => Err(format!(
                "custom field '{}' has no option '{missing}'",
                self.field
            )),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("enum({})", self.field)
    }
}
