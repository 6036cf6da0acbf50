//! Actions: intents to mutate one item.
//!
//! An `Action` names schema objects the way users write rules ("set Priority
//! to High", "move to Doing"). Before anything is sent to the service it is
//! resolved against the run's snapshot into a `Mutation`, which carries the
//! remote ids. Resolution is where idempotence and schema checks live:
//! - the item already holds the desired value -> `Resolution::AlreadySatisfied`
//! - the field / option / section does not exist -> `SchemaError`

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::SchemaError;
use super::ids::{FieldId, OptionId, ProjectId, SectionId};
use super::item::{External, Item};
use super::project::ProjectSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Append a plain-text comment. Comments are append-only, so this always applies.
    AddComment { text: String },

    /// Add a follower, given as a user gid or email.
    AddFollower { follower: String },

    /// Assign to a user gid or email, or unassign with `None`.
    AssignTo { assignee: Option<String> },

    /// Select an option of an enum custom field, both given by name.
    SetEnumField { field: String, option: String },

    /// Replace the item's external data.
    SetExternal { external: External },

    /// Move the item into a section of a project it belongs to.
    MoveToSection { project: String, section: String },
}

impl Action {
    pub fn add_comment(text: impl Into<String>) -> Self {
        Action::AddComment { text: text.into() }
    }

    pub fn add_follower(follower: impl Into<String>) -> Self {
        Action::AddFollower {
            follower: follower.into(),
        }
    }

    pub fn assign_to(assignee: impl Into<String>) -> Self {
        Action::AssignTo {
            assignee: Some(assignee.into()),
        }
    }

    pub fn unassign() -> Self {
        Action::AssignTo { assignee: None }
    }

    pub fn set_enum_field(field: impl Into<String>, option: impl Into<String>) -> Self {
        Action::SetEnumField {
            field: field.into(),
            option: option.into(),
        }
    }

    pub fn set_external(external: External) -> Self {
        Action::SetExternal { external }
    }

    pub fn move_to_section(project: impl Into<String>, section: impl Into<String>) -> Self {
        Action::MoveToSection {
            project: project.into(),
            section: section.into(),
        }
    }

    /// Resolve this action for `item` against the project schema.
    pub fn resolve(&self, item: &Item, schema: &ProjectSchema) -> Result<Resolution, SchemaError> {
        match self {
            Action::AddComment { text } => Ok(Resolution::Apply(Mutation::AddComment {
                text: text.clone(),
            })),

            Action::AddFollower { follower } => Ok(Resolution::Apply(Mutation::AddFollower {
                follower: follower.clone(),
            })),

            Action::AssignTo { assignee } => {
                let unchanged = match (&item.assignee, assignee) {
                    (None, None) => true,
                    (Some(current), Some(wanted)) => current.matches(wanted),
                    _ => false,
                };
                if unchanged {
                    return Ok(Resolution::AlreadySatisfied);
                }
                Ok(Resolution::Apply(Mutation::SetAssignee {
                    assignee: assignee.clone(),
                }))
            }

            Action::SetEnumField { field, option } => {
                let custom_field =
                    item.custom_field(field)
                        .ok_or_else(|| SchemaError::UnknownField {
                            field: field.clone(),
                        })?;
                let options =
                    custom_field
                        .enum_options()
                        .ok_or_else(|| SchemaError::NotAnEnumField {
                            field: field.clone(),
                        })?;
                let wanted = options.iter().find(|o| &o.name == option).ok_or_else(|| {
                    SchemaError::UnknownOption {
                        field: field.clone(),
                        option: option.clone(),
                    }
                })?;
                if custom_field.enum_value() == Some(wanted) {
                    return Ok(Resolution::AlreadySatisfied);
                }
                Ok(Resolution::Apply(Mutation::SetEnumField {
                    field: custom_field.id.clone(),
                    option: Some(wanted.id.clone()),
                }))
            }

            Action::SetExternal { external } => {
                if item.external.as_ref() == Some(external) {
                    return Ok(Resolution::AlreadySatisfied);
                }
                Ok(Resolution::Apply(Mutation::SetExternal {
                    external: external.clone(),
                }))
            }

            Action::MoveToSection { project, section } => {
                let membership =
                    item.membership_in(project)
                        .ok_or_else(|| SchemaError::NotInProject {
                            project: project.clone(),
                        })?;
                if membership.section.as_ref().map(|s| s.name.as_str()) == Some(section.as_str()) {
                    return Ok(Resolution::AlreadySatisfied);
                }
                let target = (schema.project.name == *project)
                    .then(|| schema.section(section))
                    .flatten()
                    .ok_or_else(|| SchemaError::UnknownSection {
                        project: project.clone(),
                        section: section.clone(),
                    })?;
                Ok(Resolution::Apply(Mutation::AddToSection {
                    project: membership.project.id.clone(),
                    section: target.id.clone(),
                }))
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddComment { text } => write!(f, "AddComment({text})"),
            Action::AddFollower { follower } => write!(f, "AddFollower({follower})"),
            Action::AssignTo { assignee: Some(a) } => write!(f, "AssignTo({a})"),
            Action::AssignTo { assignee: None } => write!(f, "Unassign"),
            Action::SetEnumField { field, option } => write!(f, "SetEnumField({field}, {option})"),
            Action::SetExternal { .. } => write!(f, "SetExternal"),
            Action::MoveToSection { project, section } => {
                write!(f, "MoveToSection({project}, {section})")
            }
        }
    }
}

/// A resolved request, addressed with remote ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mutation", rename_all = "snake_case")]
pub enum Mutation {
    AddComment { text: String },
    AddFollower { follower: String },
    SetAssignee { assignee: Option<String> },
    SetEnumField { field: FieldId, option: Option<OptionId> },
    SetExternal { external: External },
    AddToSection { project: ProjectId, section: SectionId },
}

/// Outcome of resolving an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Apply(Mutation),
    AlreadySatisfied,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{
        CustomField, EnumOption, FieldValue, Membership, ProjectRef, SectionRef, User,
    };
    use chrono::{TimeZone, Utc};

    fn project() -> ProjectRef {
        ProjectRef {
            id: "p1".into(),
            name: "Bugs".to_string(),
        }
    }

    fn section(id: &str, name: &str) -> SectionRef {
        SectionRef {
            id: id.into(),
            name: name.to_string(),
        }
    }

    fn schema() -> ProjectSchema {
        let mut schema = ProjectSchema::new(project());
        schema.sections = vec![section("s1", "Inbox"), section("s2", "Doing")];
        schema
    }

    fn option(id: &str, name: &str) -> EnumOption {
        EnumOption {
            id: id.into(),
            name: name.to_string(),
        }
    }

    fn item() -> Item {
        let mut item = Item::new("1", "task", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        item.custom_fields.push(CustomField {
            id: "f1".into(),
            name: "Priority".to_string(),
            value: FieldValue::Enum {
                value: Some(option("o1", "High")),
                options: vec![option("o1", "High"), option("o2", "Low")],
            },
        });
        item.custom_fields.push(CustomField {
            id: "f2".into(),
            name: "Points".to_string(),
            value: FieldValue::Number { value: None },
        });
        item.memberships.push(Membership {
            project: project(),
            section: Some(section("s1", "Inbox")),
        });
        item
    }

    #[test]
    fn set_enum_field_resolves_ids() {
        let resolved = Action::set_enum_field("Priority", "Low")
            .resolve(&item(), &schema())
            .unwrap();
        assert_eq!(
            resolved,
            Resolution::Apply(Mutation::SetEnumField {
                field: "f1".into(),
                option: Some("o2".into()),
            })
        );
    }

    #[test]
    fn set_enum_field_is_idempotent() {
        let resolved = Action::set_enum_field("Priority", "High")
            .resolve(&item(), &schema())
            .unwrap();
        assert_eq!(resolved, Resolution::AlreadySatisfied);
    }

    #[test]
    fn set_enum_field_reports_schema_errors() {
        let item = item();
        let schema = schema();

        assert_eq!(
            Action::set_enum_field("Severity", "High").resolve(&item, &schema),
            Err(SchemaError::UnknownField {
                field: "Severity".to_string()
            })
        );
        assert_eq!(
            Action::set_enum_field("Points", "High").resolve(&item, &schema),
            Err(SchemaError::NotAnEnumField {
                field: "Points".to_string()
            })
        );
        assert_eq!(
            Action::set_enum_field("Priority", "Urgent").resolve(&item, &schema),
            Err(SchemaError::UnknownOption {
                field: "Priority".to_string(),
                option: "Urgent".to_string()
            })
        );
    }

    #[test]
    fn assign_to_matches_gid_or_email() {
        let mut item = item();
        item.assignee = Some(User::new("u1", "Ada").with_email("ada@example.com"));

        assert_eq!(
            Action::assign_to("ada@example.com").resolve(&item, &schema()),
            Ok(Resolution::AlreadySatisfied)
        );
        assert_eq!(
            Action::assign_to("u1").resolve(&item, &schema()),
            Ok(Resolution::AlreadySatisfied)
        );
        assert_eq!(
            Action::unassign().resolve(&item, &schema()),
            Ok(Resolution::Apply(Mutation::SetAssignee { assignee: None }))
        );
    }

    #[test]
    fn move_to_section_checks_membership_and_schema() {
        let item = item();
        let schema = schema();

        assert_eq!(
            Action::move_to_section("Bugs", "Inbox").resolve(&item, &schema),
            Ok(Resolution::AlreadySatisfied)
        );
        assert_eq!(
            Action::move_to_section("Bugs", "Doing").resolve(&item, &schema),
            Ok(Resolution::Apply(Mutation::AddToSection {
                project: "p1".into(),
                section: "s2".into(),
            }))
        );
        assert!(matches!(
            Action::move_to_section("Bugs", "Done").resolve(&item, &schema),
            Err(SchemaError::UnknownSection { .. })
        ));
        assert!(matches!(
            Action::move_to_section("Roadmap", "Doing").resolve(&item, &schema),
            Err(SchemaError::NotInProject { .. })
        ));
    }

    #[test]
    fn comments_always_apply() {
        let resolved = Action::add_comment("ping").resolve(&item(), &schema()).unwrap();
        assert_eq!(
            resolved,
            Resolution::Apply(Mutation::AddComment {
                text: "ping".to_string()
            })
        );
    }
}
