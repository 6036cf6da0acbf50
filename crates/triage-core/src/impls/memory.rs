//! InMemoryProject: every service port over one project held in memory.
//!
//! Mutations and reorders are applied to the held state, so a second run sees
//! the effects of the first. Every accepted call is also logged for
//! assertions. `fail_next_read` / `fail_next_write` make the next read
//! (catalog, fetch, list) or write (mutation, reorder) fail.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{
    FieldValue, Item, ItemId, Move, Mutation, Placement, ProjectId, ProjectSchema, SectionId,
    ServiceError, Story, StoryKind, User,
};
use crate::ports::{Catalog, Clock, GroupingService, ItemSource, MutationService, SystemClock};

/// Serialized form of an [`InMemoryProject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub schema: ProjectSchema,
    /// The identity calls are made as.
    pub me: User,
    /// Users that can be assigned, besides `me`.
    #[serde(default)]
    pub users: Vec<User>,
    /// Items in display order.
    #[serde(default)]
    pub items: Vec<Item>,
}

/// One accepted mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationLog {
    pub item: ItemId,
    pub mutation: Mutation,
}

struct State {
    snapshot: ProjectSnapshot,
    mutations: Vec<MutationLog>,
    moves: Vec<Move>,
    read_failures: VecDeque<ServiceError>,
    write_failures: VecDeque<ServiceError>,
    next_story: u64,
}

impl State {
    fn read(&mut self) -> Result<(), ServiceError> {
        self.read_failures.pop_front().map_or(Ok(()), Err)
    }

    fn write(&mut self) -> Result<(), ServiceError> {
        self.write_failures.pop_front().map_or(Ok(()), Err)
    }

    fn position(&self, item: &ItemId) -> Result<usize, ServiceError> {
        self.snapshot
            .items
            .iter()
            .position(|i| &i.id == item)
            .ok_or_else(|| ServiceError::permanent(format!("unknown item {item}")))
    }

    fn user(&self, reference: &str) -> Result<User, ServiceError> {
        std::iter::once(&self.snapshot.me)
            .chain(&self.snapshot.users)
            .find(|u| u.matches(reference))
            .cloned()
            .ok_or_else(|| ServiceError::schema(format!("unknown user {reference}")))
    }

    fn story_id(&mut self) -> String {
        self.next_story += 1;
        format!("story-{}", self.next_story)
    }
}

pub struct InMemoryProject {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl InMemoryProject {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        Self {
            state: Mutex::new(State {
                snapshot,
                mutations: Vec::new(),
                moves: Vec::new(),
                read_failures: VecDeque::new(),
                write_failures: VecDeque::new(),
                next_story: 0,
            }),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Timestamps for stories written by mutations.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The next catalog, fetch or list call fails with `error`. Queued failures are used in order.
    pub async fn fail_next_read(&self, error: ServiceError) {
        self.state.lock().await.read_failures.push_back(error);
    }

    /// The next mutation or reorder fails with `error`.
    pub async fn fail_next_write(&self, error: ServiceError) {
        self.state.lock().await.write_failures.push_back(error);
    }

    pub async fn snapshot(&self) -> ProjectSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    pub async fn item(&self, id: &ItemId) -> Option<Item> {
        let state = self.state.lock().await;
        state.snapshot.items.iter().find(|i| &i.id == id).cloned()
    }

    pub async fn mutations(&self) -> Vec<MutationLog> {
        self.state.lock().await.mutations.clone()
    }

    pub async fn moves(&self) -> Vec<Move> {
        self.state.lock().await.moves.clone()
    }

    /// Ids of the items in the section named `section`, in display order.
    pub async fn section_order(&self, section: &str) -> Vec<ItemId> {
        let state = self.state.lock().await;
        let Some(section) = state.snapshot.schema.section(section) else {
            return Vec::new();
        };
        in_section(&state.snapshot, &section.id)
            .map(|i| i.id.clone())
            .collect()
    }
}

fn in_section<'a>(
    snapshot: &'a ProjectSnapshot,
    section: &'a SectionId,
) -> impl Iterator<Item = &'a Item> {
    let project = &snapshot.schema.project.id;
    snapshot.items.iter().filter(move |item| {
        item.memberships.iter().any(|m| {
            &m.project.id == project && m.section.as_ref().is_some_and(|s| &s.id == section)
        })
    })
}

#[async_trait]
impl Catalog for InMemoryProject {
    async fn project(&self, project: &str) -> Result<ProjectSchema, ServiceError> {
        let mut state = self.state.lock().await;
        state.read()?;
        let schema = &state.snapshot.schema;
        if schema.project.name == project || schema.project.id.as_str() == project {
            Ok(schema.clone())
        } else {
            Err(ServiceError::permanent(format!("unknown project {project}")))
        }
    }

    async fn current_user(&self) -> Result<User, ServiceError> {
        let mut state = self.state.lock().await;
        state.read()?;
        Ok(state.snapshot.me.clone())
    }
}

#[async_trait]
impl ItemSource for InMemoryProject {
    async fn fetch_items(&self, project: &ProjectId) -> Result<Vec<Item>, ServiceError> {
        let mut state = self.state.lock().await;
        state.read()?;
        if &state.snapshot.schema.project.id != project {
            return Err(ServiceError::permanent(format!("unknown project {project}")));
        }
        Ok(state
            .snapshot
            .items
            .iter()
            .filter(|item| item.memberships.iter().any(|m| &m.project.id == project))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MutationService for InMemoryProject {
    async fn apply(&self, item: &ItemId, mutation: &Mutation) -> Result<(), ServiceError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.write()?;
        let index = state.position(item)?;
        let author = Some(state.snapshot.me.clone());

        let story = match mutation {
            Mutation::AddComment { text } => Some(StoryKind::Comment { text: text.clone() }),
            Mutation::AddFollower { follower } => {
                state.user(follower)?;
                None
            }
            Mutation::SetAssignee { assignee } => {
                let user = assignee.as_deref().map(|a| state.user(a)).transpose()?;
                state.snapshot.items[index].assignee = user;
                Some(StoryKind::Other)
            }
            Mutation::SetEnumField { field, option } => {
                let target = &mut state.snapshot.items[index];
                let custom_field = target
                    .custom_fields
                    .iter_mut()
                    .find(|f| &f.id == field)
                    .ok_or_else(|| ServiceError::schema(format!("unknown field {field}")))?;
                let name = custom_field.name.clone();
                let FieldValue::Enum { value, options } = &mut custom_field.value else {
                    return Err(ServiceError::schema(format!("field {field} is not an enum")));
                };
                *value = match option {
                    Some(option) => Some(
                        options
                            .iter()
                            .find(|o| &o.id == option)
                            .cloned()
                            .ok_or_else(|| ServiceError::schema(format!("unknown option {option}")))?,
                    ),
                    None => None,
                };
                Some(StoryKind::EnumChanged { field: name })
            }
            Mutation::SetExternal { external } => {
                state.snapshot.items[index].external = Some(external.clone());
                None
            }
            Mutation::AddToSection { project, section } => {
                let schema = &state.snapshot.schema;
                if &schema.project.id != project {
                    return Err(ServiceError::permanent(format!("unknown project {project}")));
                }
                let section = schema
                    .sections
                    .iter()
                    .find(|s| &s.id == section)
                    .cloned()
                    .ok_or_else(|| ServiceError::schema(format!("unknown section {section}")))?;
                let project_name = schema.project.name.clone();
                let membership = state.snapshot.items[index]
                    .memberships
                    .iter_mut()
                    .find(|m| &m.project.id == project)
                    .ok_or_else(|| ServiceError::permanent(format!("{item} is not in {project}")))?;
                membership.section = Some(section.clone());
                Some(StoryKind::SectionChanged {
                    project: project_name,
                    section: section.name,
                })
            }
        };

        if let Some(kind) = story {
            let id = state.story_id();
            state.snapshot.items[index].stories.push(Story {
                id: id.into(),
                created_at: now,
                author,
                kind,
            });
        }
        state.mutations.push(MutationLog {
            item: item.clone(),
            mutation: mutation.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl GroupingService for InMemoryProject {
    async fn list_items(&self, section: &SectionId) -> Result<Vec<Item>, ServiceError> {
        let mut state = self.state.lock().await;
        state.read()?;
        if state.snapshot.schema.sections.iter().all(|s| &s.id != section) {
            return Err(ServiceError::permanent(format!("unknown section {section}")));
        }
        Ok(in_section(&state.snapshot, section).cloned().collect())
    }

    async fn reorder(
        &self,
        project: &ProjectId,
        item: &ItemId,
        placement: &Placement,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.write()?;
        if &state.snapshot.schema.project.id != project {
            return Err(ServiceError::permanent(format!("unknown project {project}")));
        }
        let from = state.position(item)?;
        let moved = state.snapshot.items.remove(from);
        let at = match placement {
            Placement::Before(reference) => state.position(reference),
            Placement::After(reference) => state.position(reference).map(|i| i + 1),
        };
        let at = match at {
            Ok(at) => at,
            Err(err) => {
                state.snapshot.items.insert(from, moved);
                return Err(err);
            }
        };
        state.snapshot.items.insert(at, moved);
        state.moves.push(Move {
            item: item.clone(),
            placement: placement.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::domain::{CustomField, CustomFieldDef, EnumOption, FieldKind, Membership, ProjectRef, SectionRef};
    use chrono::{TimeZone, Utc};

    pub fn project_ref() -> ProjectRef {
        ProjectRef {
            id: "p1".into(),
            name: "Bugs".to_string(),
        }
    }

    pub fn section(name: &str) -> SectionRef {
        SectionRef {
            id: format!("sec-{name}").into(),
            name: name.to_string(),
        }
    }

    fn priority_options() -> Vec<EnumOption> {
        ["High", "Medium", "Low"]
            .iter()
            .map(|name| EnumOption {
                id: format!("opt-{name}").into(),
                name: name.to_string(),
            })
            .collect()
    }

    /// Project "Bugs": sections Inbox/Doing/Done, enum field Priority and number field Points.
    pub fn schema() -> ProjectSchema {
        let mut schema = ProjectSchema::new(project_ref());
        schema.sections = vec![section("Inbox"), section("Doing"), section("Done")];
        schema.custom_fields = vec![
            CustomFieldDef {
                id: "f-priority".into(),
                name: "Priority".to_string(),
                kind: FieldKind::Enum,
                options: priority_options(),
            },
            CustomFieldDef {
                id: "f-points".into(),
                name: "Points".to_string(),
                kind: FieldKind::Number,
                options: Vec::new(),
            },
        ];
        schema
    }

    pub fn ada() -> User {
        User::new("u-ada", "Ada").with_email("ada@example.com")
    }

    /// An item in the Inbox of "Bugs" with the given Priority.
    pub fn item(id: &str, priority: Option<&str>) -> Item {
        let mut item = Item::new(id, format!("item {id}"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        item.memberships.push(Membership {
            project: project_ref(),
            section: Some(section("Inbox")),
        });
        let options = priority_options();
        item.custom_fields.push(CustomField {
            id: "f-priority".into(),
            name: "Priority".to_string(),
            value: FieldValue::Enum {
                value: priority.and_then(|p| options.iter().find(|o| o.name == p).cloned()),
                options,
            },
        });
        item
    }

    pub fn snapshot(items: Vec<Item>) -> ProjectSnapshot {
        ProjectSnapshot {
            schema: schema(),
            me: User::new("u-bot", "Triage Bot"),
            users: vec![ada()],
            items,
        }
    }

    pub fn project(items: Vec<Item>) -> Arc<InMemoryProject> {
        Arc::new(InMemoryProject::new(snapshot(items)))
    }
}
