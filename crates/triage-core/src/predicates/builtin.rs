//! Built-in predicates.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use super::history::{for_at_least_suffix, held_for_at_least};
use super::{EvalContext, Predicate};
use crate::domain::{External, Item, Story, StoryKind, format_duration};

macro_rules! unit_predicate {
    ($(#[$meta:meta])* $name:ident, |$item:ident, $ctx:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Predicate for $name {
            #[allow(unused_variables)]
            fn evaluate(&self, $item: &Item, $ctx: &EvalContext) -> bool {
                $body
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(stringify!($name))
            }
        }
    };
}

unit_predicate!(AlwaysTrue, |item, ctx| true);

unit_predicate!(
    /// Past due. Due today (date only) is not overdue; no due date is never overdue.
    Overdue,
    |item, ctx| match (item.due_at, item.due_on) {
        (Some(at), _) => at < ctx.now,
        (None, Some(on)) => on < ctx.today(),
        (None, None) => false,
    }
);

unit_predicate!(Unassigned, |item, ctx| item.assignee.is_none());
unit_predicate!(HasNoDueDate, |item, ctx| item.due_at.is_none() && item.due_on.is_none());
unit_predicate!(IsComplete, |item, ctx| item.completed);
unit_predicate!(IsIncomplete, |item, ctx| !item.completed);

/// Due within `window` from now, and not yet overdue.
///
/// With a due timestamp: `now < due_at <= now + window`. With only a due date:
/// `today < due_on <= today + whole days of window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWithin {
    window: Duration,
}

impl DueWithin {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl Predicate for DueWithin {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        if let Some(at) = item.due_at {
            return ctx.now < at && at <= ctx.now + self.window;
        }
        if let Some(on) = item.due_on {
            let today = ctx.today();
            return today < on && on <= today + Duration::days(self.window.num_days());
        }
        false
    }
}

impl fmt::Display for DueWithin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DueWithin({})", format_duration(self.window))
    }
}

/// Has an assignee; with [`Assigned::to`], one with that display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assigned {
    name: Option<String>,
}

impl Assigned {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Predicate for Assigned {
    fn evaluate(&self, item: &Item, _: &EvalContext) -> bool {
        match (&item.assignee, &self.name) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(user), Some(name)) => &user.name == name,
        }
    }
}

impl fmt::Display for Assigned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Assigned to '{name}'"),
            None => f.write_str("Assigned"),
        }
    }
}

/// How to match a piece of text (a comment, a description).
#[derive(Clone)]
pub enum TextMatcher {
    Any,
    Contains(String),
    Custom {
        label: String,
        f: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    },
}

impl TextMatcher {
    pub fn custom(
        label: impl Into<String>,
        f: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        TextMatcher::Custom {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatcher::Any => true,
            TextMatcher::Contains(needle) => text.contains(needle.as_str()),
            TextMatcher::Custom { f, .. } => f(text),
        }
    }
}

impl fmt::Debug for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatcher::Any => f.write_str("any"),
            TextMatcher::Contains(needle) => write!(f, "'{needle}'"),
            TextMatcher::Custom { label, .. } => f.write_str(label),
        }
    }
}

impl From<&str> for TextMatcher {
    fn from(needle: &str) -> Self {
        TextMatcher::Contains(needle.to_string())
    }
}

/// At least one comment matches.
#[derive(Debug, Clone)]
pub struct HasComment {
    matcher: TextMatcher,
}

impl HasComment {
    pub fn any() -> Self {
        Self {
            matcher: TextMatcher::Any,
        }
    }

    pub fn matching(matcher: impl Into<TextMatcher>) -> Self {
        Self {
            matcher: matcher.into(),
        }
    }
}

impl Predicate for HasComment {
    fn evaluate(&self, item: &Item, _: &EvalContext) -> bool {
        item.comments().any(|text| self.matcher.matches(text))
    }
}

impl fmt::Display for HasComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            TextMatcher::Any => f.write_str("HasComment"),
            m => write!(f, "HasComment({m})"),
        }
    }
}

/// Non-empty description, or one accepted by a matcher.
#[derive(Debug, Clone)]
pub struct HasDescription {
    matcher: Option<TextMatcher>,
}

impl HasDescription {
    pub fn new() -> Self {
        Self { matcher: None }
    }

    pub fn matching(matcher: impl Into<TextMatcher>) -> Self {
        Self {
            matcher: Some(matcher.into()),
        }
    }
}

impl Default for HasDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate for HasDescription {
    fn evaluate(&self, item: &Item, _: &EvalContext) -> bool {
        match &self.matcher {
            Some(m) => m.matches(&item.notes),
            None => !item.notes.is_empty(),
        }
    }
}

impl fmt::Display for HasDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Some(m) => write!(f, "HasDescription({m})"),
            None => f.write_str("HasDescription"),
        }
    }
}

pub type ExternalMatcher = Arc<dyn Fn(&External) -> bool + Send + Sync>;

/// Has external data, optionally accepted by a matcher.
#[derive(Clone, Default)]
pub struct HasExternal {
    matcher: Option<(String, ExternalMatcher)>,
}

impl HasExternal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(
        label: impl Into<String>,
        f: impl Fn(&External) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            matcher: Some((label.into(), Arc::new(f))),
        }
    }
}

impl Predicate for HasExternal {
    fn evaluate(&self, item: &Item, _: &EvalContext) -> bool {
        match (&item.external, &self.matcher) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(external), Some((_, f))) => f(external),
        }
    }
}

impl fmt::Display for HasExternal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Some((label, _)) => write!(f, "HasExternal({label})"),
            None => f.write_str("HasExternal"),
        }
    }
}

fn enum_changed(field: &str) -> impl Fn(&Story) -> bool + '_ {
    move |story: &Story| matches!(&story.kind, StoryKind::EnumChanged { field: f } if f == field)
}

/// An enum custom field is set (to `option`, if given).
///
/// Items without the field never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasEnumValue {
    field: String,
    option: Option<String>,
    for_at_least: Option<Duration>,
}

impl HasEnumValue {
    pub fn new(field: impl Into<String>, option: Option<&str>) -> Self {
        Self {
            field: field.into(),
            option: option.map(str::to_string),
            for_at_least: None,
        }
    }

    pub fn set_to(field: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            option: Some(option.into()),
            for_at_least: None,
        }
    }

    /// Also require the value to have been set longer than `duration` ago.
    pub fn for_at_least(mut self, duration: Duration) -> Self {
        self.for_at_least = Some(duration);
        self
    }
}

impl Predicate for HasEnumValue {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        let Some(value) = item.custom_field(&self.field).and_then(|f| f.enum_value()) else {
            return false;
        };
        if self.option.as_ref().is_some_and(|o| &value.name != o) {
            return false;
        }
        match self.for_at_least {
            Some(d) => held_for_at_least(item, ctx, d, enum_changed(&self.field)),
            None => true,
        }
    }
}

impl fmt::Display for HasEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.option {
            Some(o) => write!(f, "Has '{}' set to '{o}'", self.field)?,
            None => write!(f, "Has '{}' set", self.field)?,
        }
        f.write_str(&for_at_least_suffix(self.for_at_least))
    }
}

/// The item has the enum field but no option selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasUnsetEnum {
    field: String,
    for_at_least: Option<Duration>,
}

impl HasUnsetEnum {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            for_at_least: None,
        }
    }

    pub fn for_at_least(mut self, duration: Duration) -> Self {
        self.for_at_least = Some(duration);
        self
    }
}

impl Predicate for HasUnsetEnum {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        let unset = item
            .custom_field(&self.field)
            .is_some_and(|f| f.enum_options().is_some() && f.enum_value().is_none());
        if !unset {
            return false;
        }
        match self.for_at_least {
            Some(d) => held_for_at_least(item, ctx, d, enum_changed(&self.field)),
            None => true,
        }
    }
}

impl fmt::Display for HasUnsetEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Has '{}' unset{}",
            self.field,
            for_at_least_suffix(self.for_at_least)
        )
    }
}

/// Member of a project (by name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsInProject {
    project: String,
    for_at_least: Option<Duration>,
}

impl IsInProject {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            for_at_least: None,
        }
    }

    pub fn for_at_least(mut self, duration: Duration) -> Self {
        self.for_at_least = Some(duration);
        self
    }
}

impl Predicate for IsInProject {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        if item.membership_in(&self.project).is_none() {
            return false;
        }
        let Some(d) = self.for_at_least else {
            return true;
        };
        held_for_at_least(item, ctx, d, |story| {
            matches!(&story.kind, StoryKind::AddedToProject { project } if project == &self.project)
        })
    }
}

impl fmt::Display for IsInProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In '{}' project{}",
            self.project,
            for_at_least_suffix(self.for_at_least)
        )
    }
}

/// In a given section of a project (both by name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsInProjectAndSection {
    project: String,
    section: String,
    for_at_least: Option<Duration>,
}

impl IsInProjectAndSection {
    pub fn new(project: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            section: section.into(),
            for_at_least: None,
        }
    }

    pub fn for_at_least(mut self, duration: Duration) -> Self {
        self.for_at_least = Some(duration);
        self
    }
}

impl Predicate for IsInProjectAndSection {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        let in_section = item
            .membership_in(&self.project)
            .and_then(|m| m.section.as_ref())
            .is_some_and(|s| s.name == self.section);
        if !in_section {
            return false;
        }
        let Some(d) = self.for_at_least else {
            return true;
        };
        // Without a section change the item was added straight into this section.
        held_for_at_least(item, ctx, d, |story| match &story.kind {
            StoryKind::SectionChanged { project, section } => {
                project == &self.project && section == &self.section
            }
            StoryKind::AddedToProject { project } => project == &self.project,
            _ => false,
        })
    }
}

impl fmt::Display for IsInProjectAndSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In '{}' project and '{}' section{}",
            self.project,
            self.section,
            for_at_least_suffix(self.for_at_least)
        )
    }
}
