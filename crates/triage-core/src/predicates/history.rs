//! History-based predicates.
//!
//! "For at least" qualifiers look at the item's stories: the most recent story
//! that put the item into its current state marks when that state began. When
//! no such story exists the item is assumed to have been created in that state.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::{EvalContext, Predicate};
use crate::domain::{Item, Story, format_duration};

/// When the state recognized by `entered` began.
pub(crate) fn state_since(item: &Item, entered: impl Fn(&Story) -> bool) -> DateTime<Utc> {
    item.stories
        .iter()
        .rev()
        .find(|s| entered(s))
        .map(|s| s.created_at)
        .unwrap_or(item.created_at)
}

/// Has the item been in the state recognized by `entered` for longer than `duration`?
pub(crate) fn held_for_at_least(
    item: &Item,
    ctx: &EvalContext,
    duration: Duration,
    entered: impl Fn(&Story) -> bool,
) -> bool {
    ctx.now - state_since(item, entered) > duration
}

pub(crate) fn for_at_least_suffix(duration: Option<Duration>) -> String {
    match duration {
        Some(d) if d > Duration::zero() => format!(" for at least {}", format_duration(d)),
        _ => String::new(),
    }
}

/// The triager has not acted on the item (within a window, if given).
///
/// "Acted" means the item has a story authored by the triager's own user
/// ([`EvalContext::actor`]). Without a window any story at all counts, so
/// `Untriaged::new()` matches each item until the triager first touches it.
/// Negated, it can be used with `ignore` to leave recently handled items alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Untriaged {
    within: Option<Duration>,
}

impl Untriaged {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only stories newer than `duration` count as triage.
    pub fn for_at_least(duration: Duration) -> Self {
        Self {
            within: Some(duration),
        }
    }
}

impl Predicate for Untriaged {
    fn evaluate(&self, item: &Item, ctx: &EvalContext) -> bool {
        let Some(actor) = ctx.actor.as_ref() else {
            return true;
        };
        let last = item
            .stories
            .iter()
            .rev()
            .find(|s| s.author.as_ref().is_some_and(|a| a.id == actor.id));
        match (last, self.within) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(story), Some(window)) => ctx.now - story.created_at > window,
        }
    }
}

impl fmt::Display for Untriaged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Untriaged{}", for_at_least_suffix(self.within))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{at, ctx, item};
    use super::*;
    use crate::domain::{StoryKind, User};

    fn me() -> User {
        User::new("u-bot", "triage bot")
    }

    fn story(id: &str, author: User, hours_ago: i64) -> Story {
        Story {
            id: id.into(),
            created_at: at() - Duration::hours(hours_ago),
            author: Some(author),
            kind: StoryKind::Comment {
                text: "hi".to_string(),
            },
        }
    }

    #[test]
    fn untriaged_without_window_means_never_touched() {
        let ctx = ctx().with_actor(me());
        let mut touched = item("1");
        touched.stories.push(story("s1", me(), 24 * 30));

        let mut others_only = item("2");
        others_only.stories.push(story("s2", User::new("u-ada", "Ada"), 1));

        assert!(!Untriaged::new().evaluate(&touched, &ctx));
        assert!(Untriaged::new().evaluate(&others_only, &ctx));
    }

    #[test]
    fn untriaged_window_looks_at_latest_own_story() {
        let ctx = ctx().with_actor(me());
        let mut it = item("1");
        it.stories.push(story("s1", me(), 72));

        assert!(Untriaged::for_at_least(Duration::days(2)).evaluate(&it, &ctx));

        it.stories.push(story("s2", me(), 1));
        assert!(!Untriaged::for_at_least(Duration::days(2)).evaluate(&it, &ctx));
    }

    #[test]
    fn state_since_falls_back_to_creation() {
        let it = item("1");
        assert_eq!(state_since(&it, |_| true), it.created_at);
    }

    #[test]
    fn display_mentions_window() {
        assert_eq!(Untriaged::new().to_string(), "Untriaged");
        assert_eq!(
            Untriaged::for_at_least(Duration::days(2)).to_string(),
            "Untriaged for at least 2d"
        );
    }
}
