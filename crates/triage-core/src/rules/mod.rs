//! Rules: "when this predicate holds, do these actions".

pub mod handler;
pub mod table;

pub use handler::{RuleHandler, StaticActions};
pub use table::{ItemActions, RuleAction, RuleId, RuleMatches, RuleTable};
