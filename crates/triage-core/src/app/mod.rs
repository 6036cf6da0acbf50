//! App layer: wires predicates, rules, workflows and sorters to the ports.
//!
//! # Components
//! - **TriagerConfig**: project, timezone, dry run (in code or from env)
//! - **TriagerBuilder**: registration and fail-fast validation against the project schema
//! - **Triager**: `triage()` and `sort()` passes, each producing a `RunReport`
//! - **Dispatcher** (internal): resolve, apply or plan, and record each action

pub mod builder;
pub mod config;
mod dispatch;
pub mod triager;

pub use self::builder::{BuildError, Collaborators, TriagerBuilder};
pub use self::config::{ConfigError, EnvReader, ProcessEnv, TriagerConfig, parse_offset};
pub use self::triager::Triager;
