//! Port implementations.
//!
//! - **InMemoryProject**: one project held in memory, implementing every
//!   service port. Backs the tests and the demo CLI.
//!
//! A client for the real service would live in its own crate.

pub mod memory;

pub use self::memory::{InMemoryProject, MutationLog, ProjectSnapshot};
