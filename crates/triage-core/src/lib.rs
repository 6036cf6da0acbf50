//! triage-core
//!
//! Rule-driven triage for a remote project-management service.
//!
//! # Modules
//! - **domain**: item snapshot, actions, schema, errors, run report
//! - **ports**: ItemSource, MutationService, GroupingService, Catalog, Clock, IdGenerator
//! - **predicates**: predicate algebra and built-in predicates
//! - **rules**: rule table of (predicate, handler) registrations
//! - **sorters**: sorter algebra and minimal reorder planning
//! - **workflow**: staged workflows over sections, enum fields or external data
//! - **app**: config, builder, triager (`triage()` / `sort()`)
//! - **impls**: InMemoryProject

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod predicates;
pub mod rules;
pub mod sorters;
pub mod workflow;
