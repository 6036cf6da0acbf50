//! Domain identifiers (strongly-typed IDs).
//!
//! Two families live here:
//! - `Gid<T>`: opaque string ids handed out by the remote service (items,
//!   projects, sections, custom fields, enum options, users).
//! - `RunId`: ULID generated locally for every `triage()` / `sort()` run, so the
//!   log lines and the report of one run can be correlated.
//!
//! Both use the phantom marker pattern: `T` only exists at compile time, so an
//! `ItemId` can never be passed where a `SectionId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each id kind.
///
/// `kind()` is used by `Display`, e.g. `Item(1203)` or `run-01HV...`.
pub trait IdMarker: Send + Sync + 'static {
    fn kind() -> &'static str;
}

/// Remote global id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Gid<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> From<&str> for Gid<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Gid<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Gid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::kind(), self.value)
    }
}

/// Locally generated, time-sortable id.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> LocalId<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for LocalId<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for LocalId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", T::kind(), self.ulid)
    }
}

// ========================================
// Marker types
// ========================================

macro_rules! id_marker {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {}

        impl IdMarker for $name {
            fn kind() -> &'static str {
                $kind
            }
        }
    };
}

id_marker!(
    /// Marker for work items (tasks).
    Item => "Item"
);
id_marker!(Project => "Project");
id_marker!(Section => "Section");
id_marker!(Field => "CustomField");
id_marker!(EnumOption => "EnumOption");
id_marker!(User => "User");
id_marker!(Story => "Story");
id_marker!(
    /// Marker for a single triage/sort run.
    Run => "run"
);

// ========================================
// Type aliases
// ========================================

pub type ItemId = Gid<Item>;
pub type ProjectId = Gid<Project>;
pub type SectionId = Gid<Section>;
pub type FieldId = Gid<Field>;
pub type OptionId = Gid<EnumOption>;
pub type UserId = Gid<User>;
pub type StoryId = Gid<Story>;

/// Identifier of one engine run.
pub type RunId = LocalId<Run>;
