//! Errors and their classification.
//!
//! Each layer owns its error type:
//! - `ServiceError`: a collaborator call failed (fetch, mutation, reorder).
//! - `SchemaError`: an action names something the project does not have.
//! - `HandlerError`: a rule handler refused to produce actions.
//! - `WorkflowError`: a workflow definition is malformed.
//! - `TriageError`: the run itself failed and stopped.
//!
//! Only `TriageError` escapes a run. The other three are caught at the
//! smallest granularity and recorded in the [`RunReport`](super::RunReport).

use std::fmt;

use serde::{Deserialize, Serialize};

/// ErrorKind classifies collaborator failures.
///
/// - Transient: network, rate limit, timeout. Aborts the run; the caller may retry it.
/// - Permanent: the service rejected the request. The action is skipped.
/// - Schema: the service does not know a referenced field/option/user. The action is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Permanent,
    Schema,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Schema => "schema",
        };
        f.write_str(s)
    }
}

/// A collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service error (kind: {kind}): {message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An action could not be resolved against the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SchemaError {
    #[error("item has no custom field '{field}'")]
    UnknownField { field: String },

    #[error("custom field '{field}' is not an enum field")]
    NotAnEnumField { field: String },

    #[error("custom field '{field}' has no enum option '{option}'")]
    UnknownOption { field: String, option: String },

    #[error("item is not a member of project '{project}'")]
    NotInProject { project: String },

    #[error("project '{project}' has no section '{section}'")]
    UnknownSection { project: String, section: String },
}

/// A rule handler failed for one item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A workflow definition was rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow '{workflow}' has no stages")]
    NoStages { workflow: String },

    #[error("workflow '{workflow}' defines stage '{stage}' more than once")]
    DuplicateStage { workflow: String, stage: String },
}

/// A run failed and stopped.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("transient failure while dispatching to {item}: {source}")]
    Dispatch {
        item: String,
        #[source]
        source: ServiceError,
    },
}

impl TriageError {
    /// The collaborator error behind this failure.
    pub fn service_error(&self) -> &ServiceError {
        match self {
            TriageError::Fetch { source, .. } | TriageError::Dispatch { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display_includes_kind() {
        let err = ServiceError::transient("rate limited");
        assert_eq!(err.to_string(), "service error (kind: transient): rate limited");
        assert!(err.kind().is_transient());
        assert!(!ServiceError::permanent("gone").kind().is_transient());
    }

    #[test]
    fn schema_error_messages_name_the_reference() {
        let err = SchemaError::UnknownOption {
            field: "Priority".to_string(),
            option: "Urgent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "custom field 'Priority' has no enum option 'Urgent'"
        );
    }

    #[test]
    fn triage_error_exposes_source() {
        let err = TriageError::Fetch {
            what: "items",
            source: ServiceError::transient("timeout"),
        };
        assert!(err.to_string().contains("failed to fetch items"));
        assert_eq!(err.service_error().message(), "timeout");
    }
}
