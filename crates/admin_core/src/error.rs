use std::fmt;

use shared::domain::{InstitutionId, RecordKind, RecordRef};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(RecordRef),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} no longer exists; proposal discarded")]
    StaleTarget(RecordRef),
    #[error("no add or edit form is open")]
    NoActiveForm,
    #[error("no removal is awaiting confirmation")]
    NoPendingRemoval,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Refresh rejected because it would break the store's key or foreign-key invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("jobs reference unknown institutions: {0:?}")]
    OrphanJobs(Vec<InstitutionId>),
    #[error("{record} is keyed as {key}")]
    KeyMismatch { record: RecordRef, key: RecordRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Blank,
    Duplicate(String),
    Unassigned,
    Mismatch { expected: String, found: String },
    WrongKind { expected: RecordKind, found: RecordKind },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("is required"),
            Self::Duplicate(value) => write!(f, "lists '{value}' more than once"),
            Self::Unassigned => f.write_str("must not be set on a new record"),
            Self::Mismatch { expected, found } => write!(f, "expected {expected}, found {found}"),
            Self::WrongKind { expected, found } => {
                write!(f, "expected {expected} fields, found {found} fields")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn has_issue(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid submission: ")?;
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", issue.field, issue.problem)?;
        }
        Ok(())
    }
}
