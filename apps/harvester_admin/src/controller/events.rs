//! UI/backend events and error modeling for the admin GUI.

use admin_core::WorkflowError;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::CatalogSnapshot,
};

pub enum UiEvent {
    Info(String),
    CatalogLoaded(CatalogSnapshot),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    NotFound,
    Validation,
    Storage,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadCatalog,
    ApplyIntent,
    Workflow,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("not found")
            || message_lower.contains("no longer exists")
        {
            UiErrorCategory::NotFound
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("must not")
            || message_lower.contains("constraint")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("database")
            || message_lower.contains("sqlite")
            || message_lower.contains("migration")
            || message_lower.contains("locked")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("disconnect")
            || message_lower.contains("queue is full")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_api(context: UiErrorContext, error: ApiError) -> Self {
        let category = match error.code {
            ErrorCode::NotFound => UiErrorCategory::NotFound,
            ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::Internal => UiErrorCategory::Storage,
        };
        Self {
            category,
            context,
            message: error.message,
        }
    }

    pub fn from_workflow(error: &WorkflowError) -> Self {
        let category = match error {
            WorkflowError::NotFound(_) | WorkflowError::StaleTarget(_) => {
                UiErrorCategory::NotFound
            }
            WorkflowError::Validation(_)
            | WorkflowError::NoActiveForm
            | WorkflowError::NoPendingRemoval => UiErrorCategory::Validation,
            WorkflowError::Store(_) => UiErrorCategory::Storage,
        };
        Self {
            category,
            context: UiErrorContext::Workflow,
            message: error.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[path = "../tests/events_tests.rs"]
mod tests;
