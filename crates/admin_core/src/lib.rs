//! Administrative core for harvest configurations: a read-only catalog of
//! institutions and their OAI-PMH harvest jobs, and the proposal workflow that
//! turns user actions into create/update/delete intents.

use shared::protocol::Intent;

pub mod error;
pub mod panels;
pub mod store;
mod validate;
pub mod view;
pub mod workflow;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use error::{FieldIssue, Problem, StoreError, ValidationError, WorkflowError};
pub use panels::{AdminAction, InstitutionPanel, JobList, JobPanel, PanelButton, SetsDisplay};
pub use store::CollectionStore;
pub use view::{AdminView, Dialog, FormMode, RemovalNotice};
pub use workflow::{Draft, Proposal, ProposalKind, WorkflowController, WorkflowState};

/// Receives finalized intents. Persisting them, and refreshing the store
/// afterwards, is entirely the receiver's job.
pub trait IntentSink {
    fn on_intent(&mut self, intent: Intent);
}

impl IntentSink for Vec<Intent> {
    fn on_intent(&mut self, intent: Intent) {
        self.push(intent);
    }
}
