//! Backend commands queued from UI to backend worker.

use shared::protocol::Intent;

#[derive(Debug)]
pub enum BackendCommand {
    /// Re-read the whole catalog and publish it.
    LoadCatalog,
    /// Persist a finalized intent, then publish the resulting catalog.
    ApplyIntent(Intent),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadCatalog => "load_catalog",
            Self::ApplyIntent(_) => "apply_intent",
        }
    }
}
