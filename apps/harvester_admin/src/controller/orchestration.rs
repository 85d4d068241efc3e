//! Command orchestration helpers from UI actions to backend command queue.

use admin_core::IntentSink;
use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::Intent;

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err("UI command queue is full; please retry".to_string()),
        Err(TrySendError::Disconnected(_)) => Err(
            "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                .to_string(),
        ),
    }
}

/// Forwards finalized intents to the backend worker. A failed hand-off is
/// kept until the UI collects it with [`QueuedIntentSink::take_failure`].
pub struct QueuedIntentSink {
    cmd_tx: Sender<BackendCommand>,
    failure: Option<String>,
}

impl QueuedIntentSink {
    pub fn new(cmd_tx: Sender<BackendCommand>) -> Self {
        Self {
            cmd_tx,
            failure: None,
        }
    }

    pub fn request_catalog(&mut self) {
        if let Err(message) = dispatch_backend_command(&self.cmd_tx, BackendCommand::LoadCatalog) {
            self.failure = Some(message);
        }
    }

    pub fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }
}

impl IntentSink for QueuedIntentSink {
    fn on_intent(&mut self, intent: Intent) {
        if let Err(message) =
            dispatch_backend_command(&self.cmd_tx, BackendCommand::ApplyIntent(intent))
        {
            tracing::warn!("dropped intent: {message}");
            self.failure = Some(message);
        }
    }
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
