//! Runtime bridge between UI command queue and the storage worker.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use shared::error::ApiException;
use storage::{AppliedIntent, HarvestScheduleStore, Storage};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    database_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let storage = match Storage::new(&database_url).await {
                Ok(storage) => storage,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!(
                            "backend worker startup failure: could not open database '{database_url}': {err:#}"
                        ),
                    )));
                    tracing::error!("failed to open database '{database_url}': {err:#}");
                    return;
                }
            };
            tracing::info!(database_url = %database_url, "backend worker ready");
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            serve(&storage, &cmd_rx, &ui_tx).await;
            tracing::info!("backend command queue closed; worker exiting");
        });
    })
}

/// Handles commands until every sender is dropped. Each command ends with a
/// fresh catalog so the UI never has to patch its copy.
pub async fn serve<S>(store: &S, cmd_rx: &Receiver<BackendCommand>, ui_tx: &Sender<UiEvent>)
where
    S: HarvestScheduleStore + ?Sized,
{
    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend command received");
        match cmd {
            BackendCommand::LoadCatalog => {}
            BackendCommand::ApplyIntent(intent) => match store.apply_intent(&intent).await {
                Ok(applied) => {
                    let _ = ui_tx.try_send(UiEvent::Info(describe_applied(&applied)));
                }
                Err(err) => {
                    tracing::warn!(?intent, "failed to apply intent: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(storage_error(
                        UiErrorContext::ApplyIntent,
                        err,
                    )));
                }
            },
        }
        publish_catalog(store, ui_tx).await;
    }
}

async fn publish_catalog<S>(store: &S, ui_tx: &Sender<UiEvent>)
where
    S: HarvestScheduleStore + ?Sized,
{
    match store.snapshot().await {
        Ok(snapshot) => {
            if ui_tx.try_send(UiEvent::CatalogLoaded(snapshot)).is_err() {
                tracing::warn!("ui event queue unavailable; dropped catalog snapshot");
            }
        }
        Err(err) => {
            tracing::error!("failed to load catalog: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(storage_error(
                UiErrorContext::LoadCatalog,
                err,
            )));
        }
    }
}

fn storage_error(context: UiErrorContext, err: anyhow::Error) -> UiError {
    match err.downcast::<ApiException>() {
        Ok(exception) => UiError::from_api(context, exception.into()),
        Err(err) => UiError::from_message(context, format!("{err:#}")),
    }
}

fn describe_applied(applied: &AppliedIntent) -> String {
    match applied {
        AppliedIntent::Created(target) => format!("Created {target}"),
        AppliedIntent::Updated(target) => format!("Saved {target}"),
        AppliedIntent::Deleted {
            target,
            cascaded_jobs: 0,
        } => format!("Removed {target}"),
        AppliedIntent::Deleted {
            target,
            cascaded_jobs: 1,
        } => format!("Removed {target} and 1 harvest job"),
        AppliedIntent::Deleted {
            target,
            cascaded_jobs,
        } => format!("Removed {target} and {cascaded_jobs} harvest jobs"),
    }
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
