use std::path::PathBuf;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::{events::UiEvent, orchestration::QueuedIntentSink};
use ui::HarvesterAdminApp;

#[derive(Debug, Parser)]
#[command(
    name = "harvester_admin",
    about = "Manage institutions and their OAI-PMH harvest jobs"
)]
struct Args {
    /// Config file to read instead of ./harvester_admin.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Database URL or path; overrides the config file and environment.
    #[arg(long)]
    database_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref());
    if let Some(database_url) = args.database_url {
        settings.database_url = config::normalize_database_url(&database_url);
    }
    tracing::info!(database_url = %settings.database_url, "starting harvester admin");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    backend_bridge::runtime::launch(settings.database_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(settings.window_title.clone())
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        &settings.window_title,
        options,
        Box::new(|_cc| {
            Ok(Box::new(HarvesterAdminApp::new(
                QueuedIntentSink::new(cmd_tx),
                ui_rx,
            )))
        }),
    )
}
