//! UI layer for the harvester admin: egui app shell over the admin view.

pub mod app;

pub use app::HarvesterAdminApp;
