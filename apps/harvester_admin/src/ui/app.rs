//! Admin screen: institution list with job rows, plus the one dialog the
//! workflow currently has open.

use std::time::Duration;

use admin_core::{
    panels::{InstitutionRow, NO_JOBS_PLACEHOLDER},
    view::{INSTITUTION_FIELD_LABELS, JOB_FIELD_LABELS},
    AdminAction, AdminView, Dialog, Draft, JobList, JobPanel, PanelButton, WorkflowError,
};
use crossbeam_channel::Receiver;
use eframe::egui;
use shared::domain::{InstitutionId, JobId, NewInstitution, NewJob};

use crate::controller::{
    events::{UiError, UiErrorCategory, UiErrorContext, UiEvent},
    orchestration::QueuedIntentSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::NotFound => "Not found",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogOutcome {
    Open,
    Submit,
    Confirm,
    Cancel,
}

pub struct HarvesterAdminApp {
    view: AdminView<QueuedIntentSink>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    status_banner: Option<StatusBanner>,
    /// Editable text behind the job form's sets, one set per line.
    sets_text: String,
    catalog_loaded: bool,
}

impl HarvesterAdminApp {
    pub fn new(sink: QueuedIntentSink, ui_rx: Receiver<UiEvent>) -> Self {
        let mut app = Self {
            view: AdminView::new(sink),
            ui_rx,
            status: "Loading catalog...".to_string(),
            status_banner: None,
            sets_text: String::new(),
            catalog_loaded: false,
        };
        app.view.sink_mut().request_catalog();
        app.collect_queue_failure();
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::CatalogLoaded(snapshot) => {
                    self.catalog_loaded = true;
                    match self.view.replace(snapshot) {
                        Ok(()) => {}
                        Err(err @ WorkflowError::StaleTarget(_)) => {
                            self.sets_text.clear();
                            self.set_banner(StatusBannerSeverity::Warning, &UiError::from_workflow(&err));
                        }
                        Err(err) => {
                            self.set_banner(StatusBannerSeverity::Error, &UiError::from_workflow(&err));
                        }
                    }
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "backend error: {}", err.message());
                    self.set_banner(StatusBannerSeverity::Error, &err);
                }
            }
        }
    }

    fn set_banner(&mut self, severity: StatusBannerSeverity, err: &UiError) {
        self.status_banner = Some(StatusBanner {
            severity,
            message: format!("{}: {}", err_label(err.category()), err.message()),
        });
    }

    fn collect_queue_failure(&mut self) {
        if let Some(message) = self.view.sink_mut().take_failure() {
            let err = UiError::from_message(UiErrorContext::General, message);
            self.set_banner(StatusBannerSeverity::Error, &err);
        }
    }

    fn handle_action(&mut self, action: AdminAction) {
        match self.view.dispatch(action) {
            Ok(()) => {
                self.status_banner = None;
                self.sets_text = match self.view.form() {
                    Some(Draft::Job { fields, .. }) => fields.sets.join("\n"),
                    _ => String::new(),
                };
            }
            Err(err) => self.set_banner(StatusBannerSeverity::Error, &UiError::from_workflow(&err)),
        }
    }

    fn finish_dialog(&mut self, outcome: DialogOutcome) {
        let result = match outcome {
            DialogOutcome::Open => return,
            DialogOutcome::Submit => self.view.submit(),
            DialogOutcome::Confirm => self.view.confirm(),
            DialogOutcome::Cancel => {
                self.view.cancel();
                Ok(())
            }
        };
        match result {
            Ok(()) => {
                self.status_banner = None;
                if outcome != DialogOutcome::Cancel {
                    self.status = "Saving...".to_string();
                }
            }
            Err(err @ WorkflowError::StaleTarget(_)) => {
                self.set_banner(StatusBannerSeverity::Warning, &UiError::from_workflow(&err));
            }
            Err(err) => self.set_banner(StatusBannerSeverity::Error, &UiError::from_workflow(&err)),
        }
        if self.view.state().is_idle() {
            self.sets_text.clear();
        }
        self.collect_queue_failure();
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
                StatusBannerSeverity::Warning => (
                    egui::Color32::from_rgb(110, 88, 40),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(180, 150, 80)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(6.0);
        }
    }

    fn show_catalog(&mut self, ctx: &egui::Context) {
        let panel = self.view.panel();
        let mut clicked: Option<AdminAction> = None;
        let dialog_open = self.view.dialog() != Dialog::None;

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);

            ui.horizontal(|ui| {
                ui.heading("Institutions");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_enabled_ui(!dialog_open, |ui| {
                        panel_button(ui, panel.add_institution, &mut clicked);
                    });
                });
            });
            ui.separator();

            if !self.catalog_loaded {
                ui.spinner();
                return;
            }
            if panel.rows.is_empty() {
                ui.weak("No institutions yet.");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_enabled_ui(!dialog_open, |ui| {
                    for row in &panel.rows {
                        institution_row(ui, row, &mut clicked);
                    }
                });
            });
        });

        if let Some(action) = clicked {
            self.handle_action(action);
        }
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let dialog = self.view.dialog();
        if dialog == Dialog::None {
            return;
        }
        let title = dialog.title().to_string();
        let labels = dialog.field_labels();
        let notice = match &dialog {
            Dialog::ConfirmRemoval(notice) => Some(notice.clone()),
            _ => None,
        };
        let institution_name = match &dialog {
            Dialog::JobForm {
                institution_name, ..
            } => institution_name.to_string(),
            _ => String::new(),
        };
        drop(dialog);

        let mut outcome = DialogOutcome::Open;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                if let Some(notice) = &notice {
                    ui.label(&notice.message);
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Remove").clicked() {
                            outcome = DialogOutcome::Confirm;
                        }
                        if ui.button("Cancel").clicked() {
                            outcome = DialogOutcome::Cancel;
                        }
                    });
                    return;
                }

                match self.view.form_mut() {
                    Some(Draft::Institution { id, fields }) => {
                        institution_form(ui, &labels, *id, fields);
                    }
                    Some(Draft::Job { id, fields }) => {
                        job_form(ui, &labels, &institution_name, *id, fields, &mut self.sets_text);
                    }
                    None => {}
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        outcome = DialogOutcome::Submit;
                    }
                    if ui.button("Cancel").clicked() {
                        outcome = DialogOutcome::Cancel;
                    }
                });
            });

        self.finish_dialog(outcome);
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let store = self.view.store();
                    let jobs: usize = store.jobs().values().map(|jobs| jobs.len()).sum();
                    ui.small(format!(
                        "{} institutions, {} jobs",
                        store.institutions().len(),
                        jobs
                    ));
                });
            });
        });
    }
}

impl eframe::App for HarvesterAdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_status_bar(ctx);
        self.show_catalog(ctx);
        self.show_dialog(ctx);

        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

fn panel_button(ui: &mut egui::Ui, button: PanelButton, clicked: &mut Option<AdminAction>) {
    if ui.button(button.label).clicked() {
        *clicked = Some(button.action);
    }
}

fn institution_row(ui: &mut egui::Ui, row: &InstitutionRow, clicked: &mut Option<AdminAction>) {
    egui::CollapsingHeader::new(egui::RichText::new(&row.name).strong())
        .id_salt(("institution", row.id))
        .default_open(true)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                for button in row.buttons {
                    panel_button(ui, button, clicked);
                }
            });
            if !row.details.is_empty() {
                egui::Grid::new(("institution_details", row.id))
                    .num_columns(2)
                    .show(ui, |ui| {
                        for (label, value) in &row.details {
                            ui.weak(*label);
                            ui.label(value);
                            ui.end_row();
                        }
                    });
            }
            ui.add_space(4.0);

            match &row.jobs {
                JobList::Empty => {
                    ui.weak(NO_JOBS_PLACEHOLDER);
                }
                JobList::Jobs(jobs) => {
                    for job in jobs {
                        job_card(ui, job, clicked);
                    }
                }
            }
        });
}

fn job_card(ui: &mut egui::Ui, job: &JobPanel, clicked: &mut Option<AdminAction>) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::symmetric(8, 6))
        .show(ui, |ui| {
            egui::Grid::new(("job", job.institution_id, job.job_id))
                .num_columns(2)
                .show(ui, |ui| {
                    ui.weak("Repository");
                    ui.label(&job.repository_base_url);
                    ui.end_row();
                    ui.weak("Sets");
                    ui.vertical(|ui| {
                        for set in job.sets.labels() {
                            ui.label(set);
                        }
                    });
                    ui.end_row();
                    ui.weak("Metadata prefix");
                    ui.label(&job.metadata_prefix);
                    ui.end_row();
                    ui.weak("Schedule");
                    ui.monospace(&job.schedule);
                    ui.end_row();
                    ui.weak("Last successful run");
                    ui.label(&job.last_successful_run);
                    ui.end_row();
                });
            ui.horizontal(|ui| {
                for button in job.buttons {
                    panel_button(ui, button, clicked);
                }
            });
        });
}

fn institution_form(
    ui: &mut egui::Ui,
    labels: &[&'static str],
    id: Option<InstitutionId>,
    fields: &mut NewInstitution,
) {
    let [name, description, location, website, email, phone, web_contact] =
        INSTITUTION_FIELD_LABELS;
    egui::Grid::new("institution_form")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            if let (Some(id), Some(label)) = (id, labels.first()) {
                ui.label(*label);
                ui.monospace(id.to_string());
                ui.end_row();
            }
            ui.label(name);
            ui.text_edit_singleline(&mut fields.name);
            ui.end_row();
            optional_text_row(ui, description, &mut fields.description);
            optional_text_row(ui, location, &mut fields.location);
            optional_text_row(ui, website, &mut fields.website);
            optional_text_row(ui, email, &mut fields.email);
            optional_text_row(ui, phone, &mut fields.phone);
            optional_text_row(ui, web_contact, &mut fields.web_contact);
        });
}

fn job_form(
    ui: &mut egui::Ui,
    labels: &[&'static str],
    institution_name: &str,
    id: Option<JobId>,
    fields: &mut NewJob,
    sets_text: &mut String,
) {
    let [url, sets, prefix, schedule] = JOB_FIELD_LABELS;
    egui::Grid::new("job_form")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            if let (Some(id), Some(label)) = (id, labels.first()) {
                ui.label(*label);
                ui.monospace(id.to_string());
                ui.end_row();
            }
            ui.label("Institution");
            ui.label(institution_name);
            ui.end_row();
            ui.label(url);
            ui.text_edit_singleline(&mut fields.repository_base_url);
            ui.end_row();
            ui.label(sets);
            ui.vertical(|ui| {
                if ui.text_edit_multiline(sets_text).changed() {
                    fields.sets = parse_sets(sets_text);
                }
                ui.small("One set per line. Leave empty to harvest the entire repository.");
            });
            ui.end_row();
            ui.label(prefix);
            ui.text_edit_singleline(&mut fields.metadata_prefix);
            ui.end_row();
            ui.label(schedule);
            ui.text_edit_singleline(&mut fields.schedule_cron_expression);
            ui.end_row();
        });
}

fn optional_text_row(ui: &mut egui::Ui, label: &str, value: &mut Option<String>) {
    ui.label(label);
    let mut text = value.clone().unwrap_or_default();
    if ui.text_edit_singleline(&mut text).changed() {
        *value = if text.is_empty() { None } else { Some(text) };
    }
    ui.end_row();
}

/// One set per non-blank line, surrounding whitespace trimmed.
pub fn parse_sets(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
