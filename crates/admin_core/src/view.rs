//! Composition root: owns the store, the controller and the single open form,
//! and forwards finalized intents to the persistence collaborator.

use shared::{
    domain::{InstitutionId, JobId, NewInstitution, NewJob, RecordRef},
    protocol::{CatalogSnapshot, InstitutionMap, JobMap},
};

use crate::{
    error::WorkflowError,
    panels::{AdminAction, InstitutionPanel},
    store::CollectionStore,
    workflow::{Draft, WorkflowController, WorkflowState},
    IntentSink,
};

pub const INSTITUTION_FIELD_LABELS: [&str; 7] = [
    "Name",
    "Description",
    "Location",
    "Website",
    "Email",
    "Phone",
    "Web Contact",
];
pub const JOB_FIELD_LABELS: [&str; 4] = [
    "Repository Base URL",
    "Sets",
    "Metadata Prefix",
    "Schedule (cron)",
];
pub const REMOVAL_WARNING_PREFIX: &str = "This action will remove";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

/// What a removal will take with it, as shown in the confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalNotice {
    pub target: RecordRef,
    pub title: String,
    pub message: String,
    pub cascaded_jobs: Vec<JobId>,
}

/// The one dialog the admin screen shows for the current workflow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog<'a> {
    None,
    InstitutionForm {
        mode: FormMode,
        id: Option<InstitutionId>,
        fields: &'a NewInstitution,
    },
    JobForm {
        mode: FormMode,
        institution_name: &'a str,
        id: Option<JobId>,
        fields: &'a NewJob,
    },
    ConfirmRemoval(RemovalNotice),
}

impl Dialog<'_> {
    pub fn title(&self) -> &str {
        match self {
            Self::None => "",
            Self::InstitutionForm {
                mode: FormMode::Add,
                ..
            } => "Add Institution",
            Self::InstitutionForm {
                mode: FormMode::Edit,
                ..
            } => "Edit Institution",
            Self::JobForm {
                mode: FormMode::Add,
                ..
            } => "Add Job",
            Self::JobForm {
                mode: FormMode::Edit,
                ..
            } => "Edit Job",
            Self::ConfirmRemoval(notice) => &notice.title,
        }
    }

    /// Labels of the inputs the form shows, in display order. Edit forms lead
    /// with the read-only ID.
    pub fn field_labels(&self) -> Vec<&'static str> {
        let (mode, labels): (FormMode, &[&'static str]) = match self {
            Self::InstitutionForm { mode, .. } => (*mode, INSTITUTION_FIELD_LABELS.as_slice()),
            Self::JobForm { mode, .. } => (*mode, JOB_FIELD_LABELS.as_slice()),
            Self::None | Self::ConfirmRemoval(_) => return Vec::new(),
        };
        let mut out = Vec::with_capacity(labels.len() + 1);
        if mode == FormMode::Edit {
            out.push("ID");
        }
        out.extend_from_slice(labels);
        out
    }
}

pub struct AdminView<S> {
    store: CollectionStore,
    controller: WorkflowController,
    form: Option<Draft>,
    sink: S,
}

impl<S: IntentSink> AdminView<S> {
    pub fn new(sink: S) -> Self {
        Self::with_store(CollectionStore::new(), sink)
    }

    pub fn with_store(store: CollectionStore, sink: S) -> Self {
        Self {
            store,
            controller: WorkflowController::new(),
            form: None,
            sink,
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn state(&self) -> WorkflowState {
        self.controller.state()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn panel(&self) -> InstitutionPanel {
        InstitutionPanel::build(&self.store)
    }

    pub fn form(&self) -> Option<&Draft> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut Draft> {
        self.form.as_mut()
    }

    /// Routes a panel button into the controller and opens the matching form.
    /// A failed request leaves the current proposal and form untouched.
    pub fn dispatch(&mut self, action: AdminAction) -> Result<(), WorkflowError> {
        let store = &self.store;
        let form = match action {
            AdminAction::AddInstitution => {
                self.controller.request_add_institution();
                Some(Draft::Institution {
                    id: None,
                    fields: NewInstitution::default(),
                })
            }
            AdminAction::EditInstitution(id) => {
                self.controller.request_edit_institution(store, id)?;
                store.institution(id).map(|institution| Draft::Institution {
                    id: Some(id),
                    fields: institution.fields(),
                })
            }
            AdminAction::RemoveInstitution(id) => {
                self.controller.request_remove_institution(store, id)?;
                None
            }
            AdminAction::AddJob(institution_id) => {
                self.controller.request_add_job(store, institution_id)?;
                Some(Draft::Job {
                    id: None,
                    fields: NewJob::for_institution(institution_id),
                })
            }
            AdminAction::EditJob {
                institution_id,
                job_id,
            } => {
                self.controller
                    .request_edit_job(store, institution_id, job_id)?;
                store.job(institution_id, job_id).map(|job| Draft::Job {
                    id: Some(job_id),
                    fields: job.fields(),
                })
            }
            AdminAction::RemoveJob {
                institution_id,
                job_id,
            } => {
                self.controller
                    .request_remove_job(store, institution_id, job_id)?;
                None
            }
        };
        self.form = form;
        Ok(())
    }

    pub fn dialog(&self) -> Dialog<'_> {
        match (self.controller.state(), self.form.as_ref()) {
            (WorkflowState::ProposingAddInstitution, Some(Draft::Institution { id, fields })) => {
                Dialog::InstitutionForm {
                    mode: FormMode::Add,
                    id: *id,
                    fields,
                }
            }
            (
                WorkflowState::ProposingEditInstitution(_),
                Some(Draft::Institution { id, fields }),
            ) => Dialog::InstitutionForm {
                mode: FormMode::Edit,
                id: *id,
                fields,
            },
            (WorkflowState::ProposingAddJob(institution_id), Some(Draft::Job { id, fields })) => {
                Dialog::JobForm {
                    mode: FormMode::Add,
                    institution_name: self.institution_name(institution_id),
                    id: *id,
                    fields,
                }
            }
            (
                WorkflowState::ProposingEditJob { institution_id, .. },
                Some(Draft::Job { id, fields }),
            ) => Dialog::JobForm {
                mode: FormMode::Edit,
                institution_name: self.institution_name(institution_id),
                id: *id,
                fields,
            },
            (WorkflowState::ConfirmingRemoveInstitution(id), _) => {
                Dialog::ConfirmRemoval(self.institution_removal_notice(id))
            }
            (
                WorkflowState::ConfirmingRemoveJob {
                    institution_id,
                    job_id,
                },
                _,
            ) => Dialog::ConfirmRemoval(self.job_removal_notice(institution_id, job_id)),
            _ => Dialog::None,
        }
    }

    /// Submits the open form. The form survives a validation failure so the
    /// user can correct it.
    pub fn submit(&mut self) -> Result<(), WorkflowError> {
        let draft = self.form.clone().ok_or(WorkflowError::NoActiveForm)?;
        self.submit_draft(draft)
    }

    /// Replaces the open form with `draft`, then submits it.
    pub fn submit_draft(&mut self, draft: Draft) -> Result<(), WorkflowError> {
        if !self.controller.state().is_proposing() {
            return Err(WorkflowError::NoActiveForm);
        }
        self.form = Some(draft.clone());
        match self.controller.submit(&self.store, draft) {
            Ok(intent) => {
                self.form = None;
                self.sink.on_intent(intent);
                Ok(())
            }
            Err(err) => {
                if self.controller.state().is_idle() {
                    self.form = None;
                }
                Err(err)
            }
        }
    }

    pub fn confirm(&mut self) -> Result<(), WorkflowError> {
        let intent = self.controller.confirm(&self.store)?;
        self.sink.on_intent(intent);
        Ok(())
    }

    pub fn cancel(&mut self) -> bool {
        self.form = None;
        self.controller.cancel()
    }

    pub fn refresh_institutions(&mut self, institutions: InstitutionMap) -> Result<(), WorkflowError> {
        self.store.refresh_institutions(institutions)?;
        self.reconcile()
    }

    pub fn refresh_jobs(&mut self, jobs: JobMap) -> Result<(), WorkflowError> {
        self.store.refresh_jobs(jobs)?;
        self.reconcile()
    }

    /// Applies a full snapshot. `Err(StaleTarget)` means the refresh was applied
    /// but the open proposal pointed at a record that no longer exists.
    pub fn replace(&mut self, snapshot: CatalogSnapshot) -> Result<(), WorkflowError> {
        self.store.replace(snapshot)?;
        self.reconcile()
    }

    fn reconcile(&mut self) -> Result<(), WorkflowError> {
        let result = self.controller.reconcile(&self.store);
        if self.controller.state().is_idle() {
            self.form = None;
        }
        result
    }

    fn institution_name(&self, id: InstitutionId) -> &str {
        self.store
            .institution(id)
            .map(|institution| institution.name.as_str())
            .unwrap_or_default()
    }

    fn institution_removal_notice(&self, id: InstitutionId) -> RemovalNotice {
        let name = self.institution_name(id);
        let cascaded_jobs = self.store.job_ids_for(id);
        let message = match cascaded_jobs.len() {
            0 => format!("{REMOVAL_WARNING_PREFIX} the institution \"{name}\". It has no harvest jobs."),
            1 => format!(
                "{REMOVAL_WARNING_PREFIX} the institution \"{name}\" and its 1 harvest job."
            ),
            n => format!(
                "{REMOVAL_WARNING_PREFIX} the institution \"{name}\" and all {n} of its harvest jobs."
            ),
        };
        RemovalNotice {
            target: RecordRef::Institution { id },
            title: "Remove Institution".to_string(),
            message,
            cascaded_jobs,
        }
    }

    fn job_removal_notice(&self, institution_id: InstitutionId, job_id: JobId) -> RemovalNotice {
        let name = self.institution_name(institution_id);
        let url = self
            .store
            .job(institution_id, job_id)
            .map(|job| job.repository_base_url.as_str())
            .unwrap_or_default();
        RemovalNotice {
            target: RecordRef::Job {
                institution_id,
                id: job_id,
            },
            title: "Remove Job".to_string(),
            message: format!(
                "{REMOVAL_WARNING_PREFIX} the harvest job for {url} from \"{name}\"."
            ),
            cascaded_jobs: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
