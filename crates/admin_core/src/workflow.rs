//! Proposal state machine for adding, editing and removing institutions and jobs.
//!
//! Exactly one proposal is live at a time. A new request replaces whatever was
//! in progress; submit, confirm and cancel all return to [`WorkflowState::Idle`].

use shared::{
    domain::{InstitutionId, JobId, NewInstitution, NewJob, RecordKind, RecordRef},
    protocol::{Intent, NewRecord, Record},
};
use tracing::{debug, info, warn};

use crate::{
    error::{FieldIssue, Problem, ValidationError, WorkflowError},
    store::CollectionStore,
    validate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    ProposingAddInstitution,
    ProposingEditInstitution(InstitutionId),
    ConfirmingRemoveInstitution(InstitutionId),
    ProposingAddJob(InstitutionId),
    ProposingEditJob {
        institution_id: InstitutionId,
        job_id: JobId,
    },
    ConfirmingRemoveJob {
        institution_id: InstitutionId,
        job_id: JobId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalKind {
    None,
    AddInstitution,
    EditInstitution,
    RemoveInstitution,
    AddJob,
    EditJob,
    RemoveJob,
}

/// Flattened description of the live proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    pub kind: ProposalKind,
    pub target_institution_id: Option<InstitutionId>,
    pub target_job_id: Option<JobId>,
}

impl WorkflowState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_proposing(&self) -> bool {
        matches!(
            self,
            Self::ProposingAddInstitution
                | Self::ProposingEditInstitution(_)
                | Self::ProposingAddJob(_)
                | Self::ProposingEditJob { .. }
        )
    }

    pub fn is_confirming(&self) -> bool {
        matches!(
            self,
            Self::ConfirmingRemoveInstitution(_) | Self::ConfirmingRemoveJob { .. }
        )
    }

    /// The record this state must keep resolvable, if any. Adding a job
    /// depends on its parent institution.
    pub fn target(&self) -> Option<RecordRef> {
        match *self {
            Self::Idle | Self::ProposingAddInstitution => None,
            Self::ProposingEditInstitution(id)
            | Self::ConfirmingRemoveInstitution(id)
            | Self::ProposingAddJob(id) => Some(RecordRef::Institution { id }),
            Self::ProposingEditJob {
                institution_id,
                job_id,
            }
            | Self::ConfirmingRemoveJob {
                institution_id,
                job_id,
            } => Some(RecordRef::Job {
                institution_id,
                id: job_id,
            }),
        }
    }

    pub fn proposal(&self) -> Proposal {
        let kind = match self {
            Self::Idle => ProposalKind::None,
            Self::ProposingAddInstitution => ProposalKind::AddInstitution,
            Self::ProposingEditInstitution(_) => ProposalKind::EditInstitution,
            Self::ConfirmingRemoveInstitution(_) => ProposalKind::RemoveInstitution,
            Self::ProposingAddJob(_) => ProposalKind::AddJob,
            Self::ProposingEditJob { .. } => ProposalKind::EditJob,
            Self::ConfirmingRemoveJob { .. } => ProposalKind::RemoveJob,
        };
        let (target_institution_id, target_job_id) = match self.target() {
            None => (None, None),
            Some(RecordRef::Institution { id }) => (Some(id), None),
            Some(RecordRef::Job { institution_id, id }) => (Some(institution_id), Some(id)),
        };
        Proposal {
            kind,
            target_institution_id,
            target_job_id,
        }
    }
}

/// Contents of an add or edit form as handed to [`WorkflowController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Institution {
        id: Option<InstitutionId>,
        fields: NewInstitution,
    },
    Job {
        id: Option<JobId>,
        fields: NewJob,
    },
}

impl Draft {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Institution { .. } => RecordKind::Institution,
            Self::Job { .. } => RecordKind::Job,
        }
    }
}

#[derive(Debug, Default)]
pub struct WorkflowController {
    state: WorkflowState,
}

impl WorkflowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn request_add_institution(&mut self) {
        self.enter(WorkflowState::ProposingAddInstitution);
    }

    pub fn request_edit_institution(
        &mut self,
        store: &CollectionStore,
        id: InstitutionId,
    ) -> Result<(), WorkflowError> {
        require(store, RecordRef::Institution { id })?;
        self.enter(WorkflowState::ProposingEditInstitution(id));
        Ok(())
    }

    pub fn request_remove_institution(
        &mut self,
        store: &CollectionStore,
        id: InstitutionId,
    ) -> Result<(), WorkflowError> {
        require(store, RecordRef::Institution { id })?;
        self.enter(WorkflowState::ConfirmingRemoveInstitution(id));
        Ok(())
    }

    pub fn request_add_job(
        &mut self,
        store: &CollectionStore,
        institution_id: InstitutionId,
    ) -> Result<(), WorkflowError> {
        require(store, RecordRef::Institution { id: institution_id })?;
        self.enter(WorkflowState::ProposingAddJob(institution_id));
        Ok(())
    }

    pub fn request_edit_job(
        &mut self,
        store: &CollectionStore,
        institution_id: InstitutionId,
        job_id: JobId,
    ) -> Result<(), WorkflowError> {
        require_job(store, institution_id, job_id)?;
        self.enter(WorkflowState::ProposingEditJob {
            institution_id,
            job_id,
        });
        Ok(())
    }

    pub fn request_remove_job(
        &mut self,
        store: &CollectionStore,
        institution_id: InstitutionId,
        job_id: JobId,
    ) -> Result<(), WorkflowError> {
        require_job(store, institution_id, job_id)?;
        self.enter(WorkflowState::ConfirmingRemoveJob {
            institution_id,
            job_id,
        });
        Ok(())
    }

    /// Drops the live proposal. Returns `false` when there was nothing to drop.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_idle() {
            return false;
        }
        debug!(proposal = ?self.state, "proposal cancelled");
        self.state = WorkflowState::Idle;
        true
    }

    /// Validates `draft` against the open form and turns it into a create or
    /// update intent. On a validation failure the form stays open.
    pub fn submit(
        &mut self,
        store: &CollectionStore,
        draft: Draft,
    ) -> Result<Intent, WorkflowError> {
        if !self.state.is_proposing() {
            return Err(WorkflowError::NoActiveForm);
        }
        self.ensure_target(store)?;

        let intent = match (self.state, draft) {
            (WorkflowState::ProposingAddInstitution, Draft::Institution { id, fields }) => {
                let mut issues = Vec::new();
                if id.is_some() {
                    issues.push(unassigned_id());
                }
                validate::institution_fields(&fields, &mut issues);
                reject_if_any(issues)?;
                Intent::Create {
                    record: NewRecord::Institution(fields),
                }
            }
            (WorkflowState::ProposingEditInstitution(target), Draft::Institution { id, fields }) => {
                let mut issues = Vec::new();
                check_same_id("id", target, id, &mut issues);
                validate::institution_fields(&fields, &mut issues);
                reject_if_any(issues)?;
                Intent::Update {
                    record: Record::Institution(fields.with_id(target)),
                }
            }
            (WorkflowState::ProposingAddJob(institution_id), Draft::Job { id, fields }) => {
                let mut issues = Vec::new();
                if id.is_some() {
                    issues.push(unassigned_id());
                }
                check_same_id(
                    "institutionID",
                    institution_id,
                    Some(fields.institution_id),
                    &mut issues,
                );
                validate::job_fields(&fields, &mut issues);
                reject_if_any(issues)?;
                Intent::Create {
                    record: NewRecord::Job(fields),
                }
            }
            (
                WorkflowState::ProposingEditJob {
                    institution_id,
                    job_id,
                },
                Draft::Job { id, fields },
            ) => {
                let mut issues = Vec::new();
                check_same_id("id", job_id, id, &mut issues);
                check_same_id(
                    "institutionID",
                    institution_id,
                    Some(fields.institution_id),
                    &mut issues,
                );
                validate::job_fields(&fields, &mut issues);
                reject_if_any(issues)?;
                let last_successful_run = store
                    .job(institution_id, job_id)
                    .and_then(|job| job.last_successful_run);
                Intent::Update {
                    record: Record::Job(fields.with_id(job_id, last_successful_run)),
                }
            }
            (state, draft) => {
                let expected = if matches!(
                    state,
                    WorkflowState::ProposingAddInstitution
                        | WorkflowState::ProposingEditInstitution(_)
                ) {
                    RecordKind::Institution
                } else {
                    RecordKind::Job
                };
                return Err(ValidationError {
                    issues: vec![FieldIssue {
                        field: "payload",
                        problem: Problem::WrongKind {
                            expected,
                            found: draft.kind(),
                        },
                    }],
                }
                .into());
            }
        };

        self.finish(intent)
    }

    /// Turns a pending removal into a delete intent.
    pub fn confirm(&mut self, store: &CollectionStore) -> Result<Intent, WorkflowError> {
        if !self.state.is_confirming() {
            return Err(WorkflowError::NoPendingRemoval);
        }
        self.ensure_target(store)?;

        let Some(target) = self.state.target() else {
            return Err(WorkflowError::NoPendingRemoval);
        };
        self.finish(Intent::Delete { target })
    }

    /// Re-checks the live proposal after a store refresh. A proposal whose
    /// target vanished is discarded and reported as [`WorkflowError::StaleTarget`].
    pub fn reconcile(&mut self, store: &CollectionStore) -> Result<(), WorkflowError> {
        self.ensure_target(store)
    }

    fn ensure_target(&mut self, store: &CollectionStore) -> Result<(), WorkflowError> {
        match self.state.target() {
            Some(target) if !store.contains(target) => {
                warn!(proposal = ?self.state, record = %target, "proposal target disappeared; returning to idle");
                self.state = WorkflowState::Idle;
                Err(WorkflowError::StaleTarget(target))
            }
            _ => Ok(()),
        }
    }

    fn enter(&mut self, next: WorkflowState) {
        if !self.state.is_idle() {
            debug!(previous = ?self.state, next = ?next, "replacing live proposal");
        }
        debug!(proposal = ?next, "proposal opened");
        self.state = next;
    }

    fn finish(&mut self, intent: Intent) -> Result<Intent, WorkflowError> {
        info!(
            operation = ?intent.operation(),
            record_kind = %intent.record_kind(),
            "emitting intent"
        );
        self.state = WorkflowState::Idle;
        Ok(intent)
    }
}

fn require(store: &CollectionStore, record: RecordRef) -> Result<(), WorkflowError> {
    if store.contains(record) {
        Ok(())
    } else {
        Err(WorkflowError::NotFound(record))
    }
}

fn require_job(
    store: &CollectionStore,
    institution_id: InstitutionId,
    job_id: JobId,
) -> Result<(), WorkflowError> {
    require(store, RecordRef::Institution { id: institution_id })?;
    require(
        store,
        RecordRef::Job {
            institution_id,
            id: job_id,
        },
    )
}

fn unassigned_id() -> FieldIssue {
    FieldIssue {
        field: "id",
        problem: Problem::Unassigned,
    }
}

fn check_same_id<T>(field: &'static str, expected: T, found: Option<T>, issues: &mut Vec<FieldIssue>)
where
    T: PartialEq + ToString,
{
    match found {
        Some(found) if found == expected => {}
        Some(found) => issues.push(FieldIssue {
            field,
            problem: Problem::Mismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }),
        None => issues.push(FieldIssue {
            field,
            problem: Problem::Blank,
        }),
    }
}

fn reject_if_any(issues: Vec<FieldIssue>) -> Result<(), ValidationError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
