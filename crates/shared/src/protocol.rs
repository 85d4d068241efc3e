use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Institution, InstitutionId, Job, JobId, NewInstitution, NewJob, RecordKind, RecordRef};

pub type InstitutionMap = BTreeMap<InstitutionId, Institution>;
pub type JobMap = BTreeMap<InstitutionId, BTreeMap<JobId, Job>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum NewRecord {
    Institution(NewInstitution),
    Job(NewJob),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum Record {
    Institution(Institution),
    Job(Job),
}

impl Record {
    pub fn record_ref(&self) -> RecordRef {
        match self {
            Self::Institution(institution) => RecordRef::Institution { id: institution.id },
            Self::Job(job) => RecordRef::Job {
                institution_id: job.institution_id,
                id: job.id,
            },
        }
    }
}

/// A finalized create/update/delete instruction for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Intent {
    Create { record: NewRecord },
    Update { record: Record },
    Delete { target: RecordRef },
}

impl Intent {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Self::Create {
                record: NewRecord::Institution(_),
            }
            | Self::Update {
                record: Record::Institution(_),
            } => RecordKind::Institution,
            Self::Create {
                record: NewRecord::Job(_),
            }
            | Self::Update {
                record: Record::Job(_),
            } => RecordKind::Job,
            Self::Delete { target } => target.kind(),
        }
    }
}

/// Full replacement of both collections, as produced by the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub institutions: InstitutionMap,
    pub jobs: JobMap,
}

impl CatalogSnapshot {
    /// Groups a flat job listing under its institutions.
    pub fn from_records(
        institutions: impl IntoIterator<Item = Institution>,
        jobs: impl IntoIterator<Item = Job>,
    ) -> Self {
        let institutions = institutions
            .into_iter()
            .map(|institution| (institution.id, institution))
            .collect();
        let mut grouped = JobMap::new();
        for job in jobs {
            grouped
                .entry(job.institution_id)
                .or_default()
                .insert(job.id, job);
        }
        Self {
            institutions,
            jobs: grouped,
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
