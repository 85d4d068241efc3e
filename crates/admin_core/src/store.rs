//! Read-only view of the institutions and jobs known to the admin UI.
//!
//! Contents are only ever replaced wholesale by a refresh from the persistence
//! collaborator; nothing in the core patches individual records.

use std::collections::BTreeMap;

use shared::{
    domain::{Institution, InstitutionId, Job, JobId, RecordRef},
    protocol::{CatalogSnapshot, InstitutionMap, JobMap},
};
use tracing::{debug, warn};

use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct CollectionStore {
    institutions: InstitutionMap,
    jobs: JobMap,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.replace(snapshot)?;
        Ok(store)
    }

    pub fn institutions(&self) -> &InstitutionMap {
        &self.institutions
    }

    pub fn jobs(&self) -> &JobMap {
        &self.jobs
    }

    pub fn institution(&self, id: InstitutionId) -> Option<&Institution> {
        self.institutions.get(&id)
    }

    pub fn job(&self, institution_id: InstitutionId, job_id: JobId) -> Option<&Job> {
        self.jobs.get(&institution_id)?.get(&job_id)
    }

    /// Jobs of one institution in ascending ID order.
    pub fn jobs_for(&self, institution_id: InstitutionId) -> impl Iterator<Item = &Job> + '_ {
        self.jobs
            .get(&institution_id)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    pub fn job_ids_for(&self, institution_id: InstitutionId) -> Vec<JobId> {
        self.jobs_for(institution_id).map(|job| job.id).collect()
    }

    pub fn contains(&self, record: RecordRef) -> bool {
        match record {
            RecordRef::Institution { id } => self.institutions.contains_key(&id),
            RecordRef::Job { institution_id, id } => self.job(institution_id, id).is_some(),
        }
    }

    /// Replaces every institution. Jobs of institutions that disappear are
    /// dropped in the same step; returns how many were dropped.
    pub fn refresh_institutions(&mut self, institutions: InstitutionMap) -> Result<usize, StoreError> {
        check_institution_keys(&institutions)?;

        let mut dropped = 0;
        self.jobs.retain(|institution_id, jobs| {
            let keep = institutions.contains_key(institution_id);
            if !keep {
                dropped += jobs.len();
            }
            keep
        });
        if dropped > 0 {
            warn!(dropped, "institution refresh removed institutions that still had jobs");
        }

        self.institutions = institutions;
        debug!(
            institutions = self.institutions.len(),
            "institutions refreshed"
        );
        Ok(dropped)
    }

    /// Replaces every job. Rejected, leaving the store untouched, when a job
    /// points at an unknown institution or sits under the wrong keys.
    pub fn refresh_jobs(&mut self, jobs: JobMap) -> Result<(), StoreError> {
        check_job_keys(&self.institutions, &jobs)?;
        self.jobs = jobs;
        debug!(
            jobs = self.jobs.values().map(BTreeMap::len).sum::<usize>(),
            "jobs refreshed"
        );
        Ok(())
    }

    /// Atomically swaps both collections after validating them together.
    pub fn replace(&mut self, snapshot: CatalogSnapshot) -> Result<(), StoreError> {
        check_institution_keys(&snapshot.institutions)?;
        check_job_keys(&snapshot.institutions, &snapshot.jobs)?;
        debug!(
            institutions = snapshot.institutions.len(),
            jobs = snapshot.job_count(),
            "catalog replaced"
        );
        self.institutions = snapshot.institutions;
        self.jobs = snapshot.jobs;
        Ok(())
    }
}

fn check_institution_keys(institutions: &InstitutionMap) -> Result<(), StoreError> {
    for (key, institution) in institutions {
        if *key != institution.id {
            return Err(StoreError::KeyMismatch {
                record: RecordRef::Institution { id: institution.id },
                key: RecordRef::Institution { id: *key },
            });
        }
    }
    Ok(())
}

fn check_job_keys(institutions: &InstitutionMap, jobs: &JobMap) -> Result<(), StoreError> {
    let orphans: Vec<InstitutionId> = jobs
        .keys()
        .filter(|id| !institutions.contains_key(id))
        .copied()
        .collect();
    if !orphans.is_empty() {
        return Err(StoreError::OrphanJobs(orphans));
    }

    for (institution_id, by_id) in jobs {
        for (job_id, job) in by_id {
            if job.institution_id != *institution_id || job.id != *job_id {
                return Err(StoreError::KeyMismatch {
                    record: RecordRef::Job {
                        institution_id: job.institution_id,
                        id: job.id,
                    },
                    key: RecordRef::Job {
                        institution_id: *institution_id,
                        id: *job_id,
                    },
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
