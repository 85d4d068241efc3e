use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use shared::{
    domain::{Institution, InstitutionId, Job, JobId},
    protocol::CatalogSnapshot,
};

use crate::store::CollectionStore;

pub(crate) fn test_institution(id: i64) -> Institution {
    Institution {
        id: InstitutionId(id),
        name: "Test Institution".to_string(),
        description: Some("A description of the institution.".to_string()),
        location: Some("The location of the institution.".to_string()),
        website: Some("http://example.edu".to_string()),
        email: Some("test@example.edu".to_string()),
        phone: Some("+1 800 200 0000".to_string()),
        web_contact: Some("http://example.edu/contact".to_string()),
    }
}

pub(crate) fn test_job(id: i64, institution_id: i64) -> Job {
    Job {
        id: JobId(id),
        institution_id: InstitutionId(institution_id),
        repository_base_url: "http://example.edu/provider".to_string(),
        sets: Vec::new(),
        metadata_prefix: "oai_dc".to_string(),
        schedule_cron_expression: "0 0 0 * * ?".to_string(),
        last_successful_run: None,
    }
}

pub(crate) fn selective_job(id: i64, institution_id: i64) -> Job {
    Job {
        sets: vec!["set1".to_string(), "set2".to_string()],
        last_successful_run: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single(),
        ..test_job(id, institution_id)
    }
}

pub(crate) fn snapshot(institutions: Vec<Institution>, jobs: Vec<Job>) -> CatalogSnapshot {
    CatalogSnapshot::from_records(institutions, jobs)
}

/// One institution with no jobs.
pub(crate) fn single_institution_store() -> CollectionStore {
    CollectionStore::from_snapshot(snapshot(vec![test_institution(1)], Vec::new()))
        .expect("valid snapshot")
}

/// Institution 1 with jobs 1 and 2, institution 2 with none.
pub(crate) fn populated_store() -> CollectionStore {
    CollectionStore::from_snapshot(snapshot(
        vec![test_institution(1), test_institution(2)],
        vec![test_job(1, 1), selective_job(2, 1)],
    ))
    .expect("valid snapshot")
}

pub(crate) fn jobs_of(jobs: Vec<Job>) -> BTreeMap<InstitutionId, BTreeMap<JobId, Job>> {
    snapshot(Vec::new(), jobs).jobs
}
