use super::*;
use serde_json::json;

fn sample_job(id: i64, institution_id: i64) -> Job {
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

#[test]
fn delete_intent_serializes_operation_and_target() {
    let intent = Intent::Delete {
        target: RecordRef::Job {
            institution_id: InstitutionId(1),
            id: JobId(7),
        },
    };

    let value = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(
        value,
        json!({
            "operation": "delete",
            "target": { "kind": "job", "institutionID": 1, "id": 7 }
        })
    );
    assert_eq!(intent.operation(), Operation::Delete);
    assert_eq!(intent.record_kind(), RecordKind::Job);
}

#[test]
fn job_uses_camel_case_wire_field_names() {
    let value = serde_json::to_value(sample_job(1, 1)).expect("serialize");
    assert_eq!(value["institutionID"], json!(1));
    assert_eq!(value["repositoryBaseURL"], json!("http://example.edu/provider"));
    assert_eq!(value["scheduleCronExpression"], json!("0 0 0 * * ?"));
    assert_eq!(value["lastSuccessfulRun"], json!(null));
}

#[test]
fn missing_metadata_prefix_defaults_to_oai_dc() {
    let job: NewJob = serde_json::from_value(json!({
        "institutionID": 3,
        "repositoryBaseURL": "http://example.edu/provider",
        "scheduleCronExpression": "0 0 0 * * ?"
    }))
    .expect("deserialize");

    assert_eq!(job.metadata_prefix, "oai_dc");
    assert!(job.sets.is_empty());
}

#[test]
fn create_intent_reports_record_kind_of_payload() {
    let intent = Intent::Create {
        record: NewRecord::Institution(NewInstitution {
            name: "New U".to_string(),
            ..Default::default()
        }),
    };
    assert_eq!(intent.operation(), Operation::Create);
    assert_eq!(intent.record_kind(), RecordKind::Institution);
}

#[test]
fn snapshot_groups_jobs_by_institution() {
    let institution = Institution {
        id: InstitutionId(1),
        name: "Test Institution".to_string(),
        description: None,
        location: None,
        website: None,
        email: None,
        phone: None,
        web_contact: None,
    };
    let snapshot = CatalogSnapshot::from_records(
        vec![institution],
        vec![sample_job(1, 1), sample_job(2, 1)],
    );

    assert_eq!(snapshot.institutions.len(), 1);
    assert_eq!(snapshot.job_count(), 2);
    assert_eq!(snapshot.jobs[&InstitutionId(1)].len(), 2);
}
