use super::*;
use crate::test_support::{
    populated_store, selective_job, single_institution_store, snapshot, test_institution,
    test_job,
};
use shared::domain::DEFAULT_METADATA_PREFIX;
use shared::protocol::Operation;

fn new_institution(name: &str) -> NewInstitution {
    NewInstitution {
        name: name.to_string(),
        ..Default::default()
    }
}

fn new_job(institution_id: i64) -> NewJob {
    NewJob {
        institution_id: InstitutionId(institution_id),
        repository_base_url: "http://example.edu/other-provider".to_string(),
        sets: vec!["set1".to_string()],
        metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
        schedule_cron_expression: "0 0 1 * * ?".to_string(),
    }
}

fn every_request(controller: &mut WorkflowController, store: &CollectionStore) {
    let one = InstitutionId(1);
    let job = JobId(1);
    controller.request_add_institution();
    controller.request_edit_institution(store, one).expect("edit");
    controller.request_remove_institution(store, one).expect("remove");
    controller.request_add_job(store, one).expect("add job");
    controller.request_edit_job(store, one, job).expect("edit job");
    controller.request_remove_job(store, one, job).expect("remove job");
}

#[test]
fn starts_idle() {
    let controller = WorkflowController::new();
    assert_eq!(controller.state(), WorkflowState::Idle);
    assert_eq!(controller.state().proposal().kind, ProposalKind::None);
}

#[test]
fn adding_an_institution_validates_then_emits_create() {
    let store = single_institution_store();
    let mut controller = WorkflowController::new();

    controller.request_add_institution();
    assert_eq!(controller.state(), WorkflowState::ProposingAddInstitution);

    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: None,
                fields: new_institution(""),
            },
        )
        .expect_err("blank name");
    match err {
        WorkflowError::Validation(validation) => assert!(validation.has_issue("name")),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(controller.state(), WorkflowState::ProposingAddInstitution);

    let intent = controller
        .submit(
            &store,
            Draft::Institution {
                id: None,
                fields: new_institution("New U"),
            },
        )
        .expect("create");
    assert_eq!(
        intent,
        Intent::Create {
            record: NewRecord::Institution(new_institution("New U")),
        }
    );
    assert_eq!(controller.state(), WorkflowState::Idle);
}

#[test]
fn whitespace_only_name_is_blank() {
    let store = single_institution_store();
    let mut controller = WorkflowController::new();
    controller.request_add_institution();

    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: None,
                fields: new_institution("   "),
            },
        )
        .expect_err("blank");
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[test]
fn switching_edit_target_submits_against_the_new_record() {
    let store = populated_store();
    let mut controller = WorkflowController::new();

    controller
        .request_edit_institution(&store, InstitutionId(1))
        .expect("edit 1");
    controller
        .request_edit_institution(&store, InstitutionId(2))
        .expect("edit 2");
    assert_eq!(
        controller.state(),
        WorkflowState::ProposingEditInstitution(InstitutionId(2))
    );

    let fields = store
        .institution(InstitutionId(2))
        .expect("institution 2")
        .fields();
    let intent = controller
        .submit(
            &store,
            Draft::Institution {
                id: Some(InstitutionId(2)),
                fields,
            },
        )
        .expect("submit");
    match intent {
        Intent::Update {
            record: Record::Institution(institution),
        } => assert_eq!(institution.id, InstitutionId(2)),
        other => panic!("unexpected intent {other:?}"),
    }
    assert!(controller.state().is_idle());
}

#[test]
fn later_request_replaces_earlier_proposal() {
    let store = populated_store();
    let mut controller = WorkflowController::new();

    controller.request_add_institution();
    controller
        .request_remove_job(&store, InstitutionId(1), JobId(2))
        .expect("remove job");

    assert_eq!(
        controller.state(),
        WorkflowState::ConfirmingRemoveJob {
            institution_id: InstitutionId(1),
            job_id: JobId(2),
        }
    );

    // The replaced add form can no longer be submitted.
    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: None,
                fields: new_institution("Ghost"),
            },
        )
        .expect_err("no form");
    assert_eq!(err, WorkflowError::NoActiveForm);
}

#[test]
fn at_most_one_proposal_is_live_across_request_sequences() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    let one = InstitutionId(1);

    let requests: Vec<Box<dyn Fn(&mut WorkflowController) + '_>> = vec![
        Box::new(|c: &mut WorkflowController| c.request_add_institution()),
        Box::new(|c: &mut WorkflowController| {
            c.request_edit_institution(&store, one).expect("edit")
        }),
        Box::new(|c: &mut WorkflowController| {
            c.request_remove_institution(&store, one).expect("remove")
        }),
        Box::new(|c: &mut WorkflowController| c.request_add_job(&store, one).expect("add job")),
        Box::new(|c: &mut WorkflowController| {
            c.request_edit_job(&store, one, JobId(1)).expect("edit job")
        }),
        Box::new(|c: &mut WorkflowController| {
            c.request_remove_job(&store, one, JobId(2)).expect("remove job")
        }),
    ];

    for first in &requests {
        for second in &requests {
            first(&mut controller);
            second(&mut controller);
            let state = controller.state();
            assert!(
                !(state.is_proposing() && state.is_confirming()),
                "{state:?} is both proposing and confirming"
            );
            assert!(!state.is_idle());
            assert!(controller.cancel());
        }
    }
}

#[test]
fn cancel_returns_to_idle_from_every_state() {
    let store = populated_store();
    let mut controller = WorkflowController::new();

    assert!(!controller.cancel());

    controller.request_add_institution();
    assert!(controller.cancel());
    assert!(controller.state().is_idle());

    every_request(&mut controller, &store);
    assert!(controller.cancel());
    assert!(controller.state().is_idle());

    for step in 0..6 {
        let one = InstitutionId(1);
        match step {
            0 => controller.request_add_institution(),
            1 => controller.request_edit_institution(&store, one).expect("edit"),
            2 => controller.request_remove_institution(&store, one).expect("remove"),
            3 => controller.request_add_job(&store, one).expect("add job"),
            4 => controller.request_edit_job(&store, one, JobId(1)).expect("edit job"),
            _ => controller
                .request_remove_job(&store, one, JobId(1))
                .expect("remove job"),
        }
        assert!(controller.cancel());
        assert_eq!(controller.state(), WorkflowState::Idle);
        assert_eq!(
            controller.confirm(&store).expect_err("nothing pending"),
            WorkflowError::NoPendingRemoval
        );
    }
}

#[test]
fn requests_for_missing_records_report_not_found_and_keep_state() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    let missing = InstitutionId(42);

    assert_eq!(
        controller.request_edit_institution(&store, missing),
        Err(WorkflowError::NotFound(RecordRef::Institution { id: missing }))
    );
    assert_eq!(
        controller.request_remove_institution(&store, missing),
        Err(WorkflowError::NotFound(RecordRef::Institution { id: missing }))
    );
    assert_eq!(
        controller.request_add_job(&store, missing),
        Err(WorkflowError::NotFound(RecordRef::Institution { id: missing }))
    );
    assert_eq!(
        controller.request_edit_job(&store, missing, JobId(1)),
        Err(WorkflowError::NotFound(RecordRef::Institution { id: missing }))
    );
    assert_eq!(
        controller.request_remove_job(&store, InstitutionId(1), JobId(99)),
        Err(WorkflowError::NotFound(RecordRef::Job {
            institution_id: InstitutionId(1),
            id: JobId(99),
        }))
    );
    assert_eq!(controller.state(), WorkflowState::Idle);

    controller
        .request_edit_institution(&store, InstitutionId(2))
        .expect("edit");
    assert!(controller.request_remove_institution(&store, missing).is_err());
    assert_eq!(
        controller.state(),
        WorkflowState::ProposingEditInstitution(InstitutionId(2))
    );
}

#[test]
fn editing_without_changes_reproduces_the_record() {
    let store = populated_store();
    let mut controller = WorkflowController::new();

    let institution = store.institution(InstitutionId(1)).expect("institution").clone();
    controller
        .request_edit_institution(&store, institution.id)
        .expect("edit");
    let intent = controller
        .submit(
            &store,
            Draft::Institution {
                id: Some(institution.id),
                fields: institution.fields(),
            },
        )
        .expect("update");
    assert_eq!(
        intent,
        Intent::Update {
            record: Record::Institution(institution),
        }
    );

    let job = store.job(InstitutionId(1), JobId(2)).expect("job").clone();
    controller
        .request_edit_job(&store, job.institution_id, job.id)
        .expect("edit job");
    let intent = controller
        .submit(
            &store,
            Draft::Job {
                id: Some(job.id),
                fields: job.fields(),
            },
        )
        .expect("update job");
    assert_eq!(
        intent,
        Intent::Update {
            record: Record::Job(job),
        }
    );
}

#[test]
fn job_update_keeps_scheduler_owned_last_run() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    let stored = selective_job(2, 1);

    controller
        .request_edit_job(&store, InstitutionId(1), JobId(2))
        .expect("edit job");
    let mut fields = stored.fields();
    fields.sets = Vec::new();
    let intent = controller
        .submit(
            &store,
            Draft::Job {
                id: Some(JobId(2)),
                fields,
            },
        )
        .expect("update");

    let Intent::Update {
        record: Record::Job(job),
    } = intent
    else {
        panic!("expected job update");
    };
    assert!(job.sets.is_empty());
    assert_eq!(job.last_successful_run, stored.last_successful_run);
}

#[test]
fn edit_submission_must_target_the_proposed_record() {
    let store = populated_store();
    let mut controller = WorkflowController::new();

    controller
        .request_edit_institution(&store, InstitutionId(1))
        .expect("edit");
    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: Some(InstitutionId(2)),
                fields: test_institution(2).fields(),
            },
        )
        .expect_err("id mismatch");
    let WorkflowError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert!(validation.has_issue("id"));
    assert_eq!(
        controller.state(),
        WorkflowState::ProposingEditInstitution(InstitutionId(1))
    );

    controller
        .request_edit_job(&store, InstitutionId(1), JobId(1))
        .expect("edit job");
    let mut moved = test_job(1, 1).fields();
    moved.institution_id = InstitutionId(2);
    let err = controller
        .submit(
            &store,
            Draft::Job {
                id: Some(JobId(1)),
                fields: moved,
            },
        )
        .expect_err("institution mismatch");
    let WorkflowError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert!(validation.has_issue("institutionID"));
}

#[test]
fn payload_of_the_wrong_kind_is_rejected() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    controller.request_add_job(&store, InstitutionId(1)).expect("add job");

    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: None,
                fields: new_institution("Not a job"),
            },
        )
        .expect_err("wrong kind");

    let WorkflowError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert_eq!(
        validation.issues[0].problem,
        Problem::WrongKind {
            expected: RecordKind::Job,
            found: RecordKind::Institution,
        }
    );
    assert_eq!(controller.state(), WorkflowState::ProposingAddJob(InstitutionId(1)));
}

#[test]
fn adding_a_job_checks_required_fields() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    controller.request_add_job(&store, InstitutionId(2)).expect("add job");

    let mut fields = NewJob::for_institution(InstitutionId(2));
    fields.sets = vec!["a".to_string(), " ".to_string(), "a".to_string()];
    let err = controller
        .submit(&store, Draft::Job { id: None, fields })
        .expect_err("invalid job");
    let WorkflowError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert!(validation.has_issue("repositoryBaseURL"));
    assert!(validation.has_issue("scheduleCronExpression"));
    assert!(!validation.has_issue("metadataPrefix"));
    assert!(validation
        .issues
        .iter()
        .any(|issue| issue.problem == Problem::Duplicate("a".to_string())));

    let intent = controller
        .submit(
            &store,
            Draft::Job {
                id: None,
                fields: new_job(2),
            },
        )
        .expect("create job");
    assert_eq!(intent.operation(), Operation::Create);
    assert_eq!(intent.record_kind(), RecordKind::Job);
}

#[test]
fn new_records_must_not_carry_an_id() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    controller.request_add_institution();

    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: Some(InstitutionId(5)),
                fields: new_institution("Preassigned"),
            },
        )
        .expect_err("id on create");
    let WorkflowError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert_eq!(validation.issues[0].problem, Problem::Unassigned);
}

#[test]
fn intents_match_the_state_they_came_from() {
    let store = populated_store();
    let one = InstitutionId(1);
    let cases = [
        (WorkflowState::ConfirmingRemoveInstitution(one), RecordKind::Institution),
        (
            WorkflowState::ConfirmingRemoveJob {
                institution_id: one,
                job_id: JobId(1),
            },
            RecordKind::Job,
        ),
    ];

    for (state, kind) in cases {
        let mut controller = WorkflowController::new();
        match state {
            WorkflowState::ConfirmingRemoveInstitution(id) => controller
                .request_remove_institution(&store, id)
                .expect("remove"),
            WorkflowState::ConfirmingRemoveJob {
                institution_id,
                job_id,
            } => controller
                .request_remove_job(&store, institution_id, job_id)
                .expect("remove job"),
            _ => unreachable!(),
        }
        assert_eq!(controller.state(), state);

        let intent = controller.confirm(&store).expect("confirm");
        assert_eq!(intent.operation(), Operation::Delete);
        assert_eq!(intent.record_kind(), kind);
        assert_eq!(Some(intent), state.target().map(|target| Intent::Delete { target }));
        assert!(controller.state().is_idle());
    }
}

#[test]
fn submit_is_not_a_confirmation() {
    let store = populated_store();
    let mut controller = WorkflowController::new();
    controller
        .request_remove_institution(&store, InstitutionId(1))
        .expect("remove");

    let err = controller
        .submit(
            &store,
            Draft::Institution {
                id: Some(InstitutionId(1)),
                fields: test_institution(1).fields(),
            },
        )
        .expect_err("no form");
    assert_eq!(err, WorkflowError::NoActiveForm);
    assert_eq!(
        controller.state(),
        WorkflowState::ConfirmingRemoveInstitution(InstitutionId(1))
    );
}

#[test]
fn refresh_that_removes_the_target_invalidates_the_proposal() {
    let mut store = populated_store();
    let mut controller = WorkflowController::new();
    controller
        .request_remove_institution(&store, InstitutionId(1))
        .expect("remove");

    store
        .replace(snapshot(vec![test_institution(2)], Vec::new()))
        .expect("refresh");

    assert_eq!(
        controller.reconcile(&store),
        Err(WorkflowError::StaleTarget(RecordRef::Institution {
            id: InstitutionId(1),
        }))
    );
    assert!(controller.state().is_idle());
    assert_eq!(
        controller.confirm(&store),
        Err(WorkflowError::NoPendingRemoval)
    );
}

#[test]
fn add_job_goes_stale_with_its_institution() {
    let mut store = populated_store();
    let mut controller = WorkflowController::new();
    controller.request_add_job(&store, InstitutionId(2)).expect("add job");

    store
        .replace(snapshot(vec![test_institution(1)], Vec::new()))
        .expect("refresh");

    let err = controller
        .submit(
            &store,
            Draft::Job {
                id: None,
                fields: new_job(2),
            },
        )
        .expect_err("stale");
    assert_eq!(
        err,
        WorkflowError::StaleTarget(RecordRef::Institution { id: InstitutionId(2) })
    );
    assert!(controller.state().is_idle());
}

#[test]
fn reconcile_keeps_proposals_whose_target_survives() {
    let mut store = populated_store();
    let mut controller = WorkflowController::new();
    controller
        .request_edit_job(&store, InstitutionId(1), JobId(1))
        .expect("edit job");

    store
        .replace(snapshot(
            vec![test_institution(1)],
            vec![test_job(1, 1)],
        ))
        .expect("refresh");

    assert_eq!(controller.reconcile(&store), Ok(()));
    assert_eq!(
        controller.state().proposal(),
        Proposal {
            kind: ProposalKind::EditJob,
            target_institution_id: Some(InstitutionId(1)),
            target_job_id: Some(JobId(1)),
        }
    );
}
