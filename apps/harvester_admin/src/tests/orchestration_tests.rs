use super::*;

use crossbeam_channel::bounded;
use shared::domain::{InstitutionId, RecordRef};

fn delete_intent(id: i64) -> Intent {
    Intent::Delete {
        target: RecordRef::Institution {
            id: InstitutionId(id),
        },
    }
}

#[test]
fn intents_are_queued_as_apply_commands() {
    let (cmd_tx, cmd_rx) = bounded(4);
    let mut sink = QueuedIntentSink::new(cmd_tx);

    sink.on_intent(delete_intent(1));

    match cmd_rx.try_recv().expect("queued command") {
        BackendCommand::ApplyIntent(intent) => assert_eq!(intent, delete_intent(1)),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(sink.take_failure().is_none());
}

#[test]
fn full_queue_is_reported_once() {
    let (cmd_tx, _cmd_rx) = bounded(1);
    let mut sink = QueuedIntentSink::new(cmd_tx);

    sink.request_catalog();
    sink.on_intent(delete_intent(1));

    let failure = sink.take_failure().expect("failure recorded");
    assert!(failure.contains("queue is full"));
    assert!(sink.take_failure().is_none());
}

#[test]
fn disconnected_worker_is_reported() {
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(1);
    drop(cmd_rx);

    let err = dispatch_backend_command(&cmd_tx, BackendCommand::LoadCatalog)
        .expect_err("disconnected");
    assert!(err.contains("disconnected"));
}
