//! Import scenarios exercised through the public API

mod common;

use common::{events_of, gone, live, Event, FailOn, RecordingHandler};
use importar::{
    GeneratorHandler, ImportError, ImportHandler, ImportKind, ImportOperation, ImportPipeline,
    OneOffHandler, Record, StartedSubscriber,
};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<(String, Event)>>>;

/// Pipeline whose only subscriber attaches fresh recording handlers
/// to every operation, wrapped so they only accept that operation.
fn pipeline_with(log: &Log, handlers: Vec<(&'static str, FailOn)>) -> ImportPipeline {
    let log = log.clone();
    let mut pipeline = ImportPipeline::new();
    pipeline.subscribe(Arc::new(
        move |op: &mut ImportOperation| -> Result<(), ImportError> {
            for (name, fail_on) in &handlers {
                let handler = RecordingHandler::new(name, &log).failing_on(*fail_on);
                let bound = OneOffHandler::new(op, handler);
                op.attach_handler(Arc::new(bound));
            }
            Ok(())
        },
    ));
    pipeline
}

fn outcomes(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::Failed(_) | Event::Finished(_)))
        .count()
}

#[tokio::test]
async fn every_handler_gets_every_record_then_finished() {
    let log = Log::default();
    let pipeline = pipeline_with(&log, vec![("a", FailOn::Nothing), ("b", FailOn::Nothing)]);
    let records = vec![live("1", "one"), gone("2"), live("3", "three")];

    let op = pipeline
        .perform_import("foo", ImportKind::FullSync, records.clone())
        .await
        .unwrap();

    for name in ["a", "b"] {
        let mut expected: Vec<Event> = records
            .iter()
            .map(|r| Event::Record(op.id(), r.clone()))
            .collect();
        expected.push(Event::Finished(op.id()));
        assert_eq!(events_of(&log, name), expected);
    }

    // Handlers are notified in attachment order for each record
    let order: Vec<String> = log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(order, vec!["a", "b", "a", "b", "a", "b", "a", "b"]);
}

#[tokio::test]
async fn exactly_one_outcome_whatever_fails() {
    let failures = [
        ("record", FailOn::Record),
        ("failed", FailOn::Failed),
        ("finished", FailOn::Finished),
    ];

    for (label, fail_on) in failures {
        let log = Log::default();
        let pipeline = pipeline_with(&log, vec![("bad", fail_on), ("good", FailOn::Nothing)]);

        let result = pipeline
            .perform_import("foo", ImportKind::PartialUpdate, vec![live("1", "one")])
            .await;

        let expect_ok = matches!(fail_on, FailOn::Failed);
        assert_eq!(result.is_ok(), expect_ok, "failing on {}", label);
        for name in ["bad", "good"] {
            assert_eq!(
                outcomes(&events_of(&log, name)),
                1,
                "{} failing on {}",
                name,
                label
            );
        }
    }
}

#[tokio::test]
async fn source_failure_reaches_every_handler_once() {
    let log = Log::default();
    let pipeline = pipeline_with(&log, vec![("a", FailOn::Nothing), ("b", FailOn::Failed)]);
    let records: Vec<Result<Record, ImportError>> =
        vec![Ok(live("1", "one")), Err(ImportError::other("boom"))];

    let err = pipeline
        .perform_import("foo", ImportKind::FullSync, records)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "record source raised error");

    for name in ["a", "b"] {
        let events = events_of(&log, name);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::Failed(_)));
    }
}

#[tokio::test]
async fn handlers_attached_to_one_run_never_see_another() {
    let log = Log::default();
    let pipeline = pipeline_with(&log, vec![("a", FailOn::Nothing)]);

    let first = pipeline
        .perform_import("foo", ImportKind::FullSync, vec![live("1", "one")])
        .await
        .unwrap();
    let second = pipeline
        .perform_import("foo", ImportKind::FullSync, vec![live("2", "two")])
        .await
        .unwrap();

    let events = events_of(&log, "a");
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], Event::Record(id, _) if id == first.id()));
    assert!(matches!(events[3], Event::Finished(id) if id == second.id()));

    // A handler bound to the first run rejects the second
    let bound = OneOffHandler::new(&first, RecordingHandler::new("late", &log));
    assert!(bound.on_import_finished(&second).await.is_err());
    assert!(events_of(&log, "late").is_empty());
}

#[tokio::test]
async fn generator_handler_sees_operation_snapshot() {
    struct KindProbe(Arc<Mutex<Vec<String>>>);

    impl StartedSubscriber for KindProbe {
        fn name(&self) -> &str {
            "kind-probe"
        }

        fn on_import_started(&self, op: &mut ImportOperation) -> Result<(), ImportError> {
            let seen = self.0.clone();
            let handler = GeneratorHandler::new(op, move |info, records| {
                let mut count = 0;
                for record in &records {
                    record?;
                    count += 1;
                    records.suspend()?;
                }
                seen.lock()
                    .unwrap()
                    .push(format!("{} {} {}", info.record_type, info.kind, count));
                Ok(())
            })?;
            op.attach_handler(Arc::new(handler));
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ImportPipeline::new();
    pipeline.subscribe(Arc::new(KindProbe(seen.clone())));

    pipeline
        .perform_import(
            "contacts",
            ImportKind::PartialUpdate,
            vec![live("1", "one"), live("2", "two")],
        )
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["contacts PARTIAL_UPDATE 2"]);
}
