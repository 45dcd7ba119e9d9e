//! Session lifecycle: event ordering, destroy semantics, cancellation

mod common;

use std::sync::Arc;
use std::time::Duration;

use driftnet::{
    InMemoryResultStore, InputProcessor, Session, SessionConfig, SessionEvent,
    SessionEventListener, ThrottleConfig, Throttler, TraversalAlgorithm,
};
use tokio::sync::mpsc;

use common::{GatedProcessor, RuleProcessor};

fn session_config(
    processors: Vec<Arc<dyn InputProcessor>>,
    seeds: &[&str],
) -> SessionConfig {
    SessionConfig {
        initial_inputs: seeds.iter().map(|s| (*s).to_string()).collect(),
        processors,
        store: Arc::new(InMemoryResultStore::new()),
        throttler: Arc::new(Throttler::new(ThrottleConfig::None)),
        algorithm: TraversalAlgorithm::BreadthFirst,
        batch_size: 10,
        max_crawl_depth: usize::MAX,
    }
}

fn session_listener() -> (SessionEventListener, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: SessionEventListener = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (listener, rx)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("session event channel closed")
}

#[tokio::test]
async fn started_is_emitted_before_finished() {
    struct Quick;

    let processors: Vec<Arc<dyn InputProcessor>> =
        vec![Arc::new(RuleProcessor::<Quick>::new("quick").emits("seed", "k", &[]))];
    let session = Session::new(session_config(processors, &["seed"])).unwrap();
    let (listener, mut rx) = session_listener();
    session.set_event_listener(listener);
    session.init();

    match recv(&mut rx).await {
        SessionEvent::Started {
            session_id,
            initial_inputs,
        } => {
            assert_eq!(session_id, session.id());
            assert_eq!(initial_inputs, vec!["seed"]);
        }
        other => panic!("expected Started first, got {other:?}"),
    }
    match recv(&mut rx).await {
        SessionEvent::Finished {
            result_id,
            duration,
            ..
        } => {
            assert!(!result_id.is_empty());
            assert!(duration.end_time_ms > duration.start_time_ms);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
}

#[tokio::test]
async fn destroy_cancels_and_silences_a_running_session() {
    struct Gate;

    let (processor, _gate) = GatedProcessor::<Gate>::new("gated");
    let processors: Vec<Arc<dyn InputProcessor>> = vec![Arc::new(processor)];
    let session = Session::new(session_config(processors, &["seed"])).unwrap();
    let (listener, mut rx) = session_listener();
    session.set_event_listener(listener);
    session.init();

    // The session is in flight, blocked inside the processor.
    assert!(matches!(recv(&mut rx).await, SessionEvent::Started { .. }));

    session.destroy();
    session.destroy(); // idempotent

    let silence = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    match silence {
        Err(_) => {}
        Ok(None) => {} // listener dropped with the session task
        Ok(Some(event)) => panic!("no events may follow destroy, got {event:?}"),
    }
}

#[tokio::test]
async fn init_after_destroy_is_ignored() {
    struct Quick;

    let processors: Vec<Arc<dyn InputProcessor>> =
        vec![Arc::new(RuleProcessor::<Quick>::new("quick").emits("seed", "k", &[]))];
    let session = Session::new(session_config(processors, &["seed"])).unwrap();
    let (listener, mut rx) = session_listener();
    session.set_event_listener(listener);

    session.destroy();
    session.init();

    let silence = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(!matches!(silence, Ok(Some(_))), "destroyed session must not start");
}

#[tokio::test]
async fn empty_initial_inputs_are_rejected() {
    struct Quick;

    let processors: Vec<Arc<dyn InputProcessor>> =
        vec![Arc::new(RuleProcessor::<Quick>::new("quick").emits("seed", "k", &[]))];
    assert!(Session::new(session_config(processors, &[])).is_err());
}

#[tokio::test]
async fn batch_size_one_processes_sequentially() {
    struct Gate;

    let (processor, gate) = GatedProcessor::<Gate>::new("gated");
    let processors: Vec<Arc<dyn InputProcessor>> = vec![Arc::new(processor)];
    let mut config = session_config(processors, &["one", "two", "three"]);
    config.batch_size = 1;

    let session = Session::new(config).unwrap();
    let (listener, mut rx) = session_listener();
    session.set_event_listener(listener);
    session.init();
    assert!(matches!(recv(&mut rx).await, SessionEvent::Started { .. }));

    // With batch size 1 only one invocation is pending at a time; three
    // permits are consumed one batch after another.
    gate.add_permits(3);
    assert!(matches!(recv(&mut rx).await, SessionEvent::Finished { .. }));
}
