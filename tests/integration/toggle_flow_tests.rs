//! Integration tests for the edge → toggle task → status publish pipeline.
//!
//! The toggle task runs against a real `SessionController` over a
//! recording transport, so these cover the same path the firmware takes
//! from `EdgeSignal::signal` to an `OUT=<0|1>` message on the wire.

use std::sync::Arc;

use futures_lite::future::block_on;

use edgetoggle::app::events::AppEvent;
use edgetoggle::app::toggle::OutputToggleTask;
use edgetoggle::config::SystemConfig;
use edgetoggle::error::{HardwareError, TransportError};
use edgetoggle::session::{
    Delivery, InboundMessage, OwnedFragment, QoS, SessionController, SessionEvent,
};
use edgetoggle::signal::{EdgeSignal, WaitOutcome};

use crate::mock_hw::{MockOutput, RecordingSink, RecordingTransport, TransportCall, leaked_edge};

type Controller = SessionController<RecordingTransport>;
type Task = OutputToggleTask<MockOutput, Arc<Controller>, RecordingSink>;

struct Rig {
    task: Task,
    session: Arc<Controller>,
    transport: RecordingTransport,
    sink: RecordingSink,
    edge: &'static EdgeSignal,
}

fn rig(output: MockOutput) -> Rig {
    let mut config = SystemConfig::default();
    config.toggle.wait_timeout_ms = 20;

    let edge = leaked_edge();
    let transport = RecordingTransport::new();
    let session = Arc::new(SessionController::new(
        transport.clone(),
        config.broker.clone(),
        config.topics.clone(),
        edge,
    ));
    let sink = RecordingSink::default();
    let task = OutputToggleTask::new(output, session.clone(), sink.clone(), edge, &config);
    Rig {
        task,
        session,
        transport,
        sink,
        edge,
    }
}

fn go_online(rig: &Rig) {
    rig.session.start();
    rig.session.handle_event(SessionEvent::Connected);
    assert!(rig.session.session().is_some());
    rig.transport.clear();
}

// ── Edge with a live session ──────────────────────────────────

#[test]
fn edge_flips_low_output_and_publishes_out_1() {
    let mut rig = rig(MockOutput::new(false));
    go_online(&rig);

    let _ = rig.edge.signal();
    let report = block_on(rig.task.step());

    assert_eq!(report.outcome, WaitOutcome::Signaled);
    assert!(report.level);
    assert_eq!(report.published, Some(Ok(Delivery::Sent)));
    assert_eq!(
        rig.transport.calls(),
        vec![TransportCall::Publish {
            topic: "/test".into(),
            payload: "OUT=1".into(),
            qos: QoS::AtMostOnce,
            retain: false,
        }]
    );
    assert_eq!(
        rig.sink.events(),
        vec![
            AppEvent::Started { level: false },
            AppEvent::OutputToggled { level: true },
            AppEvent::StatusPublished { level: true },
        ]
    );
}

#[test]
fn two_edges_before_wait_toggle_once() {
    let mut rig = rig(MockOutput::new(true));
    go_online(&rig);

    let _ = rig.edge.signal();
    let _ = rig.edge.signal();
    let first = block_on(rig.task.step());
    let second = block_on(rig.task.step());

    assert_eq!(first.outcome, WaitOutcome::Signaled);
    assert!(!first.level);
    assert_eq!(second.outcome, WaitOutcome::TimedOut);
    assert!(!second.level);
    assert_eq!(
        rig.transport.publishes(),
        vec![("/test".into(), "OUT=0".into()), ("/test".into(), "OUT=0".into())]
    );
}

// ── No session ────────────────────────────────────────────────

#[test]
fn edge_without_session_toggles_but_publishes_nothing() {
    let mut rig = rig(MockOutput::new(false));

    let _ = rig.edge.signal();
    let report = block_on(rig.task.step());

    assert!(report.level);
    assert_eq!(report.published, None);
    assert!(rig.transport.calls().is_empty());
}

#[test]
fn publishing_stops_once_session_is_stopped() {
    let mut rig = rig(MockOutput::new(false));
    go_online(&rig);
    rig.session.stop();
    rig.transport.clear();

    let _ = rig.edge.signal();
    let report = block_on(rig.task.step());

    assert!(report.level);
    assert_eq!(report.published, None);
    assert!(rig.transport.publishes().is_empty());
}

// ── Timeout path ──────────────────────────────────────────────

#[test]
fn timeout_republishes_current_level() {
    let mut rig = rig(MockOutput::new(true));
    go_online(&rig);

    let report = block_on(rig.task.step());

    assert_eq!(report.outcome, WaitOutcome::TimedOut);
    assert!(report.level);
    assert_eq!(rig.transport.publishes(), vec![("/test".into(), "OUT=1".into())]);
}

// ── Failures are not fatal ────────────────────────────────────

#[test]
fn write_failure_keeps_level_and_still_reports() {
    let mut rig = rig(MockOutput::failing(false));
    go_online(&rig);

    let _ = rig.edge.signal();
    let report = block_on(rig.task.step());

    assert_eq!(report.outcome, WaitOutcome::Signaled);
    assert!(!report.level, "level must not change when the write fails");
    assert_eq!(rig.transport.publishes(), vec![("/test".into(), "OUT=0".into())]);
    assert!(
        rig.sink
            .events()
            .contains(&AppEvent::ToggleFailed(HardwareError::PinWriteFailed))
    );

    // The loop keeps going.
    let next = block_on(rig.task.step());
    assert_eq!(next.outcome, WaitOutcome::TimedOut);
}

#[test]
fn publish_failure_is_reported_to_sink() {
    let mut rig = rig(MockOutput::new(false));
    go_online(&rig);
    rig.transport.set_refuse_publish(true);

    let _ = rig.edge.signal();
    let report = block_on(rig.task.step());

    assert!(report.level);
    assert_eq!(report.published, Some(Err(TransportError::PublishFailed)));
    assert_eq!(
        rig.sink.events().last(),
        Some(&AppEvent::StatusPublishFailed(TransportError::PublishFailed))
    );
}

// ── Remote command ────────────────────────────────────────────

#[test]
fn remote_toggle_drives_the_same_path_as_an_edge() {
    let mut rig = rig(MockOutput::new(false));
    go_online(&rig);

    let frag = OwnedFragment::copy_from(&InboundMessage::complete("/test", b"TOGGLE")).unwrap();
    rig.session.handle_event(SessionEvent::Received(frag));
    let report = block_on(rig.task.step());

    assert_eq!(report.outcome, WaitOutcome::Signaled);
    assert!(report.level);
    assert_eq!(rig.transport.publishes(), vec![("/test".into(), "OUT=1".into())]);
}

#[test]
fn own_status_echo_does_not_toggle() {
    let mut rig = rig(MockOutput::new(false));
    go_online(&rig);

    // The status topic doubles as the command topic; our own OUT=x comes back.
    let frag = OwnedFragment::copy_from(&InboundMessage::complete("/test", b"OUT=1")).unwrap();
    rig.session.handle_event(SessionEvent::Received(frag));
    let report = block_on(rig.task.step());

    assert_eq!(report.outcome, WaitOutcome::TimedOut);
    assert!(!report.level);
}
