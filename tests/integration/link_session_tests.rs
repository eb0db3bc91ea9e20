//! Integration tests for the link state machine driving a real
//! `SessionController`, plus inbound command reassembly end to end.

use edgetoggle::fsm::{LinkEvent, LinkState, LinkStateMachine};
use edgetoggle::session::{
    InboundMessage, OwnedFragment, QoS, SessionController, SessionEvent,
};
use edgetoggle::config::SystemConfig;
use edgetoggle::signal::EdgeSignal;

use crate::mock_hw::{MockLinkDriver, RecordingTransport, TransportCall, leaked_edge};

struct Net {
    machine: LinkStateMachine,
    driver: MockLinkDriver,
    session: SessionController<RecordingTransport>,
    transport: RecordingTransport,
    edge: &'static EdgeSignal,
}

impl Net {
    fn new() -> Self {
        let config = SystemConfig::default();
        let edge = leaked_edge();
        let transport = RecordingTransport::new();
        let session = SessionController::new(
            transport.clone(),
            config.broker,
            config.topics,
            edge,
        );
        Self {
            machine: LinkStateMachine::new(),
            driver: MockLinkDriver::default(),
            session,
            transport,
            edge,
        }
    }

    fn link(&mut self, event: LinkEvent) -> LinkState {
        self.machine.handle(event, &mut self.driver, &self.session)
    }

    fn fragment(&self, topic: Option<&str>, data: &[u8], offset: usize, total_len: usize) {
        let msg = InboundMessage {
            topic,
            data,
            offset,
            total_len,
        };
        let frag = OwnedFragment::copy_from(&msg).unwrap();
        self.session.handle_event(SessionEvent::Received(frag));
    }

    fn bring_up(&mut self) {
        assert_eq!(self.link(LinkEvent::StartRequested), LinkState::Connecting);
        assert_eq!(self.link(LinkEvent::AddressAcquired), LinkState::Connected);
        self.session.handle_event(SessionEvent::Connected);
    }

    fn connects(&self) -> usize {
        self.transport
            .count(|c| matches!(c, TransportCall::Connect { .. }))
    }
}

// ── Bring-up ──────────────────────────────────────────────────

#[test]
fn bring_up_connects_subscribes_and_announces() {
    let mut net = Net::new();
    net.bring_up();

    assert_eq!(net.driver.associations, 1);
    assert_eq!(
        net.transport.calls(),
        vec![
            TransportCall::Connect {
                client_id: "mqtt_client_id".into()
            },
            TransportCall::Subscribe {
                topic: "/test".into(),
                qos: QoS::AtMostOnce
            },
            TransportCall::Publish {
                topic: "/test".into(),
                payload: "online".into(),
                qos: QoS::AtMostOnce,
                retain: false
            },
        ]
    );
    assert!(net.session.session().is_some());
}

#[test]
fn address_before_start_is_ignored() {
    let mut net = Net::new();
    assert_eq!(net.link(LinkEvent::AddressAcquired), LinkState::Idle);
    assert_eq!(net.connects(), 0);
}

// ── Link loss ─────────────────────────────────────────────────

#[test]
fn link_loss_tears_down_and_reconnects_with_same_config() {
    let mut net = Net::new();
    net.bring_up();
    let first = net.session.session().unwrap();

    assert_eq!(net.link(LinkEvent::LinkLost), LinkState::Connecting);
    assert!(net.session.session().is_none());
    assert!(!net.session.is_open());
    assert_eq!(
        net.transport.count(|c| *c == TransportCall::Disconnect),
        1
    );
    assert_eq!(net.driver.associations, 2, "re-association is immediate");

    assert_eq!(net.link(LinkEvent::AddressAcquired), LinkState::Connected);
    net.session.handle_event(SessionEvent::Connected);

    let second = net.session.session().unwrap();
    assert_ne!(first, second);
    let connects: Vec<_> = net
        .transport
        .calls()
        .into_iter()
        .filter(|c| matches!(c, TransportCall::Connect { .. }))
        .collect();
    assert_eq!(connects.len(), 2);
    assert_eq!(connects[0], connects[1]);
    assert_eq!(net.machine.stats().links_lost, 1);
}

#[test]
fn repeated_loss_while_connecting_never_stops_a_session() {
    let mut net = Net::new();
    net.link(LinkEvent::StartRequested);
    for _ in 0..5 {
        assert_eq!(net.link(LinkEvent::LinkLost), LinkState::Connecting);
    }
    assert_eq!(net.driver.associations, 6);
    assert_eq!(net.transport.count(|c| *c == TransportCall::Disconnect), 0);
    assert_eq!(net.machine.stats().session_stops, 0);
}

#[test]
fn publish_after_link_loss_is_a_no_op() {
    let mut net = Net::new();
    net.bring_up();
    net.link(LinkEvent::LinkLost);
    net.transport.clear();

    let sent = net.session.publish("/test", b"OUT=1", QoS::AtMostOnce, false);
    assert_eq!(sent, Ok(edgetoggle::session::Delivery::NoSession));
    assert!(net.transport.calls().is_empty());
}

// ── Inbound reassembly ────────────────────────────────────────

#[test]
fn split_toggle_signals_exactly_once() {
    let mut net = Net::new();
    net.bring_up();

    net.fragment(Some("/test"), b"TOG", 0, 6);
    assert!(!net.edge.is_pending(), "partial payload must not signal");
    net.fragment(None, b"GLE", 3, 6);

    assert!(net.edge.try_take());
    assert!(!net.edge.is_pending());
}

#[test]
fn out_of_order_fragment_is_dropped_and_next_message_works() {
    let mut net = Net::new();
    net.bring_up();

    net.fragment(Some("/test"), b"TOG", 0, 6);
    net.fragment(None, b"LE", 4, 6);
    assert!(!net.edge.is_pending());

    net.fragment(Some("/test"), b"TOGGLE", 0, 6);
    assert!(net.edge.try_take());
}

#[test]
fn disconnect_discards_partial_payload() {
    let mut net = Net::new();
    net.bring_up();

    net.fragment(Some("/test"), b"TOG", 0, 6);
    net.session.handle_event(SessionEvent::Disconnected);
    net.session.handle_event(SessionEvent::Reconnected);
    net.fragment(None, b"GLE", 3, 6);

    assert!(!net.edge.is_pending());
}

#[test]
fn lowercase_toggle_is_ignored() {
    let mut net = Net::new();
    net.bring_up();
    net.fragment(Some("/test"), b"toggle", 0, 6);
    assert!(!net.edge.is_pending());
}
