//! Network task: link state machine plus session event delivery.
//!
//! Runs in a dedicated thread using `edge-executor` for cooperative
//! scheduling.  Both futures are truly async: they sleep in
//! `Channel::receive().await` and wake as soon as a sysloop or MQTT
//! callback queues an event.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │  Net thread (Core 0)                                 │
//!  │  ┌────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                  │  │
//!  │  │                                                │  │
//!  │  │  ┌─────────────────┐   ┌────────────────────┐  │  │
//!  │  │  │ link_loop       │   │ session_loop       │  │  │
//!  │  │  │ LINK_EVENTS     │   │ SESSION_EVENTS     │  │  │
//!  │  │  │ → state machine │   │ → handle_event     │  │  │
//!  │  │  └─────────────────┘   └────────────────────┘  │  │
//!  │  └────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info};

use super::channels::{LINK_EVENTS, LinkQueue, SESSION_EVENTS, SessionQueue};
use super::{BrokerTransport, SessionController};
use crate::app::ports::LinkDriver;
use crate::fsm::LinkStateMachine;

/// Feeds link events to the state machine.  The machine is local to
/// this future, so only this task ever starts or stops the session.
async fn link_loop<D, T>(
    mut driver: D,
    session: Arc<SessionController<T>>,
    events: &'static LinkQueue,
) where
    D: LinkDriver,
    T: BrokerTransport,
{
    let mut machine = LinkStateMachine::new();
    loop {
        let event = events.receive().await;
        let state = machine.handle(event, &mut driver, &*session);
        log::debug!("Net: {:?} -> {:?}", event, state);
    }
}

/// Delivers transport lifecycle events to the controller.
async fn session_loop<T: BrokerTransport>(
    session: Arc<SessionController<T>>,
    events: &'static SessionQueue,
) {
    loop {
        let event = events.receive().await;
        session.handle_event(event);
    }
}

/// Entry point for the net thread.  Starts the station, spawns both
/// loops and drives them forever.
fn run_net_loop<D, T>(mut driver: D, session: Arc<SessionController<T>>)
where
    D: LinkDriver,
    T: BrokerTransport,
{
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    // The stack answers with StartRequested once the station is up.
    if let Err(e) = driver.start() {
        error!("Net: WiFi start failed: {}", e);
    }

    executor
        .spawn(link_loop(driver, session.clone(), &LINK_EVENTS))
        .detach();
    executor.spawn(session_loop(session, &SESSION_EVENTS)).detach();

    info!("Net task started");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

/// Spawn the net task pinned to Core 0 (PRO_CPU), next to the WiFi
/// stack.  Takes ownership of the link driver.
pub fn spawn<D, T>(driver: D, session: Arc<SessionController<T>>) -> std::io::Result<JoinHandle<()>>
where
    D: LinkDriver + Send + 'static,
    T: BrokerTransport + Send + 'static,
{
    crate::drivers::task_pin::spawn_on_core(
        crate::drivers::task_pin::Core::Pro,
        10,
        12,
        "net\0",
        move || run_net_loop(driver, session),
    )
}
