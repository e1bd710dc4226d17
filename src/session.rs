//! Tunnel session.
//!
//! A [`TunnelSession`] is the cheap, cloneable handle a front-end holds on a
//! running connection. The actual [`BusLink`] is owned by a single pump task;
//! the handle talks to it over a bounded command channel, so reads, writes
//! and quit requests from any thread serialize into one queue and never race
//! on the link itself.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Connecting -> Connected -> Disconnected
//!           \____________________________^
//! ```
//!
//! `Disconnected` is terminal. Calling [`quit`](TunnelSession::quit) after
//! the pump has already exited is a no-op, as is any command issued to a dead
//! session beyond a log entry for unknown datapoints.

use crate::address::{GroupAddress, IndividualAddress};
use crate::datapoint::{Datapoint, DatapointStore};
use crate::link::{BusLink, LinkEvent, ServiceKind};
use crate::sink::EventSink;
use chrono::{DateTime, Local};
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

// =============================================================================
// Group Event
// =============================================================================

/// One decoded bus event, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEvent {
    /// When the event was observed
    pub timestamp: DateTime<Local>,
    /// Sending device
    pub source: IndividualAddress,
    /// Destination group address
    pub destination: GroupAddress,
    /// Application-layer service
    pub service: ServiceKind,
    /// Raw ASDU
    pub asdu: Vec<u8>,
    /// Decoded value, `"[empty]"` for payload-less frames and `"n/a"` for
    /// unconfigured destinations
    pub decoded: String,
}

impl GroupEvent {
    /// Wall-clock time as `HH:MM:SS`.
    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// ASDU as uppercase hex pairs, e.g. `"00 0C 1A"`.
    pub fn asdu_hex(&self) -> String {
        self.asdu
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle state of a tunnel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, connection not yet attempted
    Idle,
    /// Connection attempt in flight
    Connecting,
    /// Connected, pump running
    Connected,
    /// Terminal; the session cannot be revived
    Disconnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Shared state cell; `Disconnected` latches.
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<Mutex<SessionState>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(SessionState::Idle)))
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.0.lock()
    }

    pub(crate) fn advance(&self, next: SessionState) {
        let mut state = self.0.lock();
        if *state != SessionState::Disconnected {
            *state = next;
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug)]
pub(crate) enum Command {
    Read(GroupAddress),
    Write(GroupAddress, Vec<u8>),
    Quit,
}

// =============================================================================
// TunnelSession
// =============================================================================

/// Handle to a running tunnel session.
#[derive(Debug, Clone)]
pub struct TunnelSession {
    commands: mpsc::Sender<Command>,
    sink: EventSink,
    store: DatapointStore,
    state: StateCell,
}

impl TunnelSession {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        sink: EventSink,
        store: DatapointStore,
        state: StateCell,
    ) -> Self {
        Self {
            commands,
            sink,
            store,
            state,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Whether the session is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state.get() == SessionState::Connected
    }

    /// Request a group value read for `datapoint`.
    pub fn read(&self, datapoint: &Datapoint) {
        self.send(Command::Read(datapoint.address()));
    }

    /// Encode `text` with the datapoint's translator and write it.
    ///
    /// An encoding failure produces one log entry and no bus traffic.
    pub fn write(&self, datapoint: &Datapoint, text: &str) {
        match datapoint.translator().encode(text) {
            Ok(asdu) => self.send(Command::Write(datapoint.address(), asdu)),
            Err(e) => self.sink.log(format!("error: {e}")),
        }
    }

    /// Request a read for the datapoint configured at `address`.
    ///
    /// An unconfigured address produces one log entry and no bus traffic.
    pub fn read_group(&self, address: GroupAddress) {
        let map = self.store.snapshot();
        match map.get(address) {
            Some(dp) => self.read(dp),
            None => self.sink.log(format!("datapoint {address} not loaded")),
        }
    }

    /// Write `text` to the datapoint configured at `address`.
    ///
    /// An unconfigured address produces one log entry and no bus traffic.
    pub fn write_group(&self, address: GroupAddress, text: &str) {
        let map = self.store.snapshot();
        match map.get(address) {
            Some(dp) => self.write(dp, text),
            None => self.sink.log(format!("datapoint {address} not loaded")),
        }
    }

    /// Ask the pump to shut down. Idempotent and callable from any thread;
    /// a no-op once the session is already down.
    pub fn quit(&self) {
        self.commands.try_send(Command::Quit).ok();
    }

    fn send(&self, command: Command) {
        if self.commands.try_send(command).is_err() {
            self.sink.log("error: session not connected".to_owned());
        }
    }
}

// =============================================================================
// Pump
// =============================================================================

/// Drive a connected link: execute queued commands and decode incoming group
/// events until the link ends or quit is requested. Always leaves the session
/// `Disconnected` with the link closed.
pub(crate) async fn run_session<L: BusLink + 'static>(
    mut link: L,
    mut commands: mpsc::Receiver<Command>,
    sink: EventSink,
    store: DatapointStore,
    state: StateCell,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Read(destination)) => {
                    if let Err(e) = link.group_read(destination).await {
                        sink.log(format!("error: {e}"));
                    }
                }
                Some(Command::Write(destination, asdu)) => {
                    if let Err(e) = link.group_write(destination, &asdu).await {
                        sink.log(format!("error: {e}"));
                    }
                }
                // None means every handle is dropped, treat like quit
                Some(Command::Quit) | None => break,
            },
            event = link.next_event() => match event {
                Ok(Some(event)) => on_group_event(event, &sink, &store),
                Ok(None) => {
                    sink.log("connection closed by gateway".to_owned());
                    break;
                }
                Err(e) => {
                    sink.log(format!("error: {e}"));
                    break;
                }
            },
        }
    }
    link.close();
    state.advance(SessionState::Disconnected);
    log::debug!("session pump finished");
}

/// Decode one bus event and publish it.
///
/// Decoding failures produce a log entry instead of an event row; frames to
/// unconfigured destinations show `"n/a"`.
fn on_group_event(event: LinkEvent, sink: &EventSink, store: &DatapointStore) {
    let decoded = if event.asdu.is_empty() {
        "[empty]".to_owned()
    } else {
        let map = store.snapshot();
        match map.get(event.destination) {
            Some(dp) => match dp.translator().decode_to_string(&event.asdu) {
                Ok(text) => text,
                Err(e) => {
                    sink.log(format!("error: {e}"));
                    return;
                }
            },
            None => "n/a".to_owned(),
        }
    };
    sink.event(GroupEvent {
        timestamp: Local::now(),
        source: event.source,
        destination: event.destination,
        service: event.service,
        asdu: event.asdu,
        decoded,
    });
}
