//! In-process mock link for testing.
//!
//! [`MockLink::pair`] returns the link itself plus a [`MockLinkHandle`]
//! through which a test injects group events and inspects what the session
//! sent, without any network involved.

use super::{BusLink, LinkEvent};
use crate::address::GroupAddress;
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A command the session issued through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentCommand {
    /// Group value read request
    Read(GroupAddress),
    /// Group value write with its ASDU
    Write(GroupAddress, Vec<u8>),
}

#[derive(Debug, Default)]
struct Shared {
    connect_args: Option<Vec<String>>,
    fail_connect: bool,
    sent: Vec<SentCommand>,
    open: bool,
    close_count: usize,
}

/// Mock implementation of [`BusLink`].
#[derive(Debug)]
pub struct MockLink {
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Test-side handle to a [`MockLink`].
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl MockLink {
    /// Create a connected link/handle pair.
    pub fn pair() -> (Self, MockLinkHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                shared: shared.clone(),
                events: rx,
            },
            MockLinkHandle { shared, events: tx },
        )
    }
}

#[async_trait]
impl BusLink for MockLink {
    async fn connect(&mut self, args: &[String]) -> Result<()> {
        let mut shared = self.shared.lock();
        shared.connect_args = Some(args.to_vec());
        if shared.fail_connect {
            shared.fail_connect = false;
            return Err(MonitorError::connect_failed());
        }
        shared.open = true;
        Ok(())
    }

    async fn group_read(&mut self, destination: GroupAddress) -> Result<()> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(MonitorError::not_connected());
        }
        shared.sent.push(SentCommand::Read(destination));
        Ok(())
    }

    async fn group_write(&mut self, destination: GroupAddress, asdu: &[u8]) -> Result<()> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(MonitorError::not_connected());
        }
        shared.sent.push(SentCommand::Write(destination, asdu.to_vec()));
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<LinkEvent>> {
        // None when every handle is dropped, modelling gateway shutdown
        Ok(self.events.recv().await)
    }

    fn close(&mut self) {
        let mut shared = self.shared.lock();
        shared.open = false;
        shared.close_count += 1;
        self.events.close();
    }

    fn is_open(&self) -> bool {
        self.shared.lock().open
    }
}

impl MockLinkHandle {
    /// Make the next connect attempt fail.
    pub fn fail_next_connect(&self) {
        self.shared.lock().fail_connect = true;
    }

    /// Inject a group event as if received from the bus.
    pub fn push_event(&self, event: LinkEvent) {
        self.events.send(event).ok();
    }

    /// Arguments the session connected with, if it connected.
    pub fn connect_args(&self) -> Option<Vec<String>> {
        self.shared.lock().connect_args.clone()
    }

    /// Everything the session sent so far.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.shared.lock().sent.clone()
    }

    /// Whether the link side is currently open.
    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    /// How many times the link was closed.
    pub fn close_count(&self) -> usize {
        self.shared.lock().close_count
    }
}
