//! Notification sink.
//!
//! Sessions publish group events, log lines and connection notices through an
//! [`EventSink`], a thin wrapper over a bounded channel. Posting is fire and
//! forget: the sender never blocks, and once the consumer side is gone every
//! post becomes a silent no-op, so a worker racing a teardown cannot fail or
//! wedge on its last notifications.

use crate::session::GroupEvent;
use tokio::sync::mpsc;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// A notification published by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A decoded group event for the event table
    Event(GroupEvent),
    /// A log line for the log view
    Log(String),
    /// Connection established, with the status line
    Connected(String),
}

/// Sending half of the notification channel.
///
/// Cloning is cheap; all clones feed the same receiver.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Notification>,
}

impl EventSink {
    /// Create a sink and its receiver with the given capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Create a sink and its receiver with [`DEFAULT_CAPACITY`].
    pub fn default_channel() -> (Self, mpsc::Receiver<Notification>) {
        Self::channel(DEFAULT_CAPACITY)
    }

    /// Post a notification without waiting.
    ///
    /// A full queue drops the notification with a warning; a closed receiver
    /// drops it silently.
    pub fn post(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                log::warn!("notification queue full, dropping {dropped:?}");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Post a log line.
    pub fn log(&self, message: impl Into<String>) {
        self.post(Notification::Log(message.into()));
    }

    /// Post a group event.
    pub fn event(&self, event: GroupEvent) {
        self.post(Notification::Event(event));
    }

    /// Whether the receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posts_preserve_order() {
        let (sink, mut rx) = EventSink::channel(8);
        sink.log("first");
        sink.log("second");
        sink.post(Notification::Connected("up".to_owned()));
        assert_eq!(rx.recv().await, Some(Notification::Log("first".to_owned())));
        assert_eq!(rx.recv().await, Some(Notification::Log("second".to_owned())));
        assert_eq!(
            rx.recv().await,
            Some(Notification::Connected("up".to_owned()))
        );
    }

    #[tokio::test]
    async fn closed_receiver_makes_posts_no_ops() {
        let (sink, rx) = EventSink::channel(8);
        drop(rx);
        assert!(sink.is_closed());
        sink.log("nobody listening");
        sink.log("still fine");
    }

    #[tokio::test]
    async fn default_channel_uses_default_capacity() {
        let (sink, mut rx) = EventSink::default_channel();
        for i in 0..DEFAULT_CAPACITY {
            sink.log(format!("entry {i}"));
        }
        assert_eq!(
            rx.recv().await,
            Some(Notification::Log("entry 0".to_owned()))
        );
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (sink, mut rx) = EventSink::channel(1);
        sink.log("kept");
        sink.log("dropped");
        assert_eq!(rx.recv().await, Some(Notification::Log("kept".to_owned())));
        assert!(rx.try_recv().is_err());
    }
}
