//! Session launcher.
//!
//! [`SessionLauncher`] turns validated [`ConnectionParameters`] into a
//! running [`TunnelSession`]: it builds the argument vector, spawns a worker
//! task that connects the link with a timeout, and hands back the session
//! handle immediately while the connection attempt proceeds in the
//! background. Launching again disposes the previous session first.

use crate::datapoint::DatapointStore;
use crate::error::Result;
use crate::link::BusLink;
use crate::params::ConnectionParameters;
use crate::session::{run_session, SessionState, StateCell, TunnelSession};
use crate::sink::EventSink;
use std::time::Duration;

/// How long a connection attempt may take before it is abandoned.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the session command queue.
const COMMAND_QUEUE: usize = 32;

/// Launches tunnel sessions, one live at a time.
#[derive(Debug)]
pub struct SessionLauncher {
    sink: EventSink,
    store: DatapointStore,
    current: Option<TunnelSession>,
}

impl SessionLauncher {
    /// Create a launcher publishing to `sink` and resolving datapoints
    /// through `store`.
    pub fn new(sink: EventSink, store: DatapointStore) -> Self {
        Self {
            sink,
            store,
            current: None,
        }
    }

    /// Validate `params` and launch a session over `link`.
    ///
    /// On success the previous session, if any, has been disposed and the
    /// returned handle is in `Connecting` state; connection progress arrives
    /// through the sink. On validation failure nothing is disposed or
    /// spawned, one log entry is posted and the error returned.
    ///
    /// # Errors
    ///
    /// Returns a config error when `params` names no endpoint.
    pub fn launch<L: BusLink + 'static>(
        &mut self,
        mut link: L,
        params: &ConnectionParameters,
    ) -> Result<&TunnelSession> {
        if let Err(e) = params.validate() {
            self.sink.log(format!("error: {e}"));
            return Err(e);
        }
        self.dispose();

        let args = params.to_args();
        log::debug!("launching session with args {args:?}");

        let (tx, commands) = tokio::sync::mpsc::channel(COMMAND_QUEUE);
        let state = StateCell::new();
        let session = TunnelSession::new(tx, self.sink.clone(), self.store.clone(), state.clone());

        state.advance(SessionState::Connecting);
        self.sink.log(params.status_line("Connecting"));

        let sink = self.sink.clone();
        let store = self.store.clone();
        let connected_line = params.status_line("Connected");
        tokio::spawn(async move {
            match tokio::time::timeout(CONNECT_TIMEOUT, link.connect(&args)).await {
                Ok(Ok(())) => {
                    state.advance(SessionState::Connected);
                    sink.post(crate::sink::Notification::Connected(connected_line));
                    run_session(link, commands, sink, store, state).await;
                }
                Ok(Err(e)) => {
                    sink.log(format!("error: {e}"));
                    link.close();
                    state.advance(SessionState::Disconnected);
                }
                Err(_) => {
                    sink.log(format!("error: {}", crate::error::MonitorError::connect_timeout()));
                    link.close();
                    state.advance(SessionState::Disconnected);
                }
            }
        });

        Ok(self.current.insert(session))
    }

    /// The most recently launched session, if any.
    pub fn session(&self) -> Option<&TunnelSession> {
        self.current.as_ref()
    }

    /// Quit the current session, if any. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(session) = self.current.take() {
            session.quit();
        }
    }
}

impl Drop for SessionLauncher {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::DatapointMap;
    use crate::ga;
    use crate::link::mock::MockLink;
    use crate::sink::Notification;
    use tokio::sync::mpsc;

    const DATAPOINTS: &str = r#"
[[datapoint]]
address = "1/2/3"
name = "Light"
main_number = 1
dpt = "1.001"
"#;

    fn launcher() -> (SessionLauncher, mpsc::Receiver<Notification>) {
        let (sink, rx) = EventSink::channel(32);
        let store =
            DatapointStore::with_map(DatapointMap::parse(DATAPOINTS, "test.toml").unwrap());
        (SessionLauncher::new(sink, store), rx)
    }

    async fn wait_for_state(session: &TunnelSession, wanted: SessionState) {
        for _ in 0..100 {
            if session.state() == wanted {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never reached {wanted}");
    }

    #[tokio::test]
    async fn launch_connects_and_reports() {
        let (mut launcher, mut rx) = launcher();
        let (link, handle) = MockLink::pair();
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671");
        let session = launcher.launch(link, &params).unwrap().clone();

        assert_eq!(
            rx.recv().await,
            Some(Notification::Log(
                "Connecting to 10.0.0.5 on port 3671".to_owned()
            ))
        );
        assert_eq!(
            rx.recv().await,
            Some(Notification::Connected(
                "Connected to 10.0.0.5 on port 3671".to_owned()
            ))
        );
        wait_for_state(&session, SessionState::Connected).await;
        assert_eq!(
            handle.connect_args(),
            Some(vec![
                "10.0.0.5".to_owned(),
                "-p".to_owned(),
                "3671".to_owned(),
                "monitor".to_owned()
            ])
        );
    }

    #[tokio::test]
    async fn invalid_params_log_once_and_spawn_nothing() {
        let (mut launcher, mut rx) = launcher();
        let (link, handle) = MockLink::pair();
        let params = ConnectionParameters::tunnel("", "");
        assert!(launcher.launch(link, &params).is_err());
        assert!(launcher.session().is_none());
        assert!(handle.connect_args().is_none());
        match rx.try_recv() {
            Ok(Notification::Log(line)) => assert!(line.starts_with("error:")),
            other => panic!("expected log entry, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_connect_disconnects_and_logs() {
        let (mut launcher, mut rx) = launcher();
        let (link, handle) = MockLink::pair();
        handle.fail_next_connect();
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671");
        let session = launcher.launch(link, &params).unwrap().clone();

        // skip the connecting status line
        rx.recv().await.unwrap();
        match rx.recv().await {
            Some(Notification::Log(line)) => assert!(line.starts_with("error:")),
            other => panic!("expected log entry, got {other:?}"),
        }
        wait_for_state(&session, SessionState::Disconnected).await;
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn relaunch_disposes_previous_session() {
        let (mut launcher, mut _rx) = launcher();
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671");

        let (link, first_handle) = MockLink::pair();
        let first = launcher.launch(link, &params).unwrap().clone();
        wait_for_state(&first, SessionState::Connected).await;

        let (link, _second_handle) = MockLink::pair();
        let second = launcher.launch(link, &params).unwrap().clone();
        wait_for_state(&first, SessionState::Disconnected).await;
        wait_for_state(&second, SessionState::Connected).await;
        assert_eq!(first_handle.close_count(), 1);
    }

    #[tokio::test]
    async fn session_end_to_end_write() {
        let (mut launcher, mut rx) = launcher();
        let (link, handle) = MockLink::pair();
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671");
        let session = launcher.launch(link, &params).unwrap().clone();
        wait_for_state(&session, SessionState::Connected).await;
        // drain status notifications
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        session.write_group(ga!(1/2/3), "on");
        for _ in 0..100 {
            if !handle.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(
            handle.sent(),
            vec![crate::link::mock::SentCommand::Write(
                ga!(1/2/3),
                vec![0x01]
            )]
        );
    }
}
