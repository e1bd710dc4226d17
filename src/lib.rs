//! # knx-monitor
//!
//! Session and datapoint plumbing for a KNX bus monitor: launch a tunnel
//! connection to a gateway, watch group communication as typed, decoded
//! events, and read or write configured datapoints.
//!
//! The crate deliberately stops short of any user interface or wire codec.
//! A front-end supplies a [`link::BusLink`] implementation for the actual
//! transport and consumes [`sink::Notification`]s from the session; the
//! machinery in between stays the same whether the consumer is a TUI, a GUI
//! or a test harness.
//!
//! ## Quick start
//!
//! ```no_run
//! use knx_monitor::{ConnectionParameters, DatapointStore, EventSink, SessionLauncher};
//! use knx_monitor::link::mock::MockLink;
//!
//! # async fn demo() -> knx_monitor::Result<()> {
//! let (sink, mut notifications) = EventSink::default_channel();
//! let store = DatapointStore::new();
//! store.load_file("datapoints.toml").ok();
//!
//! let mut launcher = SessionLauncher::new(sink, store);
//! let (link, _handle) = MockLink::pair();
//! let params = ConnectionParameters::tunnel("192.168.1.20", "3671");
//! launcher.launch(link, &params)?;
//!
//! while let Some(notification) = notifications.recv().await {
//!     println!("{notification:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`address`] - group and individual addresses
//! - [`dpt`] - datapoint type registry and value translation
//! - [`datapoint`] - datapoint configuration files and the shared store
//! - [`params`] - connection parameters and argument building
//! - [`link`] - the bus transport seam, with an in-process mock
//! - [`session`] - the tunnel session state machine and pump
//! - [`launcher`] - spawning sessions from parameters
//! - [`sink`] - fire-and-forget notification delivery
//! - [`error`] - structured error types

pub mod address;
pub mod datapoint;
pub mod dpt;
pub mod error;
pub mod launcher;
pub mod link;
pub mod macros;
pub mod params;
pub mod session;
pub mod sink;

#[doc(inline)]
pub use address::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use datapoint::{Datapoint, DatapointMap, DatapointStore};
#[doc(inline)]
pub use dpt::{DptValue, Translator};
#[doc(inline)]
pub use error::{MonitorError, Result};
#[doc(inline)]
pub use launcher::SessionLauncher;
#[doc(inline)]
pub use link::{BusLink, LinkEvent, ServiceKind};
#[doc(inline)]
pub use params::ConnectionParameters;
#[doc(inline)]
pub use session::{GroupEvent, SessionState, TunnelSession};
#[doc(inline)]
pub use sink::{EventSink, Notification};
