//! Bus link abstraction.
//!
//! [`BusLink`] is the seam between the session machinery and the actual
//! KNXnet/IP or serial transport. The session pump owns the link exclusively:
//! it connects, issues group reads and writes, and drains incoming group
//! events until the link reports shutdown or an error.
//!
//! [`mock::MockLink`] implements the trait in-process for tests.

use crate::address::{GroupAddress, IndividualAddress};
use crate::error::Result;
use async_trait::async_trait;
use core::fmt;

pub mod mock;

// =============================================================================
// Service Kind
// =============================================================================

/// The application-layer service of a group event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// A-GroupValue-Read request (APCI 0x00)
    ReadRequest,
    /// A-GroupValue-Response (APCI 0x40)
    ReadResponse,
    /// A-GroupValue-Write (APCI 0x80)
    Write,
}

impl ServiceKind {
    /// Classify an APCI value, masking the 6 data bits of the low byte.
    pub fn from_apci(apci: u8) -> Option<Self> {
        match apci & 0xC0 {
            0x00 => Some(Self::ReadRequest),
            0x40 => Some(Self::ReadResponse),
            0x80 => Some(Self::Write),
            _ => None,
        }
    }

    /// Display label used in the event table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadRequest => "read request",
            Self::ReadResponse => "read response",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Link Event
// =============================================================================

/// One group communication observed on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    /// Individual address of the sending device
    pub source: IndividualAddress,
    /// Destination group address
    pub destination: GroupAddress,
    /// Application-layer service
    pub service: ServiceKind,
    /// ASDU, byte 0 holding the APCI low byte; empty for read requests
    pub asdu: Vec<u8>,
}

// =============================================================================
// BusLink
// =============================================================================

/// Async transport to the KNX bus.
///
/// `next_event` follows a stream contract: `Ok(Some(event))` delivers a group
/// event, `Ok(None)` means the link shut down in an orderly fashion, and
/// `Err` reports a failure. Both `Ok(None)` and `Err` are terminal, the pump
/// must not poll again afterwards.
#[async_trait]
pub trait BusLink: Send {
    /// Establish the connection described by `args`.
    ///
    /// # Errors
    ///
    /// Returns a link error when the gateway cannot be reached.
    async fn connect(&mut self, args: &[String]) -> Result<()>;

    /// Issue a group value read request to `destination`.
    ///
    /// # Errors
    ///
    /// Returns a link error when the request cannot be sent.
    async fn group_read(&mut self, destination: GroupAddress) -> Result<()>;

    /// Write `asdu` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns a link error when the frame cannot be sent.
    async fn group_write(&mut self, destination: GroupAddress, asdu: &[u8]) -> Result<()>;

    /// Wait for the next group event.
    ///
    /// # Errors
    ///
    /// Returns a link error on receive failure; terminal.
    async fn next_event(&mut self) -> Result<Option<LinkEvent>>;

    /// Tear down the connection. Safe to call more than once.
    fn close(&mut self);

    /// Whether the link is still open.
    fn is_open(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apci_classification() {
        assert_eq!(ServiceKind::from_apci(0x00), Some(ServiceKind::ReadRequest));
        assert_eq!(ServiceKind::from_apci(0x40), Some(ServiceKind::ReadResponse));
        assert_eq!(ServiceKind::from_apci(0x80), Some(ServiceKind::Write));
        // data bits in the low byte do not change the service
        assert_eq!(ServiceKind::from_apci(0x81), Some(ServiceKind::Write));
        assert_eq!(ServiceKind::from_apci(0x7F), Some(ServiceKind::ReadResponse));
        assert_eq!(ServiceKind::from_apci(0xC0), None);
    }

    #[test]
    fn display_labels() {
        assert_eq!(ServiceKind::Write.to_string(), "write");
        assert_eq!(ServiceKind::ReadRequest.to_string(), "read request");
    }
}
