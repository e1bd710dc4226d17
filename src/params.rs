//! Connection parameters for a tunnel session.
//!
//! [`ConnectionParameters`] is an immutable record describing how to reach a
//! KNX gateway: an IP endpoint (host and UDP port) or a serial port, plus the
//! NAT-aware and routing-mode flags. The launcher validates the record once
//! and turns it into the argument vector handed to the bus link.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// Immutable parameters for one connection attempt.
///
/// Fields are set through the constructors and `with_*` builders and cannot
/// change afterwards, so a spawned worker and the caller always agree on what
/// was requested. An empty string counts as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParameters {
    local_host: String,
    host: String,
    port: String,
    use_nat: bool,
    routing: bool,
}

impl ConnectionParameters {
    /// Parameters for an IP tunnel to `host` on UDP `port`.
    pub fn tunnel(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            local_host: String::new(),
            host: host.into(),
            port: port.into(),
            use_nat: false,
            routing: false,
        }
    }

    /// Parameters for an FT1.2 connection over serial `port`.
    ///
    /// Equivalent to an empty host: whether a connection is serial is decided
    /// by the host field alone.
    pub fn serial(port: impl Into<String>) -> Self {
        Self::tunnel("", port)
    }

    /// Bind the local endpoint to `local_host`.
    pub fn with_local_host(mut self, local_host: impl Into<String>) -> Self {
        self.local_host = local_host.into();
        self
    }

    /// Enable NAT-aware addressing.
    pub fn with_nat(mut self, use_nat: bool) -> Self {
        self.use_nat = use_nat;
        self
    }

    /// Use KNXnet/IP routing instead of tunneling.
    pub fn with_routing(mut self, routing: bool) -> Self {
        self.routing = routing;
        self
    }

    /// Remote host, empty for serial connections.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// UDP or serial port.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Local endpoint override, empty when unset.
    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    /// Whether this is a serial connection (no host given).
    pub fn is_serial(&self) -> bool {
        self.host.is_empty()
    }

    /// Whether NAT-aware addressing is requested.
    pub fn use_nat(&self) -> bool {
        self.use_nat
    }

    /// Whether routing mode is requested.
    pub fn uses_routing(&self) -> bool {
        self.routing
    }

    /// Check that the record names at least one endpoint.
    ///
    /// # Errors
    ///
    /// Returns a missing-endpoint config error when both host and port are
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() && self.port.is_empty() {
            return Err(MonitorError::missing_endpoint());
        }
        Ok(())
    }

    /// Build the argument vector for the bus link.
    ///
    /// A non-empty host selects the IP path: local host override, remote
    /// host, NAT flag, routing flag, `-p <port>`. An empty host selects the
    /// serial path, which is only `-s <port>`. Both end with the `monitor`
    /// command.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.host.is_empty() {
            if !self.local_host.is_empty() {
                args.push("-localhost".to_owned());
                args.push(self.local_host.clone());
            }
            args.push(self.host.clone());
            if self.use_nat {
                args.push("-nat".to_owned());
            }
            if self.routing {
                args.push("-routing".to_owned());
            }
            if !self.port.is_empty() {
                args.push("-p".to_owned());
                args.push(self.port.clone());
            }
        } else {
            args.push("-s".to_owned());
            args.push(self.port.clone());
        }
        args.push("monitor".to_owned());
        args
    }

    /// Human-readable status line, e.g.
    /// `"Connecting to 10.0.0.5 on port 3671, using NAT"`.
    pub fn status_line(&self, prefix: &str) -> String {
        let mut line = String::from(prefix);
        if !self.host.is_empty() {
            line.push_str(" to ");
            line.push_str(&self.host);
        }
        line.push_str(" on port ");
        line.push_str(&self.port);
        if self.use_nat {
            line.push_str(", using NAT");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_an_endpoint() {
        assert!(ConnectionParameters::tunnel("", "").validate().is_err());
        assert!(ConnectionParameters::tunnel("10.0.0.5", "").validate().is_ok());
        assert!(ConnectionParameters::tunnel("", "3671").validate().is_ok());
        assert!(ConnectionParameters::serial("/dev/ttyUSB0").validate().is_ok());
    }

    #[test]
    fn tunnel_args_in_fixed_order() {
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671");
        assert_eq!(params.to_args(), vec!["10.0.0.5", "-p", "3671", "monitor"]);
    }

    #[test]
    fn full_tunnel_args() {
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671")
            .with_local_host("192.168.1.10")
            .with_nat(true)
            .with_routing(true);
        assert_eq!(
            params.to_args(),
            vec![
                "-localhost",
                "192.168.1.10",
                "10.0.0.5",
                "-nat",
                "-routing",
                "-p",
                "3671",
                "monitor"
            ]
        );
    }

    #[test]
    fn serial_args_use_serial_flag() {
        let params = ConnectionParameters::serial("/dev/ttyUSB0");
        assert!(params.is_serial());
        assert_eq!(params.to_args(), vec!["-s", "/dev/ttyUSB0", "monitor"]);
    }

    #[test]
    fn empty_host_takes_the_serial_path() {
        let params = ConnectionParameters::tunnel("", "3671");
        assert!(params.is_serial());
        assert_eq!(params.to_args(), vec!["-s", "3671", "monitor"]);
    }

    #[test]
    fn serial_path_ignores_ip_only_flags() {
        let params = ConnectionParameters::serial("/dev/ttyUSB0")
            .with_local_host("192.168.1.10")
            .with_nat(true)
            .with_routing(true);
        assert_eq!(params.to_args(), vec!["-s", "/dev/ttyUSB0", "monitor"]);
    }

    #[test]
    fn status_line_variants() {
        let params = ConnectionParameters::tunnel("10.0.0.5", "3671").with_nat(true);
        assert_eq!(
            params.status_line("Connecting"),
            "Connecting to 10.0.0.5 on port 3671, using NAT"
        );
        let serial = ConnectionParameters::serial("/dev/ttyUSB0");
        assert_eq!(
            serial.status_line("Connected"),
            "Connected on port /dev/ttyUSB0"
        );
    }
}
