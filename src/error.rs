//! Error types for monitor sessions.
//!
//! Failures are grouped by category (configuration, addressing, datapoint
//! translation, link, datapoint loading). Each category has an internal kind
//! enum and a public wrapper carrying a backtrace, with convenience
//! constructors on [`MonitorError`].
//!
//! Policy (see `session` and `launcher`): failures on a worker or callback
//! path are caught locally and turned into asynchronous log notifications;
//! none of these errors is ever allowed to take the process down.

use core::fmt;
use std::backtrace::Backtrace;

/// Result type alias for monitor operations.
pub type Result<T> = core::result::Result<T, MonitorError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Connection-parameter validation variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigErrorKind {
    /// Neither a host nor a serial port was given.
    MissingEndpoint,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressErrorKind {
    InvalidGroupAddress,
    InvalidIndividualAddress,
    OutOfRange,
}

/// Datapoint translation error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DptErrorKind {
    UnknownMainType,
    UnknownSubtype,
    InvalidData,
    ValueOutOfRange,
    InvalidValue,
}

/// Link error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkErrorKind {
    ConnectFailed,
    Timeout,
    NotConnected,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// Error type returned by all monitor operations.
#[derive(Debug)]
pub enum MonitorError {
    /// Connection-parameter validation errors
    Config(ConfigError),
    /// Address parsing and range errors
    Address(AddressError),
    /// Datapoint type translation errors (registry, encoding, decoding)
    Dpt(DptError),
    /// Errors reported by the underlying bus link
    Link(LinkError),
    /// Datapoint file loading errors (path, line, offending item)
    Load(LoadError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Connection-parameter validation error with backtrace
#[derive(Debug)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    backtrace: Backtrace,
}

impl ConfigError {
    pub(crate) fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Check whether both host and serial port were empty.
    pub fn is_missing_endpoint(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::MissingEndpoint)
    }

    /// Backtrace captured where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Addressing error with backtrace
#[derive(Debug)]
pub struct AddressError {
    kind: AddressErrorKind,
    backtrace: Backtrace,
}

impl AddressError {
    pub(crate) fn new(kind: AddressErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if an address component is out of range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressErrorKind::OutOfRange)
    }

    /// Backtrace captured where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Datapoint translation error with backtrace
#[derive(Debug)]
pub struct DptError {
    kind: DptErrorKind,
    backtrace: Backtrace,
}

impl DptError {
    pub(crate) fn new(kind: DptErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the main number or subtype id was not in the registry.
    pub fn is_unknown_type(&self) -> bool {
        matches!(
            self.kind,
            DptErrorKind::UnknownMainType | DptErrorKind::UnknownSubtype
        )
    }

    /// Check if a value was outside the subtype's range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, DptErrorKind::ValueOutOfRange)
    }

    /// Backtrace captured where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Link error with backtrace
#[derive(Debug)]
pub struct LinkError {
    kind: LinkErrorKind,
    backtrace: Backtrace,
}

impl LinkError {
    pub(crate) fn new(kind: LinkErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if this is a connect timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, LinkErrorKind::Timeout)
    }

    /// Check if the link was not (or no longer) connected.
    pub fn is_not_connected(&self) -> bool {
        matches!(self.kind, LinkErrorKind::NotConnected)
    }

    /// Backtrace captured where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Datapoint file loading error.
///
/// Carries everything the log surface needs verbatim: the file path, the
/// line number of the failure when known, and the offending item (usually
/// the group address or DPT id of the bad entry).
#[derive(Debug)]
pub struct LoadError {
    path: String,
    line: Option<usize>,
    item: Option<String>,
    message: String,
    backtrace: Backtrace,
}

impl LoadError {
    pub(crate) fn new(
        path: impl Into<String>,
        line: Option<usize>,
        item: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line,
            item,
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Path of the file that failed to load.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Line number of the failure, when the parser could attribute one.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// The offending item, when the failure is tied to a single entry.
    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    /// Underlying parser or validation message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace captured where the error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

// =============================================================================
// Convenience Constructors for MonitorError
// =============================================================================

impl MonitorError {
    // Configuration errors
    pub(crate) fn missing_endpoint() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::MissingEndpoint))
    }

    // Addressing errors
    pub(crate) fn invalid_group_address() -> Self {
        Self::Address(AddressError::new(AddressErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_individual_address() -> Self {
        Self::Address(AddressError::new(
            AddressErrorKind::InvalidIndividualAddress,
        ))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Address(AddressError::new(AddressErrorKind::OutOfRange))
    }

    // Translation errors
    pub(crate) fn unknown_main_type() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::UnknownMainType))
    }

    pub(crate) fn unknown_subtype() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::UnknownSubtype))
    }

    pub(crate) fn invalid_dpt_data() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidData))
    }

    pub(crate) fn dpt_value_out_of_range() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::ValueOutOfRange))
    }

    pub(crate) fn invalid_dpt_value() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidValue))
    }

    // Link errors
    pub(crate) fn connect_failed() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::ConnectFailed))
    }

    pub(crate) fn connect_timeout() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Timeout))
    }

    pub(crate) fn not_connected() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::NotConnected))
    }
}

impl From<LoadError> for MonitorError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::MissingEndpoint => {
                write!(f, "no host and no serial port given")
            }
        }
    }
}

impl fmt::Display for AddressErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressErrorKind::InvalidGroupAddress => write!(f, "invalid group address"),
            AddressErrorKind::InvalidIndividualAddress => {
                write!(f, "invalid individual address")
            }
            AddressErrorKind::OutOfRange => write!(f, "address component out of range"),
        }
    }
}

impl fmt::Display for DptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DptErrorKind::UnknownMainType => write!(f, "unknown DPT main number"),
            DptErrorKind::UnknownSubtype => write!(f, "unknown DPT subtype id"),
            DptErrorKind::InvalidData => write!(f, "data does not fit the datapoint type"),
            DptErrorKind::ValueOutOfRange => write!(f, "value out of range for datapoint type"),
            DptErrorKind::InvalidValue => write!(f, "value not parseable for datapoint type"),
        }
    }
}

impl fmt::Display for LinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkErrorKind::ConnectFailed => write!(f, "connection setup failed"),
            LinkErrorKind::Timeout => write!(f, "connection attempt timed out"),
            LinkErrorKind::NotConnected => write!(f, "not connected"),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to load datapoints from {}, {}",
            self.path, self.message
        )?;
        if let Some(line) = self.line {
            write!(f, ", line {line}")?;
        }
        if let Some(item) = &self.item {
            write!(f, ", item {item}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Config(e) => write!(f, "configuration error: {}", e.kind),
            MonitorError::Address(e) => write!(f, "addressing error: {}", e.kind),
            MonitorError::Dpt(e) => write!(f, "DPT error: {}", e.kind),
            MonitorError::Link(e) => write!(f, "link error: {}", e.kind),
            MonitorError::Load(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MonitorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_display_carries_path_line_and_item() {
        let err: MonitorError = LoadError::new(
            "/tmp/points.toml",
            Some(7),
            Some("40/2/3".to_owned()),
            "address component out of range",
        )
        .into();
        let text = err.to_string();
        assert!(text.contains("/tmp/points.toml"));
        assert!(text.contains("line 7"));
        assert!(text.contains("item 40/2/3"));
    }

    #[test]
    fn load_error_without_position_omits_fields() {
        let err: MonitorError =
            LoadError::new("/tmp/points.toml", None, None, "unexpected eof").into();
        let text = err.to_string();
        assert!(!text.contains("line"));
        assert!(!text.contains("item"));
    }

    #[test]
    fn predicates_match_kinds() {
        match MonitorError::missing_endpoint() {
            MonitorError::Config(e) => assert!(e.is_missing_endpoint()),
            _ => panic!("wrong category"),
        }
        match MonitorError::connect_timeout() {
            MonitorError::Link(e) => assert!(e.is_timeout()),
            _ => panic!("wrong category"),
        }
        match MonitorError::unknown_main_type() {
            MonitorError::Dpt(e) => assert!(e.is_unknown_type()),
            _ => panic!("wrong category"),
        }
    }
}
