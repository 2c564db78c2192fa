//! Error types for the LoRa modem core
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ModemError`]: Arbiter contention and caller precondition failures
//! - [`IoError`]: Outcome of a submitted send/receive operation
//! - [`RadioError`]: Failures reported by the chip driver
//! - [`ConfigError`]: Rejected modem configuration
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most modem methods.

// =============================================================================
// Modem Errors
// =============================================================================

/// Arbiter and precondition errors
///
/// `Busy` is an expected contention outcome, not a fault. Retry policy
/// belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemError {
    /// Another operation owns the modem
    Busy,
    /// Operation not valid in the current state (no configuration,
    /// nothing to cancel, ...)
    InvalidState,
}

impl core::fmt::Display for ModemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ModemError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModemError::Busy => "device busy",
            ModemError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Operation outcome errors
///
/// These are delivered through the completion notifier or returned from the
/// blocking entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Wait deadline elapsed with no completion
    Timeout,
    /// Radio reported a fault (header, sync, CRC, TX watchdog)
    PeripheralError,
    /// Continuous receive was explicitly stopped
    Canceled,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::PeripheralError => "peripheral error",
            IoError::Canceled => "operation canceled",
        }
    }
}

// =============================================================================
// Radio Errors
// =============================================================================

/// Errors raised by the chip driver behind [`RadioDriver`](crate::radio::RadioDriver)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Bus transfer to the radio failed
    Bus,
    /// Payload exceeds the configured maximum
    PayloadTooLarge,
    /// Radio has not been initialized
    NotConfigured,
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RadioError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RadioError::Bus => "radio bus error",
            RadioError::PayloadTooLarge => "payload too large",
            RadioError::NotConfigured => "radio not configured",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Returned by [`ModemConfig::validate`](crate::ModemConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Carrier frequency is zero
    InvalidFrequency,
    /// Preamble shorter than the radio can detect
    InvalidPreamble,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidFrequency => "invalid carrier frequency",
            ConfigError::InvalidPreamble => "invalid preamble length",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match modem.send(&payload, &mut delay) {
///     Err(Error::Modem(ModemError::Busy)) => { /* retry later */ }
///     Err(Error::Io(IoError::Timeout)) => { /* no TX done */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Arbiter or precondition error
    Modem(ModemError),
    /// Operation outcome error
    Io(IoError),
    /// Chip driver error
    Radio(RadioError),
    /// Configuration error
    Config(ConfigError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Modem(e) => write!(f, "modem: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Radio(e) => write!(f, "radio: {}", e.as_str()),
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Error::Modem(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Error::Radio(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result type alias for modem operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration checks
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for chip driver calls
pub type RadioResult<T> = core::result::Result<T, RadioError>;

// =============================================================================
// Unit Tests
// =============================================================================
