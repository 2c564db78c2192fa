//! Centralized Constants
//!
//! Single source of truth for the magic numbers used by the modem core.
//!
//! # Organization
//!
//! - **Payload sizes**: packet buffer dimensions
//! - **Timing**: wait multipliers and polling intervals
//! - **Deferral**: interrupt queue depth

// =============================================================================
// Payload Sizes
// =============================================================================

/// Largest LoRa payload the radio FIFO can hold
pub const MAX_PAYLOAD_LEN: usize = 255;

// =============================================================================
// Timing Constants
// =============================================================================

/// Blocking send waits this many times the computed time-on-air
///
/// Separates a genuinely lost TX done from ordinary timing jitter.
pub const TX_TIMEOUT_MULTIPLIER: u32 = 2;

/// Poll interval while blocked on a completion notifier, in microseconds
pub const WAIT_POLL_INTERVAL_US: u32 = 100;

/// Receive timeout value meaning "stay in RX until a packet or an explicit stop"
pub const RX_CONTINUOUS: u32 = 0;

// =============================================================================
// Deferral
// =============================================================================

/// Default number of IRQ edges buffered between the ISR and the deferred context
pub const DEFAULT_DEFERRED_DEPTH: usize = 4;
