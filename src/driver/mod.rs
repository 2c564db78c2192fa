//! Core modem components.
//!
//! - [`config`] - Configuration types and builder
//! - [`error`] - Error types and result aliases
//! - [`arbiter`] - Free/Busy/Cleanup state machine
//! - [`context`] - Per-operation record and the packet handler trait
//! - [`modem`] - The [`Modem`] core, with its operations split across
//!   `transmit`, `receive` and `completion`
//!
//! # Example
//!
//! ```ignore
//! use ph_lora_modem::driver::{Direction, Modem, ModemConfig};
//!
//! let config = ModemConfig::new()
//!     .with_frequency(868_100_000)
//!     .with_direction(Direction::Tx);
//! ```

// Submodules
pub mod arbiter;
pub mod config;
pub mod context;
pub mod error;
pub mod modem;

mod completion;
mod receive;
mod transmit;

// Re-exports for convenience
pub use arbiter::{Arbiter, ModemState, OperationId};
pub use config::{Bandwidth, CodingRate, Direction, ModemConfig, SpreadingFactor};
pub use context::{OperationKind, PacketHandler};
pub use error::{
    ConfigError, ConfigResult, Error, IoError, ModemError, RadioError, RadioResult, Result,
};
#[cfg(feature = "async")]
pub use modem::FreeFuture;
pub use modem::Modem;
