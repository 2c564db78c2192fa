//! Radio Capability Interface
//!
//! This module defines the narrow boundary the modem core drives the
//! transceiver through. Register transfers, pin and bus setup, and PHY
//! parameter computation all live behind [`RadioDriver`], implemented per
//! chip (SX126x, SX127x, ...).
//!
//! # Event flow
//!
//! The chip driver never calls into the modem core on its own. When the
//! deferred context services an IRQ edge, the core calls
//! [`RadioDriver::process_irq`], which reads and clears the chip's IRQ
//! status and reports at most one [`RadioEvent`] per call. The core keeps
//! calling until it returns `None`.
//!
//! # Example Implementation
//!
//! ```ignore
//! struct Sx1262<SPI> {
//!     device: sx1262::Device<SPI>,
//!     sleeping: bool,
//! }
//!
//! impl<SPI: SpiDevice> RadioDriver for Sx1262<SPI> {
//!     fn sleep(&mut self) -> RadioResult<()> {
//!         self.device
//!             .execute_command(SetSleep { config: SleepConfig::WarmStart })
//!             .map_err(|_| RadioError::Bus)?;
//!         self.sleeping = true;
//!         Ok(())
//!     }
//!
//!     // ... other methods
//! }
//! ```

mod event;

pub use event::{IrqLine, Packet, RadioEvent, RxQuality};

use crate::driver::config::ModemConfig;
use crate::driver::error::RadioResult;

// =============================================================================
// Radio Driver Trait
// =============================================================================

/// Capabilities the modem core needs from a half-duplex transceiver.
///
/// All methods are called with the modem's radio lock held, from either a
/// caller thread or the deferred context. None of them may block waiting for
/// an interrupt.
pub trait RadioDriver {
    /// Bring the chip out of reset and into a configurable state
    fn init(&mut self) -> RadioResult<()>;

    /// Enter the lowest-power state that keeps configuration
    fn sleep(&mut self) -> RadioResult<()>;

    /// Report whether the chip is in its low-power state
    ///
    /// Drivers without a sleep notion keep the default.
    fn is_sleeping(&self) -> bool {
        false
    }

    /// Wake the chip from its low-power state
    ///
    /// Only called when [`is_sleeping`](Self::is_sleeping) returns `true`.
    /// On SX126x this is a `GetStatus` command with NSS toggling.
    fn wakeup(&mut self) -> RadioResult<()> {
        Ok(())
    }

    /// Apply modulation, packet and channel parameters
    fn configure(&mut self, config: &ModemConfig) -> RadioResult<()>;

    /// Select the public (0x34) or private (0x12) LoRa sync word
    fn set_public_network(&mut self, enable: bool) -> RadioResult<()>;

    /// Set the payload length for the next packet
    fn set_max_payload(&mut self, len: u8) -> RadioResult<()>;

    /// Time on air of a `len`-byte packet, in milliseconds
    fn time_on_air(&self, config: &ModemConfig, len: u8) -> u32;

    /// Load `data` and start transmitting
    fn send(&mut self, data: &[u8]) -> RadioResult<()>;

    /// Enter receive mode
    ///
    /// `timeout_ms` of [`RX_CONTINUOUS`](crate::constants::RX_CONTINUOUS)
    /// keeps the receiver open until a packet arrives.
    fn enter_receive(&mut self, timeout_ms: u32) -> RadioResult<()>;

    /// Emit an unmodulated carrier for `duration_s` seconds
    ///
    /// The radio must report [`RadioEvent::TxTimeout`] when the run ends.
    fn continuous_wave(&mut self, frequency_hz: u32, power_dbm: i8, duration_s: u16)
    -> RadioResult<()>;

    /// Read and clear the IRQ status raised on `line`
    ///
    /// On [`RadioEvent::RxDone`] the payload is copied into `packet`.
    /// Returns `None` once no unserviced event remains.
    fn process_irq(&mut self, line: IrqLine, packet: &mut Packet)
    -> RadioResult<Option<RadioEvent>>;
}
