//! LoRa Modem Core
//!
//! A `no_std`, `no_alloc` arbiter and operation state machine for a single
//! half-duplex LoRa transceiver (SX126x, SX127x, ...).
//!
//! The crate owns the hard part of a radio driver: deciding who may use the
//! radio, carrying each operation from submission to its interrupt-driven
//! completion, and resolving the race between a caller that stops waiting and
//! a completion that is already on its way. Register access, bus setup and PHY
//! arithmetic stay in a chip driver behind [`RadioDriver`].
//!
//! # Architecture
//!
//! 1. **Arbiter** ([`driver::arbiter`]): `Free -> Busy -> Cleanup -> Free`,
//!    with the `Busy -> Cleanup` compare-and-set deciding who finalizes
//! 2. **Modem** ([`Modem`]): blocking and async send/receive built on the
//!    arbiter, plus the completion handlers
//! 3. **Deferral** ([`IrqDeferral`]): the ISR only pends an IRQ line; the
//!    deferred context drains it with [`Modem::process_deferred`]
//! 4. **Radio** ([`radio`]): the capability trait chip drivers implement
//!
//! # Features
//!
//! - `async` (default): futures for completion, arbiter and deferral waits
//! - `defmt`: defmt logging and `defmt::Format` on public types
//! - `log`: log facade logging
//! - `esp-hal`: esp-hal interrupt handler macro and delay helpers
//!
//! # Example
//!
//! ```ignore
//! use ph_lora_modem::{Direction, IrqDeferral, IrqLine, Modem, ModemConfig};
//!
//! static MODEM: Modem<Sx1262<Spi>> = Modem::new(Sx1262::new(SPI));
//! static DEFERRAL: IrqDeferral<4> = IrqDeferral::new();
//!
//! // DIO1 interrupt handler
//! fn on_dio1() {
//!     DEFERRAL.pend(IrqLine::Dio1);
//! }
//!
//! // Deferred context (thread, work loop or async task)
//! fn irq_worker() {
//!     MODEM.process_deferred(&DEFERRAL);
//! }
//!
//! MODEM.init()?;
//! MODEM.configure(ModemConfig::new().with_direction(Direction::Tx))?;
//! MODEM.send(b"hello", &mut delay)?;
//! ```
//!
//! # Memory Requirements
//!
//! A [`Modem`] holds the radio driver, the operation context and one
//! packet-sized (255 byte) outcome slot. An [`IrqDeferral`] costs one byte per
//! queue entry plus bookkeeping. Nothing is heap allocated.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Lint levels mirror the [lints] tables in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod radio;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "esp-hal")]
#[cfg_attr(docsrs, doc(cfg(feature = "esp-hal")))]
pub mod integration;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::arbiter::{ModemState, OperationId};
pub use driver::config::{Bandwidth, CodingRate, Direction, ModemConfig, SpreadingFactor};
pub use driver::context::{OperationKind, PacketHandler};
pub use driver::error::{
    ConfigError, ConfigResult, Error, IoError, ModemError, RadioError, RadioResult, Result,
};
pub use driver::modem::Modem;
pub use radio::{IrqLine, Packet, RadioDriver, RadioEvent, RxQuality};
pub use sync::{Completion, CompletionSignal, IrqDeferral, ReceivedPacket};

// esp-hal facade re-export (for ergonomic access)
#[cfg(feature = "esp-hal")]
pub mod esp_hal {
    //! esp-hal integration facade.
    //!
    //! This module re-exports esp-hal integration helpers for ergonomic access.

    #![cfg_attr(docsrs, doc(cfg(feature = "esp-hal")))]

    pub use crate::integration::esp_hal::{Delay, InterruptHandler, ModemEspExt, Priority};
    pub use crate::modem_isr;
}

/// Shared modem constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Deferral
        DEFAULT_DEFERRED_DEPTH,
        // Payload
        MAX_PAYLOAD_LEN,
        // Timing
        RX_CONTINUOUS,
        TX_TIMEOUT_MULTIPLIER,
        WAIT_POLL_INTERVAL_US,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static modem and its interrupt deferral queue.
///
/// The radio driver expression must be usable in a `const` context.
///
/// # Examples
///
/// ```ignore
/// ph_lora_modem::modem_static!(MODEM, DEFERRAL, Sx1262<Spi>, Sx1262::new(SPI));
///
/// MODEM.init().unwrap();
/// DEFERRAL.pend(IrqLine::Dio1);
/// MODEM.process_deferred(&DEFERRAL);
/// ```
#[macro_export]
macro_rules! modem_static {
    ($modem:ident, $deferral:ident, $radio:ty, $init:expr) => {
        $crate::modem_static!(
            $modem,
            $deferral,
            $radio,
            $init,
            $crate::constants::DEFAULT_DEFERRED_DEPTH
        );
    };
    ($modem:ident, $deferral:ident, $radio:ty, $init:expr, $depth:expr) => {
        static $modem: $crate::Modem<$radio> = $crate::Modem::new($init);
        static $deferral: $crate::IrqDeferral<{ $depth }> = $crate::IrqDeferral::new();
    };
}
