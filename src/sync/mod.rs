//! Synchronization and Concurrency Support
//!
//! ISR-safe building blocks shared by the modem core and its users:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Async waker storage (`async` feature)
//!
//! - **Completion notifier** (`signal`)
//!   - [`CompletionSignal`] - single-slot outcome mailbox, pollable or awaitable
//!
//! - **Interrupt deferral** (`deferred`)
//!   - [`IrqDeferral`] - bounded queue of IRQ lines from the ISR to the
//!     deferred context
//!
//! # Example
//!
//! ```ignore
//! use ph_lora_modem::sync::{CompletionSignal, IrqDeferral};
//!
//! static DEFERRAL: IrqDeferral<4> = IrqDeferral::new();
//! static TX_DONE: CompletionSignal = CompletionSignal::new();
//!
//! fn dio1_isr() {
//!     DEFERRAL.pend(IrqLine::Dio1);
//! }
//! ```

pub(crate) mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;

pub mod deferred;
pub mod signal;

#[cfg(feature = "async")]
pub use deferred::IrqFuture;
pub use deferred::IrqDeferral;
#[cfg(feature = "async")]
pub use signal::CompletionFuture;
pub use signal::{Completion, CompletionSignal, ReceivedPacket};
