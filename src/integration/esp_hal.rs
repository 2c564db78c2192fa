//! esp-hal Integration Module
//!
//! Glue for running the modem core on esp-hal targets when the `esp-hal`
//! feature is enabled:
//!
//! - [`modem_isr!`]: defines a GPIO interrupt handler that only pends the
//!   radio's IRQ line on an [`IrqDeferral`](crate::IrqDeferral)
//! - [`ModemEspExt`]: blocking send/receive using esp-hal's [`Delay`]
//! - Re-exports of the esp-hal types those need
//!
//! # Usage
//!
//! ```ignore
//! use ph_lora_modem::{IrqDeferral, IrqLine, Modem, modem_isr};
//! use ph_lora_modem::esp_hal::{ModemEspExt, Priority};
//!
//! static MODEM: Modem<Sx1262<Spi>> = Modem::new(Sx1262::new(SPI));
//! static DEFERRAL: IrqDeferral<4> = IrqDeferral::new();
//! static DIO1: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));
//!
//! modem_isr!(DIO1_HANDLER, Priority::Priority1, DEFERRAL, IrqLine::Dio1, {
//!     critical_section::with(|cs| {
//!         if let Some(pin) = DIO1.borrow_ref_mut(cs).as_mut() {
//!             pin.clear_interrupt();
//!         }
//!     });
//! });
//!
//! fn main() {
//!     io.set_interrupt_handler(DIO1_HANDLER);
//!     MODEM.init().unwrap();
//!     MODEM.configure(config).unwrap();
//!     MODEM.send_blocking(b"ping").unwrap();
//! }
//!
//! #[embassy_executor::task]
//! async fn deferred() {
//!     MODEM.run_deferred(&DEFERRAL).await
//! }
//! ```

// Re-export esp-hal types for convenience
pub use esp_hal::delay::Delay;
pub use esp_hal::interrupt::{InterruptHandler, Priority};

use crate::driver::error::Result;
use crate::driver::modem::Modem;
use crate::radio::{RadioDriver, RxQuality};

/// Blocking operations using esp-hal's busy-wait [`Delay`].
pub trait ModemEspExt {
    /// [`Modem::send`] with an esp-hal delay provider
    ///
    /// # Errors
    ///
    /// Same as [`Modem::send`].
    fn send_blocking(&self, data: &[u8]) -> Result<()>;

    /// [`Modem::receive`] with an esp-hal delay provider
    ///
    /// # Errors
    ///
    /// Same as [`Modem::receive`].
    fn receive_blocking(&self, buf: &mut [u8], timeout_ms: u32) -> Result<(usize, RxQuality)>;
}

impl<R: RadioDriver> ModemEspExt for Modem<R> {
    fn send_blocking(&self, data: &[u8]) -> Result<()> {
        let mut delay = Delay::new();
        self.send(data, &mut delay)
    }

    fn receive_blocking(&self, buf: &mut [u8], timeout_ms: u32) -> Result<(usize, RxQuality)> {
        let mut delay = Delay::new();
        self.receive(buf, timeout_ms, &mut delay)
    }
}

/// Macro for defining a radio IRQ handler with esp-hal semantics.
///
/// The handler runs the optional `$body` (typically clearing the GPIO
/// interrupt flag) and then pends `$line` on `$deferral`. It never touches
/// the modem itself; completion logic runs in the deferred context.
///
/// # Parameters
///
/// - `$name`: The name for the handler constant (e.g., `DIO1_HANDLER`)
/// - `$priority`: The interrupt priority (e.g., `Priority::Priority1`)
/// - `$deferral`: A `static` [`IrqDeferral`](crate::IrqDeferral)
/// - `$line`: The [`IrqLine`](crate::IrqLine) to pend
/// - `$body`: Optional block run before pending
///
/// # Equivalent Code
///
/// ```ignore
/// #[esp_hal::handler(priority = $priority)]
/// fn __modem_isr_internal() {
///     $body
///     $deferral.pend($line);
/// }
/// const $name: InterruptHandler = __modem_isr_internal;
/// ```
#[macro_export]
macro_rules! modem_isr {
    ($name:ident, $priority:expr, $deferral:expr, $line:expr) => {
        $crate::modem_isr!($name, $priority, $deferral, $line, {});
    };
    ($name:ident, $priority:expr, $deferral:expr, $line:expr, $body:block) => {
        #[allow(non_upper_case_globals)]
        const $name: $crate::esp_hal::InterruptHandler = {
            #[esp_hal::handler(priority = $priority)]
            fn __modem_isr_internal() {
                $body
                $deferral.pend($line);
            }
            __modem_isr_internal
        };
    };
}
