//! External Stack Integrations
//!
//! - **esp-hal** (`esp_hal`): Integration with the esp-hal hardware abstraction layer
//!   - GPIO interrupt handler definition that feeds the deferral queue
//!   - Blocking operations with esp-hal's delay provider
//!   - Requires `esp-hal` feature
//!
//! # Example
//!
//! ```ignore
//! use ph_lora_modem::integration::esp_hal::{ModemEspExt, Priority};
//! modem_isr!(DIO1_HANDLER, Priority::Priority1, DEFERRAL, IrqLine::Dio1);
//! MODEM.send_blocking(b"ping")?;
//! ```

#[cfg(feature = "esp-hal")]
pub mod esp_hal;

#[cfg(feature = "esp-hal")]
pub use esp_hal::ModemEspExt;
