//! Completion events reported by the radio.
//!
//! The chip driver turns a serviced IRQ into one [`RadioEvent`]; the modem
//! core feeds it into the operation state machine.

use crate::internal::constants::MAX_PAYLOAD_LEN;

/// Fixed-capacity buffer holding one received payload.
pub type Packet = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// Radio interrupt line that raised an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqLine {
    /// DIO1 (TX done, RX done, timeouts, CRC errors on SX126x)
    Dio1,
    /// DIO2
    Dio2,
    /// DIO3
    Dio3,
}

/// Signal quality of a received packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxQuality {
    /// Packet RSSI in dBm
    pub rssi_dbm: i16,
    /// Packet SNR in dB
    pub snr_db: i8,
}

impl RxQuality {
    /// Create a quality record
    pub const fn new(rssi_dbm: i16, snr_db: i8) -> Self {
        Self { rssi_dbm, snr_db }
    }
}

/// A hardware completion event, already decoded from the radio's IRQ status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    /// Transmission finished
    TxDone,
    /// Radio-internal TX watchdog fired (also ends a continuous-wave test)
    TxTimeout,
    /// Packet received; payload was written to the caller's [`Packet`]
    RxDone(RxQuality),
    /// Radio-internal RX window expired
    RxTimeout,
    /// Header, sync or CRC fault on reception
    RxError,
}
