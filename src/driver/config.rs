//! Configuration types for the LoRa modem
//!
//! The core only stores and forwards these values; turning them into
//! register settings or airtime is the chip driver's job.

use super::error::{ConfigError, ConfigResult};

/// Shortest preamble (in symbols) the receivers reliably detect
const MIN_PREAMBLE_LEN: u16 = 6;

/// LoRa channel bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    /// 125 kHz
    #[default]
    Khz125,
    /// 250 kHz
    Khz250,
    /// 500 kHz
    Khz500,
}

impl Bandwidth {
    /// Bandwidth in Hz
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Bandwidth::Khz125 => 125_000,
            Bandwidth::Khz250 => 250_000,
            Bandwidth::Khz500 => 500_000,
        }
    }
}

/// LoRa spreading factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpreadingFactor {
    /// SF6
    Sf6 = 6,
    /// SF7 (default)
    #[default]
    Sf7 = 7,
    /// SF8
    Sf8 = 8,
    /// SF9
    Sf9 = 9,
    /// SF10
    Sf10 = 10,
    /// SF11
    Sf11 = 11,
    /// SF12
    Sf12 = 12,
}

impl SpreadingFactor {
    /// Numeric spreading factor
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

/// LoRa forward error correction rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CodingRate {
    /// 4/5 (default)
    #[default]
    Cr4_5 = 1,
    /// 4/6
    Cr4_6 = 2,
    /// 4/7
    Cr4_7 = 3,
    /// 4/8
    Cr4_8 = 4,
}

/// Whether the configuration prepares the radio for sending or listening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Transmit configuration
    Tx,
    /// Receive configuration
    #[default]
    Rx,
}

/// Complete modem configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Channel bandwidth
    pub bandwidth: Bandwidth,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Coding rate
    pub coding_rate: CodingRate,
    /// Preamble length in symbols
    pub preamble_len: u16,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// TX or RX configuration
    pub direction: Direction,
    /// Invert IQ (downlink-style)
    pub iq_inverted: bool,
    /// Use the public LoRaWAN sync word
    pub public_network: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemConfig {
    /// Create a new configuration with defaults (868.1 MHz, SF7, 125 kHz, 4/5)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frequency_hz: 868_100_000,
            bandwidth: Bandwidth::Khz125,
            spreading_factor: SpreadingFactor::Sf7,
            coding_rate: CodingRate::Cr4_5,
            preamble_len: 8,
            tx_power_dbm: 14,
            direction: Direction::Rx,
            iq_inverted: false,
            public_network: true,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the carrier frequency
    #[must_use]
    pub const fn with_frequency(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    /// Set the bandwidth
    #[must_use]
    pub const fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Set the spreading factor
    #[must_use]
    pub const fn with_spreading_factor(mut self, sf: SpreadingFactor) -> Self {
        self.spreading_factor = sf;
        self
    }

    /// Set the coding rate
    #[must_use]
    pub const fn with_coding_rate(mut self, cr: CodingRate) -> Self {
        self.coding_rate = cr;
        self
    }

    /// Set the preamble length
    #[must_use]
    pub const fn with_preamble_len(mut self, symbols: u16) -> Self {
        self.preamble_len = symbols;
        self
    }

    /// Set the transmit power
    #[must_use]
    pub const fn with_tx_power(mut self, dbm: i8) -> Self {
        self.tx_power_dbm = dbm;
        self
    }

    /// Set the configuration direction
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Enable or disable IQ inversion
    #[must_use]
    pub const fn with_iq_inverted(mut self, inverted: bool) -> Self {
        self.iq_inverted = inverted;
        self
    }

    /// Select the public or private sync word
    #[must_use]
    pub const fn with_public_network(mut self, public: bool) -> Self {
        self.public_network = public;
        self
    }

    /// Configuration allows transmitting
    #[must_use]
    pub const fn is_tx(&self) -> bool {
        matches!(self.direction, Direction::Tx)
    }

    /// Check the values the core relies on
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidFrequency`] for a zero carrier
    /// - [`ConfigError::InvalidPreamble`] for preambles shorter than 6 symbols
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.frequency_hz == 0 {
            return Err(ConfigError::InvalidFrequency);
        }
        if self.preamble_len < MIN_PREAMBLE_LEN {
            return Err(ConfigError::InvalidPreamble);
        }
        Ok(())
    }
}
