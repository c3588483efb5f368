//! Half-duplex packet radio abstraction
//!
//! Modelled on the SX127x family: one packet in flight at a time, every
//! operation bounded by a caller-supplied timeout.

/// Largest payload a single LoRa packet can carry
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Classification of radio errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioErrorKind {
    /// Operation did not complete within its timeout
    Timeout,
    /// Packet received with a bad CRC
    Crc,
    /// Payload larger than the modem accepts
    PayloadTooLarge,
    /// SPI or pin error talking to the modem
    Bus,
    /// Anything else
    Other,
}

/// Radio error that can be classified
pub trait RadioError: core::fmt::Debug {
    /// Convert to a generic error kind
    fn kind(&self) -> RadioErrorKind;
}

impl RadioError for RadioErrorKind {
    fn kind(&self) -> RadioErrorKind {
        *self
    }
}

/// LoRa signal bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    Khz62_5,
    #[default]
    Khz125,
    Khz250,
    Khz500,
}

/// LoRa spreading factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpreadingFactor {
    Sf7,
    Sf8,
    #[default]
    Sf9,
    Sf10,
    Sf11,
    Sf12,
}

/// LoRa forward error correction rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodingRate {
    Cr4_5,
    Cr4_6,
    #[default]
    Cr4_7,
    Cr4_8,
}

/// Modem settings handed to the driver once at startup
///
/// The defaults are the settings every node in the family uses; two nodes
/// only hear each other if all of these match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoraConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    pub bandwidth: Bandwidth,
    pub spreading_factor: SpreadingFactor,
    pub coding_rate: CodingRate,
    /// Explicit header mode (length and coding rate sent in the header)
    pub explicit_header: bool,
    /// Preamble length in symbols
    pub preamble_len: u16,
    /// Invert IQ (false for node-to-node traffic)
    pub iq_inverted: bool,
    /// Append and check payload CRC
    pub crc: bool,
    /// Sync word (0x12 = private network)
    pub sync_word: u8,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 916_800_000,
            bandwidth: Bandwidth::Khz125,
            spreading_factor: SpreadingFactor::Sf9,
            coding_rate: CodingRate::Cr4_7,
            explicit_header: true,
            preamble_len: 12,
            iq_inverted: false,
            crc: true,
            sync_word: 0x12,
            tx_power_dbm: 20,
        }
    }
}

/// Half-duplex packet radio
///
/// Power is not managed here; the enable line is a separate
/// [`OutputPin`](crate::gpio::OutputPin) owned by the same component.
pub trait Radio {
    /// Error type for radio operations
    type Error: RadioError;

    /// Reset the modem and check that it answers
    async fn detect(&mut self) -> bool;

    /// Apply modem settings
    async fn configure(&mut self, config: &LoraConfig) -> Result<(), Self::Error>;

    /// Listen for one packet
    ///
    /// Returns `Ok(Some(len))` with the packet in `buf[..len]`, or `Ok(None)`
    /// when nothing arrived before `timeout_ms` elapsed.
    async fn receive(&mut self, buf: &mut [u8], timeout_ms: u32)
        -> Result<Option<usize>, Self::Error>;

    /// Transmit one packet, waiting at most `timeout_ms` for TX done
    async fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lora_config_matches_field_devices() {
        let config = LoraConfig::default();
        assert_eq!(config.frequency_hz, 916_800_000);
        assert_eq!(config.spreading_factor, SpreadingFactor::Sf9);
        assert_eq!(config.coding_rate, CodingRate::Cr4_7);
        assert_eq!(config.preamble_len, 12);
        assert_eq!(config.sync_word, 0x12);
        assert_eq!(config.tx_power_dbm, 20);
        assert!(config.crc);
    }
}
