//! Configuration type definitions
//!
//! Defaults match the deployed field devices. Zero durations mean "use the
//! default", so a partially filled config is always usable after
//! [`RadioConfig::normalized`].

use mbx_hal::LoraConfig;
use mbx_protocol::frame;
use mbx_protocol::messages::{Field, MAX_FIELD_LEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default radio receive window (ms)
pub const DEFAULT_RX_TIMEOUT_MS: u32 = 5_000;

/// Default radio transmit timeout (ms)
pub const DEFAULT_TX_TIMEOUT_MS: u32 = 10_000;

/// Default radio cycle period (ms)
pub const DEFAULT_CYCLE_PERIOD_MS: u32 = 1_000;

/// Default pause between serial reads while a frame is incomplete (ms)
pub const DEFAULT_READ_BACKOFF_MS: u32 = 100;

/// Default number of backoff pauses before a partial frame is abandoned
pub const DEFAULT_READ_RETRIES: u16 = 20;

/// Default pause between serial drains when the bus is idle (ms)
pub const DEFAULT_SERIAL_POLL_MS: u32 = 2_000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Node identity is empty
    EmptySenderId,
    /// Node identity contains a framing token
    InvalidSenderId,
    /// Node identity does not fit a frame field
    SenderIdTooLong,
    /// TOML input could not be parsed
    TomlParse,
}

/// Which directions the radio cycle serves
///
/// A node that only reports (mailbox, soil sensor) skips the whole cycle
/// when it has nothing to send. A node that must hear others (gateway,
/// display) powers up every cycle. Whenever the radio is on, the cycle
/// listens for the receive window before transmitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommunicationMode {
    TxOnly,
    #[default]
    TxRx,
}

/// What a typed queue does when it is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Overflow {
    /// Drop the new message immediately
    #[default]
    Drop,
    /// Wait up to `timeout_ms` for space, then drop
    Block { timeout_ms: u32 },
}

/// Radio duty-cycle configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RadioConfig {
    /// Receive window per cycle (ms), 0 = default
    pub rx_timeout_ms: u32,
    /// Transmit timeout (ms), 0 = default
    pub tx_timeout_ms: u32,
    /// Cycle period (ms), 0 = default
    pub cycle_period_ms: u32,
    pub mode: CommunicationMode,
    /// Carrier frequency (Hz)
    pub frequency_hz: u32,
    /// Transmit power (dBm)
    pub tx_power_dbm: i8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        let lora = LoraConfig::default();
        Self {
            rx_timeout_ms: DEFAULT_RX_TIMEOUT_MS,
            tx_timeout_ms: DEFAULT_TX_TIMEOUT_MS,
            cycle_period_ms: DEFAULT_CYCLE_PERIOD_MS,
            mode: CommunicationMode::TxRx,
            frequency_hz: lora.frequency_hz,
            tx_power_dbm: lora.tx_power_dbm,
        }
    }
}

impl RadioConfig {
    /// Build a config the way nodes declare it: zero arguments take defaults
    pub fn new(
        rx_timeout_ms: u32,
        tx_timeout_ms: u32,
        cycle_period_ms: u32,
        mode: CommunicationMode,
    ) -> Self {
        Self {
            rx_timeout_ms,
            tx_timeout_ms,
            cycle_period_ms,
            mode,
            ..Self::default()
        }
        .normalized()
    }

    /// Replace zero durations with defaults
    pub fn normalized(self) -> Self {
        let or_default = |value: u32, default: u32| if value == 0 { default } else { value };
        let lora = LoraConfig::default();
        Self {
            rx_timeout_ms: or_default(self.rx_timeout_ms, DEFAULT_RX_TIMEOUT_MS),
            tx_timeout_ms: or_default(self.tx_timeout_ms, DEFAULT_TX_TIMEOUT_MS),
            cycle_period_ms: or_default(self.cycle_period_ms, DEFAULT_CYCLE_PERIOD_MS),
            frequency_hz: or_default(self.frequency_hz, lora.frequency_hz),
            ..self
        }
    }

    /// Modem settings for this node
    pub fn lora(&self) -> LoraConfig {
        LoraConfig {
            frequency_hz: self.frequency_hz,
            tx_power_dbm: self.tx_power_dbm,
            ..LoraConfig::default()
        }
    }
}

/// Loop bus broker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerConfig {
    /// This node's identity on the loop
    pub sender_id: Field,
    /// Overflow policy of the Foo queue
    pub foo_overflow: Overflow,
    /// Overflow policy of the Status queue
    pub status_overflow: Overflow,
    /// Backoff pauses allowed while waiting for the rest of a frame
    pub read_retries: u16,
    /// Length of one backoff pause (ms)
    pub read_backoff_ms: u32,
    /// Idle pause between serial drains (ms)
    pub poll_interval_ms: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            sender_id: Field::new(),
            foo_overflow: Overflow::Drop,
            status_overflow: Overflow::Drop,
            read_retries: DEFAULT_READ_RETRIES,
            read_backoff_ms: DEFAULT_READ_BACKOFF_MS,
            poll_interval_ms: DEFAULT_SERIAL_POLL_MS,
        }
    }
}

impl BrokerConfig {
    pub fn new(sender_id: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            sender_id: validate_sender_id(sender_id)?,
            ..Self::default()
        })
    }

    /// Check the identity can be stamped on frames
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sender_id(&self.sender_id).map(|_| ())
    }
}

/// Validate a node identity and copy it into field storage
pub fn validate_sender_id(sender_id: &str) -> Result<Field, ConfigError> {
    if sender_id.is_empty() {
        return Err(ConfigError::EmptySenderId);
    }
    if sender_id.len() > MAX_FIELD_LEN {
        return Err(ConfigError::SenderIdTooLong);
    }
    frame::validate_field(sender_id).map_err(|_| ConfigError::InvalidSenderId)?;
    Field::try_from(sender_id).map_err(|_| ConfigError::SenderIdTooLong)
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeConfig {
    pub broker: BrokerConfig,
    pub radio: RadioConfig,
}

impl NodeConfig {
    /// Normalize durations and validate the identity
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.broker.validate()?;
        Ok(Self {
            radio: self.radio.normalized(),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_arguments_take_defaults() {
        let config = RadioConfig::new(0, 0, 0, CommunicationMode::TxOnly);
        assert_eq!(config.rx_timeout_ms, 5_000);
        assert_eq!(config.tx_timeout_ms, 10_000);
        assert_eq!(config.cycle_period_ms, 1_000);
        assert_eq!(config.mode, CommunicationMode::TxOnly);
    }

    #[test]
    fn test_explicit_values_kept() {
        let config = RadioConfig::new(2_000, 3_000, 60_000, CommunicationMode::TxRx);
        assert_eq!(config.rx_timeout_ms, 2_000);
        assert_eq!(config.tx_timeout_ms, 3_000);
        assert_eq!(config.cycle_period_ms, 60_000);
    }

    #[test]
    fn test_lora_overrides() {
        let config = RadioConfig {
            tx_power_dbm: 14,
            ..RadioConfig::default()
        };
        let lora = config.lora();
        assert_eq!(lora.tx_power_dbm, 14);
        assert_eq!(lora.frequency_hz, 916_800_000);
        assert_eq!(lora.preamble_len, 12);
    }

    #[test]
    fn test_sender_id_validation() {
        assert!(validate_sender_id("mbx").is_ok());
        assert_eq!(validate_sender_id(""), Err(ConfigError::EmptySenderId));
        assert_eq!(validate_sender_id("a|b"), Err(ConfigError::InvalidSenderId));
        assert_eq!(validate_sender_id("^a"), Err(ConfigError::InvalidSenderId));

        let long = [b'n'; MAX_FIELD_LEN + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(validate_sender_id(long), Err(ConfigError::SenderIdTooLong));
    }

    #[test]
    fn test_default_node_config_needs_identity() {
        assert_eq!(
            NodeConfig::default().validated(),
            Err(ConfigError::EmptySenderId)
        );

        let config = NodeConfig {
            broker: BrokerConfig::new("gateway").unwrap(),
            radio: RadioConfig {
                rx_timeout_ms: 0,
                ..RadioConfig::default()
            },
        }
        .validated()
        .unwrap();
        assert_eq!(config.radio.rx_timeout_ms, DEFAULT_RX_TIMEOUT_MS);
    }
}
