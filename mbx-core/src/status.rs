//! Node status store
//!
//! Gateways and displays keep the latest value reported for each status
//! key and periodically republish the whole set. Counters (door openings,
//! mule alarms) are stored as decimal strings so every entry publishes the
//! same way.

use core::fmt::Write;

use embassy_sync::channel::DynamicSender;
use embedded_hal_async::delay::DelayNs;
use heapless::LinearMap;
use mbx_hal::{UartRx, UartTx};
use mbx_protocol::batch::{self, RadioMessage};
use mbx_protocol::keys;
use mbx_protocol::messages::{self, Field, StatusMsg};

use crate::broker::{BrokerError, MsgBroker};

/// Maximum number of distinct keys tracked
pub const MAX_STATUS_KEYS: usize = 16;

/// Errors from updating the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Store already holds [`MAX_STATUS_KEYS`] keys
    Full,
    /// Key or value does not fit a field or contains a reserved byte
    InvalidEntry,
}

/// What applying a radio message changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Applied {
    /// Event counter bumped to the contained value
    Incremented(u32),
    /// Value stored
    Set,
    /// Key not tracked by the store
    Ignored,
}

/// Bounded key to latest-value map
#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    entries: LinearMap<Field, Field, MAX_STATUS_KEYS>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StatusError> {
        let value = messages::field(value).map_err(|_| StatusError::InvalidEntry)?;
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            *slot = value;
            return Ok(());
        }
        let key = messages::field(key).map_err(|_| StatusError::InvalidEntry)?;
        self.entries
            .insert(key, value)
            .map(|_| ())
            .map_err(|_| StatusError::Full)
    }

    /// Add one to the counter under `key`
    ///
    /// A missing or non-numeric value counts as zero.
    pub fn increment(&mut self, key: &str) -> Result<u32, StatusError> {
        let count = self
            .get(key)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
            .saturating_add(1);
        let mut value = Field::new();
        // u32 always fits a field
        let _ = write!(value, "{}", count);
        self.set(key, &value)?;
        Ok(count)
    }

    /// Update the store from one received `Key:Value` radio message
    ///
    /// Door openings and mule alarms are counted, the mailbox temperature
    /// is stored, anything else is left to other consumers.
    pub fn apply(&mut self, message: &str) -> Result<Applied, StatusError> {
        let (key, value) = batch::split_key_value(message);
        match key {
            keys::MAILBOX_DOOR_OPENED | keys::MULE_ALARM => {
                let count = self.increment(key)?;
                debug!("{} count now {}", key, count);
                Ok(Applied::Incremented(count))
            }
            keys::MAILBOX_TEMPERATURE => {
                self.set(key, value)?;
                Ok(Applied::Set)
            }
            _ => Ok(Applied::Ignored),
        }
    }

    /// All entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Queue every entry as a `Key:Value` radio message
    ///
    /// Never waits; entries that do not fit the queue are dropped. Returns
    /// the number queued.
    pub fn publish_radio(&self, outbound: &DynamicSender<'_, RadioMessage>) -> usize {
        let mut queued = 0;
        for (key, value) in self.iter() {
            let Ok(message) = batch::key_value(key, value) else {
                warn!("Status {} does not fit a radio message", key);
                continue;
            };
            if outbound.try_send(message).is_err() {
                warn!("Outbound radio queue full, status not published");
                break;
            }
            queued += 1;
        }
        queued
    }

    /// Send every entry around the loop bus as a `Status` message
    pub fn publish_bus<RX, TX, D>(
        &self,
        broker: &mut MsgBroker<'_, RX, TX, D>,
    ) -> Result<usize, BrokerError>
    where
        RX: UartRx,
        TX: UartTx,
        D: DelayNs,
    {
        let mut sent = 0;
        for (key, value) in self.iter() {
            broker.publish(StatusMsg::new(key, value)?)?;
            sent += 1;
        }
        Ok(sent)
    }
}
