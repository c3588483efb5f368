//! mbx-iot Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the transport layer is written
//! against. Board crates implement them on top of their chip HAL; tests
//! implement them with in-memory mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mbx-node / mbx-core (broker, radio)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mbx-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  RP2040 UART  │       │ SX127x driver │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRx`], [`uart::UartTx`] - Serial loop bus endpoints
//! - [`gpio::OutputPin`] - Radio power enable line
//! - [`radio::Radio`] - Half-duplex packet radio

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)] // Implemented by drivers, never used as dyn

pub mod gpio;
pub mod radio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{HalPin, OutputPin};
pub use radio::{LoraConfig, Radio, RadioError, RadioErrorKind, MAX_PAYLOAD_LEN};
pub use uart::{IoError, IoUart, SerialError, SerialErrorKind, UartRx, UartTx, Unconnected};
