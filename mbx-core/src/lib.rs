//! Board-agnostic transport logic for mbx-iot nodes
//!
//! This crate contains everything between the hardware traits in
//! `mbx-hal` and the task wiring in `mbx-node`:
//!
//! - Loop bus broker (frame reading, dispatch, forwarding, publishing)
//! - Typed destination queues with overflow policies
//! - Radio duty-cycle transport with outbound batching
//! - Status store shared by gateway and display nodes
//! - Configuration type definitions
//!
//! Nothing here owns a timer or an executor. Periodic loops live in the
//! node crate; backoff pauses take an `embedded-hal-async` delay.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod broker;
pub mod config;
pub mod queue;
pub mod status;
pub mod transport;

pub use broker::{Delivery, Disposition, DrainStats, MsgBroker};
pub use config::{BrokerConfig, CommunicationMode, NodeConfig, Overflow, RadioConfig};
pub use queue::Destination;
pub use status::StatusStore;
pub use transport::{CycleReport, InboundPacket, RadioTransport, TransportError};
