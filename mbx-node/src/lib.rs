//! mbx-iot node runtime
//!
//! Static queues, interrupt event cells and the long-running transport
//! tasks every board runs. A board binary owns pin assignment and
//! peripheral setup, builds a [`MsgBroker`](mbx_core::MsgBroker) and a
//! [`RadioTransport`](mbx_core::RadioTransport), and spawns thin
//! executor tasks around the loops in [`tasks`]:
//!
//! ```ignore
//! #[embassy_executor::task]
//! async fn radio(transport: RadioTransport<'static, Sx127x, HalPin<Output<'static>>>) {
//!     mbx_node::tasks::radio_task(transport, &RADIO_STOP).await
//! }
//! ```
//!
//! # Activities
//!
//! - radio cycle on its own ticker
//! - opportunistic loop bus drain, woken by timer or RX interrupt
//! - application heartbeat feeding the radio queue
//!
//! Shutdown is cooperative: signalling a task's stop cell ends its loop
//! after the current unit of work.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channels;
pub mod events;
pub mod tasks;

pub use events::EdgeEvent;
