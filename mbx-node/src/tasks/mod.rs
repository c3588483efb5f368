//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! The tasks are generic over the board's peripherals; a board binary
//! wraps each in a concrete `#[embassy_executor::task]`.

pub mod heartbeat;
pub mod radio;
pub mod serial;

#[cfg(test)]
pub(crate) mod mock;

pub use heartbeat::{heartbeat_message, heartbeat_task};
pub use radio::radio_task;
pub use serial::serial_task;
