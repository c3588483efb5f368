//! Inter-task communication channels
//!
//! Static queues shared by the transport tasks and application code. Every
//! producer uses non-blocking sends, so a full queue drops the new item
//! instead of stalling an interrupt handler or the loop bus.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use mbx_core::InboundPacket;
use mbx_protocol::batch::RadioMessage;
use mbx_protocol::messages::{FooMsg, StatusMsg};

/// Channel capacity for messages waiting for the next radio cycle
pub const RADIO_OUTBOUND_SIZE: usize = 64;

/// Channel capacity for received radio packets
pub const RADIO_INBOUND_SIZE: usize = 8;

/// Channel capacity for each typed loop bus queue
pub const BUS_QUEUE_SIZE: usize = 8;

pub type RadioOutbound = Channel<CriticalSectionRawMutex, RadioMessage, RADIO_OUTBOUND_SIZE>;
pub type RadioInbound = Channel<CriticalSectionRawMutex, InboundPacket, RADIO_INBOUND_SIZE>;
pub type FooQueue = Channel<CriticalSectionRawMutex, FooMsg, BUS_QUEUE_SIZE>;
pub type StatusQueue = Channel<CriticalSectionRawMutex, StatusMsg, BUS_QUEUE_SIZE>;

/// Application messages waiting to be batched onto the radio
pub static RADIO_OUTBOUND: RadioOutbound = Channel::new();

/// Raw packets received by the radio, split by consumers
pub static RADIO_INBOUND: RadioInbound = Channel::new();

/// Foo messages received from the loop bus
pub static FOO_QUEUE: FooQueue = Channel::new();

/// Status messages received from the loop bus
pub static STATUS_QUEUE: StatusQueue = Channel::new();

/// Wake the serial task before its next poll (e.g. from a UART RX interrupt)
pub static SERIAL_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the radio task to stop after its current cycle
pub static RADIO_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the serial task to stop after its current drain
pub static SERIAL_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Ask the heartbeat task to stop
pub static HEARTBEAT_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();
