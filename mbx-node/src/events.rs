//! Pin edge events
//!
//! Interrupt handlers only record that an edge happened; the consumer picks
//! it up on its next loop. Each cell holds one event and a newer edge
//! replaces an unconsumed older one, so an interrupt storm costs nothing
//! but the lost intermediate edges.

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::signal::Signal;

/// Direction of a pin transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeEvent {
    Rising,
    Falling,
}

impl EdgeEvent {
    /// Edge that led to the pin reading `high`
    pub fn from_level(high: bool) -> Self {
        if high {
            EdgeEvent::Rising
        } else {
            EdgeEvent::Falling
        }
    }
}

/// Single-slot "latest edge wins" cell
pub type EdgeCell<M> = Signal<M, EdgeEvent>;

/// Mailbox door switch
pub static DOOR_EDGE: EdgeCell<CriticalSectionRawMutex> = Signal::new();

/// Mule alarm sensor
pub static MULE_EDGE: EdgeCell<CriticalSectionRawMutex> = Signal::new();

/// Display push button
pub static BUTTON_EDGE: EdgeCell<CriticalSectionRawMutex> = Signal::new();

/// Record an edge; safe from interrupt context
pub fn record_edge<M: RawMutex>(cell: &EdgeCell<M>, event: EdgeEvent) {
    cell.signal(event);
}

/// Take the pending edge, if any, without waiting
pub fn take_edge<M: RawMutex>(cell: &EdgeCell<M>) -> Option<EdgeEvent> {
    cell.try_take()
}

/// Wait for the next edge
pub async fn next_edge<M: RawMutex>(cell: &EdgeCell<M>) -> EdgeEvent {
    cell.wait().await
}
