//! Heartbeat task
//!
//! Every node reports a counting heartbeat so the gateway can tell a quiet
//! node from a dead one.

use core::fmt::Write;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::DynamicSender;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use mbx_core::transport;
use mbx_protocol::batch::{self, BatchError, RadioMessage};

/// Heartbeat message for beat number `count`
pub fn heartbeat_message(key: &str, count: u32) -> Result<RadioMessage, BatchError> {
    let mut value = heapless::String::<10>::new();
    // u32 has at most 10 digits
    let _ = write!(value, "{}", count);
    batch::key_value(key, &value)
}

/// Heartbeat task - queues `key:count` for the radio every period
pub async fn heartbeat_task<M: RawMutex>(
    key: &'static str,
    outbound: DynamicSender<'_, RadioMessage>,
    period_ms: u32,
    stop: &Signal<M, ()>,
) {
    info!("Heartbeat task started: {}", key);

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(period_ms)));
    let mut count: u32 = 0;

    loop {
        match select(ticker.next(), stop.wait()).await {
            Either::First(()) => {
                count = count.wrapping_add(1);
                match heartbeat_message(key, count) {
                    Ok(message) => {
                        let _ = transport::enqueue(&outbound, &message);
                    }
                    Err(e) => warn!("Heartbeat {} not queued: {:?}", key, e),
                }
            }
            Either::Second(()) => {
                info!("Heartbeat task stopped");
                return;
            }
        }
    }
}
