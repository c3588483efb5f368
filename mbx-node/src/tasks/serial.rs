//! Loop bus serial task
//!
//! Drains the inbound UART opportunistically: whenever the poll interval
//! elapses or an RX interrupt wakes the task, every complete frame already
//! buffered is dispatched and forwarded.

use embassy_futures::select::{select3, Either3};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_hal_async::delay::DelayNs;

use mbx_core::MsgBroker;
use mbx_hal::{UartRx, UartTx};

/// Serial task - drains the loop bus until asked to stop
pub async fn serial_task<RX, TX, D, M>(
    mut broker: MsgBroker<'_, RX, TX, D>,
    poll_interval_ms: u32,
    wake: &Signal<M, ()>,
    stop: &Signal<M, ()>,
) where
    RX: UartRx,
    TX: UartTx,
    D: DelayNs,
    M: RawMutex,
{
    info!("Serial task started as {}", broker.sender_id());

    loop {
        let stats = broker.drain().await;
        if stats.frames > 0 {
            debug!(
                "Drained {} frames: {} dispatched, {} forwarded, {} dropped",
                stats.frames,
                stats.dispatched,
                stats.forwarded,
                stats.dropped
            );
        }

        // More bytes arrived while draining; go again without sleeping.
        // A failing UART waits for the next poll instead.
        if stats.serial_error.is_none() && broker.input_ready() {
            yield_now().await;
            continue;
        }

        match select3(
            Timer::after_millis(u64::from(poll_interval_ms)),
            wake.wait(),
            stop.wait(),
        )
        .await
        {
            Either3::First(()) | Either3::Second(()) => {}
            Either3::Third(()) => {
                info!("Serial task stopped");
                return;
            }
        }
    }
}
