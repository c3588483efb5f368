//! Radio duty-cycle task
//!
//! Runs one transport cycle per tick until asked to stop.

use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use mbx_core::RadioTransport;
use mbx_hal::{OutputPin, Radio};

/// Radio task - cycles the radio on its own ticker
///
/// A stop request is honoured between cycles; a cycle in progress always
/// finishes so the radio is left powered off.
pub async fn radio_task<R, P, M>(mut transport: RadioTransport<'_, R, P>, stop: &Signal<M, ()>)
where
    R: Radio,
    P: OutputPin,
    M: RawMutex,
{
    let period_ms = transport.config().cycle_period_ms;
    info!("Radio task started, period {} ms", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(period_ms)));

    loop {
        match select(ticker.next(), stop.wait()).await {
            Either::First(()) => {
                let report = transport.run_cycle().await;
                if !report.skipped {
                    debug!(
                        "Cycle: rx {:?}, batched {}, tx {}",
                        report.received,
                        report.batched,
                        report.transmitted
                    );
                }
                yield_now().await;
            }
            Either::Second(()) => {
                info!("Radio task stopped");
                return;
            }
        }
    }
}
