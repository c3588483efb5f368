//! Typed destination queues
//!
//! The broker hands decoded messages to consumers through bounded
//! `embassy-sync` channels. Each destination carries its own overflow
//! policy; a full queue never stalls the loop bus for longer than the
//! policy allows.

use embassy_futures::select::{select, Either};
use embassy_sync::channel::DynamicSender;
use embedded_hal_async::delay::DelayNs;

use crate::config::Overflow;

/// A message was dropped because its queue stayed full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Sending half of a typed queue plus its overflow policy
pub struct Destination<'a, T> {
    sender: DynamicSender<'a, T>,
    overflow: Overflow,
}

impl<'a, T> Destination<'a, T> {
    pub fn new(sender: DynamicSender<'a, T>, overflow: Overflow) -> Self {
        Self { sender, overflow }
    }

    /// Destination that drops on a full queue
    pub fn dropping(sender: DynamicSender<'a, T>) -> Self {
        Self::new(sender, Overflow::Drop)
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Enqueue without waiting, whatever the policy
    pub fn try_deliver(&self, msg: T) -> Result<(), QueueFull> {
        self.sender.try_send(msg).map_err(|_| QueueFull)
    }

    /// Enqueue according to the overflow policy
    pub async fn deliver<D: DelayNs>(&self, msg: T, delay: &mut D) -> Result<(), QueueFull> {
        match self.overflow {
            Overflow::Drop => self.try_deliver(msg),
            Overflow::Block { timeout_ms } => {
                match select(self.sender.send(msg), delay.delay_ms(timeout_ms)).await {
                    Either::First(()) => Ok(()),
                    Either::Second(()) => Err(QueueFull),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Test doubles shared by the core tests

    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll};

    use embedded_hal_async::delay::DelayNs;

    /// Delay that completes immediately and records the requested time
    #[derive(Debug, Default)]
    pub struct NoDelay {
        pub total_ms: u64,
        pub calls: u32,
    }

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
            self.calls += 1;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
            self.calls += 1;
        }
    }

    /// Delay that yields once before completing
    ///
    /// Lets a competing future in a `select` make progress first.
    #[derive(Debug, Default)]
    pub struct YieldDelay;

    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    impl DelayNs for YieldDelay {
        async fn delay_ns(&mut self, _ns: u32) {
            YieldOnce(false).await
        }
    }
}
