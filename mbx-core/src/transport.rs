//! Radio duty-cycle transport
//!
//! Nodes run on batteries, so the radio is powered only for one short
//! window per cycle:
//!
//! ```text
//!        ┌─────────────────────────────┐
//!  EN ───┘                             └──────────────── ... next tick
//!        │ RX (≤ rx_timeout) │ TX batch│
//! ```
//!
//! Application code enqueues short strings on the outbound queue at any
//! time without blocking. Each cycle joins everything queued into one
//! `|`-separated packet. Received packets go to the inbound queue untouched;
//! consumers split them with [`drain_inbound`].

use embassy_sync::channel::{DynamicReceiver, DynamicSender};
use heapless::Vec;
use mbx_hal::{OutputPin, Radio, RadioError, RadioErrorKind, MAX_PAYLOAD_LEN};
use mbx_protocol::batch::{self, BatchBuilder, BatchError, RadioMessage};

use crate::config::{CommunicationMode, RadioConfig};

/// One received radio packet, as it came off the air
pub type InboundPacket = Vec<u8, MAX_PAYLOAD_LEN>;

/// Transport construction errors
///
/// These are the only transport errors that leave the component; a node
/// that gets one cannot use its radio and should not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Modem did not answer during detection
    RadioNotFound,
    /// Modem rejected its settings
    Configure(RadioErrorKind),
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Radio stayed off (TxOnly with nothing to send)
    pub skipped: bool,
    /// Length of the packet received, if any
    pub received: Option<usize>,
    /// Received packet was lost because the inbound queue was full
    pub inbound_dropped: bool,
    /// Messages placed in this cycle's batch
    pub batched: usize,
    /// Messages discarded because they could never be sent
    pub rejected: usize,
    /// Batch handed to the radio and acknowledged
    pub transmitted: bool,
}

/// Duty-cycled radio with outbound batching
pub struct RadioTransport<'a, R, P> {
    radio: R,
    power: P,
    outbound: DynamicReceiver<'a, RadioMessage>,
    inbound: DynamicSender<'a, InboundPacket>,
    config: RadioConfig,
    // Message taken from the queue that did not fit the last batch
    carry: Option<RadioMessage>,
}

impl<'a, R, P> RadioTransport<'a, R, P>
where
    R: Radio,
    P: OutputPin,
{
    /// Detect and configure the radio, leaving it powered off
    ///
    /// Zero timeouts or period in `config` take the defaults.
    pub async fn new(
        mut radio: R,
        mut power: P,
        outbound: DynamicReceiver<'a, RadioMessage>,
        inbound: DynamicSender<'a, InboundPacket>,
        config: RadioConfig,
    ) -> Result<Self, TransportError> {
        let config = config.normalized();

        power.set_high();
        if !radio.detect().await {
            power.set_low();
            error!("Radio not found");
            return Err(TransportError::RadioNotFound);
        }
        let configured = radio.configure(&config.lora()).await;
        power.set_low();

        if let Err(e) = configured {
            error!("Radio configuration failed: {:?}", e.kind());
            return Err(TransportError::Configure(e.kind()));
        }

        info!(
            "Radio ready: {:?}, rx {} ms, tx {} ms, period {} ms",
            config.mode,
            config.rx_timeout_ms,
            config.tx_timeout_ms,
            config.cycle_period_ms
        );

        Ok(Self {
            radio,
            power,
            outbound,
            inbound,
            config,
            carry: None,
        })
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Give back the radio and its power pin
    pub fn release(self) -> (R, P) {
        (self.radio, self.power)
    }

    /// Returns true if a TxOnly cycle would have something to send
    ///
    /// Pulls one message into the carry slot to find out, since the queue
    /// can only be inspected by receiving from it.
    fn has_outbound(&mut self) -> bool {
        if self.carry.is_none() {
            self.carry = self.outbound.try_receive().ok();
        }
        self.carry.is_some()
    }

    /// Run one power-on / receive / transmit / power-off cycle
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        if self.config.mode == CommunicationMode::TxOnly && !self.has_outbound() {
            trace!("Nothing to send, radio stays off");
            report.skipped = true;
            return report;
        }

        self.power.set_high();
        self.receive(&mut report).await;

        let builder = self.collect_batch(&mut report);
        if builder.is_empty() {
            trace!("Nothing to send");
        } else {
            let payload = builder.as_str().as_bytes();
            debug!("TX {} messages, {} bytes", builder.count(), payload.len());
            match self.radio.transmit(payload, self.config.tx_timeout_ms).await {
                Ok(()) => report.transmitted = true,
                Err(e) => warn!("TX failed: {:?}", e.kind()),
            }
        }

        self.power.set_low();
        report
    }

    async fn receive(&mut self, report: &mut CycleReport) {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        match self.radio.receive(&mut buf, self.config.rx_timeout_ms).await {
            Ok(Some(len)) => {
                let len = len.min(MAX_PAYLOAD_LEN);
                debug!("RX {} bytes", len);
                report.received = Some(len);
                let packet = InboundPacket::from_slice(&buf[..len]).unwrap_or_default();
                if self.inbound.try_send(packet).is_err() {
                    warn!("Inbound queue full, packet dropped");
                    report.inbound_dropped = true;
                }
            }
            Ok(None) => trace!("RX nothing received"),
            Err(e) => debug!("RX error: {:?}", e.kind()),
        }
    }

    /// Take queued messages in order until the queue is empty or the
    /// packet is full
    fn collect_batch(&mut self, report: &mut CycleReport) -> BatchBuilder {
        let mut builder = BatchBuilder::new();

        loop {
            let next = match self.carry.take() {
                Some(msg) => msg,
                None => match self.outbound.try_receive() {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
            };

            match builder.push(&next) {
                Ok(()) => report.batched += 1,
                Err(BatchError::Full) => {
                    self.carry = Some(next);
                    break;
                }
                Err(e) => {
                    warn!("Dropping unsendable message: {:?}", e);
                    report.rejected += 1;
                }
            }
        }

        builder
    }
}

/// Hand every message of every queued inbound packet to `handle`
///
/// Packets that are not UTF-8 are skipped. Returns the number of packets
/// taken from the queue.
pub fn drain_inbound<F>(inbound: &DynamicReceiver<'_, InboundPacket>, mut handle: F) -> usize
where
    F: FnMut(&str),
{
    let mut packets = 0;
    while let Ok(packet) = inbound.try_receive() {
        packets += 1;
        let Ok(text) = core::str::from_utf8(&packet) else {
            warn!("Dropping non-UTF-8 packet ({} bytes)", packet.len());
            continue;
        };
        for message in batch::split(text) {
            handle(message);
        }
    }
    packets
}

/// Enqueue a message for the next radio cycle without waiting
///
/// Safe to call from time-critical code; a full queue drops the message.
pub fn enqueue(
    outbound: &DynamicSender<'_, RadioMessage>,
    message: &str,
) -> Result<(), BatchError> {
    let message = batch::radio_message(message)?;
    outbound.try_send(message).map_err(|_| {
        warn!("Outbound radio queue full, message dropped");
        BatchError::Full
    })
}
