//! Loop bus message broker
//!
//! Co-located boards are chained into a ring: each board's UART TX feeds the
//! next board's RX. The broker on every board reads frames from its inbound
//! side, hands the ones it understands to local queues, and writes every
//! frame it did not originate to its outbound side. A frame therefore
//! travels the ring once and dies when it reaches its sender again.
//!
//! ```text
//!   ┌──────┐ TX      RX ┌──────┐ TX      RX ┌──────┐
//!   │ mbx  │ ─────────► │ dsp  │ ─────────► │ soil │
//!   └──────┘            └──────┘            └──────┘
//!      ▲ RX                                    TX │
//!      └──────────────────────────────────────────┘
//! ```
//!
//! Either side may be missing; a board at the end of a chain simply has no
//! outbound endpoint.

use embedded_hal_async::delay::DelayNs;
use mbx_hal::{SerialError, SerialErrorKind, UartRx, UartTx};
use mbx_protocol::frame::{self, FrameBody, FrameError, FrameParser};
use mbx_protocol::messages::{Field, FooMsg, Message, StatusMsg, LOOPBACK_SENDER_ID, MIN_FIELDS};

use crate::config::{validate_sender_id, BrokerConfig, ConfigError};
use crate::queue::Destination;

/// Errors from broker construction and publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrokerError {
    /// Node identity rejected
    Config(ConfigError),
    /// Message could not be framed
    Frame(FrameError),
    /// Outbound UART failed
    Serial(SerialErrorKind),
}

impl From<ConfigError> for BrokerError {
    fn from(e: ConfigError) -> Self {
        BrokerError::Config(e)
    }
}

impl From<FrameError> for BrokerError {
    fn from(e: FrameError) -> Self {
        BrokerError::Frame(e)
    }
}

/// Why no frame came back from a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// Receive buffer ran dry before any START
    NoFrameFound,
    /// Receive buffer ran dry between START and END
    Incomplete,
    /// Frame overran the body buffer and was discarded
    FrameTooLong,
    /// Inbound UART failed
    Serial(SerialErrorKind),
}

/// Why a received frame was discarded without dispatch or forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// Body is not UTF-8
    Malformed,
    /// Fewer than kind, sender and one payload field
    TooFewFields,
    /// Frame came back around the loop to its sender
    OwnFrame,
}

/// What happened to a frame on the local side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Enqueued on the matching typed queue
    Delivered,
    /// Known kind but this node has no queue for it
    NoDestination,
    /// Queue stayed full, message lost
    QueueFull,
    /// Kind tag not recognised
    UnknownKind,
    /// Known kind but a field did not fit
    Invalid,
}

/// Outcome of processing one received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    Dropped(DropReason),
    Handled { dispatch: Dispatch, forwarded: bool },
}

/// Outcome of a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// Frame written to the outbound UART
    Written,
    /// No outbound endpoint, frame discarded
    NoOutput,
}

/// Counters from draining the inbound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrainStats {
    /// Complete frames read
    pub frames: u16,
    /// Frames enqueued locally
    pub dispatched: u16,
    /// Frames written onward
    pub forwarded: u16,
    /// Frames discarded (own, short, malformed or overlong)
    pub dropped: u16,
    /// Inbound UART error that ended the drain
    pub serial_error: Option<SerialErrorKind>,
}

/// Message broker for one board on the loop bus
pub struct MsgBroker<'a, RX, TX, D> {
    sender_id: Field,
    uart_in: Option<RX>,
    uart_out: Option<TX>,
    foo: Option<Destination<'a, FooMsg>>,
    status: Option<Destination<'a, StatusMsg>>,
    parser: FrameParser,
    delay: D,
    read_retries: u16,
    read_backoff_ms: u32,
}

impl<'a, RX, TX, D> MsgBroker<'a, RX, TX, D>
where
    RX: UartRx,
    TX: UartTx,
    D: DelayNs,
{
    /// Create a broker with the default read budget and no destinations
    pub fn new(
        sender_id: &str,
        uart_in: Option<RX>,
        uart_out: Option<TX>,
        delay: D,
    ) -> Result<Self, BrokerError> {
        let defaults = BrokerConfig::default();
        Ok(Self {
            sender_id: validate_sender_id(sender_id)?,
            uart_in,
            uart_out,
            foo: None,
            status: None,
            parser: FrameParser::new(),
            delay,
            read_retries: defaults.read_retries,
            read_backoff_ms: defaults.read_backoff_ms,
        })
    }

    /// Create a broker from a node config
    pub fn from_config(
        config: &BrokerConfig,
        uart_in: Option<RX>,
        uart_out: Option<TX>,
        delay: D,
    ) -> Result<Self, BrokerError> {
        let broker = Self::new(&config.sender_id, uart_in, uart_out, delay)?;
        Ok(broker.with_read_budget(config.read_retries, config.read_backoff_ms))
    }

    /// Route received Foo messages to `dest`
    pub fn with_foo(mut self, dest: Destination<'a, FooMsg>) -> Self {
        self.foo = Some(dest);
        self
    }

    /// Route received Status messages to `dest`
    pub fn with_status(mut self, dest: Destination<'a, StatusMsg>) -> Self {
        self.status = Some(dest);
        self
    }

    /// Bound the blocking read: `retries` pauses of `backoff_ms` each
    pub fn with_read_budget(mut self, retries: u16, backoff_ms: u32) -> Self {
        self.read_retries = retries;
        self.read_backoff_ms = backoff_ms;
        self
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn has_input(&self) -> bool {
        self.uart_in.is_some()
    }

    pub fn has_output(&self) -> bool {
        self.uart_out.is_some()
    }

    /// Returns true if the inbound UART has bytes waiting
    pub fn input_ready(&mut self) -> bool {
        match self.uart_in.as_mut() {
            Some(uart) => uart.read_ready().unwrap_or(false),
            None => false,
        }
    }

    /// Give back the endpoints and delay
    pub fn release(self) -> (Option<RX>, Option<TX>, D) {
        (self.uart_in, self.uart_out, self.delay)
    }

    /// Read one frame from whatever is already buffered
    ///
    /// Junk before START is discarded. A partial frame is kept and resumed
    /// on the next call, so `Incomplete` loses nothing.
    pub fn read_frame(&mut self) -> Result<FrameBody, ReadError> {
        let Some(uart) = self.uart_in.as_mut() else {
            return Err(ReadError::NoFrameFound);
        };

        loop {
            let byte = match uart.try_read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) if self.parser.is_mid_frame() => return Err(ReadError::Incomplete),
                Ok(None) => return Err(ReadError::NoFrameFound),
                Err(e) => return Err(ReadError::Serial(e.kind())),
            };

            match self.parser.feed(byte) {
                Ok(Some(body)) => return Ok(body),
                Ok(None) => {}
                Err(_) => {
                    warn!("Frame overran {} bytes, discarded", frame::MAX_BODY_SIZE);
                    return Err(ReadError::FrameTooLong);
                }
            }
        }
    }

    /// Read one frame, waiting for the rest of a frame already started
    ///
    /// Pauses between attempts while mid-frame. When the retry budget runs
    /// out the partial frame is abandoned and `Incomplete` is returned.
    pub async fn read_frame_blocking(&mut self) -> Result<FrameBody, ReadError> {
        let mut retries = 0u16;
        loop {
            match self.read_frame() {
                Err(ReadError::Incomplete) if retries < self.read_retries => {
                    retries += 1;
                    self.delay.delay_ms(self.read_backoff_ms).await;
                }
                Err(ReadError::Incomplete) => {
                    warn!(
                        "Partial frame abandoned after {} retries ({} bytes)",
                        retries,
                        self.parser.pending_len()
                    );
                    self.parser.reset();
                    return Err(ReadError::Incomplete);
                }
                other => return other,
            }
        }
    }

    /// Dispatch and forward one received frame body
    pub async fn on_frame(&mut self, body: &[u8]) -> Disposition {
        let Ok(fields) = frame::decode(body) else {
            debug!("Dropping frame: not UTF-8");
            return Disposition::Dropped(DropReason::Malformed);
        };

        if fields.len() < MIN_FIELDS {
            debug!("Dropping frame: {} fields", fields.len());
            return Disposition::Dropped(DropReason::TooFewFields);
        }

        let sender = fields[1];
        if sender == self.sender_id.as_str() {
            trace!("Dropping own frame");
            return Disposition::Dropped(DropReason::OwnFrame);
        }

        let dispatch = match Message::from_fields(&fields) {
            Ok(msg) => self.dispatch(msg).await,
            Err(FrameError::UnknownKind) => {
                debug!("No handler for kind {}", fields[0]);
                Dispatch::UnknownKind
            }
            Err(e) => {
                debug!("Invalid {} frame: {:?}", fields[0], e);
                Dispatch::Invalid
            }
        };

        let forwarded = if sender == LOOPBACK_SENDER_ID {
            trace!("Not forwarding loopback frame");
            false
        } else {
            self.forward(body)
        };

        Disposition::Handled {
            dispatch,
            forwarded,
        }
    }

    async fn dispatch(&mut self, msg: Message) -> Dispatch {
        let result = match msg {
            Message::Foo(m) => match &self.foo {
                Some(dest) => dest.deliver(m, &mut self.delay).await,
                None => return Dispatch::NoDestination,
            },
            Message::Status(m) => match &self.status {
                Some(dest) => dest.deliver(m, &mut self.delay).await,
                None => return Dispatch::NoDestination,
            },
        };

        match result {
            Ok(()) => Dispatch::Delivered,
            Err(_) => {
                warn!("Queue full, message dropped");
                Dispatch::QueueFull
            }
        }
    }

    /// Write a received body onward, byte for byte
    fn forward(&mut self, body: &[u8]) -> bool {
        let Some(uart) = self.uart_out.as_mut() else {
            return false;
        };
        let Ok(frame) = frame::wrap(body) else {
            return false;
        };
        match uart.write_blocking(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("Forward failed: {:?}", e.kind());
                false
            }
        }
    }

    /// Read and process one frame, waiting for a partial frame to finish
    pub async fn process_next(&mut self) -> Result<Disposition, ReadError> {
        let body = self.read_frame_blocking().await?;
        Ok(self.on_frame(&body).await)
    }

    /// Process every complete frame already buffered
    ///
    /// Stops when the buffer runs dry; a trailing partial frame stays in
    /// the parser for the next drain.
    pub async fn drain(&mut self) -> DrainStats {
        let mut stats = DrainStats::default();
        loop {
            match self.read_frame() {
                Ok(body) => {
                    stats.frames = stats.frames.saturating_add(1);
                    match self.on_frame(&body).await {
                        Disposition::Dropped(_) => {
                            stats.dropped = stats.dropped.saturating_add(1);
                        }
                        Disposition::Handled {
                            dispatch,
                            forwarded,
                        } => {
                            if dispatch == Dispatch::Delivered {
                                stats.dispatched = stats.dispatched.saturating_add(1);
                            }
                            if forwarded {
                                stats.forwarded = stats.forwarded.saturating_add(1);
                            }
                        }
                    }
                }
                Err(ReadError::FrameTooLong) => {
                    stats.dropped = stats.dropped.saturating_add(1);
                }
                Err(ReadError::Serial(kind)) => {
                    warn!("Serial read error: {:?}", kind);
                    stats.serial_error = Some(kind);
                    break;
                }
                Err(ReadError::NoFrameFound | ReadError::Incomplete) => break,
            }
        }
        stats
    }

    /// Send a message around the loop
    ///
    /// A blank sender id is stamped with this node's identity. The message
    /// is not dispatched locally.
    pub fn publish(&mut self, msg: impl Into<Message>) -> Result<Delivery, BrokerError> {
        let mut msg = msg.into();
        msg.stamp_sender(&self.sender_id)?;
        let frame = msg.encode()?;

        let Some(uart) = self.uart_out.as_mut() else {
            debug!("No outbound UART, {:?} not sent", msg.kind());
            return Ok(Delivery::NoOutput);
        };
        uart.write_blocking(&frame).map_err(|e| BrokerError::Serial(e.kind()))?;
        Ok(Delivery::Written)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory loop bus endpoints

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    use mbx_hal::{SerialError, SerialErrorKind, UartRx, UartTx};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MockError;

    impl SerialError for MockError {
        fn kind(&self) -> SerialErrorKind {
            SerialErrorKind::Other
        }
    }

    /// Inbound endpoint fed by the test
    #[derive(Debug, Clone, Default)]
    pub struct MockRx {
        pub bytes: Rc<RefCell<VecDeque<u8>>>,
        /// Reads fail while bytes stay buffered, like an uncleared overrun
        pub fail: bool,
    }

    impl MockRx {
        pub fn with(bytes: &[u8]) -> Self {
            let rx = Self::default();
            rx.push(bytes);
            rx
        }

        pub fn push(&self, bytes: &[u8]) {
            self.bytes.borrow_mut().extend(bytes.iter().copied());
        }
    }

    impl UartRx for MockRx {
        type Error = MockError;

        fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            if self.fail {
                return Err(MockError);
            }
            let mut bytes = self.bytes.borrow_mut();
            let mut n = 0;
            while n < buf.len() {
                match bytes.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.bytes.borrow().is_empty())
        }
    }

    /// Outbound endpoint recording everything written
    #[derive(Debug, Clone, Default)]
    pub struct MockTx {
        pub written: Rc<RefCell<Vec<u8>>>,
        pub fail: bool,
    }

    impl MockTx {
        pub fn take(&self) -> Vec<u8> {
            core::mem::take(&mut *self.written.borrow_mut())
        }
    }

    impl UartTx for MockTx {
        type Error = MockError;

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(MockError);
            }
            self.written.borrow_mut().extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}
