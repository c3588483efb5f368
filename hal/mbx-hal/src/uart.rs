//! UART serial communication abstractions
//!
//! The loop bus needs two things from a UART: a way to pull whatever bytes
//! are already buffered without waiting, and a way to push a whole frame out.

/// Classification of serial errors, shared by all implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialErrorKind {
    /// Receive FIFO overflowed and bytes were lost
    Overrun,
    /// Framing or parity error on the line
    Framing,
    /// Operation did not complete in time
    Timeout,
    /// Anything else
    Other,
}

/// Serial error that can be classified
pub trait SerialError: core::fmt::Debug {
    /// Convert to a generic error kind
    fn kind(&self) -> SerialErrorKind;
}

impl SerialError for core::convert::Infallible {
    fn kind(&self) -> SerialErrorKind {
        match *self {}
    }
}

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error: SerialError;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error: SerialError;

    /// Read data from the UART
    ///
    /// Blocks until at least one byte is available or an error occurs.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Returns true if at least one byte can be read without waiting
    fn read_ready(&mut self) -> Result<bool, Self::Error>;

    /// Read a single byte from the UART
    ///
    /// Waits until a byte actually arrives; zero-length reads are retried.
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        while self.read_blocking(&mut buf)? == 0 {}
        Ok(buf[0])
    }

    /// Read a single byte if one is already buffered
    ///
    /// Returns `Ok(None)` when the receive buffer is empty, including when
    /// the endpoint claimed to be ready but produced nothing.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.read_ready()? {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.read_blocking(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

/// Placeholder endpoint for a node wired to only one side of the loop
///
/// Never has data to read and discards everything written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconnected;

impl UartRx for Unconnected {
    type Error = core::convert::Infallible;

    fn read_blocking(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl UartTx for Unconnected {
    type Error = core::convert::Infallible;

    fn write_blocking(&mut self, _data: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Error wrapper for [`embedded_io`] based UARTs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoError<E>(pub E);

impl<E: embedded_io::Error> SerialError for IoError<E> {
    fn kind(&self) -> SerialErrorKind {
        match self.0.kind() {
            embedded_io::ErrorKind::OutOfMemory => SerialErrorKind::Overrun,
            embedded_io::ErrorKind::InvalidData => SerialErrorKind::Framing,
            embedded_io::ErrorKind::TimedOut => SerialErrorKind::Timeout,
            _ => SerialErrorKind::Other,
        }
    }
}

/// Adapter exposing any buffered [`embedded_io`] stream as a loop bus endpoint
///
/// Chip HALs provide buffered UARTs implementing `Read + ReadReady + Write`;
/// wrapping one in `IoUart` is all a board needs to hand it to the broker.
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> UartRx for IoUart<T>
where
    T: embedded_io::Read + embedded_io::ReadReady,
{
    type Error = IoError<T::Error>;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.inner.read(buf).map_err(IoError)
    }

    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready().map_err(IoError)
    }
}

impl<T> UartTx for IoUart<T>
where
    T: embedded_io::Write,
{
    type Error = IoError<T::Error>;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().map_err(IoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Byte source with a fixed buffer, standing in for a buffered UART
    struct FakeStream {
        rx: [u8; 8],
        rx_len: usize,
        rx_pos: usize,
        tx: [u8; 8],
        tx_len: usize,
    }

    impl FakeStream {
        fn with_rx(bytes: &[u8]) -> Self {
            let mut rx = [0u8; 8];
            rx[..bytes.len()].copy_from_slice(bytes);
            Self {
                rx,
                rx_len: bytes.len(),
                rx_pos: 0,
                tx: [0u8; 8],
                tx_len: 0,
            }
        }
    }

    impl embedded_io::ErrorType for FakeStream {
        type Error = embedded_io::ErrorKind;
    }

    impl embedded_io::Read for FakeStream {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.rx_len - self.rx_pos);
            buf[..n].copy_from_slice(&self.rx[self.rx_pos..self.rx_pos + n]);
            self.rx_pos += n;
            Ok(n)
        }
    }

    impl embedded_io::ReadReady for FakeStream {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.rx_pos < self.rx_len)
        }
    }

    impl embedded_io::Write for FakeStream {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.tx.len() - self.tx_len);
            self.tx[self.tx_len..self.tx_len + n].copy_from_slice(&buf[..n]);
            self.tx_len += n;
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_try_read_byte_drains_then_reports_empty() {
        let mut uart = IoUart::new(FakeStream::with_rx(b"^a"));

        assert_eq!(uart.try_read_byte(), Ok(Some(b'^')));
        assert_eq!(uart.try_read_byte(), Ok(Some(b'a')));
        assert_eq!(uart.try_read_byte(), Ok(None));
        assert_eq!(uart.read_ready(), Ok(false));
    }

    #[test]
    fn test_write_blocking_writes_everything() {
        let mut uart = IoUart::new(FakeStream::with_rx(&[]));
        uart.write_blocking(b"^x|y~").unwrap();
        uart.flush().unwrap();

        let stream = uart.into_inner();
        assert_eq!(&stream.tx[..stream.tx_len], b"^x|y~");
    }

    /// Endpoint that reports ready but never produces a byte
    struct EmptyReads;

    impl UartRx for EmptyReads {
        type Error = core::convert::Infallible;

        fn read_blocking(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Ok(0)
        }

        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
    }

    #[test]
    fn test_try_read_byte_ignores_empty_read() {
        let mut uart = EmptyReads;
        assert_eq!(uart.try_read_byte(), Ok(None));
    }

    #[test]
    fn test_unconnected_is_silent() {
        let mut uart = Unconnected;
        assert_eq!(uart.try_read_byte(), Ok(None));
        assert_eq!(uart.write_blocking(b"^x~"), Ok(()));
    }

    #[test]
    fn test_io_error_kind_mapping() {
        let err = IoError(embedded_io::ErrorKind::InvalidData);
        assert_eq!(err.kind(), SerialErrorKind::Framing);

        let err = IoError(embedded_io::ErrorKind::Interrupted);
        assert_eq!(err.kind(), SerialErrorKind::Other);
    }
}
