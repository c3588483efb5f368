//! Host stand-ins for the peripherals the tasks own

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use mbx_hal::{
    LoraConfig, OutputPin, Radio, RadioErrorKind, SerialError, SerialErrorKind, UartRx, UartTx,
};

/// Radio that hears nothing and counts what it is asked to do
#[derive(Debug, Clone, Default)]
pub struct CountingRadio {
    pub receives: Rc<Cell<usize>>,
    pub transmitted: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Radio for CountingRadio {
    type Error = RadioErrorKind;

    async fn detect(&mut self) -> bool {
        true
    }

    async fn configure(&mut self, _config: &LoraConfig) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn receive(
        &mut self,
        _buf: &mut [u8],
        _timeout_ms: u32,
    ) -> Result<Option<usize>, Self::Error> {
        self.receives.set(self.receives.get() + 1);
        Ok(None)
    }

    async fn transmit(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        self.transmitted.borrow_mut().push(data.to_vec());
        Ok(())
    }
}

/// Radio enable line shared with the test
#[derive(Debug, Clone, Default)]
pub struct SharedPin {
    pub high: Rc<Cell<bool>>,
}

impl OutputPin for SharedPin {
    fn set_high(&mut self) {
        self.high.set(true);
    }

    fn set_low(&mut self) {
        self.high.set(false);
    }

    fn is_set_high(&self) -> bool {
        self.high.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineError;

impl SerialError for LineError {
    fn kind(&self) -> SerialErrorKind {
        SerialErrorKind::Overrun
    }
}

/// Inbound UART fed by the test
///
/// With `fail` set every read errors while the bytes stay buffered.
#[derive(Debug, Clone, Default)]
pub struct FeedRx {
    pub bytes: Rc<RefCell<VecDeque<u8>>>,
    pub reads: Rc<Cell<usize>>,
    pub fail: bool,
}

impl FeedRx {
    pub fn push(&self, bytes: &[u8]) {
        self.bytes.borrow_mut().extend(bytes.iter().copied());
    }
}

impl UartRx for FeedRx {
    type Error = LineError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads.set(self.reads.get() + 1);
        if self.fail {
            return Err(LineError);
        }
        let mut bytes = self.bytes.borrow_mut();
        let mut n = 0;
        while n < buf.len() {
            let Some(b) = bytes.pop_front() else { break };
            buf[n] = b;
            n += 1;
        }
        Ok(n)
    }

    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.bytes.borrow().is_empty())
    }
}

/// Outbound UART recording everything written
#[derive(Debug, Clone, Default)]
pub struct RecordTx {
    pub written: Rc<RefCell<Vec<u8>>>,
}

impl UartTx for RecordTx {
    type Error = LineError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.written.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay that returns at once
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}
