//! GPIO pin abstractions
//!
//! The transport only drives one pin directly: the radio module's enable
//! line, which gates its power between duty cycles.

/// Digital output pin
///
/// Infallible by contract: a power enable line that cannot be driven is a
/// wiring fault, not something the duty cycle can recover from.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Adapter for [`embedded_hal`] output pins
///
/// Tracks the driven level itself so it works with pins that are not
/// `StatefulOutputPin`. Errors from the underlying pin are discarded; every
/// chip HAL we target has `Infallible` GPIO.
pub struct HalPin<P> {
    pin: P,
    high: bool,
}

impl<P: embedded_hal::digital::OutputPin> HalPin<P> {
    /// Wrap a pin, driving it low so the initial state is known
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin, high: false }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: embedded_hal::digital::OutputPin> OutputPin for HalPin<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
