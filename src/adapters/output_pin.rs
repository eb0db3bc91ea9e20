//! GPIO output adapter.
//!
//! Wraps any `embedded-hal` 1.0 [`StatefulOutputPin`] (on the device an
//! `esp_idf_hal` `PinDriver` in input/output mode) as an [`OutputPort`].

use embedded_hal::digital::{PinState, StatefulOutputPin};

use crate::app::ports::OutputPort;
use crate::error::HardwareError;

/// The toggled output pin.
pub struct HalOutput<P> {
    pin: P,
}

impl<P: StatefulOutputPin> HalOutput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Give the pin back.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> OutputPort for HalOutput<P> {
    fn level(&mut self) -> Result<bool, HardwareError> {
        self.pin.is_set_high().map_err(|_| HardwareError::PinReadFailed)
    }

    fn set_level(&mut self, high: bool) -> Result<(), HardwareError> {
        self.pin
            .set_state(PinState::from(high))
            .map_err(|_| HardwareError::PinWriteFailed)
    }
}
