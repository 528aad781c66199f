//! Byte-wide data bus abstraction.

use embedded_hal::digital::{ErrorType, InputPin};

/// An 8-bit parallel input sampled on demand.
///
/// The channel samples it while the read clock is high.
pub trait DataBus: ErrorType {
    /// Reads the byte currently present on D7..D0.
    fn sample(&mut self) -> Result<u8, Self::Error>;
}

impl<T: DataBus + ?Sized> DataBus for &mut T {
    #[inline]
    fn sample(&mut self) -> Result<u8, Self::Error> {
        T::sample(self)
    }
}

/// Data bus built from eight individual input pins, D0 first.
#[derive(Debug)]
pub struct PinBus<P> {
    pins: [P; 8],
}

impl<P> PinBus<P> {
    /// Creates a bus from pins ordered D0..D7.
    pub fn new(pins: [P; 8]) -> Self {
        Self { pins }
    }

    /// Releases the pins.
    pub fn into_pins(self) -> [P; 8] {
        self.pins
    }
}

impl<P: InputPin> ErrorType for PinBus<P> {
    type Error = P::Error;
}

impl<P: InputPin> DataBus for PinBus<P> {
    fn sample(&mut self) -> Result<u8, Self::Error> {
        let mut byte = 0u8;
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if pin.is_high()? {
                byte |= 1 << bit;
            }
        }
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct FixedPin(bool);

    impl ErrorType for FixedPin {
        type Error = Infallible;
    }

    impl InputPin for FixedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn test_pin_bus_bit_order() {
        // D0, D2 and D7 high.
        let levels = [true, false, true, false, false, false, false, true];
        let mut bus = PinBus::new(levels.map(FixedPin));
        assert_eq!(bus.sample().unwrap(), 0b1000_0101);
    }

    #[test]
    fn test_pin_bus_all_low() {
        let mut bus = PinBus::new([false; 8].map(FixedPin));
        assert_eq!(bus.sample().unwrap(), 0);
    }
}
