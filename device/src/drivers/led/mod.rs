use super::{ActiveHigh, ActiveLevel};
use core::marker::PhantomData;
use embedded_hal::digital::StatefulOutputPin;

pub struct Led<P, L = ActiveHigh>
where
    P: StatefulOutputPin,
    L: ActiveLevel,
{
    pin: P,
    _active: PhantomData<L>,
}

impl<P, L> Led<P, L>
where
    P: StatefulOutputPin,
    L: ActiveLevel,
{
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            _active: PhantomData,
        }
    }
}

impl<P, L> crate::traits::led::Led for Led<P, L>
where
    P: StatefulOutputPin,
    L: ActiveLevel,
{
    type Error = P::Error;

    fn on(&mut self) -> Result<(), Self::Error> {
        if L::ACTIVE_HIGH {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }

    fn off(&mut self) -> Result<(), Self::Error> {
        if L::ACTIVE_HIGH {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        }
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.pin.toggle()
    }

    fn state(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_set_high()? == L::ACTIVE_HIGH)
    }
}

impl<P> From<P> for Led<P>
where
    P: StatefulOutputPin,
{
    fn from(pin: P) -> Self {
        Self::new(pin)
    }
}
