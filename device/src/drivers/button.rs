use super::{ActiveLevel, ActiveLow};
use core::marker::PhantomData;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

/// A push button on an edge-capable GPIO. Buttons pulling the line low when pressed are the
/// common case, hence the default.
pub struct Button<P, L = ActiveLow>
where
    P: Wait + InputPin,
    L: ActiveLevel,
{
    pin: P,
    _active: PhantomData<L>,
}

impl<P, L> Button<P, L>
where
    P: Wait + InputPin,
    L: ActiveLevel,
{
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            _active: PhantomData,
        }
    }

    pub fn is_pressed(&mut self) -> Result<bool, P::Error> {
        Ok(self.pin.is_high()? == L::ACTIVE_HIGH)
    }
}

impl<P, L> crate::traits::button::Button for Button<P, L>
where
    P: Wait + InputPin,
    L: ActiveLevel,
{
    type Error = P::Error;

    async fn wait_pressed(&mut self) -> Result<(), Self::Error> {
        if L::ACTIVE_HIGH {
            self.pin.wait_for_rising_edge().await
        } else {
            self.pin.wait_for_falling_edge().await
        }
    }

    async fn wait_released(&mut self) -> Result<(), Self::Error> {
        if L::ACTIVE_HIGH {
            self.pin.wait_for_falling_edge().await
        } else {
            self.pin.wait_for_rising_edge().await
        }
    }
}
