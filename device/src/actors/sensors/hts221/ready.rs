use crate::drivers::sensors::hts221::register::ctrl3::ActiveState;
use crate::kernel::event::{EventFlags, Events};
use core::convert::Infallible;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::digital::Wait;

/// Watches the HTS221 DRDY pin and posts [`Events::DATA_READY`] on every assertion.
pub struct DataReadyLine<'a, P, M>
where
    P: Wait,
    M: RawMutex,
{
    pin: P,
    active: ActiveState,
    events: &'a EventFlags<M>,
}

impl<'a, P, M> DataReadyLine<'a, P, M>
where
    P: Wait,
    M: RawMutex,
{
    /// `active` must match the polarity configured in CTRL_REG3.
    pub fn new(pin: P, active: ActiveState, events: &'a EventFlags<M>) -> Self {
        Self {
            pin,
            active,
            events,
        }
    }

    pub async fn wait_asserted(&mut self) -> Result<(), P::Error> {
        match self.active {
            ActiveState::High => self.pin.wait_for_rising_edge().await,
            ActiveState::Low => self.pin.wait_for_falling_edge().await,
        }
    }

    /// Only returns if the pin fails.
    pub async fn run(&mut self) -> Result<Infallible, P::Error> {
        loop {
            self.wait_asserted().await?;
            trace!("HTS221 data ready");
            self.events.post(Events::DATA_READY);
        }
    }
}
