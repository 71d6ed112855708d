use crate::actors::sensors::hts221::Trigger;
use crate::traits::button::Button;
use core::convert::Infallible;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Requests a reading on every button press.
pub struct ButtonTrigger<'a, B, M>
where
    B: Button,
    M: RawMutex,
{
    button: B,
    trigger: Trigger<'a, M>,
}

impl<'a, B, M> ButtonTrigger<'a, B, M>
where
    B: Button,
    M: RawMutex,
{
    pub fn new(button: B, trigger: Trigger<'a, M>) -> Self {
        Self { button, trigger }
    }

    /// Only returns if the button fails.
    pub async fn run(&mut self) -> Result<Infallible, B::Error> {
        loop {
            self.button.wait_pressed().await?;
            debug!("button pressed");
            self.trigger.request();
        }
    }
}
