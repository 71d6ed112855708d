use crate::kernel::event::{EventFlags, Events};
use crate::traits::led::Led;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkerConfig {
    /// How long the LED stays in the toggled state.
    pub duration: Duration,
}

impl Default for BlinkerConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(100),
        }
    }
}

/// Blinks an LED once per [`Events::LED_BLINK`].
pub struct Blinker<'a, L, M>
where
    L: Led,
    M: RawMutex,
{
    led: L,
    events: &'a EventFlags<M>,
    config: BlinkerConfig,
}

impl<'a, L, M> Blinker<'a, L, M>
where
    L: Led,
    M: RawMutex,
{
    pub fn new(led: L, events: &'a EventFlags<M>, config: BlinkerConfig) -> Self {
        Self {
            led,
            events,
            config,
        }
    }

    pub async fn blink(&mut self) -> Result<(), L::Error> {
        self.led.toggle()?;
        Timer::after(self.config.duration).await;
        self.led.toggle()
    }

    /// Requests posted while a blink is in progress are dropped.
    pub async fn run(&mut self) {
        loop {
            self.events.clear(Events::LED_BLINK);
            self.events.wait_any(Events::LED_BLINK).await;
            if self.blink().await.is_err() {
                warn!("failed to toggle LED");
            }
        }
    }
}
