//! The acquisition task: the single owner of the HTS221 bus handle and calibration.
//!
//! Each cycle waits for [`Events::TRIGGER`], starts a one-shot conversion, waits (bounded) for
//! [`Events::DATA_READY`] and reads the converted result. Interrupt-side collaborators only post
//! event bits; see [`DataReadyLine`] and [`crate::actors::button::ButtonTrigger`].

mod ready;

pub use ready::DataReadyLine;

use crate::domain::Reading;
use crate::drivers::sensors::hts221::{Config, Hts221, Hts221Error};
use crate::kernel::event::{EventFlags, Events};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Timer};
use embedded_hal_async::i2c::I2c;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Upper bound on the wait for data-ready after a one-shot trigger.
    pub timeout: Duration,
    /// Settling time before the sensor is first addressed.
    pub startup_delay: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            startup_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Idle,
    TriggerRequested,
    ConversionPending,
    DataReady,
    TimedOut,
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionError<E> {
    Sensor(Hts221Error<E>),
    /// No data-ready within [`AcquisitionConfig::timeout`]. The next trigger starts over.
    Timeout,
}

impl<E> AcquisitionError<E> {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionError::Sensor(e) => e.as_str(),
            AcquisitionError::Timeout => "timed out waiting for data ready",
        }
    }
}

impl<E> From<Hts221Error<E>> for AcquisitionError<E> {
    fn from(e: Hts221Error<E>) -> Self {
        AcquisitionError::Sensor(e)
    }
}

/// Receives the outcome of every acquisition cycle.
pub trait SensorMonitor<E> {
    fn notify(&self, outcome: Result<Reading, AcquisitionError<E>>);
}

impl<M: RawMutex, E> SensorMonitor<E> for Signal<M, Result<Reading, AcquisitionError<E>>> {
    fn notify(&self, outcome: Result<Reading, AcquisitionError<E>>) {
        self.signal(outcome);
    }
}

impl<M: RawMutex, E, const N: usize> SensorMonitor<E>
    for Channel<M, Result<Reading, AcquisitionError<E>>, N>
{
    fn notify(&self, outcome: Result<Reading, AcquisitionError<E>>) {
        if self.try_send(outcome).is_err() {
            warn!("sensor monitor full, dropping outcome");
        }
    }
}

/// Non-blocking "request a reading". Safe to use from interrupt context.
pub struct Trigger<'a, M: RawMutex> {
    events: &'a EventFlags<M>,
}

impl<'a, M: RawMutex> Trigger<'a, M> {
    pub fn new(events: &'a EventFlags<M>) -> Self {
        Self { events }
    }

    pub fn request(&self) {
        self.events.post(Events::TRIGGER);
    }
}

impl<'a, M: RawMutex> Clone for Trigger<'a, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: RawMutex> Copy for Trigger<'a, M> {}

pub struct Acquisition<'a, M, I>
where
    M: RawMutex,
    I: I2c,
{
    hts221: Hts221,
    i2c: I,
    events: &'a EventFlags<M>,
    sensor_config: Config,
    config: AcquisitionConfig,
    state: State,
}

impl<'a, M, I> Acquisition<'a, M, I>
where
    M: RawMutex,
    I: I2c,
{
    pub fn new(
        hts221: Hts221,
        i2c: I,
        events: &'a EventFlags<M>,
        sensor_config: Config,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            hts221,
            i2c,
            events,
            sensor_config,
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn sensor(&self) -> &Hts221 {
        &self.hts221
    }

    pub fn trigger(&self) -> Trigger<'a, M> {
        Trigger::new(self.events)
    }

    /// Bring the sensor up and release a data-ready line left asserted by an earlier session.
    pub async fn initialize(&mut self) -> Result<(), AcquisitionError<I::Error>> {
        self.state = State::Idle;
        if self.config.startup_delay.as_ticks() > 0 {
            Timer::after(self.config.startup_delay).await;
        }

        let config = self.sensor_config;
        info!(
            "HTS221 configuration: avg_t = {}, avg_h = {}, data ready = {}",
            config.temperature_averaging.temperature_samples(),
            config.humidity_averaging.humidity_samples(),
            config.data_ready
        );
        if let Err(e) = self.hts221.initialize(&mut self.i2c, &config).await {
            error!("HTS221 initialization failed: {}", e.as_str());
            return Err(e.into());
        }

        // DRDY only drops once both outputs are read; a stale level would hide the next edge.
        self.hts221.read_raw(&mut self.i2c).await?;
        self.events.clear(Events::DATA_READY);
        Ok(())
    }

    /// Run one acquisition cycle, starting with the wait for a trigger.
    ///
    /// Triggers posted while a conversion is in flight are not queued: the event bits are
    /// cleared at the start of every cycle.
    pub async fn next(&mut self) -> Result<Reading, AcquisitionError<I::Error>> {
        self.state = State::Idle;
        if self.hts221.session().conversion_pending {
            // A conversion that outlived its timeout holds DRDY asserted until the outputs are read.
            if let Err(e) = self.hts221.read_raw(&mut self.i2c).await {
                warn!("HTS221 stale output release failed: {}", e.as_str());
            }
        }
        self.events.clear(Events::TRIGGER | Events::DATA_READY);
        self.events.wait_any(Events::TRIGGER).await;
        self.events.clear(Events::TRIGGER);
        self.state = State::TriggerRequested;
        trace!("HTS221 trigger accepted");

        let outcome = self.acquire().await;
        match &outcome {
            Ok(reading) => {
                info!(
                    "HTS221 temperature = {}, relative humidity = {}",
                    reading.temperature,
                    reading.relative_humidity
                );
            }
            Err(e) => {
                error!("HTS221 acquisition failed: {}", e.as_str());
            }
        }
        self.state = State::Idle;
        outcome
    }

    async fn acquire(&mut self) -> Result<Reading, AcquisitionError<I::Error>> {
        if self.hts221.calibration().is_none() {
            return Err(Hts221Error::NotCalibrated.into());
        }
        self.events.post(Events::LED_BLINK);

        // Cleared ahead of the trigger so an edge racing the write is not lost.
        self.events.clear(Events::DATA_READY);
        self.hts221.trigger_one_shot(&mut self.i2c).await?;
        self.state = State::ConversionPending;

        if with_timeout(self.config.timeout, self.events.wait_any(Events::DATA_READY))
            .await
            .is_err()
        {
            self.state = State::TimedOut;
            return Err(AcquisitionError::Timeout);
        }
        self.events.clear(Events::DATA_READY);
        self.state = State::DataReady;

        Ok(self.hts221.read(&mut self.i2c).await?)
    }

    /// Acquire forever, handing every outcome to `monitor`.
    pub async fn run<S: SensorMonitor<I::Error>>(&mut self, monitor: &S) {
        loop {
            let outcome = self.next().await;
            monitor.notify(outcome);
        }
    }
}
