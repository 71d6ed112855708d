#![macro_use]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(async_fn_in_trait)]
//! Interrupt-driven acquisition for the ST HTS221 humidity and temperature sensor, built on
//! [embassy](https://github.com/embassy-rs/embassy) and the `embedded-hal-async` traits.
//!
//! # Architecture
//!
//! Interrupt-style handlers (a button edge and the sensor's data-ready edge) never touch the bus.
//! They post bits into a coalescing [`EventFlags`](kernel::event::EventFlags) group and return.
//! A single [`Acquisition`](actors::sensors::hts221::Acquisition) task owns the I2C bus and the
//! calibration, and runs the trigger → one-shot → bounded wait → read cycle.
//!
//! # Example
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::signal::Signal;
//! use hts221_device::actors::sensors::hts221::*;
//! use hts221_device::drivers::sensors::hts221::{Config, Hts221};
//! use hts221_device::kernel::event::EventFlags;
//!
//! static EVENTS: EventFlags<CriticalSectionRawMutex> = EventFlags::new();
//!
//! async fn sensor_task<I: embedded_hal_async::i2c::I2c>(i2c: I) {
//!     let mut acquisition = Acquisition::new(
//!         Hts221::new(),
//!         i2c,
//!         &EVENTS,
//!         Config::default(),
//!         AcquisitionConfig::default(),
//!     );
//!     if acquisition.initialize().await.is_ok() {
//!         let readings = Signal::<CriticalSectionRawMutex, _>::new();
//!         acquisition.run(&readings).await;
//!     }
//! }
//! ```

pub(crate) mod fmt;

pub mod kernel;

pub mod actors;

pub mod traits;

pub mod drivers;

pub mod domain;

#[cfg(feature = "std")]
pub mod testutil;
