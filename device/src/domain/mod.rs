pub mod temperature;

use core::fmt::{Debug, Formatter};
use temperature::*;

/// A converted measurement from one completed acquisition cycle.
///
/// Relative humidity is reported as computed from the factory calibration and is not clamped:
/// near saturation (or below the lower calibration point) it may fall outside `0..=100`.
#[derive(Copy, Clone, PartialEq)]
pub struct Reading {
    pub temperature: Temperature<Celsius>,
    pub relative_humidity: f32,
}

impl Debug for Reading {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reading")
            .field("temperature", &self.temperature)
            .field("relative_humidity", &self.relative_humidity)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reading {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(
            f,
            "Reading(temperature: {}, relative_humidity: {})",
            &self.temperature,
            &self.relative_humidity
        );
    }
}
