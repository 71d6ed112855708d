//! Factory calibration and the linear conversion models derived from it.
//!
//! The block at 0x30 holds two calibration points per channel. Physical values are stored in
//! fixed point (°C × 8 for temperature, %rH × 2 for humidity); the models are built in those
//! units and the scale is divided out after `raw × m + q` is applied.

use super::register::calibration::CALIBRATION_LEN;
use crate::domain::temperature::{Celsius, Temperature};

const TEMPERATURE_SCALE: f32 = 8.0;
const HUMIDITY_SCALE: f32 = 2.0;

/// Both calibration points of a channel share the same raw code, so no slope exists.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidCalibration {
    Temperature,
    Humidity,
}

/// The decoded fields of the calibration block.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawCalibration {
    pub h0_rh_x2: u8,
    pub h1_rh_x2: u8,
    pub t0_degc_x8: u16,
    pub t1_degc_x8: u16,
    pub h0_t0_out: i16,
    pub h1_t0_out: i16,
    pub t0_out: i16,
    pub t1_out: i16,
}

impl RawCalibration {
    /// Encode back into the device layout. Reserved bytes are zero.
    pub fn to_bytes(&self) -> [u8; CALIBRATION_LEN] {
        let mut block = [0; CALIBRATION_LEN];
        block[0] = self.h0_rh_x2;
        block[1] = self.h1_rh_x2;
        block[2] = self.t0_degc_x8 as u8;
        block[3] = self.t1_degc_x8 as u8;
        let t0_msb = (self.t0_degc_x8 >> 8) as u8 & 0b11;
        let t1_msb = (self.t1_degc_x8 >> 8) as u8 & 0b11;
        block[5] = t0_msb | (t1_msb << 2);
        block[6..8].copy_from_slice(&self.h0_t0_out.to_le_bytes());
        block[10..12].copy_from_slice(&self.h1_t0_out.to_le_bytes());
        block[12..14].copy_from_slice(&self.t0_out.to_le_bytes());
        block[14..16].copy_from_slice(&self.t1_out.to_le_bytes());
        block
    }
}

impl From<&[u8; CALIBRATION_LEN]> for RawCalibration {
    fn from(block: &[u8; CALIBRATION_LEN]) -> Self {
        let t_msb = block[5];
        Self {
            h0_rh_x2: block[0],
            h1_rh_x2: block[1],
            t0_degc_x8: (u16::from(t_msb & 0b0000_0011) << 8) | u16::from(block[2]),
            t1_degc_x8: (u16::from(t_msb & 0b0000_1100) << 6) | u16::from(block[3]),
            h0_t0_out: i16::from_le_bytes([block[6], block[7]]),
            h1_t0_out: i16::from_le_bytes([block[10], block[11]]),
            t0_out: i16::from_le_bytes([block[12], block[13]]),
            t1_out: i16::from_le_bytes([block[14], block[15]]),
        }
    }
}

/// `value = (raw × slope + intercept) / scale`
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearModel {
    pub slope: f32,
    pub intercept: f32,
    scale: f32,
}

impl LinearModel {
    /// Fit through `(code0, value0)` and `(code1, value1)`, values in fixed-point units.
    /// Returns `None` when both codes are equal.
    pub fn from_points(
        code0: i16,
        value0: f32,
        code1: i16,
        value1: f32,
        scale: f32,
    ) -> Option<Self> {
        let denominator = i32::from(code1) - i32::from(code0);
        if denominator == 0 {
            return None;
        }
        let slope = (value1 - value0) / denominator as f32;
        let intercept = value1 - f32::from(code1) * slope;
        Some(Self {
            slope,
            intercept,
            scale,
        })
    }

    pub fn convert(&self, raw: i16) -> f32 {
        (f32::from(raw) * self.slope + self.intercept) / self.scale
    }
}

/// Conversion models for both channels, computed once per session.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub raw: RawCalibration,
    pub temperature: LinearModel,
    pub humidity: LinearModel,
}

impl Calibration {
    pub fn compute(block: &[u8; CALIBRATION_LEN]) -> Result<Calibration, InvalidCalibration> {
        RawCalibration::from(block).try_into()
    }

    pub fn temperature(&self, t_out: i16) -> Temperature<Celsius> {
        self.temperature.convert(t_out).into()
    }

    /// Relative humidity in percent. Not clamped to `0..=100`.
    pub fn humidity(&self, h_out: i16) -> f32 {
        self.humidity.convert(h_out)
    }
}

impl TryFrom<RawCalibration> for Calibration {
    type Error = InvalidCalibration;

    fn try_from(raw: RawCalibration) -> Result<Self, Self::Error> {
        let temperature = LinearModel::from_points(
            raw.t0_out,
            f32::from(raw.t0_degc_x8),
            raw.t1_out,
            f32::from(raw.t1_degc_x8),
            TEMPERATURE_SCALE,
        )
        .ok_or(InvalidCalibration::Temperature)?;

        let humidity = LinearModel::from_points(
            raw.h0_t0_out,
            f32::from(raw.h0_rh_x2),
            raw.h1_t0_out,
            f32::from(raw.h1_rh_x2),
            HUMIDITY_SCALE,
        )
        .ok_or(InvalidCalibration::Humidity)?;

        Ok(Calibration {
            raw,
            temperature,
            humidity,
        })
    }
}
