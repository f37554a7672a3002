//! Oscillator parameter set and live-tuning updates.

use crate::config::SurfaceStyle;
use crate::error::{Result, SimError};

/// Largest population a single run may allocate.
pub const MAX_POINTS: u32 = 4096;

/// Population size, base frequency and global coupling strength K.
///
/// `point_num` is fixed for the lifetime of the buffers built from it.
/// `base_freq` and `connection_coefficient` may change between ticks through
/// [`ParamUpdate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorParams {
    point_num: u32,
    base_freq: f32,
    connection_coefficient: f32,
}

impl OscillatorParams {
    pub fn new(point_num: u32, base_freq: f32, connection_coefficient: f32) -> Result<Self> {
        if point_num == 0 {
            return Err(SimError::Configuration(
                "point_num must be greater than zero".into(),
            ));
        }
        if point_num > MAX_POINTS {
            return Err(SimError::Configuration(format!(
                "point_num {point_num} exceeds the maximum of {MAX_POINTS}"
            )));
        }
        check_finite("base_freq", base_freq)?;
        check_finite("connection_coefficient", connection_coefficient)?;

        Ok(Self {
            point_num,
            base_freq,
            connection_coefficient,
        })
    }

    pub fn point_num(&self) -> u32 {
        self.point_num
    }

    pub fn base_freq(&self) -> f32 {
        self.base_freq
    }

    pub fn connection_coefficient(&self) -> f32 {
        self.connection_coefficient
    }

    pub(crate) fn apply(&mut self, update: &ParamUpdate) {
        if let Some(base_freq) = update.base_freq {
            self.base_freq = base_freq;
        }
        if let Some(k) = update.connection_coefficient {
            self.connection_coefficient = k;
        }
    }
}

fn check_finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::Configuration(format!("{name} must be finite, got {value}")))
    }
}

/// Live parameter changes, applied at the next tick boundary.
///
/// Population size is deliberately absent: changing it needs fresh buffers
/// and a fresh frequency table, i.e. a new simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamUpdate {
    pub base_freq: Option<f32>,
    pub connection_coefficient: Option<f32>,
    pub style: Option<SurfaceStyle>,
}

impl ParamUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_freq(mut self, base_freq: f32) -> Self {
        self.base_freq = Some(base_freq);
        self
    }

    pub fn with_connection_coefficient(mut self, k: f32) -> Self {
        self.connection_coefficient = Some(k);
        self
    }

    pub fn with_style(mut self, style: SurfaceStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.base_freq.is_none() && self.connection_coefficient.is_none() && self.style.is_none()
    }

    /// Later values win field by field.
    pub fn merge(self, later: ParamUpdate) -> ParamUpdate {
        ParamUpdate {
            base_freq: later.base_freq.or(self.base_freq),
            connection_coefficient: later.connection_coefficient.or(self.connection_coefficient),
            style: later.style.or(self.style),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(base_freq) = self.base_freq {
            check_finite("base_freq", base_freq)
                .map_err(|e| SimError::InvalidArgument(e.to_string()))?;
        }
        if let Some(k) = self.connection_coefficient {
            check_finite("connection_coefficient", k)
                .map_err(|e| SimError::InvalidArgument(e.to_string()))?;
        }
        if let Some(style) = &self.style {
            style
                .validate()
                .map_err(|e| SimError::InvalidArgument(e.to_string()))?;
        }
        Ok(())
    }
}
