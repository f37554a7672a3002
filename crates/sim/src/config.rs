//! Run configuration.
//!
//! Everything a run needs is re-derivable from a [`SimConfig`]: there is no
//! checkpoint state. Configs round-trip through JSON for the viewer.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::params::OscillatorParams;
use crate::phase::PhaseSeed;

/// How natural frequencies are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyDistribution {
    /// Uniform offsets in `[-base_freq / 2, base_freq / 2)`.
    #[default]
    Uniform,
    /// Box-Muller normal samples with standard deviation `base_freq * sigma`.
    Gaussian { sigma: f32 },
}

/// When the host collects the order-parameter readback.
///
/// Both modes feed the velocity pass of tick `t + 1` with the order parameter
/// of tick `t`. `Deferred` only moves the wait to the start of the next tick so
/// the transfer overlaps with presenting the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    #[default]
    Blocking,
    Deferred,
}

/// Maps synchronization magnitude to the mesh scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusMapping {
    pub gain: f32,
    pub offset: f32,
}

impl Default for RadiusMapping {
    fn default() -> Self {
        Self {
            gain: 0.7,
            offset: 0.5,
        }
    }
}

impl RadiusMapping {
    pub fn visual_radius(&self, r: f32) -> f32 {
        r * self.gain + self.offset
    }
}

/// Material styling handed to the surface shader.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceStyle {
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub metallic: f32,
    pub smoothness: f32,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            color1: [0.08, 0.22, 0.65, 1.0],
            color2: [0.98, 0.55, 0.12, 1.0],
            metallic: 0.5,
            smoothness: 0.5,
        }
    }
}

impl SurfaceStyle {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("metallic", self.metallic), ("smoothness", self.smoothness)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::Configuration(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self
            .color1
            .iter()
            .chain(self.color2.iter())
            .any(|c| !c.is_finite())
        {
            return Err(SimError::Configuration("surface colors must be finite".into()));
        }
        Ok(())
    }
}

/// Complete description of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub point_num: u32,
    pub base_freq: f32,
    pub connection_coefficient: f32,
    /// Seeds both the frequency table and any randomized initial phase.
    pub seed: u64,
    pub distribution: FrequencyDistribution,
    pub phase_seed: PhaseSeed,
    pub radius: RadiusMapping,
    pub feedback: FeedbackMode,
    pub style: SurfaceStyle,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            point_num: 1024,
            base_freq: 1.0,
            connection_coefficient: 1.0,
            seed: 0x5eed,
            distribution: FrequencyDistribution::Uniform,
            phase_seed: PhaseSeed::UniformRandom,
            radius: RadiusMapping::default(),
            feedback: FeedbackMode::Blocking,
            style: SurfaceStyle::default(),
        }
    }
}

impl SimConfig {
    pub fn with_population(mut self, point_num: u32) -> Self {
        self.point_num = point_num;
        self
    }

    pub fn with_coupling(mut self, k: f32) -> Self {
        self.connection_coefficient = k;
        self
    }

    pub fn with_base_freq(mut self, base_freq: f32) -> Self {
        self.base_freq = base_freq;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_phase_seed(mut self, phase_seed: PhaseSeed) -> Self {
        self.phase_seed = phase_seed;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackMode) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_distribution(mut self, distribution: FrequencyDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn oscillator_params(&self) -> Result<OscillatorParams> {
        OscillatorParams::new(self.point_num, self.base_freq, self.connection_coefficient)
    }

    /// Checks everything that can be checked before touching the surface.
    pub fn validate(&self) -> Result<()> {
        self.oscillator_params()?;
        if let FrequencyDistribution::Gaussian { sigma } = self.distribution {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(SimError::Configuration(format!(
                    "gaussian sigma must be finite and non-negative, got {sigma}"
                )));
            }
        }
        if !self.radius.gain.is_finite() || !self.radius.offset.is_finite() {
            return Err(SimError::Configuration("radius mapping must be finite".into()));
        }
        if let PhaseSeed::Explicit(values) = &self.phase_seed {
            if values.len() != self.point_num as usize {
                return Err(SimError::Configuration(format!(
                    "explicit phase seed has {} values for {} oscillators",
                    values.len(),
                    self.point_num
                )));
            }
        }
        self.style.validate()
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &std::path::Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &std::path::Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
