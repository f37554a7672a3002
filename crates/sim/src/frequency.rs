//! Natural frequency table.
//!
//! One intrinsic frequency per oscillator, drawn once at startup and never
//! modified afterwards. Both the velocity pass and the surface shader read it.

use rand::Rng;
use std::f32::consts::TAU;

use crate::config::FrequencyDistribution;
use crate::error::{Result, SimError};

#[derive(Clone, Debug, PartialEq)]
pub struct NaturalFrequencyTable {
    values: Vec<f32>,
}

impl NaturalFrequencyTable {
    /// Draw `point_num` independent samples scaled by `base_freq`.
    ///
    /// Deterministic for a seeded `rng`.
    pub fn generate<R: Rng + ?Sized>(
        point_num: u32,
        base_freq: f32,
        distribution: FrequencyDistribution,
        rng: &mut R,
    ) -> Result<Self> {
        if point_num == 0 {
            return Err(SimError::InvalidArgument(
                "frequency table needs at least one oscillator".into(),
            ));
        }

        let values = match distribution {
            FrequencyDistribution::Uniform => (0..point_num)
                .map(|_| (rng.gen::<f32>() - 0.5) * base_freq)
                .collect(),
            FrequencyDistribution::Gaussian { sigma } => (0..point_num)
                .map(|_| box_muller(rng) * sigma * base_freq)
                .collect(),
        };

        Ok(Self { values })
    }

    /// Wrap a hand-built table.
    pub fn from_values(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(SimError::InvalidArgument(
                "frequency table needs at least one oscillator".into(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidArgument(
                "natural frequencies must be finite".into(),
            ));
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn mean(&self) -> f32 {
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        (sum / self.values.len() as f64) as f32
    }

    pub fn std_dev(&self) -> f32 {
        let mean = self.mean() as f64;
        let var: f64 = self
            .values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.values.len() as f64;
        var.sqrt() as f32
    }
}

/// One standard normal sample.
fn box_muller<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // u1 must stay away from zero for the log
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}
