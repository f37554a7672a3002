//! Per-lane integration kernels.
//!
//! Each function is what one lane of a pass computes for one oscillator. The
//! WGSL kernels in the `viz` crate evaluate the same expressions.

use crate::order::OrderParameter;

/// Scalars shared by every lane of a velocity or phase pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassInputs {
    /// Population the caller believes the buffers hold.
    pub point_num: u32,
    /// Coupling strength K.
    pub coupling: f32,
    /// Wall-clock seconds since the previous tick.
    pub delta_time: f32,
    /// Order parameter of the previous tick.
    pub order: OrderParameter,
}

/// Mean-field velocity: `ω_i + K R sin(Θ - θ_i)`.
#[inline]
pub fn velocity_lane(natural_freq: f32, coupling: f32, order: &OrderParameter, phase: f32) -> f32 {
    natural_freq + coupling * order.r * (order.theta - phase).sin()
}

/// Forward Euler phase step. No wrapping: consumers only take sin/cos.
#[inline]
pub fn phase_lane(phase: f32, velocity: f32, delta_time: f32) -> f32 {
    phase + velocity * delta_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_velocity_without_coupling_is_natural() {
        let order = OrderParameter {
            r: 1.0,
            theta: 2.0,
            degenerate: false,
        };
        assert_eq!(velocity_lane(0.3, 0.0, &order, 1.0), 0.3);
        assert_eq!(velocity_lane(0.3, 5.0, &OrderParameter::INITIAL, 1.0), 0.3);
    }

    #[test]
    fn test_velocity_pulls_toward_mean_phase() {
        let order = OrderParameter {
            r: 1.0,
            theta: FRAC_PI_2,
            degenerate: false,
        };
        // behind the mean phase => positive pull
        assert!((velocity_lane(0.0, 2.0, &order, 0.0) - 2.0).abs() < 1e-6);
        // ahead of the mean phase => negative pull
        assert!((velocity_lane(0.0, 2.0, &order, 2.0 * FRAC_PI_2) + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_phase_step() {
        assert_eq!(phase_lane(1.0, 2.0, 0.5), 2.0);
        assert_eq!(phase_lane(1.25, 123.0, 0.0), 1.25);
    }
}
