//! Order parameter estimator.
//!
//! The complex mean field `R e^{iΘ} = (1/N) Σ e^{iθ_j}` summarizes how
//! synchronized the population is. `R` is 1 when every phase agrees and 0 when
//! the phases cancel out.

/// Below this magnitude the mean phase is numerically meaningless.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Sentinel mean phase reported for a zero resultant.
pub const SENTINEL_THETA: f32 = 0.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrderParameter {
    /// Synchronization magnitude in `[0, 1]`.
    pub r: f32,
    /// Mean phase in `(-π, π]`.
    pub theta: f32,
    /// Set when the resultant vanished and `theta` holds the sentinel.
    pub degenerate: bool,
}

impl OrderParameter {
    /// Order parameter used before the first readback: no coupling.
    pub const INITIAL: OrderParameter = OrderParameter {
        r: 0.0,
        theta: SENTINEL_THETA,
        degenerate: false,
    };

    pub fn from_phases(phases: &[f32]) -> Self {
        if phases.is_empty() {
            return Self {
                r: 0.0,
                theta: SENTINEL_THETA,
                degenerate: true,
            };
        }

        // f64 accumulation keeps the cancelling case close to zero
        let (real_sum, imag_sum) = phases.iter().fold((0.0f64, 0.0f64), |(re, im), &p| {
            let p = p as f64;
            (re + p.cos(), im + p.sin())
        });

        let n = phases.len() as f64;
        let r = (real_sum.hypot(imag_sum) / n).min(1.0);

        if r < DEGENERATE_EPSILON {
            return Self {
                r: r as f32,
                theta: SENTINEL_THETA,
                degenerate: true,
            };
        }

        Self {
            r: r as f32,
            theta: imag_sum.atan2(real_sum) as f32,
            degenerate: false,
        }
    }
}
