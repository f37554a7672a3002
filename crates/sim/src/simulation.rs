//! Simulation controller.
//!
//! One [`Simulation::tick`] runs, in order:
//!
//! 1. apply queued parameter updates (tick boundary)
//! 2. collect a deferred readback from the previous tick, if any
//! 3. velocity pass with the previous tick's order parameter
//! 4. phase pass + buffer swap
//! 5. request the readback of the new phases (and collect it now in
//!    [`FeedbackMode::Blocking`])
//!
//! The coupling term therefore always lags the true order parameter by exactly
//! one tick, in both feedback modes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{FeedbackMode, RadiusMapping, SimConfig, SurfaceStyle};
use crate::error::{Result, SimError};
use crate::frequency::NaturalFrequencyTable;
use crate::kernel::PassInputs;
use crate::order::OrderParameter;
use crate::params::{OscillatorParams, ParamUpdate};
use crate::render::RenderParams;
use crate::surface::ComputeSurface;

/// Telemetry for one completed tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub elapsed: f32,
    /// Latest collected order parameter; feeds the next velocity pass.
    pub order: OrderParameter,
    pub visual_radius: f32,
}

pub struct Simulation<S: ComputeSurface> {
    params: OscillatorParams,
    style: SurfaceStyle,
    radius_mapping: RadiusMapping,
    feedback: FeedbackMode,
    frequencies: NaturalFrequencyTable,
    surface: S,
    pending_update: Option<ParamUpdate>,
    order: OrderParameter,
    visual_radius: f32,
    readback: Vec<f32>,
    elapsed: f32,
    tick: u64,
}

impl<S: ComputeSurface> Simulation<S> {
    /// Build a run from `config`: draws the frequency table and the initial
    /// phases from `config.seed`, uploads both and runs the initialize pass.
    pub fn new(config: &SimConfig, surface: S) -> Result<Self> {
        config.validate()?;
        let params = config.oscillator_params()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let frequencies = NaturalFrequencyTable::generate(
            params.point_num(),
            params.base_freq(),
            config.distribution,
            &mut rng,
        )?;
        let phases = config.phase_seed.seed_phases(params.point_num(), &mut rng)?;
        Self::assemble(config, params, frequencies, &phases, surface)
    }

    /// Like [`new`](Self::new) but with a caller-supplied frequency table.
    pub fn with_frequencies(
        config: &SimConfig,
        frequencies: NaturalFrequencyTable,
        surface: S,
    ) -> Result<Self> {
        config.validate()?;
        let params = config.oscillator_params()?;
        if frequencies.len() != params.point_num() as usize {
            return Err(SimError::Configuration(format!(
                "frequency table has {} entries for {} oscillators",
                frequencies.len(),
                params.point_num()
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let phases = config.phase_seed.seed_phases(params.point_num(), &mut rng)?;
        Self::assemble(config, params, frequencies, &phases, surface)
    }

    fn assemble(
        config: &SimConfig,
        params: OscillatorParams,
        frequencies: NaturalFrequencyTable,
        phases: &[f32],
        mut surface: S,
    ) -> Result<Self> {
        if surface.point_num() != params.point_num() {
            return Err(SimError::mismatch(
                "surface allocation",
                params.point_num() as usize,
                surface.point_num() as usize,
            ));
        }
        surface.upload_frequencies(&frequencies)?;
        surface.initialize(phases)?;

        let initial = OrderParameter::from_phases(phases);
        if initial.degenerate {
            log::debug!("initial phases have a zero resultant; mean phase uses the sentinel");
        }
        log::info!(
            "Kuramoto simulation: {} oscillators, K = {}, base_freq = {}, {:?} feedback",
            params.point_num(),
            params.connection_coefficient(),
            params.base_freq(),
            config.feedback
        );

        Ok(Self {
            params,
            style: config.style,
            radius_mapping: config.radius,
            feedback: config.feedback,
            frequencies,
            surface,
            pending_update: None,
            order: OrderParameter::INITIAL,
            visual_radius: config.radius.visual_radius(OrderParameter::INITIAL.r),
            readback: Vec::with_capacity(params.point_num() as usize),
            elapsed: 0.0,
            tick: 0,
        })
    }

    /// Queue a live update; it takes effect at the start of the next tick.
    pub fn queue_update(&mut self, update: ParamUpdate) -> Result<()> {
        update.validate()?;
        self.pending_update = Some(match self.pending_update.take() {
            Some(earlier) => earlier.merge(update),
            None => update,
        });
        Ok(())
    }

    /// Advance by `dt` seconds.
    ///
    /// A failed pass aborts only this tick: no swap happens, the last good
    /// snapshot stays current and the next tick tries again.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidArgument(format!(
                "tick delta must be finite and non-negative, got {dt}"
            )));
        }

        self.apply_pending_update();

        if self.surface.has_pending_readback() {
            self.collect_order_parameter()?;
        }

        let inputs = PassInputs {
            point_num: self.params.point_num(),
            coupling: self.params.connection_coefficient(),
            delta_time: dt,
            order: self.order,
        };

        if let Err(err) = self.run_passes(&inputs) {
            log::warn!("tick {} aborted, keeping last snapshot: {err}", self.tick + 1);
            return Err(err);
        }

        self.surface.request_readback()?;
        if self.feedback == FeedbackMode::Blocking {
            self.collect_order_parameter()?;
        }

        self.elapsed += dt;
        self.tick += 1;

        log::debug!(
            "tick {}: R = {:.4}, Θ = {:.4}, radius = {:.4}",
            self.tick,
            self.order.r,
            self.order.theta,
            self.visual_radius
        );

        Ok(self.report())
    }

    /// Wait for any outstanding readback and fold it into the order parameter.
    pub fn flush_readback(&mut self) -> Result<OrderParameter> {
        if self.surface.has_pending_readback() {
            self.collect_order_parameter()?;
        }
        Ok(self.order)
    }

    /// Parameter bundle for this tick's draw.
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            style: self.style,
            radius: self.visual_radius,
            elapsed_time: self.elapsed,
            base_freq: self.params.base_freq(),
            point_num: self.params.point_num(),
        }
    }

    pub fn report(&self) -> TickReport {
        TickReport {
            tick: self.tick,
            elapsed: self.elapsed,
            order: self.order,
            visual_radius: self.visual_radius,
        }
    }

    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.style
    }

    pub fn frequencies(&self) -> &NaturalFrequencyTable {
        &self.frequencies
    }

    pub fn order(&self) -> OrderParameter {
        self.order
    }

    pub fn visual_radius(&self) -> f32 {
        self.visual_radius
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn feedback_mode(&self) -> FeedbackMode {
        self.feedback
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn apply_pending_update(&mut self) {
        if let Some(update) = self.pending_update.take() {
            self.params.apply(&update);
            if let Some(style) = update.style {
                self.style = style;
            }
            log::debug!(
                "applied update at tick boundary: K = {}, base_freq = {}",
                self.params.connection_coefficient(),
                self.params.base_freq()
            );
        }
    }

    fn run_passes(&mut self, inputs: &PassInputs) -> Result<()> {
        self.surface.update_velocity(inputs)?;
        self.surface.update_phase(inputs)
    }

    fn collect_order_parameter(&mut self) -> Result<()> {
        self.surface.complete_readback(&mut self.readback)?;
        let expected = self.params.point_num() as usize;
        if self.readback.len() != expected {
            return Err(SimError::mismatch(
                "order parameter readback",
                expected,
                self.readback.len(),
            ));
        }

        self.order = OrderParameter::from_phases(&self.readback);
        if self.order.degenerate {
            log::trace!("degenerate order parameter, mean phase set to sentinel");
        }
        self.visual_radius = self.radius_mapping.visual_radius(self.order.r);
        Ok(())
    }
}
