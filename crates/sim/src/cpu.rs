//! Rayon-backed compute surface.
//!
//! Runs every pass with one parallel lane per oscillator. It is the reference
//! implementation for the GPU kernels and the surface used by headless tests.

use rayon::prelude::*;
use std::sync::Arc;

use crate::buffer::{allocate_zeroed, PingPong, SnapshotReader};
use crate::error::{Result, SimError};
use crate::frequency::NaturalFrequencyTable;
use crate::kernel::{phase_lane, velocity_lane, PassInputs};
use crate::params::MAX_POINTS;
use crate::surface::ComputeSurface;

pub struct CpuSurface {
    point_num: u32,
    frequencies: Vec<f32>,
    velocity: Vec<f32>,
    phases: PingPong,
    pending: Option<Arc<Vec<f32>>>,
}

impl CpuSurface {
    pub fn new(point_num: u32) -> Result<Self> {
        if point_num == 0 || point_num > MAX_POINTS {
            return Err(SimError::Configuration(format!(
                "cpu surface population must be in 1..={MAX_POINTS}, got {point_num}"
            )));
        }
        let n = point_num as usize;
        Ok(Self {
            point_num,
            frequencies: allocate_zeroed(n, "natural frequency buffer")?,
            velocity: allocate_zeroed(n, "velocity buffer")?,
            phases: PingPong::allocate(n)?,
            pending: None,
        })
    }

    /// Current phase snapshot.
    pub fn phases(&self) -> &[f32] {
        self.phases.current()
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocity
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Which of the two phase slots is current.
    pub fn current_index(&self) -> usize {
        self.phases.current_index()
    }

    /// Handle for observing the phase buffer from another thread.
    pub fn reader(&self) -> SnapshotReader {
        self.phases.reader()
    }

    fn check_inputs(&self, what: &'static str, inputs: &PassInputs) -> Result<()> {
        if inputs.point_num != self.point_num {
            return Err(SimError::mismatch(
                what,
                self.point_num as usize,
                inputs.point_num as usize,
            ));
        }
        Ok(())
    }
}

impl ComputeSurface for CpuSurface {
    fn point_num(&self) -> u32 {
        self.point_num
    }

    fn upload_frequencies(&mut self, table: &NaturalFrequencyTable) -> Result<()> {
        if table.len() != self.frequencies.len() {
            return Err(SimError::mismatch(
                "frequency upload",
                self.frequencies.len(),
                table.len(),
            ));
        }
        self.frequencies.copy_from_slice(table.values());
        Ok(())
    }

    fn initialize(&mut self, phases: &[f32]) -> Result<()> {
        self.phases.initialize(phases)?;
        self.velocity.iter_mut().for_each(|v| *v = 0.0);
        self.pending = None;
        Ok(())
    }

    fn update_velocity(&mut self, inputs: &PassInputs) -> Result<()> {
        self.check_inputs("velocity pass", inputs)?;
        let coupling = inputs.coupling;
        let order = inputs.order;
        let phases = self.phases.current();

        self.velocity
            .par_iter_mut()
            .zip(self.frequencies.par_iter())
            .zip(phases.par_iter())
            .for_each(|((velocity, &omega), &theta)| {
                *velocity = velocity_lane(omega, coupling, &order, theta);
            });
        Ok(())
    }

    fn update_phase(&mut self, inputs: &PassInputs) -> Result<()> {
        self.check_inputs("phase pass", inputs)?;
        let dt = inputs.delta_time;
        let velocity = &self.velocity;

        self.phases.write_with(|read, write| {
            write
                .par_iter_mut()
                .zip(read.par_iter())
                .zip(velocity.par_iter())
                .for_each(|((out, &theta), &v)| {
                    *out = phase_lane(theta, v, dt);
                });
        });
        self.phases.swap();
        Ok(())
    }

    fn request_readback(&mut self) -> Result<()> {
        if self.pending.is_none() {
            self.pending = Some(self.phases.current_arc());
        }
        Ok(())
    }

    fn complete_readback(&mut self, out: &mut Vec<f32>) -> Result<()> {
        let snapshot = match self.pending.take() {
            Some(snapshot) => snapshot,
            None => self.phases.current_arc(),
        };
        out.clear();
        out.extend_from_slice(&snapshot);
        Ok(())
    }

    fn has_pending_readback(&self) -> bool {
        self.pending.is_some()
    }
}
