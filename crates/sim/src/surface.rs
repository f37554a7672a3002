//! The compute surface seam.
//!
//! A compute surface owns the frequency, velocity and double-buffered phase
//! buffers and runs the three integration passes over them. The transfer of
//! the phase buffer back to host memory is split into a non-blocking
//! [`request_readback`](ComputeSurface::request_readback) and a blocking
//! [`complete_readback`](ComputeSurface::complete_readback); the latter is the
//! only call in a tick that may wait on the surface.

use crate::error::Result;
use crate::frequency::NaturalFrequencyTable;
use crate::kernel::PassInputs;

pub trait ComputeSurface {
    /// Number of oscillator slots in every buffer.
    fn point_num(&self) -> u32;

    /// Copy the natural frequency table into surface memory.
    fn upload_frequencies(&mut self, table: &NaturalFrequencyTable) -> Result<()>;

    /// Initialize pass: write the seed state into the phase buffers and clear
    /// the velocity buffer. Run once at startup.
    fn initialize(&mut self, phases: &[f32]) -> Result<()>;

    /// Velocity pass: `ω̇_i = ω_i + K R sin(Θ - θ_i)` from the current phases.
    fn update_velocity(&mut self, inputs: &PassInputs) -> Result<()>;

    /// Phase pass: `θ_i += ω̇_i Δt` into the write buffer, then swap.
    ///
    /// On error no swap happens and the previous snapshot stays current.
    fn update_phase(&mut self, inputs: &PassInputs) -> Result<()>;

    /// Schedule a transfer of the current phase buffer. Does not block.
    fn request_readback(&mut self) -> Result<()>;

    /// Blocking: wait for the scheduled transfer and copy it into `out`.
    ///
    /// Schedules a transfer first if none is pending.
    fn complete_readback(&mut self, out: &mut Vec<f32>) -> Result<()>;

    fn has_pending_readback(&self) -> bool;
}
