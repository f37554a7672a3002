//! Mean-field Kuramoto oscillator core.
//!
//! A population of phase oscillators `θ_i` with natural frequencies `ω_i`,
//! coupled through the population's order parameter `R e^{iΘ}`:
//!
//! ```text
//! ω̇_i = ω_i + K · R · sin(Θ − θ_i)
//! θ_i ← θ_i + ω̇_i · Δt
//! ```
//!
//! This crate is surface-agnostic: the integration passes run behind the
//! [`ComputeSurface`] trait. [`CpuSurface`] runs them with rayon; the `viz`
//! crate provides a wgpu implementation and the mesh renderer.
//!
//! # Example
//!
//! ```
//! use sim::{CpuSurface, PhaseSeed, SimConfig, Simulation};
//!
//! let config = SimConfig::default()
//!     .with_population(64)
//!     .with_coupling(2.0)
//!     .with_phase_seed(PhaseSeed::UniformRandom);
//! let surface = CpuSurface::new(64).unwrap();
//! let mut sim = Simulation::new(&config, surface).unwrap();
//!
//! let report = sim.tick(1.0 / 60.0).unwrap();
//! assert!((0.0..=1.0).contains(&report.order.r));
//! ```

pub mod buffer;
pub mod config;
pub mod cpu;
pub mod error;
pub mod frequency;
pub mod kernel;
pub mod order;
pub mod params;
pub mod phase;
pub mod remap;
pub mod render;
pub mod simulation;
pub mod surface;

pub use buffer::{PingPong, SnapshotReader};
pub use config::{FeedbackMode, FrequencyDistribution, RadiusMapping, SimConfig, SurfaceStyle};
pub use cpu::CpuSurface;
pub use error::{Result, SimError};
pub use frequency::NaturalFrequencyTable;
pub use kernel::PassInputs;
pub use order::OrderParameter;
pub use params::{OscillatorParams, ParamUpdate, MAX_POINTS};
pub use phase::PhaseSeed;
pub use render::RenderParams;
pub use simulation::{Simulation, TickReport};
pub use surface::ComputeSurface;
