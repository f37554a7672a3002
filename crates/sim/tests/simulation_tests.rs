//! End-to-end tests for the Kuramoto tick loop on the CPU surface.
//!
//! Tests cover:
//! - Static scenarios (no coupling, no drift)
//! - Synchronization of a tightly clustered population
//! - Zero-dt idempotence
//! - One-tick feedback lag in both feedback modes
//! - Coupling strength vs. long-run coherence
//! - Aborted ticks keeping the last good snapshot

use std::f32::consts::{FRAC_PI_2, PI};

use sim::{
    ComputeSurface, CpuSurface, FeedbackMode, FrequencyDistribution, NaturalFrequencyTable,
    OrderParameter, PassInputs, PhaseSeed, SimConfig, SimError, Simulation,
};

// =============================================================================
// HELPERS
// =============================================================================

fn cpu_sim(config: &SimConfig) -> Simulation<CpuSurface> {
    let surface = CpuSurface::new(config.point_num).expect("cpu surface");
    Simulation::new(config, surface).expect("simulation")
}

fn cpu_sim_with(config: &SimConfig, frequencies: Vec<f32>) -> Simulation<CpuSurface> {
    let table = NaturalFrequencyTable::from_values(frequencies).expect("table");
    let surface = CpuSurface::new(config.point_num).expect("cpu surface");
    Simulation::with_frequencies(config, table, surface).expect("simulation")
}

/// Average R over the last `window` of `ticks` ticks.
fn settled_coherence(config: &SimConfig, ticks: usize, window: usize, dt: f32) -> f32 {
    let mut sim = cpu_sim(config);
    let mut sum = 0.0;
    for i in 0..ticks {
        let report = sim.tick(dt).expect("tick");
        if i >= ticks - window {
            sum += report.order.r;
        }
    }
    sum / window as f32
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_uncoupled_static_quadrants() {
    let config = SimConfig::default()
        .with_population(4)
        .with_coupling(0.0)
        .with_phase_seed(PhaseSeed::Explicit(vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2]));
    let mut sim = cpu_sim_with(&config, vec![0.0; 4]);

    let report = sim.tick(1.0).unwrap();

    assert_eq!(
        sim.surface().phases(),
        &[0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2],
        "no coupling and no drift must leave phases untouched"
    );
    assert!(report.order.r < 1e-5, "R = {}", report.order.r);
    assert!(report.order.degenerate);
    assert_eq!(report.order.theta, 0.0);
    assert!((report.visual_radius - 0.5).abs() < 1e-4);
}

#[test]
fn test_clustered_population_synchronizes() {
    let config = SimConfig::default()
        .with_population(100)
        .with_base_freq(1.0)
        .with_coupling(2.0)
        .with_distribution(FrequencyDistribution::Gaussian { sigma: 0.05 })
        .with_phase_seed(PhaseSeed::UniformRandom)
        .with_seed(2024);
    let mut sim = cpu_sim(&config);
    assert!(
        sim.frequencies().std_dev() < 0.1,
        "frequencies should be tightly clustered"
    );

    let mut last = sim.report();
    for _ in 0..1000 {
        last = sim.tick(0.016).unwrap();
    }

    assert!(last.order.r > 0.95, "expected synchronization, R = {}", last.order.r);
    assert!(last.visual_radius > 1.1);
}

#[test]
fn test_zero_dt_tick_is_idempotent() {
    let config = SimConfig::default()
        .with_population(64)
        .with_coupling(1.5)
        .with_seed(11);
    let mut sim = cpu_sim(&config);
    for _ in 0..20 {
        sim.tick(0.016).unwrap();
    }

    let before = sim.surface().phases().to_vec();
    sim.tick(0.0).unwrap();
    assert_eq!(sim.surface().phases(), before.as_slice());
}

#[test]
fn test_first_tick_has_no_coupling() {
    let config = SimConfig::default()
        .with_population(2)
        .with_coupling(10.0)
        .with_phase_seed(PhaseSeed::Explicit(vec![0.0, 0.5]));
    let mut sim = cpu_sim_with(&config, vec![1.0, -1.0]);

    sim.tick(0.1).unwrap();
    let after_first = sim.surface().phases().to_vec();
    assert!((after_first[0] - 0.1).abs() < 1e-6);
    assert!((after_first[1] - 0.4).abs() < 1e-6);

    // second tick couples through the order parameter of the first tick's result
    let order = OrderParameter::from_phases(&after_first);
    sim.tick(0.1).unwrap();
    let expected: Vec<f32> = after_first
        .iter()
        .zip([1.0f32, -1.0])
        .map(|(&theta, omega)| {
            let v = omega + 10.0 * order.r * (order.theta - theta).sin();
            theta + v * 0.1
        })
        .collect();
    for (got, want) in sim.surface().phases().iter().zip(&expected) {
        assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
    }
}

#[test]
fn test_deferred_feedback_matches_blocking_trajectory() {
    let base = SimConfig::default()
        .with_population(128)
        .with_coupling(1.2)
        .with_seed(77);
    let mut blocking = cpu_sim(&base.clone().with_feedback(FeedbackMode::Blocking));
    let mut deferred = cpu_sim(&base.with_feedback(FeedbackMode::Deferred));

    for _ in 0..50 {
        blocking.tick(0.02).unwrap();
        deferred.tick(0.02).unwrap();
    }

    assert_eq!(
        blocking.surface().phases(),
        deferred.surface().phases(),
        "both modes must lag the order parameter by exactly one tick"
    );
    assert!(deferred.surface().has_pending_readback());
    let flushed = deferred.flush_readback().unwrap();
    assert_eq!(flushed, blocking.order());
}

#[test]
fn test_stronger_coupling_never_lowers_coherence() {
    let base = SimConfig::default()
        .with_population(200)
        .with_base_freq(1.0)
        .with_phase_seed(PhaseSeed::UniformRandom)
        .with_seed(5);

    let couplings = [0.0, 1.0, 2.0, 4.0];
    let coherence: Vec<f32> = couplings
        .iter()
        .map(|&k| settled_coherence(&base.clone().with_coupling(k), 1500, 200, 0.02))
        .collect();

    for pair in coherence.windows(2) {
        assert!(
            pair[1] + 0.05 >= pair[0],
            "coherence should not drop with coupling: {coherence:?}"
        );
    }
    assert!(coherence[3] > 0.9, "strong coupling should lock: {coherence:?}");
    assert!(coherence[0] < 0.3, "no coupling should stay incoherent: {coherence:?}");
}

#[test]
fn test_live_coupling_change_applies_next_tick() {
    let config = SimConfig::default()
        .with_population(2)
        .with_coupling(0.0)
        .with_phase_seed(PhaseSeed::Explicit(vec![0.0, 0.2]));
    let mut sim = cpu_sim_with(&config, vec![0.0, 0.0]);

    sim.tick(0.1).unwrap();
    assert_eq!(sim.surface().phases(), &[0.0, 0.2]);

    sim.queue_update(sim::ParamUpdate::new().with_connection_coefficient(5.0))
        .unwrap();
    sim.tick(0.1).unwrap();
    let phases = sim.surface().phases();
    assert!(phases[0] > 0.0, "oscillator behind the mean is pulled forward");
    assert!(phases[1] < 0.2, "oscillator ahead of the mean is pulled back");
}

// =============================================================================
// FAILURE HANDLING
// =============================================================================

/// Wraps the CPU surface and reports a size mismatch on chosen phase passes.
struct FlakySurface {
    inner: CpuSurface,
    phase_calls: u32,
    fail_on: u32,
}

impl ComputeSurface for FlakySurface {
    fn point_num(&self) -> u32 {
        self.inner.point_num()
    }

    fn upload_frequencies(&mut self, table: &NaturalFrequencyTable) -> sim::Result<()> {
        self.inner.upload_frequencies(table)
    }

    fn initialize(&mut self, phases: &[f32]) -> sim::Result<()> {
        self.inner.initialize(phases)
    }

    fn update_velocity(&mut self, inputs: &PassInputs) -> sim::Result<()> {
        self.inner.update_velocity(inputs)
    }

    fn update_phase(&mut self, inputs: &PassInputs) -> sim::Result<()> {
        self.phase_calls += 1;
        if self.phase_calls == self.fail_on {
            return Err(SimError::DimensionMismatch {
                what: "phase pass",
                expected: inputs.point_num as usize,
                actual: inputs.point_num as usize - 1,
            });
        }
        self.inner.update_phase(inputs)
    }

    fn request_readback(&mut self) -> sim::Result<()> {
        self.inner.request_readback()
    }

    fn complete_readback(&mut self, out: &mut Vec<f32>) -> sim::Result<()> {
        self.inner.complete_readback(out)
    }

    fn has_pending_readback(&self) -> bool {
        self.inner.has_pending_readback()
    }
}

#[test]
fn test_failed_pass_freezes_state_for_one_tick() {
    let config = SimConfig::default().with_population(16).with_seed(3);
    let surface = FlakySurface {
        inner: CpuSurface::new(16).unwrap(),
        phase_calls: 0,
        fail_on: 3,
    };
    let mut sim = Simulation::new(&config, surface).unwrap();

    sim.tick(0.05).unwrap();
    sim.tick(0.05).unwrap();
    let snapshot = sim.surface().inner.phases().to_vec();
    let index = sim.surface().inner.current_index();
    let report = sim.report();

    let err = sim.tick(0.05).unwrap_err();
    assert!(matches!(err, SimError::DimensionMismatch { .. }));
    assert!(!err.is_fatal());
    assert_eq!(sim.surface().inner.phases(), snapshot.as_slice());
    assert_eq!(sim.surface().inner.current_index(), index);
    assert_eq!(sim.report(), report, "aborted tick must not advance telemetry");

    let next = sim.tick(0.05).unwrap();
    assert_eq!(next.tick, 3);
    assert_ne!(sim.surface().inner.phases(), snapshot.as_slice());
}
