//! The simulation engine: owns a device program and advances N independent
//! worlds in lockstep.
//!
//! Usage:
//!
//! ```no_run
//! use swarmsim_core::config::{SimulationConfig, TaskConfig};
//! use swarmsim_core::simulator::Simulator;
//! use swarmsim_data::GenomeShape;
//!
//! let mut sim = Simulator::new(
//!     &SimulationConfig::default(),
//!     &TaskConfig::default(),
//!     GenomeShape::reference(),
//! )
//! .expect("device program builds");
//! sim.init_worlds(1.2, 42);
//! loop {
//!     sim.step();
//!     let state = sim.get_state();
//!     // hand state.transforms to a viewer
//!     # break;
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::buffers::ParameterBuffers;
use crate::config::{SimulationConfig, TaskConfig};
use crate::device::{
    build_program, steps_for, DeviceError, DeviceProgram, ProgramSpec, RobotTransform,
};
use swarmsim_data::{Genome, GenomeShape};

/// Read-only snapshot for the external viewer. Exposes no buffer layout;
/// transforms are world-major, `robots_per_world` entries per world.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationState {
    pub step_count: u64,
    pub clock: f32,
    pub transforms: Vec<RobotTransform>,
}

pub struct Simulator {
    program: Box<dyn DeviceProgram>,
    staged: ParameterBuffers,
    num_worlds: usize,
    robots_per_world: usize,
    time_step: f32,
    step_count: u64,
    clock: f32,
}

impl Simulator {
    /// Builds the device program for the given constants and allocates the
    /// host parameter mirror. An unavailable or incompatible device is
    /// fatal: the error propagates and there is no fallback.
    pub fn new(
        simulation: &SimulationConfig,
        task: &TaskConfig,
        shape: GenomeShape,
    ) -> Result<Self, DeviceError> {
        let spec = ProgramSpec {
            num_worlds: simulation.num_worlds,
            robots_per_world: simulation.num_robots,
            time_step: simulation.time_step,
            dynamics_iterations: simulation.dynamics_iterations,
            shape,
            task: task.clone(),
        };
        let program = build_program(&spec)?;
        tracing::debug!(
            num_worlds = spec.num_worlds,
            robots_per_world = spec.robots_per_world,
            time_step = spec.time_step,
            "device program built"
        );
        Ok(Self {
            program,
            staged: ParameterBuffers::zeroed(simulation.num_worlds, shape),
            num_worlds: simulation.num_worlds,
            robots_per_world: simulation.num_robots,
            time_step: simulation.time_step,
            step_count: 0,
            clock: 0.0,
        })
    }

    /// Resets every world to a fresh configuration for the given target-pad
    /// separation, reseeding each world's independent random stream from
    /// the host seed. Must be called before the first `step`.
    pub fn init_worlds(&mut self, target_distance: f32, seed: u64) {
        self.program.seed_streams(seed);
        self.program.init_worlds(target_distance);
        self.program.init_robots();
        self.step_count = 0;
        self.clock = 0.0;
    }

    /// Advances every world by exactly one time step. Synchronous: returns
    /// once the device confirms completion.
    pub fn step(&mut self) {
        self.program.step();
        self.step_count += 1;
        self.clock += self.time_step;
    }

    /// Advances until the simulated clock has moved by `seconds`,
    /// dispatched as a single device-side loop. Equivalent to the matching
    /// number of `step` calls.
    pub fn simulate(&mut self, seconds: f32) {
        let steps = steps_for(seconds, self.time_step);
        self.program.advance(seconds);
        self.step_count += steps;
        self.clock += steps as f32 * self.time_step;
    }

    /// Stages one genome into the host mirror for one world. Only that
    /// world's slice is touched; nothing reaches the device until
    /// `commit_ann_parameters`.
    pub fn set_ann_parameters(&mut self, world: usize, genome: &Genome) -> Result<(), DeviceError> {
        self.staged.stage(world, genome)
    }

    /// Pushes the whole staged mirror to the device and re-initializes the
    /// device-side parameter view. Only well-defined between episodes.
    pub fn commit_ann_parameters(&mut self) -> Result<(), DeviceError> {
        self.program.install_parameters(&self.staged)
    }

    /// Cumulative task reward per world since the last `init_worlds`.
    #[must_use]
    pub fn get_fitness(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_worlds);
        self.program.read_fitness(&mut out);
        out
    }

    /// Per-robot poses, world-major.
    #[must_use]
    pub fn get_transforms(&self) -> Vec<RobotTransform> {
        let mut out = Vec::with_capacity(self.num_worlds * self.robots_per_world);
        self.program.read_transforms(&mut out);
        out
    }

    /// Snapshot for the external viewer.
    #[must_use]
    pub fn get_state(&self) -> SimulationState {
        SimulationState {
            step_count: self.step_count,
            clock: self.clock,
            transforms: self.get_transforms(),
        }
    }

    #[must_use]
    pub fn num_worlds(&self) -> usize {
        self.num_worlds
    }

    #[must_use]
    pub fn robots_per_world(&self) -> usize {
        self.robots_per_world
    }

    #[must_use]
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    #[must_use]
    pub fn clock(&self) -> f32 {
        self.clock
    }
}
