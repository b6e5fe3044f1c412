//! The compute-program seam.
//!
//! The Simulator drives an opaque device program through a fixed set of
//! named entry points: stream seeding, world/robot initialization, per-step
//! and bulk advance, parameter installation, and fitness/transform
//! extraction. Build-time constants live in [`ProgramSpec`]; changing any
//! of them requires building a new program.

use thiserror::Error;

use crate::buffers::ParameterBuffers;
use crate::config::TaskConfig;
use crate::kernel::CpuProgram;
use serde::{Deserialize, Serialize};
use swarmsim_data::GenomeShape;

/// Errors raised at program construction or parameter upload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// No compute backend available for the requested program.
    #[error("compute device unavailable: {0}")]
    Unavailable(String),

    /// The program could not be built for the requested constants.
    #[error("device program build failed: {0}")]
    BuildFailure(String),

    /// Staged genome shape does not match the program's compiled shape.
    #[error("parameter shape mismatch: program compiled for {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: GenomeShape,
        found: GenomeShape,
    },

    /// A flattened buffer's length disagrees with the program's layout.
    #[error("buffer '{field}' holds {found} elements, program expects {expected}")]
    BufferMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// World index outside the compiled world count.
    #[error("world index {world} out of range (program has {num_worlds} worlds)")]
    WorldIndexOutOfRange { world: usize, num_worlds: usize },
}

/// Build-time constants of a device program.
#[derive(Debug, Clone)]
pub struct ProgramSpec {
    pub num_worlds: usize,
    pub robots_per_world: usize,
    pub time_step: f32,
    pub dynamics_iterations: u32,
    pub shape: GenomeShape,
    pub task: TaskConfig,
}

/// Renderable pose of one robot: position plus orientation as sin/cos.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotTransform {
    pub x: f32,
    pub y: f32,
    pub sin: f32,
    pub cos: f32,
}

/// Entry points of a loaded device program.
///
/// Calls are synchronous: each returns only once the device has completed
/// the dispatch. Worlds are fully independent; no call observes partial
/// state.
pub trait DeviceProgram: Send {
    fn spec(&self) -> &ProgramSpec;

    /// Re-initializes every world's independent random stream.
    fn seed_streams(&mut self, seed: u64);

    /// Rebuilds arena and pads for the given target-pad separation.
    fn init_worlds(&mut self, target_distance: f32);

    /// Re-places robots and clears controller and task state.
    fn init_robots(&mut self);

    /// Advances every world by exactly one time step.
    fn step(&mut self);

    /// Device-side loop advancing every world by the given duration;
    /// equivalent to the matching number of `step` calls.
    fn advance(&mut self, seconds: f32);

    /// Installs the full host parameter mirror as the device-side view.
    fn install_parameters(&mut self, params: &ParameterBuffers) -> Result<(), DeviceError>;

    /// One cumulative fitness scalar per world.
    fn read_fitness(&self, out: &mut Vec<f32>);

    /// Per-robot transforms, world-major.
    fn read_transforms(&self, out: &mut Vec<RobotTransform>);
}

/// Builds the device program for the given constants.
///
/// Construction is all-or-nothing: an incompatible spec is fatal to the
/// caller, there is no degraded fallback.
pub fn build_program(spec: &ProgramSpec) -> Result<Box<dyn DeviceProgram>, DeviceError> {
    if spec.num_worlds == 0 || spec.robots_per_world == 0 {
        return Err(DeviceError::BuildFailure(format!(
            "program requires at least one world and one robot, got {}x{}",
            spec.num_worlds, spec.robots_per_world
        )));
    }
    if spec.time_step <= 0.0 || spec.dynamics_iterations == 0 {
        return Err(DeviceError::BuildFailure(format!(
            "non-positive integration constants: time_step={}, iterations={}",
            spec.time_step, spec.dynamics_iterations
        )));
    }
    if spec.shape != GenomeShape::reference() {
        return Err(DeviceError::BuildFailure(format!(
            "kernel is compiled for the reference controller {:?}, got {:?}",
            GenomeShape::reference(),
            spec.shape
        )));
    }
    Ok(Box::new(CpuProgram::build(spec.clone())))
}

/// Number of whole steps needed to advance the clock by `seconds`.
#[must_use]
pub fn steps_for(seconds: f32, time_step: f32) -> u64 {
    if seconds <= 0.0 {
        return 0;
    }
    ((seconds / time_step) - 1e-4).ceil().max(0.0) as u64
}
