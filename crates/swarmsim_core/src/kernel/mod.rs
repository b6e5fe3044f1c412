//! Reference compute program: a rayon-parallel CPU backend implementing
//! the device entry-point contract.
//!
//! Each world is fully self-contained (own random stream, arena, robots),
//! so worlds are stepped in parallel with no cross-world state and results
//! are independent of thread scheduling.

pub(crate) mod sense;
pub(crate) mod world;

use rayon::prelude::*;

use crate::buffers::ParameterBuffers;
use crate::device::{steps_for, DeviceError, DeviceProgram, ProgramSpec, RobotTransform};
use self::world::WorldState;

/// Robot body radius in metres.
pub(crate) const ROBOT_RADIUS: f32 = 0.06;
/// Distance between the two wheels.
pub(crate) const AXLE_LENGTH: f32 = 0.104;
/// Reach of one proximity ray beyond the body.
pub(crate) const PROXIMITY_RANGE: f32 = 0.12;
/// Reach of the quadrant cameras.
pub(crate) const CAMERA_RANGE: f32 = 2.0;
/// Minimum spawn distance from any wall.
pub(crate) const SPAWN_MARGIN: f32 = 0.12;
/// Divisor of the per-tick wheel-usage energy drain.
pub(crate) const WHEEL_DRAIN_DIVISOR: f32 = 2.0 * 82.0;

pub struct CpuProgram {
    spec: ProgramSpec,
    params: ParameterBuffers,
    worlds: Vec<WorldState>,
}

impl CpuProgram {
    #[must_use]
    pub fn build(spec: ProgramSpec) -> Self {
        let worlds = (0..spec.num_worlds)
            .map(|w| WorldState::new(&spec, stream_seed(0, w as u64)))
            .collect();
        Self {
            params: ParameterBuffers::zeroed(spec.num_worlds, spec.shape),
            worlds,
            spec,
        }
    }
}

impl DeviceProgram for CpuProgram {
    fn spec(&self) -> &ProgramSpec {
        &self.spec
    }

    fn seed_streams(&mut self, seed: u64) {
        for (w, world) in self.worlds.iter_mut().enumerate() {
            world.reseed(stream_seed(seed, w as u64));
        }
    }

    fn init_worlds(&mut self, target_distance: f32) {
        let spec = &self.spec;
        self.worlds
            .par_iter_mut()
            .for_each(|world| world.init_arena(spec, target_distance));
    }

    fn init_robots(&mut self) {
        let spec = &self.spec;
        self.worlds
            .par_iter_mut()
            .for_each(|world| world.place_robots(spec));
    }

    fn step(&mut self) {
        let spec = &self.spec;
        let params = &self.params;
        self.worlds
            .par_iter_mut()
            .enumerate()
            .for_each(|(w, world)| world.step(params.world_params(w), spec));
    }

    fn advance(&mut self, seconds: f32) {
        let steps = steps_for(seconds, self.spec.time_step);
        let spec = &self.spec;
        let params = &self.params;
        self.worlds
            .par_iter_mut()
            .enumerate()
            .for_each(|(w, world)| {
                for _ in 0..steps {
                    world.step(params.world_params(w), spec);
                }
            });
    }

    fn install_parameters(&mut self, params: &ParameterBuffers) -> Result<(), DeviceError> {
        params.check_layout(self.spec.num_worlds, self.spec.shape)?;
        self.params = params.clone();
        Ok(())
    }

    fn read_fitness(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.worlds.iter().map(WorldState::total_fitness));
    }

    fn read_transforms(&self, out: &mut Vec<RobotTransform>) {
        out.clear();
        for world in &self.worlds {
            world.collect_transforms(out);
        }
    }
}

/// Derives one world's stream seed from the master seed (splitmix64 step).
pub(crate) fn stream_seed(master: u64, index: u64) -> u64 {
    let mut z = master
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(index.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use swarmsim_data::GenomeShape;

    fn program(num_worlds: usize, robots: usize) -> CpuProgram {
        CpuProgram::build(ProgramSpec {
            num_worlds,
            robots_per_world: robots,
            time_step: 1.0 / 30.0,
            dynamics_iterations: 4,
            shape: GenomeShape::reference(),
            task: TaskConfig::default(),
        })
    }

    #[test]
    fn test_stream_seeds_differ_per_world() {
        let a = stream_seed(42, 0);
        let b = stream_seed(42, 1);
        let c = stream_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_parameters_keep_robots_stationary() {
        let mut prog = program(1, 1);
        prog.seed_streams(7);
        prog.init_worlds(1.2);
        prog.init_robots();

        let mut before = Vec::new();
        prog.read_transforms(&mut before);
        for _ in 0..30 {
            prog.step();
        }
        let mut after = Vec::new();
        prog.read_transforms(&mut after);

        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_advance_matches_explicit_steps() {
        let mut stepped = program(2, 4);
        let mut bulk = program(2, 4);
        let genome = crate::evaluator::randomized_genome(GenomeShape::reference(), 5);
        let mut params = ParameterBuffers::zeroed(2, GenomeShape::reference());
        params.stage(0, &genome).unwrap();
        params.stage(1, &genome).unwrap();
        for prog in [&mut stepped, &mut bulk] {
            prog.install_parameters(&params).unwrap();
            prog.seed_streams(11);
            prog.init_worlds(1.5);
            prog.init_robots();
        }

        for _ in 0..60 {
            stepped.step();
        }
        bulk.advance(2.0);

        let (mut a, mut b) = (Vec::new(), Vec::new());
        stepped.read_transforms(&mut a);
        bulk.read_transforms(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_install_rejects_wrong_world_count() {
        let mut prog = program(2, 1);
        let foreign = ParameterBuffers::zeroed(3, GenomeShape::reference());
        assert!(matches!(
            prog.install_parameters(&foreign),
            Err(DeviceError::BufferMismatch { .. })
        ));
    }
}
