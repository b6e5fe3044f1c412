//! Fitness evaluation: the trait the optimizer scores particles through,
//! the trial protocol shared by every evaluator, and the multi-world
//! batched evaluator.

use thiserror::Error;

use crate::config::{SimulationConfig, TaskConfig};
use crate::device::DeviceError;
use crate::genome::GenomeLogic;
use crate::kernel::stream_seed;
use crate::simulator::Simulator;
use swarmsim_data::{Genome, GenomeBounds, GenomeShape};

/// Errors surfaced by a fitness evaluation round.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A worker failed to reply within its wall-clock budget.
    #[error("worker {worker} did not reply within the timeout")]
    WorkerUnresponsive { worker: usize },

    /// A worker's channel disconnected (thread died or pool shut down).
    #[error("worker {worker} is gone")]
    WorkerLost { worker: usize },

    /// The evaluator is sized for a different population.
    #[error("evaluator sized for {expected} genomes, got {found}")]
    PoolSize { expected: usize, found: usize },
}

/// Scores a full generation of genomes. Results are order-aligned with the
/// input slice; an error fails the generation as a unit, there are no
/// partial generations.
pub trait FitnessEvaluator {
    fn evaluate(&mut self, genomes: &[Genome]) -> Result<Vec<f32>, EvalError>;
}

/// Closure-backed evaluator for deterministic objectives in tests and
/// headless experiments.
pub struct FnEvaluator<F>(pub F);

impl<F: FnMut(&Genome) -> f32> FitnessEvaluator for FnEvaluator<F> {
    fn evaluate(&mut self, genomes: &[Genome]) -> Result<Vec<f32>, EvalError> {
        Ok(genomes.iter().map(&mut self.0).collect())
    }
}

/// Runs the full trial set for the genomes currently committed to `sim`
/// and accumulates the normalized score per world into `acc`.
///
/// For every difficulty distance and repetition the worlds are re-seeded
/// with a distinct stream, run for one full episode, and each world's raw
/// reward is divided by the maximum achievable trips at that distance.
pub(crate) fn run_trial_set(
    sim: &mut Simulator,
    task: &TaskConfig,
    stage: impl Fn(&mut Simulator) -> Result<(), DeviceError>,
    trial_seed: &mut u64,
    acc: &mut [f32],
) -> Result<(), EvalError> {
    for &distance in &task.target_distances {
        for _ in 0..task.trial_repetitions {
            let seed = stream_seed(*trial_seed, 0);
            *trial_seed = trial_seed.wrapping_add(1);

            sim.init_worlds(distance, seed);
            stage(sim)?;
            sim.commit_ann_parameters()?;
            sim.simulate(task.episode_seconds);

            let bound = task.max_trips(distance);
            for (world, &fitness) in sim.get_fitness().iter().enumerate() {
                acc[world] += fitness / bound;
            }
        }
    }
    Ok(())
}

/// Scales a trial-set accumulator down to one scalar per genome.
pub(crate) fn normalize_scores(acc: &mut [f32], task: &TaskConfig, robots_per_world: usize) {
    let divisor =
        (task.target_distances.len() * task.trial_repetitions * robots_per_world) as f32;
    for score in acc.iter_mut() {
        *score /= divisor;
    }
}

/// Bulk evaluation mode: one Simulator with as many worlds as genomes,
/// every world advanced in lockstep on the device. Shares the Simulator
/// contract (and the trial protocol) with the per-particle workers.
pub struct BatchEvaluator {
    sim: Simulator,
    task: TaskConfig,
    trial_seed: u64,
}

impl BatchEvaluator {
    pub fn new(
        population_size: usize,
        simulation: &SimulationConfig,
        task: &TaskConfig,
        shape: GenomeShape,
        base_seed: u64,
    ) -> Result<Self, DeviceError> {
        let simulation = SimulationConfig {
            num_worlds: population_size,
            ..simulation.clone()
        };
        Ok(Self {
            sim: Simulator::new(&simulation, task, shape)?,
            task: task.clone(),
            trial_seed: base_seed,
        })
    }
}

impl FitnessEvaluator for BatchEvaluator {
    fn evaluate(&mut self, genomes: &[Genome]) -> Result<Vec<f32>, EvalError> {
        if genomes.len() != self.sim.num_worlds() {
            return Err(EvalError::PoolSize {
                expected: self.sim.num_worlds(),
                found: genomes.len(),
            });
        }

        let mut scores = vec![0.0f32; genomes.len()];
        run_trial_set(
            &mut self.sim,
            &self.task,
            |sim| {
                for (world, genome) in genomes.iter().enumerate() {
                    sim.set_ann_parameters(world, genome)?;
                }
                Ok(())
            },
            &mut self.trial_seed,
            &mut scores,
        )?;
        normalize_scores(&mut scores, &self.task, self.sim.robots_per_world());
        Ok(scores)
    }
}

/// Convenience used by headless smoke runs: score one randomized genome
/// on a fresh simulator.
pub fn randomized_genome(shape: GenomeShape, seed: u64) -> Genome {
    use rand::SeedableRng;
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    Genome::randomize_with_rng(shape, GenomeBounds::default(), &mut rng)
}
