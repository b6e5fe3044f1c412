//! Particle Swarm Optimization over genome space.
//!
//! A particle is a (position, velocity) pair of genomes plus its tracked
//! fitness and personal best. Each generation runs a full barrier:
//! evaluate every particle, update personal bests (strict improvement
//! only), replace the global best if strictly exceeded, then move the
//! swarm. There is no built-in stop criterion; the loop runs until an
//! injected predicate says otherwise.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::config::{PsoConfig, VelocitySeed};
use crate::evaluator::FitnessEvaluator;
use crate::genome::GenomeLogic;
use crate::metrics::OptimizerMetrics;
use swarmsim_data::{Genome, GenomeBounds, GenomeShape};

/// Snapshot of a position at the best fitness seen.
#[derive(Clone, Debug)]
pub struct ParticleBest {
    pub position: Genome,
    pub fitness: f32,
}

/// One candidate solution. The id is an opaque comparison key; particles
/// expose no other identity.
#[derive(Clone, Debug)]
pub struct Particle {
    id: Uuid,
    pub position: Genome,
    pub velocity: Genome,
    pub fitness: f32,
    pub best: Option<ParticleBest>,
}

impl Particle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Outcome of one full generation cycle.
#[derive(Clone, Copy, Debug)]
pub struct GenerationSummary {
    pub generation: u64,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    /// Whether the global best was replaced this generation.
    pub improved: bool,
}

pub struct Optimizer {
    config: PsoConfig,
    particles: Vec<Particle>,
    global_best: Option<ParticleBest>,
    rng: ChaCha8Rng,
    generation: u64,
    metrics: OptimizerMetrics,
}

impl Optimizer {
    /// Creates the swarm: every particle gets an independently randomized
    /// position and a velocity seeded per the configured policy.
    #[must_use]
    pub fn new(config: PsoConfig, shape: GenomeShape, bounds: GenomeBounds, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let particles = (0..config.population_size)
            .map(|_| {
                let position = Genome::randomize_with_rng(shape, bounds, &mut rng);
                let velocity = match config.velocity_seed {
                    VelocitySeed::Randomized => {
                        Genome::randomize_with_rng(shape, bounds, &mut rng)
                    }
                    VelocitySeed::Zero => Genome::zeroed_with_bounds(shape, bounds),
                };
                Particle {
                    id: Uuid::new_v4(),
                    position,
                    velocity,
                    fitness: 0.0,
                    best: None,
                }
            })
            .collect();

        Self {
            config,
            particles,
            global_best: None,
            rng,
            generation: 0,
            metrics: OptimizerMetrics::new(),
        }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn global_best(&self) -> Option<&ParticleBest> {
        self.global_best.as_ref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn metrics(&self) -> &OptimizerMetrics {
        &self.metrics
    }

    /// Scores every particle's current position. Blocks until the whole
    /// generation is back; a failed evaluation fails the generation.
    pub fn evaluate_generation(&mut self, evaluator: &mut dyn FitnessEvaluator) -> Result<()> {
        let positions: Vec<Genome> = self
            .particles
            .iter()
            .map(|p| p.position.clone())
            .collect();
        let scores = evaluator
            .evaluate(&positions)
            .context("generation evaluation failed")?;
        anyhow::ensure!(
            scores.len() == self.particles.len(),
            "evaluator returned {} scores for {} particles",
            scores.len(),
            self.particles.len()
        );
        for (particle, score) in self.particles.iter_mut().zip(scores) {
            particle.fitness = score;
        }
        self.metrics
            .record_evaluations(self.particles.len() as u64);
        Ok(())
    }

    /// Strict-improvement personal-best update; ties do not churn.
    pub fn update_personal_bests(&mut self) {
        for particle in &mut self.particles {
            let improved = match &particle.best {
                None => true,
                Some(best) => particle.fitness > best.fitness,
            };
            if improved {
                particle.best = Some(ParticleBest {
                    position: particle.position.clone(),
                    fitness: particle.fitness,
                });
            }
        }
    }

    /// Replaces the global best with the strictly best personal best, if
    /// any strictly exceeds it. Returns whether a replacement happened.
    pub fn update_global_best(&mut self) -> bool {
        let mut improved = false;
        for particle in &self.particles {
            let Some(best) = &particle.best else { continue };
            let exceeds = match &self.global_best {
                None => true,
                Some(global) => best.fitness > global.fitness,
            };
            if exceeds {
                self.global_best = Some(best.clone());
                improved = true;
            }
        }
        improved
    }

    /// Canonical velocity/position update. Two uniform draws per particle
    /// per generation, shared across every genome field.
    pub fn update_positions(&mut self) -> Result<()> {
        let global = self
            .global_best
            .clone()
            .context("global best not yet established")?;
        let (w, alfa, beta) = (
            self.config.inertia,
            self.config.cognitive,
            self.config.social,
        );

        for particle in &mut self.particles {
            let best = particle
                .best
                .as_ref()
                .context("personal best not yet established")?;
            let r1: f32 = self.rng.gen();
            let r2: f32 = self.rng.gen();

            let cognitive = best.position.sub(&particle.position)?.scale(alfa * r1);
            let social = global.position.sub(&particle.position)?.scale(beta * r2);
            let velocity = particle
                .velocity
                .scale(w)
                .add(&cognitive)?
                .add(&social)?;

            particle.position = particle.position.add(&velocity)?;
            particle.velocity = velocity;
        }
        Ok(())
    }

    /// One full generation: evaluate, update bests, move the swarm.
    pub fn step_generation(
        &mut self,
        evaluator: &mut dyn FitnessEvaluator,
    ) -> Result<GenerationSummary> {
        self.evaluate_generation(evaluator)?;
        self.update_personal_bests();
        let improved = self.update_global_best();
        self.update_positions()?;
        self.generation += 1;

        let best_fitness = self
            .global_best
            .as_ref()
            .map(|b| b.fitness)
            .unwrap_or(f32::NEG_INFINITY);
        let mean_fitness =
            self.particles.iter().map(|p| p.fitness).sum::<f32>() / self.particles.len() as f32;

        let summary = GenerationSummary {
            generation: self.generation,
            best_fitness,
            mean_fitness,
            improved,
        };
        self.metrics.record_generation(&summary);
        Ok(summary)
    }

    /// Runs generations until `stop` returns true. Termination is an
    /// external decision; the swarm itself never converges on its own.
    pub fn run(
        &mut self,
        evaluator: &mut dyn FitnessEvaluator,
        mut stop: impl FnMut(&Optimizer) -> bool,
    ) -> Result<()> {
        loop {
            self.step_generation(evaluator)?;
            if stop(self) {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::FnEvaluator;
    use swarmsim_data::Actuator;

    fn optimizer(population: usize, seed: u64) -> Optimizer {
        Optimizer::new(
            PsoConfig {
                population_size: population,
                ..PsoConfig::default()
            },
            GenomeShape::reference(),
            GenomeBounds::default(),
            seed,
        )
    }

    #[test]
    fn test_velocities_randomized_by_default() {
        let opt = optimizer(4, 1);
        assert!(opt
            .particles()
            .iter()
            .any(|p| p.velocity.weights.iter().any(|&v| v != 0.0)));
    }

    #[test]
    fn test_zero_velocity_policy() {
        let opt = Optimizer::new(
            PsoConfig {
                population_size: 3,
                velocity_seed: VelocitySeed::Zero,
                ..PsoConfig::default()
            },
            GenomeShape::reference(),
            GenomeBounds::default(),
            1,
        );
        assert!(opt
            .particles()
            .iter()
            .all(|p| p.velocity.weights.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_tied_fitness_does_not_replace_personal_best() {
        let mut opt = optimizer(2, 2);
        let mut eval = FnEvaluator(|_: &Genome| 1.0);
        opt.evaluate_generation(&mut eval).unwrap();
        opt.update_personal_bests();
        let first: Vec<Genome> = opt
            .particles()
            .iter()
            .map(|p| p.best.as_ref().unwrap().position.clone())
            .collect();

        // Move positions, then re-evaluate at the same fitness: ties must
        // keep the original snapshot.
        opt.update_global_best();
        opt.update_positions().unwrap();
        opt.evaluate_generation(&mut eval).unwrap();
        opt.update_personal_bests();
        for (particle, original) in opt.particles().iter().zip(first) {
            assert_eq!(particle.best.as_ref().unwrap().position, original);
        }
    }

    #[test]
    fn test_global_best_dominates_personal_bests() {
        let mut opt = optimizer(5, 3);
        let mut eval = FnEvaluator(|g: &Genome| -g.actuator_bias(Actuator::Wheels0).abs());
        for _ in 0..5 {
            opt.step_generation(&mut eval).unwrap();
            let global = opt.global_best().unwrap().fitness;
            for particle in opt.particles() {
                assert!(global >= particle.best.as_ref().unwrap().fitness);
            }
        }
    }

    #[test]
    fn test_update_positions_without_bests_is_an_error() {
        let mut opt = optimizer(2, 4);
        assert!(opt.update_positions().is_err());
    }
}
