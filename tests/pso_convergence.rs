use swarmsim_core::config::PsoConfig;
use swarmsim_core::evaluator::FnEvaluator;
use swarmsim_core::pso::Optimizer;
use swarmsim_data::{Actuator, Genome, GenomeBounds, GenomeShape};

fn optimizer(population: usize, seed: u64) -> Optimizer {
    Optimizer::new(
        PsoConfig {
            population_size: population,
            inertia: 0.9,
            cognitive: 2.0,
            social: 2.0,
            ..PsoConfig::default()
        },
        GenomeShape::reference(),
        GenomeBounds::default(),
        seed,
    )
}

/// Deterministic objective: negative distance of one wheel bias from a
/// target constant. Smooth, maximum 0 at bias = 1.7.
fn wheel_bias_objective(genome: &Genome) -> f32 {
    -(genome.actuator_bias(Actuator::Wheels0) - 1.7).abs()
}

#[test]
fn test_personal_bests_are_monotonic() {
    let mut opt = optimizer(6, 11);
    let mut eval = FnEvaluator(wheel_bias_objective);

    let mut previous: Vec<Option<f32>> = vec![None; 6];
    for _ in 0..15 {
        opt.step_generation(&mut eval).unwrap();
        for (slot, particle) in previous.iter_mut().zip(opt.particles()) {
            let best = particle.best.as_ref().unwrap().fitness;
            if let Some(last) = *slot {
                assert!(
                    best >= last,
                    "personal best regressed: {} -> {}",
                    last,
                    best
                );
            }
            *slot = Some(best);
        }
    }
}

#[test]
fn test_global_best_is_monotonic_and_dominates() {
    let mut opt = optimizer(6, 12);
    let mut eval = FnEvaluator(wheel_bias_objective);

    let mut last_global: Option<f32> = None;
    for _ in 0..15 {
        opt.step_generation(&mut eval).unwrap();
        let global = opt.global_best().unwrap().fitness;
        if let Some(last) = last_global {
            assert!(global >= last, "global best regressed");
        }
        for particle in opt.particles() {
            assert!(global >= particle.best.as_ref().unwrap().fitness);
        }
        last_global = Some(global);
    }
}

#[test]
fn test_swarm_improves_within_twenty_generations() {
    let mut opt = optimizer(4, 13);
    let mut eval = FnEvaluator(wheel_bias_objective);

    let first = opt.step_generation(&mut eval).unwrap();
    let baseline = first.best_fitness;

    let mut improved = false;
    for _ in 0..19 {
        let summary = opt.step_generation(&mut eval).unwrap();
        if summary.best_fitness > baseline {
            improved = true;
            break;
        }
    }
    assert!(
        improved,
        "global best never strictly improved past {}",
        baseline
    );
}

#[test]
fn test_improved_flag_tracks_global_best_changes() {
    let mut opt = optimizer(4, 14);
    let mut eval = FnEvaluator(wheel_bias_objective);

    // The very first generation always establishes a global best.
    let first = opt.step_generation(&mut eval).unwrap();
    assert!(first.improved);

    let mut last_best = first.best_fitness;
    for _ in 0..10 {
        let summary = opt.step_generation(&mut eval).unwrap();
        if summary.improved {
            assert!(summary.best_fitness > last_best);
        } else {
            assert_eq!(summary.best_fitness, last_best);
        }
        last_best = summary.best_fitness;
    }
}
