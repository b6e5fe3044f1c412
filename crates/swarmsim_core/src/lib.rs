//! # Swarmsim Core
//!
//! The simulation and optimization engine for swarmsim: evolving neural
//! controllers for a swarm of simulated robots by coupling a parallel
//! multi-world simulator with a distributed Particle Swarm Optimizer.
//!
//! This crate contains:
//! - Genome arithmetic with per-field boundary enforcement
//! - The device-program seam and the rayon-parallel CPU reference kernel
//! - The `Simulator`: N independent worlds advanced in lockstep
//! - The PSO optimizer with full-barrier generations
//! - Evaluation workers (persistent thread per particle) and the batched
//!   multi-world evaluator
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use swarmsim_core::config::PsoConfig;
//! use swarmsim_core::evaluator::FnEvaluator;
//! use swarmsim_core::pso::Optimizer;
//! use swarmsim_data::{Actuator, Genome, GenomeBounds, GenomeShape};
//!
//! let mut optimizer = Optimizer::new(
//!     PsoConfig { population_size: 4, ..PsoConfig::default() },
//!     GenomeShape::reference(),
//!     GenomeBounds::default(),
//!     42,
//! );
//! // Toy objective: drive one bias toward zero.
//! let mut evaluator = FnEvaluator(|g: &Genome| -g.actuator_bias(Actuator::Wheels0).abs());
//! let summary = optimizer.step_generation(&mut evaluator).unwrap();
//! assert_eq!(summary.generation, 1);
//! ```

/// Host parameter mirror with world-major layout
pub mod buffers;
/// Configuration management for simulator, task, optimizer and workers
pub mod config;
/// The compute-program seam: entry points, build constants, errors
pub mod device;
/// Fitness evaluation trait, trial protocol, batched evaluator
pub mod evaluator;
/// Genome arithmetic with per-field boundary enforcement
pub mod genome;
/// Rayon-parallel CPU reference kernel
pub mod kernel;
/// Optimization metrics and logging setup
pub mod metrics;
/// Particle Swarm Optimization over genome space
pub mod pso;
/// The multi-world simulation engine
pub mod simulator;
/// Persistent per-particle evaluation workers
pub mod worker;

pub use buffers::ParameterBuffers;
pub use config::AppConfig;
pub use device::{DeviceError, DeviceProgram, ProgramSpec, RobotTransform};
pub use evaluator::{BatchEvaluator, EvalError, FitnessEvaluator, FnEvaluator};
pub use genome::GenomeLogic;
pub use metrics::{init_logging, OptimizerMetrics};
pub use pso::{GenerationSummary, Optimizer, Particle, ParticleBest};
pub use simulator::{SimulationState, Simulator};
pub use worker::WorkerPool;
