//! Persistent evaluation workers: one isolated thread per particle.
//!
//! Each worker owns its own single-world Simulator for the lifetime of the
//! optimization run, so device setup cost is paid once. Workers share no
//! mutable state with each other or with the optimizer; the only
//! interaction is a dedicated command/reply channel pair per worker. A
//! genome crosses the boundary in its exported hex form and a single
//! scalar comes back.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::{SimulationConfig, TaskConfig, WorkerConfig};
use crate::evaluator::{normalize_scores, run_trial_set, EvalError, FitnessEvaluator};
use crate::kernel::stream_seed;
use crate::simulator::Simulator;
use swarmsim_data::{Genome, GenomeShape};

enum WorkerRequest {
    /// Evaluate one genome (hex wire form) over the full trial set.
    Evaluate { genome_hex: String },
    /// Shut the worker down.
    Stop,
}

struct WorkerHandle {
    request_tx: Sender<WorkerRequest>,
    reply_rx: Receiver<f32>,
    thread: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    handles: Vec<WorkerHandle>,
    reply_timeout: Duration,
}

impl WorkerPool {
    /// Spawns one worker per particle. Every worker's Simulator is built
    /// up front so an unavailable device fails the whole pool immediately.
    pub fn spawn(
        population_size: usize,
        simulation: &SimulationConfig,
        task: &TaskConfig,
        worker: &WorkerConfig,
        shape: GenomeShape,
        base_seed: u64,
    ) -> Result<Self, EvalError> {
        let single_world = SimulationConfig {
            num_worlds: 1,
            ..simulation.clone()
        };

        let mut handles = Vec::with_capacity(population_size);
        for index in 0..population_size {
            let sim = Simulator::new(&single_world, task, shape)?;
            let task = task.clone();
            let (request_tx, request_rx) = mpsc::channel();
            let (reply_tx, reply_rx) = mpsc::channel();
            let trial_seed = stream_seed(base_seed, index as u64);

            let thread = thread::spawn(move || {
                worker_loop(index, sim, task, trial_seed, &request_rx, &reply_tx);
            });
            handles.push(WorkerHandle {
                request_tx,
                reply_rx,
                thread: Some(thread),
            });
        }

        tracing::info!(workers = population_size, "evaluation worker pool ready");
        Ok(Self {
            handles,
            reply_timeout: Duration::from_secs(worker.reply_timeout_secs),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stops every worker and joins its thread. Evaluations after this
    /// report `WorkerLost`.
    pub fn shutdown(&mut self) {
        for handle in &self.handles {
            let _ = handle.request_tx.send(WorkerRequest::Stop);
        }
        for handle in &mut self.handles {
            if let Some(thread) = handle.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl FitnessEvaluator for WorkerPool {
    /// Sends every genome out, then performs one blocking receive per
    /// worker: a full-barrier synchronization. Fitness is attributed by
    /// channel identity, never by arrival order.
    fn evaluate(&mut self, genomes: &[Genome]) -> Result<Vec<f32>, EvalError> {
        if genomes.len() != self.handles.len() {
            return Err(EvalError::PoolSize {
                expected: self.handles.len(),
                found: genomes.len(),
            });
        }

        for (worker, (handle, genome)) in self.handles.iter().zip(genomes.iter()).enumerate() {
            handle
                .request_tx
                .send(WorkerRequest::Evaluate {
                    genome_hex: genome.to_hex(),
                })
                .map_err(|_| EvalError::WorkerLost { worker })?;
        }

        let mut scores = Vec::with_capacity(self.handles.len());
        for (worker, handle) in self.handles.iter().enumerate() {
            let fitness = handle
                .reply_rx
                .recv_timeout(self.reply_timeout)
                .map_err(|err| match err {
                    RecvTimeoutError::Timeout => EvalError::WorkerUnresponsive { worker },
                    RecvTimeoutError::Disconnected => EvalError::WorkerLost { worker },
                })?;
            scores.push(fitness);
        }
        Ok(scores)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    index: usize,
    mut sim: Simulator,
    task: TaskConfig,
    mut trial_seed: u64,
    request_rx: &Receiver<WorkerRequest>,
    reply_tx: &Sender<f32>,
) {
    while let Ok(request) = request_rx.recv() {
        let genome_hex = match request {
            WorkerRequest::Stop => break,
            WorkerRequest::Evaluate { genome_hex } => genome_hex,
        };

        let genome = match Genome::from_hex(&genome_hex) {
            Ok(genome) => genome,
            Err(err) => {
                tracing::error!(worker = index, error = %err, "undecodable genome, worker exiting");
                break;
            }
        };

        let mut score = [0.0f32];
        let outcome = run_trial_set(
            &mut sim,
            &task,
            |sim| sim.set_ann_parameters(0, &genome),
            &mut trial_seed,
            &mut score,
        );
        if let Err(err) = outcome {
            tracing::error!(worker = index, error = %err, "trial set failed, worker exiting");
            break;
        }
        normalize_scores(&mut score, &task, sim.robots_per_world());

        if reply_tx.send(score[0]).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::randomized_genome;

    fn tiny_configs() -> (SimulationConfig, TaskConfig, WorkerConfig) {
        (
            SimulationConfig {
                num_worlds: 1,
                num_robots: 2,
                ..SimulationConfig::default()
            },
            TaskConfig {
                target_distances: vec![1.2],
                trial_repetitions: 1,
                episode_seconds: 2.0,
                reward_window_delay: 0.0,
                ..TaskConfig::default()
            },
            WorkerConfig {
                reply_timeout_secs: 60,
            },
        )
    }

    #[test]
    fn test_pool_size_mismatch_is_rejected() {
        let (sim, task, worker) = tiny_configs();
        let mut pool =
            WorkerPool::spawn(2, &sim, &task, &worker, GenomeShape::reference(), 1).unwrap();
        let genomes = vec![Genome::zeroed(GenomeShape::reference())];
        assert!(matches!(
            pool.evaluate(&genomes),
            Err(EvalError::PoolSize {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_evaluation_returns_one_score_per_worker() {
        let (sim, task, worker) = tiny_configs();
        let mut pool =
            WorkerPool::spawn(3, &sim, &task, &worker, GenomeShape::reference(), 7).unwrap();
        let genomes = vec![
            Genome::zeroed(GenomeShape::reference()),
            randomized_genome(GenomeShape::reference(), 10),
            randomized_genome(GenomeShape::reference(), 11),
        ];
        let scores = pool.evaluate(&genomes).unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_stopped_pool_reports_worker_lost() {
        let (sim, task, worker) = tiny_configs();
        let mut pool =
            WorkerPool::spawn(1, &sim, &task, &worker, GenomeShape::reference(), 3).unwrap();
        pool.shutdown();
        let genomes = vec![Genome::zeroed(GenomeShape::reference())];
        assert!(matches!(
            pool.evaluate(&genomes),
            Err(EvalError::WorkerLost { worker: 0 })
        ));
    }
}
