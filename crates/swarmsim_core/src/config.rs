//! Configuration management for the simulator and the optimizer.
//!
//! All tunable parameters live in an explicit, immutable configuration
//! object passed in at construction; nothing reads ambient global state.
//! The structure maps to `config.toml`:
//!
//! ```toml
//! [simulation]
//! num_worlds = 1
//! num_robots = 30
//! time_step = 0.033333335
//! dynamics_iterations = 4
//!
//! [task]
//! target_distances = [1.2, 1.5, 1.9, 2.3, 2.7]
//! trial_repetitions = 3
//! episode_seconds = 600.0
//!
//! [pso]
//! population_size = 16
//! inertia = 0.9
//! ```

use serde::{Deserialize, Serialize};

/// World/device construction parameters. These are baked into the compiled
/// device program; changing any of them requires rebuilding the Simulator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SimulationConfig {
    pub num_worlds: usize,
    pub num_robots: usize,
    pub time_step: f32,
    pub dynamics_iterations: u32,
    /// Master seed for world random streams; `None` draws one at startup.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_worlds: 1,
            num_robots: 30,
            time_step: 1.0 / 30.0,
            dynamics_iterations: 4,
            seed: None,
        }
    }
}

/// Parameters of the foraging task embedded in the device program.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskConfig {
    /// Target-pad separation distances, one trial set per entry.
    pub target_distances: Vec<f32>,
    /// Independent trials (distinct seeds) per distance.
    pub trial_repetitions: usize,
    /// Simulated duration of one episode.
    pub episode_seconds: f32,
    /// Simulated time before the reward window opens.
    pub reward_window_delay: f32,
    /// Seconds a robot needs to travel one metre at full speed.
    pub seconds_per_metre: f32,
    pub pad_radius: f32,
    pub arena_height: f32,
    pub arena_width_min: f32,
    pub arena_width_max: f32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            target_distances: vec![1.2, 1.5, 1.9, 2.3, 2.7],
            trial_repetitions: 3,
            episode_seconds: 600.0,
            reward_window_delay: 300.0,
            seconds_per_metre: 2.733_333,
            pad_radius: 0.27,
            arena_height: 4.20,
            arena_width_min: 4.20,
            arena_width_max: 4.90,
        }
    }
}

impl TaskConfig {
    /// Maximum pad-to-pad trips a robot can complete in one episode at the
    /// given separation distance; the per-trial normalization bound.
    #[must_use]
    pub fn max_trips(&self, target_distance: f32) -> f32 {
        (self.episode_seconds / self.seconds_per_metre) / target_distance
    }
}

/// How particle velocities are seeded at the start of a run.
///
/// The reference design randomizes velocities over the full parameter
/// range rather than zero-initializing them; that behavior is preserved
/// as the default and exposed as a policy rather than silently changed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocitySeed {
    #[default]
    Randomized,
    Zero,
}

/// Canonical PSO coefficients and population sizing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PsoConfig {
    pub population_size: usize,
    /// Inertia weight applied to the previous velocity.
    pub inertia: f32,
    /// Cognitive coefficient (attraction to the personal best).
    pub cognitive: f32,
    /// Social coefficient (attraction to the global best).
    pub social: f32,
    pub velocity_seed: VelocitySeed,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            population_size: 16,
            inertia: 0.9,
            cognitive: 2.0,
            social: 2.0,
            velocity_seed: VelocitySeed::Randomized,
        }
    }
}

/// Evaluation-worker pool parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkerConfig {
    /// Wall-clock budget for one worker's reply before the generation is
    /// reported failed.
    pub reply_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 900,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub task: TaskConfig,
    pub pso: PsoConfig,
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Validates all configuration parameters, returning the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.simulation.num_worlds > 0,
            "Number of worlds must be positive"
        );
        anyhow::ensure!(
            self.simulation.num_robots > 0,
            "Robots per world must be positive"
        );
        anyhow::ensure!(
            self.simulation.time_step > 0.0,
            "Time step must be positive"
        );
        anyhow::ensure!(
            self.simulation.dynamics_iterations > 0,
            "Dynamics iterations must be positive"
        );

        anyhow::ensure!(
            !self.task.target_distances.is_empty(),
            "At least one target distance is required"
        );
        for &d in &self.task.target_distances {
            anyhow::ensure!(
                d > 2.0 * self.task.pad_radius,
                "Target distance {} must exceed the pad diameter",
                d
            );
        }
        anyhow::ensure!(
            self.task.trial_repetitions > 0,
            "Trial repetitions must be positive"
        );
        anyhow::ensure!(
            self.task.episode_seconds > 0.0,
            "Episode duration must be positive"
        );
        anyhow::ensure!(
            self.task.reward_window_delay >= 0.0,
            "Reward window delay must be non-negative"
        );
        anyhow::ensure!(
            self.task.reward_window_delay < self.task.episode_seconds,
            "Reward window delay must leave time to score"
        );
        anyhow::ensure!(
            self.task.seconds_per_metre > 0.0,
            "Seconds-per-metre must be positive"
        );
        anyhow::ensure!(self.task.pad_radius > 0.0, "Pad radius must be positive");
        anyhow::ensure!(
            self.task.arena_height > 0.0,
            "Arena height must be positive"
        );
        anyhow::ensure!(
            self.task.arena_width_min > 0.0
                && self.task.arena_width_max >= self.task.arena_width_min,
            "Arena width range must be positive and ordered"
        );

        anyhow::ensure!(
            self.pso.population_size >= 2,
            "Population size must be at least 2"
        );
        anyhow::ensure!(self.pso.inertia >= 0.0, "Inertia must be non-negative");
        anyhow::ensure!(
            self.pso.cognitive >= 0.0,
            "Cognitive coefficient must be non-negative"
        );
        anyhow::ensure!(
            self.pso.social >= 0.0,
            "Social coefficient must be non-negative"
        );

        anyhow::ensure!(
            self.worker.reply_timeout_secs > 0,
            "Worker reply timeout must be positive"
        );

        Ok(())
    }

    /// Loads and validates configuration from TOML content.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.simulation).as_bytes());
        hasher.update(format!("{:?}", self.task).as_bytes());
        hasher.update(format!("{:?}", self.pso).as_bytes());
        hasher.update(format!("{:?}", self.worker).as_bytes());
        hex::encode(hasher.finalize())
    }
}
