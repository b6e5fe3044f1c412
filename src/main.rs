use anyhow::Result;
use clap::Parser;

use swarmsim_core::config::AppConfig;
use swarmsim_core::evaluator::{randomized_genome, BatchEvaluator, FitnessEvaluator};
use swarmsim_core::pso::Optimizer;
use swarmsim_core::simulator::Simulator;
use swarmsim_core::worker::WorkerPool;
use swarmsim_core::init_logging;
use swarmsim_data::{GenomeBounds, GenomeShape};
use swarmsim_lib::app::history::{GenerationRecord, RunLogger};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mode to run in
    #[arg(short, long, value_enum, default_value = "optimize")]
    mode: Mode,

    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Stop after this many generations (runs until interrupted otherwise)
    #[arg(short, long)]
    generations: Option<u64>,

    /// Master seed override
    #[arg(short, long)]
    seed: Option<u64>,

    /// Evaluate with one batched multi-world simulator instead of the
    /// per-particle worker pool
    #[arg(long)]
    batch: bool,

    /// Directory for generation history logs
    #[arg(long, default_value = "runs")]
    log_dir: String,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Mode {
    Optimize,
    Simulate,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = load_config(&args.config)?;
    let seed = args
        .seed
        .or(config.simulation.seed)
        .unwrap_or_else(rand::random);

    match args.mode {
        Mode::Optimize => run_optimize(&config, seed, &args),
        Mode::Simulate => run_simulate(&config, seed),
    }
}

fn load_config(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => AppConfig::from_toml(&content),
        Err(_) => {
            tracing::warn!(path, "config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn run_optimize(config: &AppConfig, seed: u64, args: &Args) -> Result<()> {
    let shape = GenomeShape::reference();
    let population = config.pso.population_size;

    let mut evaluator: Box<dyn FitnessEvaluator> = if args.batch {
        Box::new(BatchEvaluator::new(
            population,
            &config.simulation,
            &config.task,
            shape,
            seed,
        )?)
    } else {
        Box::new(WorkerPool::spawn(
            population,
            &config.simulation,
            &config.task,
            &config.worker,
            shape,
            seed,
        )?)
    };

    let mut optimizer = Optimizer::new(config.pso.clone(), shape, GenomeBounds::default(), seed);
    let mut logger = RunLogger::create(&args.log_dir)?;
    tracing::info!(
        seed,
        population,
        fingerprint = %config.fingerprint(),
        log = %logger.path().display(),
        "optimization starting"
    );

    loop {
        if let Some(max) = args.generations {
            if optimizer.generation() >= max {
                break;
            }
        }
        let summary = optimizer.step_generation(evaluator.as_mut())?;
        let best_genome = if summary.improved {
            optimizer.global_best().map(|b| b.position.to_hex())
        } else {
            None
        };
        logger.log(&GenerationRecord::from_summary(&summary, best_genome))?;
    }

    if let Some(best) = optimizer.global_best() {
        tracing::info!(fitness = best.fitness, "best controller found");
        println!("{}", best.position.to_hex());
    }
    Ok(())
}

fn run_simulate(config: &AppConfig, seed: u64) -> Result<()> {
    let shape = GenomeShape::reference();
    let mut sim = Simulator::new(&config.simulation, &config.task, shape)?;

    let genome = randomized_genome(shape, seed);
    for world in 0..sim.num_worlds() {
        sim.set_ann_parameters(world, &genome)?;
    }
    sim.commit_ann_parameters()?;

    let target_distance = config.task.target_distances[0];
    sim.init_worlds(target_distance, seed);
    tracing::info!(
        worlds = sim.num_worlds(),
        robots = sim.robots_per_world(),
        target_distance,
        "headless episode starting"
    );
    sim.simulate(config.task.episode_seconds);

    for (world, fitness) in sim.get_fitness().iter().enumerate() {
        println!("world {world}: fitness {fitness:.4}");
    }
    Ok(())
}
