//! Generation history: one JSON record per generation, appended to a
//! per-run log file so long optimizations can be inspected and resumed
//! from their best controller.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use swarmsim_core::pso::GenerationSummary;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerationRecord {
    pub generation: u64,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub improved: bool,
    pub timestamp: String,
    /// Hex wire form of the global best; present when it was replaced
    /// this generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_genome: Option<String>,
}

impl GenerationRecord {
    #[must_use]
    pub fn from_summary(summary: &GenerationSummary, best_genome: Option<String>) -> Self {
        Self {
            generation: summary.generation,
            best_fitness: summary.best_fitness,
            mean_fitness: summary.mean_fitness,
            improved: summary.improved,
            timestamp: Utc::now().to_rfc3339(),
            best_genome,
        }
    }
}

/// Appending writer for one run's generation log.
pub struct RunLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Creates `<dir>/run-<timestamp>.jsonl`, creating the directory if
    /// needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        create_dir_all(dir.as_ref())?;
        let path = dir
            .as_ref()
            .join(format!("run-{}.jsonl", Utc::now().format("%Y%m%d-%H%M%S")));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { writer, path })
    }

    pub fn log(&mut self, record: &GenerationRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
