//! # Swarmsim Data
//!
//! Plain data types shared between the simulation engine and the optimizer:
//! the neural controller genome, its fixed shape and per-field boundaries,
//! and the compile-time neuron layout tables.
//!
//! This crate contains no simulation or optimization logic; the arithmetic
//! over these types lives in `swarmsim_core`.

pub mod data;

pub use data::genome::{Bounds, Genome, GenomeBounds, GenomeError, GenomeShape};
pub use data::layout::{
    Actuator, Hidden, Sensor, ACTUATOR_LABELS, HIDDEN_LABELS, NUM_ACTUATORS, NUM_HIDDEN,
    NUM_SENSORS, SENSOR_LABELS,
};
