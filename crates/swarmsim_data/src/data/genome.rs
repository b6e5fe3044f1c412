//! The genome: one candidate neural controller as a fixed-shape numeric
//! record.
//!
//! Field layout mirrors the device parameter buffers: `weights` is
//! actuator-major over the concatenated sensor+hidden inputs,
//! `weights_hidden` is hidden-major over sensors. Shapes are fixed at
//! construction and never resized; every element carries a per-field
//! semantic boundary that arithmetic in `swarmsim_core` clamps against.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::{Actuator, Hidden, Sensor, NUM_ACTUATORS, NUM_HIDDEN, NUM_SENSORS};

/// Errors raised by genome construction and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenomeError {
    /// Arithmetic or upload between genomes of incompatible shape.
    #[error("genome shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: GenomeShape,
        found: GenomeShape,
    },

    /// A field's element count does not match the declared shape.
    #[error("genome field '{field}' has {found} elements, shape requires {expected}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Neuron counts that determine every field's element count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeShape {
    pub sensors: usize,
    pub hidden: usize,
    pub actuators: usize,
}

impl GenomeShape {
    /// The reference controller: 13 sensors, 3 hidden neurons, 4 actuators.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            sensors: NUM_SENSORS,
            hidden: NUM_HIDDEN,
            actuators: NUM_ACTUATORS,
        }
    }

    #[must_use]
    pub const fn weights_len(&self) -> usize {
        self.actuators * (self.sensors + self.hidden)
    }

    #[must_use]
    pub const fn bias_len(&self) -> usize {
        self.actuators
    }

    #[must_use]
    pub const fn weights_hidden_len(&self) -> usize {
        self.hidden * self.sensors
    }

    #[must_use]
    pub const fn bias_hidden_len(&self) -> usize {
        self.hidden
    }

    #[must_use]
    pub const fn timec_hidden_len(&self) -> usize {
        self.hidden
    }

    /// Column index of a sensor input in a `weights` row.
    #[must_use]
    pub const fn sensor_column(&self, sensor: usize) -> usize {
        sensor
    }

    /// Column index of a hidden-neuron input in a `weights` row.
    #[must_use]
    pub const fn hidden_column(&self, hidden: usize) -> usize {
        self.sensors + hidden
    }
}

impl Default for GenomeShape {
    fn default() -> Self {
        Self::reference()
    }
}

/// Inclusive clamp boundary for one genome field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lo: f32,
    pub hi: f32,
}

impl Bounds {
    #[must_use]
    pub const fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.lo, self.hi)
    }
}

/// Per-field semantic boundaries.
///
/// Weights and biases share the symmetric range; time constants are
/// confined to the unit interval so leaky integration stays stable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeBounds {
    pub weights: Bounds,
    pub bias: Bounds,
    pub timec: Bounds,
}

impl Default for GenomeBounds {
    fn default() -> Self {
        Self {
            weights: Bounds::new(-5.0, 5.0),
            bias: Bounds::new(-5.0, 5.0),
            timec: Bounds::new(0.0, 1.0),
        }
    }
}

/// One candidate controller: five named numeric fields plus their shape
/// and boundaries. Immutable under arithmetic; operations in
/// `swarmsim_core` always produce a new genome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub shape: GenomeShape,
    pub bounds: GenomeBounds,
    /// Actuator-major over sensor-then-hidden inputs.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    /// Hidden-major over sensors.
    pub weights_hidden: Vec<f32>,
    pub bias_hidden: Vec<f32>,
    pub timec_hidden: Vec<f32>,
}

impl Genome {
    /// All-zero genome with default boundaries.
    #[must_use]
    pub fn zeroed(shape: GenomeShape) -> Self {
        Self::zeroed_with_bounds(shape, GenomeBounds::default())
    }

    #[must_use]
    pub fn zeroed_with_bounds(shape: GenomeShape, bounds: GenomeBounds) -> Self {
        Self {
            shape,
            bounds,
            weights: vec![0.0; shape.weights_len()],
            bias: vec![0.0; shape.bias_len()],
            weights_hidden: vec![0.0; shape.weights_hidden_len()],
            bias_hidden: vec![0.0; shape.bias_hidden_len()],
            timec_hidden: vec![0.0; shape.timec_hidden_len()],
        }
    }

    #[must_use]
    pub fn same_shape(&self, other: &Genome) -> bool {
        self.shape == other.shape
    }

    /// Weight from a sensor input to an actuator (reference layout).
    #[must_use]
    pub fn weight_from_sensor(&self, actuator: Actuator, sensor: Sensor) -> f32 {
        let row = actuator.index() * (self.shape.sensors + self.shape.hidden);
        self.weights[row + self.shape.sensor_column(sensor.index())]
    }

    /// Weight from a hidden neuron to an actuator (reference layout).
    #[must_use]
    pub fn weight_from_hidden(&self, actuator: Actuator, hidden: Hidden) -> f32 {
        let row = actuator.index() * (self.shape.sensors + self.shape.hidden);
        self.weights[row + self.shape.hidden_column(hidden.index())]
    }

    #[must_use]
    pub fn actuator_bias(&self, actuator: Actuator) -> f32 {
        self.bias[actuator.index()]
    }

    #[must_use]
    pub fn hidden_bias(&self, hidden: Hidden) -> f32 {
        self.bias_hidden[hidden.index()]
    }

    #[must_use]
    pub fn time_constant(&self, hidden: Hidden) -> f32 {
        self.timec_hidden[hidden.index()]
    }

    /// Checks every field's element count against the declared shape.
    pub fn validate(&self) -> Result<(), GenomeError> {
        let checks: [(&'static str, usize, usize); 5] = [
            ("weights", self.shape.weights_len(), self.weights.len()),
            ("bias", self.shape.bias_len(), self.bias.len()),
            (
                "weights_hidden",
                self.shape.weights_hidden_len(),
                self.weights_hidden.len(),
            ),
            (
                "bias_hidden",
                self.shape.bias_hidden_len(),
                self.bias_hidden.len(),
            ),
            (
                "timec_hidden",
                self.shape.timec_hidden_len(),
                self.timec_hidden.len(),
            ),
        ];
        for (field, expected, found) in checks {
            if expected != found {
                return Err(GenomeError::FieldLength {
                    field,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Serializes the genome to a hex string for the worker wire format.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(bytes)
    }

    /// Deserializes a genome from its hex wire form, validating the shape.
    pub fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let genome: Genome = serde_json::from_slice(&bytes)?;
        genome.validate()?;
        Ok(genome)
    }
}
