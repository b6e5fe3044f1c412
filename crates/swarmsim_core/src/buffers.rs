//! Host-side parameter mirror for all worlds.
//!
//! Each genome field is flattened into one world-major array: world `w`
//! owns `[w * stride, (w + 1) * stride)` where `stride` is the per-world
//! field length. Staging a genome touches only that world's slices; the
//! whole mirror is pushed to the device in one `commit`.

use swarmsim_data::{Genome, GenomeShape};

use crate::device::DeviceError;

/// Flattened per-field views over one world's slice of the mirror.
pub struct WorldParams<'a> {
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub weights_hidden: &'a [f32],
    pub bias_hidden: &'a [f32],
    pub timec_hidden: &'a [f32],
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParameterBuffers {
    num_worlds: usize,
    shape: GenomeShape,
    weights: Vec<f32>,
    bias: Vec<f32>,
    weights_hidden: Vec<f32>,
    bias_hidden: Vec<f32>,
    timec_hidden: Vec<f32>,
}

impl ParameterBuffers {
    #[must_use]
    pub fn zeroed(num_worlds: usize, shape: GenomeShape) -> Self {
        Self {
            num_worlds,
            shape,
            weights: vec![0.0; num_worlds * shape.weights_len()],
            bias: vec![0.0; num_worlds * shape.bias_len()],
            weights_hidden: vec![0.0; num_worlds * shape.weights_hidden_len()],
            bias_hidden: vec![0.0; num_worlds * shape.bias_hidden_len()],
            timec_hidden: vec![0.0; num_worlds * shape.timec_hidden_len()],
        }
    }

    #[must_use]
    pub fn num_worlds(&self) -> usize {
        self.num_worlds
    }

    #[must_use]
    pub fn shape(&self) -> GenomeShape {
        self.shape
    }

    /// Writes one genome into world `world`'s slices, leaving every other
    /// world's parameters untouched.
    pub fn stage(&mut self, world: usize, genome: &Genome) -> Result<(), DeviceError> {
        if world >= self.num_worlds {
            return Err(DeviceError::WorldIndexOutOfRange {
                world,
                num_worlds: self.num_worlds,
            });
        }
        if genome.shape != self.shape {
            return Err(DeviceError::ShapeMismatch {
                expected: self.shape,
                found: genome.shape,
            });
        }
        if let Err(swarmsim_data::GenomeError::FieldLength {
            field,
            expected,
            found,
        }) = genome.validate()
        {
            return Err(DeviceError::BufferMismatch {
                field,
                expected,
                found,
            });
        }

        copy_slice(&mut self.weights, world, &genome.weights);
        copy_slice(&mut self.bias, world, &genome.bias);
        copy_slice(&mut self.weights_hidden, world, &genome.weights_hidden);
        copy_slice(&mut self.bias_hidden, world, &genome.bias_hidden);
        copy_slice(&mut self.timec_hidden, world, &genome.timec_hidden);
        Ok(())
    }

    /// Borrowed per-field views over world `world`'s slice.
    #[must_use]
    pub fn world_params(&self, world: usize) -> WorldParams<'_> {
        WorldParams {
            weights: world_slice(&self.weights, world, self.shape.weights_len()),
            bias: world_slice(&self.bias, world, self.shape.bias_len()),
            weights_hidden: world_slice(
                &self.weights_hidden,
                world,
                self.shape.weights_hidden_len(),
            ),
            bias_hidden: world_slice(&self.bias_hidden, world, self.shape.bias_hidden_len()),
            timec_hidden: world_slice(&self.timec_hidden, world, self.shape.timec_hidden_len()),
        }
    }

    /// Validates the mirror against a program compiled for `num_worlds`
    /// worlds of `shape`; used by the device side before installation.
    pub fn check_layout(&self, num_worlds: usize, shape: GenomeShape) -> Result<(), DeviceError> {
        if self.shape != shape {
            return Err(DeviceError::ShapeMismatch {
                expected: shape,
                found: self.shape,
            });
        }
        let checks: [(&'static str, usize, usize); 5] = [
            (
                "weights",
                num_worlds * shape.weights_len(),
                self.weights.len(),
            ),
            ("bias", num_worlds * shape.bias_len(), self.bias.len()),
            (
                "weights_hidden",
                num_worlds * shape.weights_hidden_len(),
                self.weights_hidden.len(),
            ),
            (
                "bias_hidden",
                num_worlds * shape.bias_hidden_len(),
                self.bias_hidden.len(),
            ),
            (
                "timec_hidden",
                num_worlds * shape.timec_hidden_len(),
                self.timec_hidden.len(),
            ),
        ];
        for (field, expected, found) in checks {
            if expected != found {
                return Err(DeviceError::BufferMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

fn copy_slice(buffer: &mut [f32], world: usize, values: &[f32]) {
    let stride = values.len();
    buffer[world * stride..(world + 1) * stride].copy_from_slice(values);
}

fn world_slice(buffer: &[f32], world: usize, stride: usize) -> &[f32] {
    &buffer[world * stride..(world + 1) * stride]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GenomeLogic;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use swarmsim_data::GenomeBounds;

    #[test]
    fn test_stage_touches_only_own_world() {
        let shape = GenomeShape::reference();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let g = Genome::randomize_with_rng(shape, GenomeBounds::default(), &mut rng);

        let mut buffers = ParameterBuffers::zeroed(3, shape);
        buffers.stage(1, &g).unwrap();

        assert!(buffers.world_params(0).weights.iter().all(|&v| v == 0.0));
        assert!(buffers.world_params(2).weights.iter().all(|&v| v == 0.0));
        assert_eq!(buffers.world_params(1).weights, g.weights.as_slice());
        assert_eq!(buffers.world_params(1).timec_hidden, g.timec_hidden.as_slice());
    }

    #[test]
    fn test_stage_rejects_out_of_range_world() {
        let shape = GenomeShape::reference();
        let mut buffers = ParameterBuffers::zeroed(2, shape);
        let g = Genome::zeroed(shape);
        assert!(matches!(
            buffers.stage(2, &g),
            Err(DeviceError::WorldIndexOutOfRange { world: 2, .. })
        ));
    }

    #[test]
    fn test_stage_rejects_foreign_shape() {
        let mut buffers = ParameterBuffers::zeroed(1, GenomeShape::reference());
        let g = Genome::zeroed(GenomeShape {
            sensors: 4,
            hidden: 1,
            actuators: 2,
        });
        assert!(matches!(
            buffers.stage(0, &g),
            Err(DeviceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_check_layout_flags_world_count_mismatch() {
        let shape = GenomeShape::reference();
        let buffers = ParameterBuffers::zeroed(2, shape);
        assert!(buffers.check_layout(2, shape).is_ok());
        assert!(matches!(
            buffers.check_layout(3, shape),
            Err(DeviceError::BufferMismatch { .. })
        ));
    }
}
