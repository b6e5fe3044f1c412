//! Vector arithmetic over genomes with per-field boundary enforcement.
//!
//! Operations never mutate their operands; every result is a new genome
//! whose elements are clamped to the field's semantic range. An exact zero
//! always survives the clamp unchanged, so `sub(a, a)` is the true zero
//! genome.

use rand::Rng;
use swarmsim_data::{Bounds, Genome, GenomeBounds, GenomeError, GenomeShape};

/// Trait defining genome construction and arithmetic for the optimizer.
pub trait GenomeLogic: Sized {
    fn randomize_with_rng<R: Rng>(shape: GenomeShape, bounds: GenomeBounds, rng: &mut R) -> Self;

    /// Element-wise sum, clamped per field. Shapes must match.
    fn add(&self, other: &Self) -> Result<Self, GenomeError>;

    /// Element-wise difference, clamped per field. Shapes must match.
    fn sub(&self, other: &Self) -> Result<Self, GenomeError>;

    /// Element-wise scalar multiply, clamped per field.
    #[must_use]
    fn scale(&self, k: f32) -> Self;
}

fn zip_clamped(a: &[f32], b: &[f32], bounds: Bounds, op: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| bounds.clamp(op(x, y)))
        .collect()
}

fn map_clamped(a: &[f32], bounds: Bounds, op: impl Fn(f32) -> f32) -> Vec<f32> {
    a.iter().map(|&x| bounds.clamp(op(x))).collect()
}

fn fill_uniform<R: Rng>(len: usize, bounds: Bounds, rng: &mut R) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(bounds.lo..=bounds.hi)).collect()
}

fn elementwise(
    a: &Genome,
    b: &Genome,
    op: impl Fn(f32, f32) -> f32 + Copy,
) -> Result<Genome, GenomeError> {
    if !a.same_shape(b) {
        return Err(GenomeError::ShapeMismatch {
            expected: a.shape,
            found: b.shape,
        });
    }
    Ok(Genome {
        shape: a.shape,
        bounds: a.bounds,
        weights: zip_clamped(&a.weights, &b.weights, a.bounds.weights, op),
        bias: zip_clamped(&a.bias, &b.bias, a.bounds.bias, op),
        weights_hidden: zip_clamped(&a.weights_hidden, &b.weights_hidden, a.bounds.weights, op),
        bias_hidden: zip_clamped(&a.bias_hidden, &b.bias_hidden, a.bounds.bias, op),
        timec_hidden: zip_clamped(&a.timec_hidden, &b.timec_hidden, a.bounds.timec, op),
    })
}

impl GenomeLogic for Genome {
    fn randomize_with_rng<R: Rng>(shape: GenomeShape, bounds: GenomeBounds, rng: &mut R) -> Self {
        Self {
            shape,
            bounds,
            weights: fill_uniform(shape.weights_len(), bounds.weights, rng),
            bias: fill_uniform(shape.bias_len(), bounds.bias, rng),
            weights_hidden: fill_uniform(shape.weights_hidden_len(), bounds.weights, rng),
            bias_hidden: fill_uniform(shape.bias_hidden_len(), bounds.bias, rng),
            timec_hidden: fill_uniform(shape.timec_hidden_len(), bounds.timec, rng),
        }
    }

    fn add(&self, other: &Self) -> Result<Self, GenomeError> {
        elementwise(self, other, |x, y| x + y)
    }

    fn sub(&self, other: &Self) -> Result<Self, GenomeError> {
        elementwise(self, other, |x, y| x - y)
    }

    fn scale(&self, k: f32) -> Self {
        Genome {
            shape: self.shape,
            bounds: self.bounds,
            weights: map_clamped(&self.weights, self.bounds.weights, |x| x * k),
            bias: map_clamped(&self.bias, self.bounds.bias, |x| x * k),
            weights_hidden: map_clamped(&self.weights_hidden, self.bounds.weights, |x| x * k),
            bias_hidden: map_clamped(&self.bias_hidden, self.bounds.bias, |x| x * k),
            timec_hidden: map_clamped(&self.timec_hidden, self.bounds.timec, |x| x * k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_pair() -> (Genome, Genome) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let shape = GenomeShape::reference();
        let bounds = GenomeBounds::default();
        (
            Genome::randomize_with_rng(shape, bounds, &mut rng),
            Genome::randomize_with_rng(shape, bounds, &mut rng),
        )
    }

    fn assert_within(field: &[f32], bounds: Bounds) {
        for &v in field {
            assert!(v >= bounds.lo && v <= bounds.hi, "{} outside {:?}", v, bounds);
        }
    }

    #[test]
    fn test_add_is_closed_under_clamp() {
        let (a, b) = random_pair();
        let sum = a.add(&b).unwrap();
        assert_within(&sum.weights, sum.bounds.weights);
        assert_within(&sum.bias, sum.bounds.bias);
        assert_within(&sum.timec_hidden, sum.bounds.timec);
    }

    #[test]
    fn test_sub_self_is_exact_zero() {
        let (a, _) = random_pair();
        let zero = a.sub(&a).unwrap();
        assert!(zero.weights.iter().all(|&v| v == 0.0));
        assert!(zero.bias.iter().all(|&v| v == 0.0));
        assert!(zero.weights_hidden.iter().all(|&v| v == 0.0));
        assert!(zero.bias_hidden.iter().all(|&v| v == 0.0));
        assert!(zero.timec_hidden.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scale_clamps_to_field_range() {
        let (a, _) = random_pair();
        let scaled = a.scale(100.0);
        assert_within(&scaled.weights, scaled.bounds.weights);
        assert_within(&scaled.timec_hidden, scaled.bounds.timec);
    }

    #[test]
    fn test_operands_are_not_mutated() {
        let (a, b) = random_pair();
        let a_before = a.clone();
        let _ = a.add(&b).unwrap();
        let _ = a.scale(3.0);
        assert_eq!(a, a_before);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let (a, _) = random_pair();
        let narrow = Genome::zeroed(GenomeShape {
            sensors: 2,
            hidden: 1,
            actuators: 2,
        });
        assert!(matches!(
            a.add(&narrow),
            Err(GenomeError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            a.sub(&narrow),
            Err(GenomeError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_randomize_respects_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let g = Genome::randomize_with_rng(
            GenomeShape::reference(),
            GenomeBounds::default(),
            &mut rng,
        );
        assert_within(&g.weights, g.bounds.weights);
        assert_within(&g.bias_hidden, g.bounds.bias);
        assert_within(&g.timec_hidden, g.bounds.timec);
    }
}
