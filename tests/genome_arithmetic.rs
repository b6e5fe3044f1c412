use swarmsim_core::genome::GenomeLogic;
use swarmsim_data::{Bounds, Genome, GenomeBounds, GenomeError, GenomeShape, Hidden};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn random_genome(seed: u64) -> Genome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Genome::randomize_with_rng(GenomeShape::reference(), GenomeBounds::default(), &mut rng)
}

fn assert_field_within(field: &[f32], bounds: Bounds) {
    for &v in field {
        assert!(
            v >= bounds.lo && v <= bounds.hi,
            "{} escaped [{}, {}]",
            v,
            bounds.lo,
            bounds.hi
        );
    }
}

fn assert_closed(g: &Genome) {
    assert_field_within(&g.weights, g.bounds.weights);
    assert_field_within(&g.bias, g.bounds.bias);
    assert_field_within(&g.weights_hidden, g.bounds.weights);
    assert_field_within(&g.bias_hidden, g.bounds.bias);
    assert_field_within(&g.timec_hidden, g.bounds.timec);
}

#[test]
fn test_arithmetic_is_closed_under_field_clamp() {
    let a = random_genome(1);
    let b = random_genome(2);

    assert_closed(&a.add(&b).unwrap());
    assert_closed(&a.sub(&b).unwrap());
    for k in [-100.0, -1.0, 0.0, 0.5, 3.0, 1e6] {
        assert_closed(&a.scale(k));
    }
}

#[test]
fn test_sub_self_yields_exact_zero() {
    let a = random_genome(3);
    let zero = a.sub(&a).unwrap();
    let expected = Genome::zeroed(GenomeShape::reference());
    assert_eq!(zero.weights, expected.weights);
    assert_eq!(zero.bias, expected.bias);
    assert_eq!(zero.weights_hidden, expected.weights_hidden);
    assert_eq!(zero.bias_hidden, expected.bias_hidden);
    assert_eq!(zero.timec_hidden, expected.timec_hidden);
}

#[test]
fn test_shifted_hidden_bias_difference_is_exact() {
    // Two genomes identical except bias_hidden shifted by +0.1 inside the
    // field range: the difference must be exactly +0.1 per hidden neuron.
    let g1 = {
        let mut g = random_genome(4);
        // Keep the shift inside [-5, 5] so no clamping can trigger.
        for v in g.bias_hidden.iter_mut() {
            *v = v.clamp(-4.0, 4.0);
        }
        g
    };
    let mut g2 = g1.clone();
    for v in g2.bias_hidden.iter_mut() {
        *v += 0.1;
    }

    let diff = g2.sub(&g1).unwrap();
    for hidden in Hidden::ALL {
        let expected = g2.hidden_bias(hidden) - g1.hidden_bias(hidden);
        assert_eq!(diff.hidden_bias(hidden), expected);
        assert!((diff.hidden_bias(hidden) - 0.1).abs() < 1e-6);
    }
    // Every other field is untouched.
    assert!(diff.weights.iter().all(|&v| v == 0.0));
    assert!(diff.bias.iter().all(|&v| v == 0.0));
    assert!(diff.timec_hidden.iter().all(|&v| v == 0.0));
}

#[test]
fn test_shape_mismatch_signals_error() {
    let a = random_genome(5);
    let other = Genome::zeroed(GenomeShape {
        sensors: 7,
        hidden: 2,
        actuators: 3,
    });
    assert!(matches!(
        a.add(&other),
        Err(GenomeError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        a.sub(&other),
        Err(GenomeError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_scale_saturates_at_boundaries() {
    let a = random_genome(6);
    let big = a.scale(1e9);
    for &v in &big.weights {
        assert!(v == a.bounds.weights.lo || v == a.bounds.weights.hi || v == 0.0);
    }
    for &v in &big.timec_hidden {
        assert!(v == a.bounds.timec.lo || v == a.bounds.timec.hi);
    }
}
