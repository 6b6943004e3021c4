//! Deterministic test signals.
//!
//! Every generator takes `(frequency, length, sample_rate)` and produces
//! `length` samples with peak amplitude at most 1 starting at phase zero.

use std::f64::consts::PI;

/// Phase in cycles of sample `i`, computed as `i·f/sr` so integer periods
/// land on exact values.
fn cycles(i: usize, frequency: f64, sample_rate: f64) -> f64 {
    i as f64 * frequency / sample_rate
}

pub fn sine(frequency: f64, length: usize, sample_rate: f64) -> Vec<f64> {
    (0..length)
        .map(|i| (2.0 * PI * cycles(i, frequency, sample_rate)).sin())
        .collect()
}

/// Rising sawtooth in `[-1, 1)`.
pub fn sawtooth(frequency: f64, length: usize, sample_rate: f64) -> Vec<f64> {
    (0..length)
        .map(|i| 2.0 * cycles(i, frequency, sample_rate).fract() - 1.0)
        .collect()
}

/// Square wave: +1 for the first half of each period, -1 for the second.
pub fn square(frequency: f64, length: usize, sample_rate: f64) -> Vec<f64> {
    (0..length)
        .map(|i| {
            if cycles(i, frequency, sample_rate).fract() < 0.5 {
                1.0
            } else {
                -1.0
            }
        })
        .collect()
}

/// Triangle wave starting at zero and rising.
pub fn triangle(frequency: f64, length: usize, sample_rate: f64) -> Vec<f64> {
    (0..length)
        .map(|i| {
            let phase = cycles(i, frequency, sample_rate).fract();
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        })
        .collect()
}

/// Sum of the first `harmonics` partials with amplitude `1/k`, normalised to
/// a peak of at most 1.
pub fn sine_with_harmonics(
    frequency: f64,
    length: usize,
    sample_rate: f64,
    harmonics: usize,
) -> Vec<f64> {
    let harmonics = harmonics.max(1);
    let norm: f64 = (1..=harmonics).map(|k| 1.0 / k as f64).sum();
    (0..length)
        .map(|i| {
            let phase = 2.0 * PI * cycles(i, frequency, sample_rate);
            (1..=harmonics)
                .map(|k| (k as f64 * phase).sin() / k as f64)
                .sum::<f64>()
                / norm
        })
        .collect()
}

/// Unit impulses at the start of every period, zero elsewhere.
pub fn pulse_train(frequency: f64, length: usize, sample_rate: f64) -> Vec<f64> {
    let mut previous = None;
    (0..length)
        .map(|i| {
            let period = cycles(i, frequency, sample_rate).floor() as i64;
            let pulse = previous != Some(period);
            previous = Some(period);
            if pulse { 1.0 } else { 0.0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn generators_stay_in_unit_range() {
        let generators: [fn(f64, usize, f64) -> Vec<f64>; 5] =
            [sine, sawtooth, square, triangle, pulse_train];
        for generate in generators {
            let wave = generate(123.4, 4000, 44_100.0);
            assert_eq!(wave.len(), 4000);
            assert!(wave.iter().all(|s| s.abs() <= 1.0 + 1e-12));
        }
        let rich = sine_with_harmonics(123.4, 4000, 44_100.0, 6);
        assert!(rich.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn shapes_at_known_phases() {
        // 8 samples per period.
        let saw = sawtooth(1.0, 8, 8.0);
        assert_abs_diff_eq!(saw[0], -1.0);
        assert_abs_diff_eq!(saw[4], 0.0);
        let sq = square(1.0, 8, 8.0);
        assert_eq!(sq, vec![1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0]);
        let tri = triangle(1.0, 8, 8.0);
        assert_abs_diff_eq!(tri[2], 1.0);
        assert_abs_diff_eq!(tri[6], -1.0);
        assert_abs_diff_eq!(tri[4], 0.0);
    }

    #[test]
    fn pulse_train_spacing() {
        let pulses = pulse_train(441.0, 1000, 44_100.0);
        let positions: Vec<usize> = pulses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions, (0..10).map(|p| p * 100).collect::<Vec<_>>());
    }
}
