//! # Fast Fourier Transform (FFT) Module
//!
//! A from-scratch recursive radix-2 Cooley–Tukey transform used by the
//! spectral pitch estimators.
//!
//! ## Features
//! - Forward and inverse complex transforms of power-of-two length
//! - Real-valued convenience wrappers
//! - Hann windowing for reduced spectral leakage
//! - DC offset removal for accurate analysis
//!
//! The transform length must be a power of two. Anything else is a
//! programming error and panics before any arithmetic happens.

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

/// Complex spectrum bins produced by [`forward`].
pub type Spectrum = Vec<Complex<f64>>;

fn assert_power_of_two(n: usize) {
    assert!(
        n.is_power_of_two(),
        "FFT length must be a non-zero power of two, got {}",
        n
    );
}

/// Transforms `len` elements of `input`, starting at `offset` and taking every
/// `stride`-th element, into `out[..len]`.
///
/// The even-indexed half lands in `out[..len / 2]` and the odd-indexed half in
/// `out[len / 2..]`, then the two are combined in place with the twiddle
/// factors `exp(-2πik/len)`.
fn transform(
    input: &[Complex<f64>],
    offset: usize,
    stride: usize,
    len: usize,
    out: &mut [Complex<f64>],
) {
    if len == 1 {
        out[0] = input[offset];
        return;
    }

    let half = len / 2;
    {
        let (even, odd) = out.split_at_mut(half);
        transform(input, offset, stride * 2, half, even);
        transform(input, offset + stride, stride * 2, half, odd);
    }

    for k in 0..half {
        let twiddle = Complex::from_polar(1.0, -2.0 * PI * k as f64 / len as f64);
        let even = out[k];
        let t = twiddle * out[k + half];
        out[k] = even + t;
        out[k + half] = even - t;
    }
}

/// Performs a forward FFT on a complex sequence.
///
/// # Panics
/// * If `input.len()` is not a power of two
pub fn forward(input: &[Complex<f64>]) -> Spectrum {
    assert_power_of_two(input.len());
    let mut bins = vec![Complex::new(0.0, 0.0); input.len()];
    transform(input, 0, 1, input.len(), &mut bins);
    bins
}

/// Performs an inverse FFT.
///
/// Uses the conjugate-forward-conjugate identity and scales by `1/N`.
///
/// # Panics
/// * If `bins.len()` is not a power of two
pub fn inverse(bins: &[Complex<f64>]) -> Vec<Complex<f64>> {
    assert_power_of_two(bins.len());
    let n = bins.len() as f64;
    let conjugated: Vec<Complex<f64>> = bins.iter().map(|c| c.conj()).collect();
    forward(&conjugated)
        .into_iter()
        .map(|c| c.conj() / n)
        .collect()
}

/// Lifts a real signal into complex form and transforms it.
pub fn forward_real(signal: &[f64]) -> Spectrum {
    let buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();
    forward(&buffer)
}

/// Inverse transform keeping only the real part of the result.
pub fn inverse_real(bins: &[Complex<f64>]) -> Vec<f64> {
    inverse(bins).into_iter().map(|c| c.re).collect()
}

/// Removes the DC offset from a signal by making its average value zero.
pub fn remove_dc_offset(signal: &mut [f64]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f64>() / len as f64;
    if avg.abs() > 1e-12 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the input buffer to reduce spectral leakage.
pub fn apply_hann_window(buffer: &mut [f64]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f64;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * PI * i as f64 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Magnitudes of the first half of a spectrum, up to the Nyquist bin.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum
        .iter()
        .take(spectrum.len() / 2 + 1)
        .map(|c| c.norm())
        .collect()
}

/// The most recent power-of-two run of samples at the end of `signal`.
///
/// Returns an empty slice for empty input.
pub fn power_of_two_tail(signal: &[f64]) -> &[f64] {
    if signal.is_empty() {
        return signal;
    }
    let len = 1usize << (usize::BITS - 1 - signal.len().leading_zeros());
    &signal[signal.len() - len..]
}
