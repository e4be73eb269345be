//! # Fast Fourier Transform (FFT) Module
//!
//! This module turns time histories into amplitude spectra and computes
//! frequency response functions between two measured signals.
//!
//! ## Features
//! - FFT through RustFFT on power-of-two windows
//! - Uniform, Hann, Hamming, flat top and exponential windows
//! - Overlapped window averaging
//! - DC offset removal for accurate low-frequency bins
//! - FRF (H1 estimator) with phase and coherence
//!
//! Amplitude spectra are scaled so that a sinusoid of amplitude `A` centred
//! on a bin reads `A`, whatever window was applied.

use serde::{Deserialize, Serialize};

use crate::complex_series::ComplexSeries;
use crate::error::{PlotError, Result};
use crate::series::SampleSeries;

/// Supported FFT window functions for spectral analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowType {
    /// Rectangular (no windowing)
    Uniform,
    #[default]
    Hann,
    Hamming,
    /// Five-term flat top, for accurate amplitudes between bins
    FlatTop,
    /// Decays to 1% at the last sample, for transient responses
    Exponential,
}

impl WindowType {
    /// All available window types (for UI selection)
    pub const ALL: &'static [WindowType] = &[
        WindowType::Uniform,
        WindowType::Hann,
        WindowType::Hamming,
        WindowType::FlatTop,
        WindowType::Exponential,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WindowType::Uniform => "Uniform",
            WindowType::Hann => "Hann",
            WindowType::Hamming => "Hamming",
            WindowType::FlatTop => "Flat Top",
            WindowType::Exponential => "Exponential",
        }
    }

    /// Window weight for sample `i` of a window `len` samples long.
    pub fn weight(&self, i: usize, len: usize) -> f64 {
        if len < 2 {
            return 1.0;
        }
        let phase = 2.0 * std::f64::consts::PI * i as f64 / (len - 1) as f64;
        match self {
            WindowType::Uniform => 1.0,
            WindowType::Hann => 0.5 * (1.0 - phase.cos()),
            WindowType::Hamming => 0.54 - 0.46 * phase.cos(),
            WindowType::FlatTop => {
                0.21557895 - 0.41663158 * phase.cos() + 0.277263158 * (2.0 * phase).cos()
                    - 0.083578947 * (3.0 * phase).cos()
                    + 0.006947368 * (4.0 * phase).cos()
            }
            WindowType::Exponential => (0.01_f64.ln() * i as f64 / (len - 1) as f64).exp(),
        }
    }

    /// Mean weight over the window; amplitudes are divided by this.
    pub fn coherent_gain(&self, len: usize) -> f64 {
        if len == 0 {
            return 1.0;
        }
        (0..len).map(|i| self.weight(i, len)).sum::<f64>() / len as f64
    }
}

/// Options for the averaged FFT.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FftOptions {
    pub window: WindowType,
    /// Samples per window; `None` uses the largest power of two that fits.
    pub window_size: Option<usize>,
    /// Fraction of each window shared with the next one, `0.0..1.0`.
    pub overlap: f64,
    pub subtract_mean: bool,
}

impl Default for FftOptions {
    fn default() -> Self {
        Self {
            window: WindowType::Hann,
            window_size: None,
            overlap: 0.0,
            subtract_mean: true,
        }
    }
}

/// Shortest window with a non-zero Hann weight.
const MIN_WINDOW_SIZE: usize = 4;

/// Largest power of two that is not greater than `sample_size`.
///
/// Returns 0 for an empty input; callers treat that as "not enough data".
pub fn max_power_of_two(sample_size: usize) -> usize {
    if sample_size == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - sample_size.leading_zeros())
}

fn overlap_samples(window_size: usize, overlap: f64) -> usize {
    let samples = (overlap.clamp(0.0, 1.0) * window_size as f64).round() as usize;
    samples.min(window_size.saturating_sub(1))
}

/// Number of windows of `window_size` samples, overlapping by `overlap`,
/// that fit into `data_size` samples.
pub fn number_of_averages(window_size: usize, overlap: f64, data_size: usize) -> usize {
    if window_size == 0 || window_size > data_size {
        return 0;
    }
    let shared = overlap_samples(window_size, overlap);
    (data_size - shared) / (window_size - shared)
}

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f64]) {
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

fn apply_window(buffer: &mut [f64], window: WindowType) {
    let n = buffer.len();
    for (i, sample) in buffer.iter_mut().enumerate() {
        *sample *= window.weight(i, n);
    }
}

/// Performs a forward FFT on one window of a signal.
///
/// The window is optionally mean-subtracted, then weighted, then transformed.
/// The full (double-sided) spectrum is returned.
pub fn perform_fft(signal: &[f64], window: WindowType, subtract_mean: bool) -> ComplexSeries {
    let mut processed = signal.to_vec();
    if subtract_mean {
        remove_dc_offset(&mut processed);
    }
    apply_window(&mut processed, window);

    let mut spectrum = ComplexSeries::from_real(&processed);
    spectrum.fft_in_place();
    spectrum
}

/// Discards the negative-frequency half of a spectrum.
///
/// Bins `0..N/2` are kept (the Nyquist bin is dropped); the DC bin is removed
/// as well unless `preserve_dc` is set. No amplitude scaling happens here.
pub fn convert_double_sided_to_single_sided(
    full_spectrum: &ComplexSeries,
    preserve_dc: bool,
) -> ComplexSeries {
    let mut single = full_spectrum.clone();
    single.truncate(full_spectrum.len() / 2);
    if !preserve_dc {
        single.skip_first();
    }
    single
}

fn sample_period(data: &SampleSeries) -> Result<f64> {
    let dt = data.average_sample_spacing().ok_or_else(|| {
        PlotError::InsufficientData(format!(
            "FFT needs at least two samples, got {}",
            data.len()
        ))
    })?;
    if !(dt.is_finite() && dt > 0.0) {
        return Err(PlotError::InvalidParameter(format!(
            "sample spacing must be positive, got {dt}"
        )));
    }
    Ok(dt)
}

/// Single-sided amplitude spectrum of one window, DC included.
fn amplitude_spectrum(window_data: &[f64], window: WindowType, subtract_mean: bool) -> Vec<f64> {
    let n = window_data.len();
    let spectrum = perform_fft(window_data, window, subtract_mean);
    let single = convert_double_sided_to_single_sided(&spectrum, true);
    let scale = 1.0 / (n as f64 * window.coherent_gain(n));
    single
        .magnitudes()
        .into_iter()
        .enumerate()
        .map(|(k, magnitude)| {
            if k == 0 {
                magnitude * scale
            } else {
                2.0 * magnitude * scale
            }
        })
        .collect()
}

/// Amplitude spectrum with the default options: one Hann window spanning the
/// largest power of two samples, mean removed.
///
/// # Returns
/// * Series of amplitude (y) versus frequency (x), in the inverse units of `data.x`
pub fn compute_fft(data: &SampleSeries) -> Result<SampleSeries> {
    compute_fft_with(data, &FftOptions::default())
}

/// Averaged amplitude spectrum over overlapping windows.
///
/// # Arguments
/// * `data` - Time history with (approximately) uniform sample spacing
/// * `options` - Window function, window length, overlap and mean removal
///
/// # Errors
/// * `InsufficientData` if fewer than four samples are available
/// * `InvalidParameter` for a window shorter than four samples or longer than
///   the data, or an overlap outside `0..1`
pub fn compute_fft_with(data: &SampleSeries, options: &FftOptions) -> Result<SampleSeries> {
    let dt = sample_period(data)?;
    let window_size = match options.window_size {
        Some(size) => size,
        None if data.len() < MIN_WINDOW_SIZE => {
            return Err(PlotError::InsufficientData(format!(
                "FFT needs at least {MIN_WINDOW_SIZE} samples, got {}",
                data.len()
            )));
        }
        None => max_power_of_two(data.len()),
    };
    if window_size < MIN_WINDOW_SIZE || window_size > data.len() {
        return Err(PlotError::InvalidParameter(format!(
            "window size {window_size} must be between {MIN_WINDOW_SIZE} and the {} available samples",
            data.len()
        )));
    }
    if options.window.coherent_gain(window_size) <= 0.0 {
        return Err(PlotError::InvalidParameter(format!(
            "{} window of {window_size} samples has no coherent gain",
            options.window.label()
        )));
    }
    if !(0.0..1.0).contains(&options.overlap) {
        return Err(PlotError::InvalidParameter(format!(
            "overlap must be in [0, 1), got {}",
            options.overlap
        )));
    }

    let averages = number_of_averages(window_size, options.overlap, data.len());
    let step = window_size - overlap_samples(window_size, options.overlap);
    log::debug!(
        "Computing FFT over {averages} {} windows of {window_size} samples",
        options.window.label()
    );

    let mut sum = vec![0.0; window_size / 2];
    for k in 0..averages {
        let start = k * step;
        let chunk = &data.y()[start..start + window_size];
        let amplitudes = amplitude_spectrum(chunk, options.window, options.subtract_mean);
        for (total, amplitude) in sum.iter_mut().zip(amplitudes) {
            *total += amplitude;
        }
    }

    let df = 1.0 / (window_size as f64 * dt);
    let frequencies = (0..sum.len()).map(|k| k as f64 * df).collect();
    let amplitudes = sum.into_iter().map(|v| v / averages as f64).collect();
    SampleSeries::from_xy(frequencies, amplitudes)
}

/// Output of [`compute_frf`]; all three series share the same frequency axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponse {
    /// Gain in dB.
    pub amplitude: SampleSeries,
    /// Phase in degrees.
    pub phase: SampleSeries,
    /// Coherence in `[0, 1]`.
    pub coherence: SampleSeries,
}

struct AveragedSpectra {
    frequencies: Vec<f64>,
    input_power: Vec<f64>,
    output_power: Vec<f64>,
    cross_power: ComplexSeries,
}

fn averaged_spectra(
    input: &SampleSeries,
    output: &SampleSeries,
    number_of_averages: usize,
    window: WindowType,
) -> Result<AveragedSpectra> {
    if number_of_averages == 0 {
        return Err(PlotError::InvalidParameter(
            "number of averages must be at least 1".to_string(),
        ));
    }
    let (input, output) = input.align(output);
    let dt = sample_period(&input)?;
    let window_size = max_power_of_two(input.len() / number_of_averages);
    if window_size < MIN_WINDOW_SIZE {
        return Err(PlotError::InsufficientData(format!(
            "{} common samples cannot be split into {number_of_averages} windows",
            input.len()
        )));
    }

    let bins = window_size / 2 - 1;
    let mut input_power = vec![0.0; bins];
    let mut output_power = vec![0.0; bins];
    let mut cross = vec![rustfft::num_complex::Complex::new(0.0, 0.0); bins];

    for k in 0..number_of_averages {
        let range = k * window_size..(k + 1) * window_size;
        let x = convert_double_sided_to_single_sided(
            &perform_fft(&input.y()[range.clone()], window, true),
            false,
        );
        let y = convert_double_sided_to_single_sided(
            &perform_fft(&output.y()[range], window, true),
            false,
        );
        for (total, p) in input_power.iter_mut().zip(x.power()) {
            *total += p;
        }
        for (total, p) in output_power.iter_mut().zip(y.power()) {
            *total += p;
        }
        for (total, c) in cross.iter_mut().zip(x.cross_power(&y).bins()) {
            *total += c;
        }
    }
    log::debug!(
        "FRF spectra averaged over {number_of_averages} windows of {window_size} samples"
    );

    let df = 1.0 / (window_size as f64 * dt);
    Ok(AveragedSpectra {
        frequencies: (1..=bins).map(|k| k as f64 * df).collect(),
        input_power,
        output_power,
        cross_power: ComplexSeries::from_bins(cross),
    })
}

fn coherence_values(spectra: &AveragedSpectra) -> Vec<f64> {
    spectra
        .cross_power
        .bins()
        .iter()
        .zip(spectra.input_power.iter().zip(spectra.output_power.iter()))
        .map(|(sxy, (sxx, syy))| {
            let denominator = sxx * syy;
            if denominator > 0.0 && denominator.is_finite() {
                (sxy.norm_sqr() / denominator).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

fn unwrap_phase(phase: &mut [f64]) {
    let mut offset = 0.0;
    for i in 1..phase.len() {
        let step = phase[i] + offset - phase[i - 1];
        if step > 180.0 {
            offset -= 360.0 * ((step - 180.0) / 360.0).ceil();
        } else if step < -180.0 {
            offset += 360.0 * ((-step - 180.0) / 360.0).ceil();
        }
        phase[i] += offset;
    }
}

/// Computes the frequency response function from `input` to `output`.
///
/// The series are aligned first, then split into `number_of_averages`
/// non-overlapping power-of-two windows. The gain is the H1 estimate
/// `Sxy / Sxx` with `Sxy = conj(X) * Y`.
///
/// # Arguments
/// * `modulo_phase` - wrap phase to `[-180, 180]` degrees instead of unwrapping it
pub fn compute_frf(
    input: &SampleSeries,
    output: &SampleSeries,
    number_of_averages: usize,
    window: WindowType,
    modulo_phase: bool,
) -> Result<FrequencyResponse> {
    let spectra = averaged_spectra(input, output, number_of_averages, window)?;

    let response: Vec<_> = spectra
        .cross_power
        .bins()
        .iter()
        .zip(spectra.input_power.iter())
        .map(|(sxy, sxx)| *sxy / *sxx)
        .collect();
    let amplitude = response.iter().map(|h| 20.0 * h.norm().log10()).collect();
    let mut phase: Vec<f64> = response.iter().map(|h| h.arg().to_degrees()).collect();
    if !modulo_phase {
        unwrap_phase(&mut phase);
    }
    let coherence = coherence_values(&spectra);

    Ok(FrequencyResponse {
        amplitude: SampleSeries::from_xy(spectra.frequencies.clone(), amplitude)?,
        phase: SampleSeries::from_xy(spectra.frequencies.clone(), phase)?,
        coherence: SampleSeries::from_xy(spectra.frequencies, coherence)?,
    })
}

/// Coherence between two signals, `|Sxy|^2 / (Sxx * Syy)` per frequency.
pub fn compute_coherence(
    input: &SampleSeries,
    output: &SampleSeries,
    number_of_averages: usize,
    window: WindowType,
) -> Result<SampleSeries> {
    let spectra = averaged_spectra(input, output, number_of_averages, window)?;
    let coherence = coherence_values(&spectra);
    SampleSeries::from_xy(spectra.frequencies, coherence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine(n: usize, dt: f64, frequency: f64, amplitude: f64) -> SampleSeries {
        let x = (0..n).map(|i| i as f64 * dt).collect();
        SampleSeries::from_fn(x, |t| amplitude * (2.0 * PI * frequency * t).sin())
    }

    fn peak(spectrum: &SampleSeries) -> (f64, f64) {
        spectrum
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap()
    }

    #[test]
    fn max_power_of_two_rounds_down() {
        assert_eq!(max_power_of_two(0), 0);
        assert_eq!(max_power_of_two(1), 1);
        assert_eq!(max_power_of_two(1000), 512);
        assert_eq!(max_power_of_two(1024), 1024);
    }

    #[test]
    fn number_of_averages_accounts_for_overlap() {
        assert_eq!(number_of_averages(256, 0.0, 1024), 4);
        assert_eq!(number_of_averages(256, 0.5, 1024), 7);
        assert_eq!(number_of_averages(2048, 0.0, 1024), 0);
    }

    #[test]
    fn windows_are_symmetric() {
        let symmetric = WindowType::ALL
            .iter()
            .filter(|w| **w != WindowType::Exponential);
        for window in symmetric {
            let n = 33;
            for i in 0..n {
                assert_relative_eq!(
                    window.weight(i, n),
                    window.weight(n - 1 - i, n),
                    epsilon = 1e-12
                );
            }
        }
        assert_relative_eq!(WindowType::Hann.weight(0, 16), 0.0);
        assert_relative_eq!(WindowType::Exponential.weight(15, 16), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn uniform_window_reads_exact_amplitude() {
        let data = sine(1024, 1.0 / 1024.0, 64.0, 3.0);
        let options = FftOptions {
            window: WindowType::Uniform,
            ..FftOptions::default()
        };
        let spectrum = compute_fft_with(&data, &options).unwrap();
        let (frequency, amplitude) = peak(&spectrum);
        assert_relative_eq!(frequency, 64.0, epsilon = 1e-9);
        assert_relative_eq!(amplitude, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn averaged_fft_has_window_resolution() {
        let data = sine(4096, 1.0 / 1024.0, 100.0, 1.0);
        let options = FftOptions {
            window_size: Some(1024),
            overlap: 0.5,
            ..FftOptions::default()
        };
        let spectrum = compute_fft_with(&data, &options).unwrap();
        assert_eq!(spectrum.len(), 512);
        assert_relative_eq!(spectrum.x()[1], 1.0, epsilon = 1e-9);
        let (frequency, amplitude) = peak(&spectrum);
        assert_relative_eq!(frequency, 100.0, epsilon = 1e-9);
        assert!((amplitude - 1.0).abs() < 0.02);
    }

    #[test]
    fn fft_rejects_bad_input() {
        let single = SampleSeries::from_xy(vec![0.0], vec![1.0]).unwrap();
        assert!(matches!(compute_fft(&single), Err(PlotError::InsufficientData(_))));

        let data = sine(64, 0.01, 5.0, 1.0);
        let too_long = FftOptions {
            window_size: Some(128),
            ..FftOptions::default()
        };
        assert!(matches!(
            compute_fft_with(&data, &too_long),
            Err(PlotError::InvalidParameter(_))
        ));
    }

    #[test]
    fn short_series_are_rejected_instead_of_nan() {
        let three = SampleSeries::from_xy(vec![0.0, 0.1, 0.2], vec![1.0, 3.0, 2.0]).unwrap();
        assert!(matches!(compute_fft(&three), Err(PlotError::InsufficientData(_))));

        let data = sine(64, 0.01, 5.0, 1.0);
        for size in [2, 3] {
            let options = FftOptions {
                window_size: Some(size),
                ..FftOptions::default()
            };
            assert!(matches!(
                compute_fft_with(&data, &options),
                Err(PlotError::InvalidParameter(_))
            ));
        }

        let four = SampleSeries::from_xy(vec![0.0, 0.1, 0.2, 0.3], vec![1.0, 3.0, 2.0, 0.0]).unwrap();
        let spectrum = compute_fft(&four).unwrap();
        assert!(spectrum.y().iter().all(|a| a.is_finite()));
    }

    #[test]
    fn every_window_reads_on_bin_amplitude() {
        let data = sine(1024, 1.0 / 1024.0, 64.0, 3.0);
        for &window in WindowType::ALL {
            let options = FftOptions {
                window,
                ..FftOptions::default()
            };
            let spectrum = compute_fft_with(&data, &options).unwrap();
            let (frequency, amplitude) = peak(&spectrum);
            assert_relative_eq!(frequency, 64.0, epsilon = 1e-9);
            assert!(
                (amplitude - 3.0).abs() < 0.03 * 3.0,
                "{} window read {amplitude}",
                window.label()
            );
        }
    }

    /// Unit cosines on every bin of a `window_size` window, shifted by `delay`.
    fn multisine(window_size: usize, windows: usize, dt: f64, delay: f64) -> SampleSeries {
        let df = 1.0 / (window_size as f64 * dt);
        let x = (0..window_size * windows).map(|i| i as f64 * dt).collect();
        SampleSeries::from_fn(x, |t| {
            (1..window_size / 2)
                .map(|k| {
                    let k = k as f64;
                    (2.0 * PI * k * df * (t - delay) + 0.1 * k * k).cos()
                })
                .sum()
        })
    }

    #[test]
    fn delayed_output_lags_in_phase() {
        let dt = 0.001;
        let delay = 0.005;
        let input = multisine(512, 2, dt, 0.0);
        let output = multisine(512, 2, dt, delay);
        let frf = compute_frf(&input, &output, 2, WindowType::Uniform, true).unwrap();

        for (f, phase) in frf.phase.iter() {
            let expected = -360.0 * f * delay;
            let wrapped = expected - 360.0 * ((expected - 180.0) / 360.0).ceil();
            let difference = (phase - wrapped).rem_euclid(360.0);
            assert!(
                difference < 1e-6 || difference > 360.0 - 1e-6,
                "phase {phase} at {f} Hz, expected {wrapped}"
            );
            assert!((-180.0..=180.0).contains(&phase));
        }
        // First bin: 1.953125 Hz delayed by 5 ms
        assert!(frf.phase.y()[0] < 0.0);
        assert_relative_eq!(frf.phase.y()[0], -3.515625, epsilon = 1e-6);
        for (gain, coherence) in frf.amplitude.y().iter().zip(frf.coherence.y()) {
            assert!(gain.abs() < 1e-6);
            assert_relative_eq!(*coherence, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn unwrapped_frf_phase_is_linear_in_frequency() {
        let dt = 0.001;
        let delay = 0.005;
        let input = multisine(512, 2, dt, 0.0);
        let output = multisine(512, 2, dt, delay);
        let frf = compute_frf(&input, &output, 2, WindowType::Uniform, false).unwrap();

        assert_eq!(frf.phase.len(), 255);
        // Spans well past -180 degrees without wrapping
        for (f, phase) in frf.phase.iter() {
            assert_relative_eq!(phase, -360.0 * f * delay, epsilon = 1e-6);
        }
        assert!(frf.phase.y()[254] < -800.0);
    }

    #[test]
    fn frf_of_pure_gain() {
        let input = sine(2048, 0.001, 50.0, 1.0) + sine(2048, 0.001, 120.0, 0.5);
        let output = &input * 2.0;
        let frf = compute_frf(&input, &output, 4, WindowType::Hann, true).unwrap();
        let peak_bin = frf
            .coherence
            .x()
            .iter()
            .position(|&f| (f - 50.78125).abs() < 1e-6)
            .unwrap();
        assert_relative_eq!(frf.amplitude.y()[peak_bin], 20.0 * 2.0_f64.log10(), epsilon = 1e-6);
        assert_relative_eq!(frf.phase.y()[peak_bin], 0.0, epsilon = 1e-6);
        assert_relative_eq!(frf.coherence.y()[peak_bin], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn unwrap_removes_jumps() {
        let mut phase = vec![170.0, -170.0, -150.0];
        unwrap_phase(&mut phase);
        assert_eq!(phase, vec![170.0, 190.0, 210.0]);
    }
}
