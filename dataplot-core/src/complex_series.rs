//! Complex-valued buffers for frequency-domain work.
//!
//! A [`ComplexSeries`] holds FFT bins and nothing else. It shares
//! no API with [`crate::SampleSeries`]: there is no x axis here, only
//! `(real, imaginary)` pairs indexed by bin number, so time-domain helpers
//! such as alignment can never be applied to a spectrum by accident.

use rustfft::{FftPlanner, num_complex::Complex};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexSeries {
    bins: Vec<Complex<f64>>,
}

impl ComplexSeries {
    /// Wraps a real signal as complex samples with zero imaginary part.
    pub fn from_real(signal: &[f64]) -> Self {
        Self {
            bins: signal.iter().map(|&re| Complex { re, im: 0.0 }).collect(),
        }
    }

    pub fn from_bins(bins: Vec<Complex<f64>>) -> Self {
        Self { bins }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[Complex<f64>] {
        &self.bins
    }

    /// Forward FFT in place. Power-of-two lengths take the radix-2/4 path.
    pub fn fft_in_place(&mut self) -> &mut Self {
        if self.bins.is_empty() {
            return self;
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.bins.len());
        fft.process(&mut self.bins);
        self
    }

    /// Keeps only the bins at or below the half length.
    pub fn truncate(&mut self, len: usize) -> &mut Self {
        self.bins.truncate(len);
        self
    }

    pub fn skip_first(&mut self) -> &mut Self {
        if !self.bins.is_empty() {
            self.bins.remove(0);
        }
        self
    }

    /// `|X_k|` for every bin.
    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|c| c.norm()).collect()
    }

    /// Auto-power `|X_k|^2` for every bin.
    pub fn power(&self) -> Vec<f64> {
        self.bins.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Cross-power `conj(X_k) * Y_k`, where `self` is X.
    ///
    /// Bins beyond the shorter of the two buffers are ignored.
    pub fn cross_power(&self, other: &ComplexSeries) -> ComplexSeries {
        let bins = self
            .bins
            .iter()
            .zip(other.bins.iter())
            .map(|(x, y)| x.conj() * y)
            .collect();
        ComplexSeries { bins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fft_of_impulse_is_flat() {
        let mut impulse = vec![0.0; 8];
        impulse[0] = 1.0;
        let mut spectrum = ComplexSeries::from_real(&impulse);
        spectrum.fft_in_place();
        for magnitude in spectrum.magnitudes() {
            assert_relative_eq!(magnitude, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn cross_power_with_self_is_auto_power() {
        let mut x = ComplexSeries::from_real(&[1.0, -2.0, 0.5, 3.0]);
        x.fft_in_place();
        let cross = x.cross_power(&x);
        for (c, p) in cross.bins().iter().zip(x.power()) {
            assert_relative_eq!(c.re, p, epsilon = 1e-12);
            assert_relative_eq!(c.im, 0.0, epsilon = 1e-12);
        }
    }
}
