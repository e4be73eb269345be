use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use dataplot_core::curve_fit::{do_polynomial_fit, evaluate_fit, fit_series};
use dataplot_core::fft::{compute_coherence, compute_fft};
use dataplot_core::filter::filter_series;
use dataplot_core::{Filter, FilterParameters, FilterType, SampleSeries, WindowType};
use linreg::linear_regression;
use proptest::prelude::*;

fn time_axis(n: usize, dt: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * dt).collect()
}

#[test]
fn fft_of_sinusoid_peaks_at_its_frequency() -> anyhow::Result<()> {
    let data = SampleSeries::from_fn(time_axis(1024, 1.0 / 1024.0), |t| {
        2.5 * (2.0 * PI * 128.0 * t).sin()
    });
    let spectrum = compute_fft(&data)?;
    let (frequency, amplitude) = spectrum
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| anyhow::anyhow!("empty spectrum"))?;
    assert_relative_eq!(frequency, 128.0, epsilon = 1e-9);
    assert!((amplitude - 2.5).abs() < 0.05, "peak amplitude {amplitude}");
    Ok(())
}

#[test]
fn coherence_stays_within_unit_interval() {
    let signal = || prop::collection::vec(-10.0..10.0, 256);
    proptest!(|(input in signal(), output in signal())| {
        let x = time_axis(256, 0.001);
        let input = SampleSeries::from_xy(x.clone(), input).unwrap();
        let output = SampleSeries::from_xy(x, output).unwrap();
        let coherence = compute_coherence(&input, &output, 4, WindowType::Hann).unwrap();
        prop_assert_eq!(coherence.len(), 31);
        for c in coherence.y() {
            prop_assert!((0.0..=1.0).contains(c));
        }
    });
}

#[test]
fn initialized_filter_holds_steady_state() {
    proptest!(|(value in -100.0..100.0f64, order in 1usize..=4, butterworth in any::<bool>())| {
        let parameters = FilterParameters {
            order,
            butterworth,
            cutoff_frequency: 10.0,
            ..FilterParameters::default()
        };
        let mut filter = Filter::from_parameters(1000.0, &parameters).unwrap();
        let expected = value * filter.steady_state_gain();
        filter.initialize(value);
        for _ in 0..200 {
            filter.apply(value);
        }
        prop_assert!((filter.output() - expected).abs() < 1e-6 * (1.0 + value.abs()));
    });
}

#[test]
fn uninitialized_filter_converges_to_steady_state() -> anyhow::Result<()> {
    let parameters = FilterParameters {
        order: 2,
        cutoff_frequency: 25.0,
        ..FilterParameters::default()
    };
    let mut filter = Filter::from_parameters(1000.0, &parameters)?;
    for _ in 0..5000 {
        filter.apply(4.0);
    }
    assert_relative_eq!(filter.output(), 4.0 * filter.steady_state_gain(), epsilon = 1e-9);
    assert_relative_eq!(filter.steady_state_gain(), 1.0, epsilon = 1e-12);
    Ok(())
}

fn filter_type() -> impl Strategy<Value = FilterType> {
    prop_oneof![
        Just(FilterType::LowPass),
        Just(FilterType::HighPass),
        Just(FilterType::BandPass),
        Just(FilterType::BandStop),
        Just(FilterType::Notch),
    ]
}

#[test]
fn discrete_response_matches_prototype_on_warped_axis() {
    proptest!(|(filter_type in filter_type(), order in 1usize..=2, butterworth in any::<bool>(), theta in 0.05..3.0f64)| {
        let sample_rate = 100.0;
        let parameters = FilterParameters {
            filter_type,
            order,
            butterworth,
            cutoff_frequency: 10.0,
            width: 4.0,
            ..FilterParameters::default()
        };
        let prototype = parameters.transfer_function().unwrap();
        let filter = Filter::new(sample_rate, &prototype).unwrap();

        let omega = 2.0 * sample_rate * (theta / 2.0).tan();
        let analog = prototype.frequency_response(omega);
        let digital = filter.frequency_response(theta);
        prop_assert!(
            (analog - digital).norm() < 1e-8 * (1.0 + analog.norm()),
            "{:?} at theta {}: analog {} digital {}", filter_type, theta, analog, digital
        );
    });
}

#[test]
fn custom_filter_matches_builtin_low_pass() -> anyhow::Result<()> {
    let builtin = Filter::from_parameters(
        500.0,
        &FilterParameters {
            cutoff_frequency: 10.0,
            ..FilterParameters::default()
        },
    )?;
    let custom = Filter::from_strings(500.0, "2*3.141592653589793*10", "s + 2*3.141592653589793*10")?;
    for (a, b) in builtin.numerator().iter().zip(custom.numerator()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
    for (a, b) in builtin.denominator().iter().zip(custom.denominator()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn filter_parameters_load_from_json() -> anyhow::Result<()> {
    let json = r#"{
        "type": "Notch",
        "cutoff_frequency": 50.0,
        "width": 10.0,
        "phaseless": true
    }"#;
    let parameters: FilterParameters = serde_json::from_str(json)?;
    assert_eq!(parameters.filter_type, FilterType::Notch);
    assert_eq!(parameters.order, 1);
    assert_eq!(parameters.numerator, "");

    // Mains hum on top of a slow ramp
    let data = SampleSeries::from_fn(time_axis(4000, 0.001), |t| {
        t + 0.5 * (2.0 * PI * 50.0 * t).sin()
    });
    let filtered = filter_series(&parameters, &data)?;
    assert_eq!(filtered.len(), data.len());
    for i in 1000..3000 {
        let t = data.x()[i];
        assert_abs_diff_eq!(filtered.y()[i], t, epsilon = 0.02);
    }
    Ok(())
}

#[test]
fn polynomial_fit_recovers_generating_coefficients() -> anyhow::Result<()> {
    let coefficients = [0.5, -1.25, 2.0, 0.75];
    let x: Vec<f64> = (0..25).map(|i| -1.0 + i as f64 / 12.0).collect();
    let data = SampleSeries::from_fn(x, |t| {
        coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
    });
    let fit = do_polynomial_fit(&data, 3)?;
    for (fitted, expected) in fit.coefficients.iter().zip(coefficients) {
        assert_abs_diff_eq!(*fitted, expected, epsilon = 1e-8);
    }
    assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);

    let overlay = fit_series(&data, &fit);
    for ((x, y), fitted) in data.iter().zip(overlay.y()) {
        assert_abs_diff_eq!(evaluate_fit(x, &fit), *fitted);
        assert_abs_diff_eq!(y, *fitted, epsilon = 1e-8);
    }
    Ok(())
}

#[test]
fn linear_fit_agrees_with_linreg() -> anyhow::Result<()> {
    let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
    // Deterministic scatter around y = 1.7x - 4
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, t)| 1.7 * t - 4.0 + 0.3 * ((i * 7919 % 13) as f64 - 6.0) / 6.0)
        .collect();
    let data = SampleSeries::from_xy(x.clone(), y.clone())?;

    let fit = do_polynomial_fit(&data, 1)?;
    let (slope, intercept): (f64, f64) = linear_regression::<_, _, f64>(&x, &y)
        .map_err(|e| anyhow::anyhow!("linreg failed: {e:?}"))?;
    assert_relative_eq!(fit.coefficients[1], slope, epsilon = 1e-9);
    assert_relative_eq!(fit.coefficients[0], intercept, epsilon = 1e-9);
    assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
    Ok(())
}
