//! Mean and sample standard deviation over a run series.
//!
//! Both functions are pure and fail loudly instead of producing `NaN` when the input is too
//! short for the statistic to be defined.

/// Why a statistic could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("cannot compute a mean over zero samples")]
    EmptyInput,
    #[error("sample standard deviation needs at least 2 samples, got {count}")]
    InsufficientSamples { count: usize },
}

/// Arithmetic mean of `samples`.
pub fn mean(samples: &[f64]) -> Result<f64, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Standard deviation with Bessel's correction, `sqrt(sum((x - mean)^2) / (n - 1))`.
pub fn sample_std_dev(samples: &[f64]) -> Result<f64, StatsError> {
    if samples.len() < 2 {
        return Err(StatsError::InsufficientSamples {
            count: samples.len(),
        });
    }

    let mean = mean(samples)?;
    let sum_of_squares = samples
        .iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>();

    Ok((sum_of_squares / (samples.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_exact_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
    }

    #[test]
    fn mean_of_single_value() {
        assert_eq!(mean(&[7.25]).unwrap(), 7.25);
    }

    #[test]
    fn mean_of_nothing_fails() {
        assert_eq!(mean(&[]), Err(StatsError::EmptyInput));
    }

    #[test]
    fn bessel_corrected_std_dev() {
        let std_dev = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();

        // sum of squared deviations is 32, 32 / 7 = 4.571428...
        let reference = (32.0_f64 / 7.0).sqrt();
        assert!((std_dev - reference).abs() < 1e-12);
        assert!((std_dev - 2.138_089_935_299_395).abs() < 1e-9);
    }

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(sample_std_dev(&[3.0, 3.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn std_dev_needs_two_samples() {
        assert_eq!(
            sample_std_dev(&[1.0]),
            Err(StatsError::InsufficientSamples { count: 1 })
        );
        assert_eq!(
            sample_std_dev(&[]),
            Err(StatsError::InsufficientSamples { count: 0 })
        );
    }

    #[test]
    fn order_does_not_matter() {
        let forward = sample_std_dev(&[10.0, 20.0, 30.0]).unwrap();
        let backward = sample_std_dev(&[30.0, 10.0, 20.0]).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, 10.0);
    }
}
