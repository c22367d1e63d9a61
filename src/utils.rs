/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance dividing by `n`, 0 for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
#[test]
fn mean_of_empty() {
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(population_variance(&[]), 0.0);
}

#[cfg(test)]
#[test]
fn variance() {
    assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    assert_eq!(population_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 4.0);
}
