//! Naive linear-growth forecasting.

use crate::error::DataError;

/// Growth multiplier used when none is configured.
pub const DEFAULT_GROWTH_RATE: f64 = 1.25;

/// Upper bound on the number of forecast days.
pub const MAX_FORECASTED_DAYS: usize = 100;

/// Appends `additional` points to `series`.
///
/// Each new point is the previous point plus the last observed daily change
/// scaled by `rate`, so `rate = 1.0` continues in a straight line and larger
/// rates make the increments grow. Existing points are left untouched.
///
/// # Errors
///
/// Returns [`DataError::SeriesTooShort`] when points must be added to a series
/// with fewer than two observations.
pub fn estimate_future(series: &[f64], additional: usize, rate: f64) -> Result<Vec<f64>, DataError> {
    let mut values = series.to_vec();
    if additional == 0 {
        return Ok(values);
    }
    if values.len() < 2 {
        return Err(DataError::SeriesTooShort(values.len()));
    }

    values.reserve(additional);
    for _ in 0..additional {
        let last = values[values.len() - 1];
        let prev = values[values.len() - 2];
        values.push(last + (last - prev) * rate);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_days_returns_input() {
        let series = [3.0, 9.0, 27.0];
        assert_eq!(estimate_future(&series, 0, 7.5).unwrap(), series.to_vec());
    }

    #[test]
    fn test_rate_one_is_straight_line() {
        let forecast = estimate_future(&[100.0, 150.0], 2, 1.0).unwrap();
        assert_eq!(forecast, vec![100.0, 150.0, 200.0, 250.0]);
    }

    #[test]
    fn test_rate_two_doubles_increments() {
        let forecast = estimate_future(&[100.0, 150.0], 2, 2.0).unwrap();
        assert_eq!(forecast, vec![100.0, 150.0, 250.0, 450.0]);
    }

    #[test]
    fn test_length_grows_by_requested_days() {
        let forecast = estimate_future(&[1.0, 2.0, 4.0], 10, DEFAULT_GROWTH_RATE).unwrap();
        assert_eq!(forecast.len(), 13);
        assert_eq!(&forecast[..3], &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_short_series_is_rejected() {
        assert!(matches!(
            estimate_future(&[5.0], 1, 1.0),
            Err(DataError::SeriesTooShort(1))
        ));
        assert!(matches!(
            estimate_future(&[], 3, 1.0),
            Err(DataError::SeriesTooShort(0))
        ));
    }
}
