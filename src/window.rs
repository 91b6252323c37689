//! Display windowing: rewind and day limits.

/// Returns the part of `values` that is shown on screen.
///
/// The last `rewind` points are dropped first, then only the last
/// `display_days` of the remainder are kept (`0` keeps everything).
pub fn visible<T>(values: &[T], rewind: usize, display_days: usize) -> &[T] {
    let end = values.len().saturating_sub(rewind);
    let start = if display_days == 0 {
        0
    } else {
        end.saturating_sub(display_days)
    };
    &values[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES: [i64; 6] = [1, 2, 3, 4, 5, 6];

    #[test]
    fn test_no_rewind_no_limit_is_identity() {
        assert_eq!(visible(&SERIES, 0, 0), &SERIES);
    }

    #[test]
    fn test_rewind_drops_tail() {
        assert_eq!(visible(&SERIES, 2, 0), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_limit_keeps_last_days() {
        assert_eq!(visible(&SERIES, 0, 3), &[4, 5, 6]);
        assert_eq!(visible(&SERIES, 1, 3), &[3, 4, 5]);
    }

    #[test]
    fn test_limit_larger_than_remaining() {
        assert_eq!(visible(&SERIES, 4, 10), &[1, 2]);
    }

    #[test]
    fn test_lengths() {
        for rewind in 0..=SERIES.len() {
            for days in 0..8 {
                let remaining = SERIES.len() - rewind;
                let expected = if days == 0 { remaining } else { days.min(remaining) };
                assert_eq!(visible(&SERIES, rewind, days).len(), expected);
            }
        }
    }

    #[test]
    fn test_rewind_past_start_is_empty() {
        assert!(visible(&SERIES, 9, 0).is_empty());
    }
}
