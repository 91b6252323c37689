use crate::error::DataError;

/// Parses one count cell. Empty cells count as zero; anything else must be an integer.
pub fn parse_count(cell: &str, row: usize, column: usize) -> Result<i64, DataError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| DataError::InvalidCount {
        row,
        column,
        value: cell.to_string(),
    })
}

/// Adds `values` into `totals` day by day. Both must have the same length.
///
/// `row` and `first_column` locate `values` in the source for error reporting.
pub fn add_into(
    totals: &mut [i64],
    values: &[i64],
    row: usize,
    first_column: usize,
) -> Result<(), DataError> {
    debug_assert_eq!(totals.len(), values.len());
    for (day, (total, value)) in totals.iter_mut().zip(values).enumerate() {
        *total = total.checked_add(*value).ok_or(DataError::Overflow {
            row,
            column: first_column + day,
        })?;
    }
    Ok(())
}
