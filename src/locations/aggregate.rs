use std::collections::BTreeMap;

use tracing::debug;

use crate::error::DataError;
use crate::locations::types::{LocationTable, Series};
use crate::locations::utility::{add_into, parse_count};
use crate::parser::Record;

/// Columns before the first date: region, country, latitude, longitude.
pub const LEADING_COLUMNS: usize = 4;

/// Aggregates parsed records into a [`LocationTable`].
///
/// Record 0 supplies the date labels. Each further record is one region whose
/// counts are kept under `(country, region)` and summed into its country's
/// total and into the worldwide total. When a `(country, region)` pair appears
/// more than once, the last row is kept as the region series while every row
/// still counts toward the totals.
///
/// # Errors
///
/// Fails on a missing or short header, on rows whose width differs from the
/// header, on count cells that are neither empty nor an integer, and on totals
/// that do not fit in an `i64`.
pub fn aggregate_records(records: &[Record]) -> Result<LocationTable, DataError> {
    let (header_row, rows) = records.split_first().ok_or(DataError::MissingHeader)?;
    if header_row.len() < LEADING_COLUMNS {
        return Err(DataError::ShortHeader {
            found: header_row.len(),
        });
    }

    let header: Vec<String> = header_row[LEADING_COLUMNS..].to_vec();
    let days = header.len();
    let expected = header_row.len();

    let mut subregions: BTreeMap<(String, String), Series> = BTreeMap::new();
    let mut totals: BTreeMap<String, Series> = BTreeMap::new();
    let mut worldwide = vec![0; days];

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        if row.len() != expected {
            return Err(DataError::ColumnCount {
                row: row_number,
                found: row.len(),
                expected,
            });
        }

        let series = row[LEADING_COLUMNS..]
            .iter()
            .enumerate()
            .map(|(offset, cell)| parse_count(cell, row_number, LEADING_COLUMNS + offset))
            .collect::<Result<Series, _>>()?;

        let region = row[0].clone();
        let country = row[1].clone();

        add_into(
            totals.entry(country.clone()).or_insert_with(|| vec![0; days]),
            &series,
            row_number,
            LEADING_COLUMNS,
        )?;
        add_into(&mut worldwide, &series, row_number, LEADING_COLUMNS)?;
        subregions.insert((country, region), series);
    }

    debug!(
        rows = rows.len(),
        countries = totals.len(),
        regions = subregions.len(),
        days,
        "Aggregated time series"
    );

    Ok(LocationTable {
        header,
        subregions,
        totals,
        worldwide,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::types::LocationKey;

    fn rec(fields: &[&str]) -> Record {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn header() -> Record {
        rec(&["Province/State", "Country/Region", "Lat", "Long", "1/22/20", "1/23/20"])
    }

    #[test]
    fn test_two_countries_scenario() {
        let records = vec![
            header(),
            rec(&["", "US", "0", "0", "5", "10"]),
            rec(&["Hubei", "China", "0", "0", "100", "150"]),
        ];
        let table = aggregate_records(&records).unwrap();

        assert_eq!(table.header(), &["1/22/20", "1/23/20"]);
        assert_eq!(table.country_total("US"), Some(&[5, 10][..]));
        assert_eq!(table.country_total("China"), Some(&[100, 150][..]));
        assert_eq!(table.worldwide_total(), &[105, 160]);
        assert_eq!(table.subregion("China", "Hubei"), Some(&[100, 150][..]));
    }

    #[test]
    fn test_country_total_sums_regions() {
        let records = vec![
            header(),
            rec(&["Ontario", "Canada", "0", "0", "1", "2"]),
            rec(&["Quebec", "Canada", "0", "0", "3", "4"]),
            rec(&["", "Italy", "0", "0", "5", "6"]),
        ];
        let table = aggregate_records(&records).unwrap();

        let summed = table
            .subregions_of("Canada")
            .fold(vec![0, 0], |mut acc, (_, series)| {
                add_into(&mut acc, series, 0, LEADING_COLUMNS).unwrap();
                acc
            });
        assert_eq!(table.country_total("Canada"), Some(&summed[..]));
        assert_eq!(summed, vec![4, 6]);

        let mut world = vec![0, 0];
        for country in table.countries() {
            add_into(&mut world, table.country_total(country).unwrap(), 0, LEADING_COLUMNS)
                .unwrap();
        }
        assert_eq!(table.worldwide_total(), &world[..]);
    }

    #[test]
    fn test_empty_cells_count_as_zero() {
        let records = vec![header(), rec(&["", "Iran", "0", "0", "", "7"])];
        let table = aggregate_records(&records).unwrap();
        assert_eq!(table.country_total("Iran"), Some(&[0, 7][..]));
    }

    #[test]
    fn test_normalized_blank_region_is_kept() {
        let records = vec![
            header(),
            rec(&[" ", "US", "37", "-95", "10", "20"]),
            rec(&["Guam", "US", "13", "144", "1", "1"]),
        ];
        let table = aggregate_records(&records).unwrap();

        assert_eq!(table.subregion("US", " "), Some(&[10, 20][..]));
        assert_eq!(table.subregion("US", "Guam"), Some(&[1, 1][..]));
        assert_eq!(table.country_total("US"), Some(&[11, 21][..]));
    }

    #[test]
    fn test_duplicate_region_keeps_last_row_but_sums_all() {
        let records = vec![
            header(),
            rec(&["X", "Spain", "0", "0", "1", "1"]),
            rec(&["X", "Spain", "0", "0", "2", "2"]),
        ];
        let table = aggregate_records(&records).unwrap();

        assert_eq!(table.subregion("Spain", "X"), Some(&[2, 2][..]));
        assert_eq!(table.country_total("Spain"), Some(&[3, 3][..]));
    }

    #[test]
    fn test_header_only_gives_zero_worldwide() {
        let table = aggregate_records(&[header()]).unwrap();
        assert_eq!(table.worldwide_total(), &[0, 0]);
        assert_eq!(table.countries().count(), 0);
    }

    #[test]
    fn test_every_series_matches_header_length() {
        let records = vec![
            header(),
            rec(&["A", "France", "0", "0", "1", "2"]),
            rec(&["", "Peru", "0", "0", "3", "4"]),
        ];
        let table = aggregate_records(&records).unwrap();
        for key in table.keys() {
            if let Some(series) = table.series(&key) {
                assert_eq!(series.len(), table.days(), "{key}");
            }
        }
        assert!(table.series(&LocationKey::WorldwideTotal).is_some());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            aggregate_records(&[]),
            Err(DataError::MissingHeader)
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            aggregate_records(&[rec(&["a", "b"])]),
            Err(DataError::ShortHeader { found: 2 })
        ));
    }

    #[test]
    fn test_column_count_mismatch() {
        let records = vec![header(), rec(&["", "US", "0", "0", "5"])];
        assert!(matches!(
            aggregate_records(&records),
            Err(DataError::ColumnCount {
                row: 1,
                found: 5,
                expected: 6
            })
        ));
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let records = vec![
            rec(&["Province/State", "Country/Region", "Lat", "Long", "1/22/20"]),
            rec(&["A", "X", "0", "0", "5000000000000000000"]),
            rec(&["B", "X", "0", "0", "5000000000000000000"]),
        ];
        assert!(matches!(
            aggregate_records(&records),
            Err(DataError::Overflow { row: 2, column: 4 })
        ));
    }

    #[test]
    fn test_non_numeric_cell_fails() {
        let records = vec![header(), rec(&["", "US", "0", "0", "5", "ten"])];
        assert!(matches!(
            aggregate_records(&records),
            Err(DataError::InvalidCount { row: 1, column: 5, .. })
        ));
    }
}
