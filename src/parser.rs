//! CSV parser for the published time-series files.
//!
//! Record 0 is the header (`Province/State, Country/Region, Lat, Long, dates...`),
//! every following record is one reporting region.

use csv::ReaderBuilder;

use crate::error::DataError;

/// One parsed CSV line, fields in file order.
pub type Record = Vec<String>;

/// Decodes `bytes` as UTF-8 and parses them into records.
///
/// Lines starting with the delimiter (rows without a province/state) get a
/// single space prepended, so the region is kept under the name `" "` instead
/// of an empty field.
///
/// # Errors
///
/// Returns an error if the body is not UTF-8 or is not well-formed CSV,
/// including rows whose column count differs from the header's.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>, DataError> {
    let text = std::str::from_utf8(bytes)?;
    let normalized = normalize_lines(text.trim_start_matches('\u{feff}'));

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(normalized.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(records)
}

fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        if line.starts_with(',') {
            out.push(' ');
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_and_rows() {
        let csv = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
                   Hubei,China,30.9,112.2,444,444\n";
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0][4], "1/22/20");
        assert_eq!(records[1][0], "Hubei");
        assert_eq!(records[1][1], "China");
    }

    #[test]
    fn test_missing_region_becomes_single_space() {
        let csv = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n,US,37,-95,10,20\n";
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records[1], vec![" ", "US", "37", "-95", "10", "20"]);
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let csv = "Province/State,Country/Region,Lat,Long,1/22/20\n\
                   \"Bonaire, Sint Eustatius and Saba\",Netherlands,12.2,-68.3,0\n";
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records[1][0], "Bonaire, Sint Eustatius and Saba");
        assert_eq!(records[1][1], "Netherlands");
    }

    #[test]
    fn test_crlf_and_bom_are_tolerated() {
        let csv = "\u{feff}Province/State,Country/Region,Lat,Long,1/22/20\r\n,Italy,43,12,3\r\n";
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records[0][0], "Province/State");
        assert_eq!(records[1], vec![" ", "Italy", "43", "12", "3"]);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let result = parse_records(&[0xFF, 0xFE, b',', b'a']);
        assert!(matches!(result, Err(DataError::Utf8(_))));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\nHubei,China,30.9,112.2,444\n";
        let result = parse_records(csv.as_bytes());
        assert!(matches!(result, Err(DataError::Csv(_))));
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(parse_records(b"").unwrap().is_empty());
    }
}
