// ==============================================================================
// parsers/tabular.rs - Tab-Delimited BioAssay Table Reader
// ==============================================================================
// Description: Shared column reader used by every BioAssay input format
// Created: 2025-11-06
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================
// Format: header line of column names followed by data rows
// Example:
//   "ID"    "Name"    "Mnorm"    "A"
//   g1      gene one  0.532      11.2
//   g2      gene two  -1.05      9.87
// ==============================================================================

use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

use crate::formats::{ColumnType, TabularLayout};
use crate::models::{BioAssay, FieldData};

use super::ReadError;

/// Markers read as missing numeric values
const MISSING_VALUES: [&str; 3] = ["NA", "NAN", "ERROR"];

/// Options shared by all tabular readers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabularOptions {
    /// Read every column instead of the layout defaults
    pub all_fields: bool,
    /// ',' is the decimal separator
    pub comma_decimal: bool,
}

/// Read a header line and data rows into a BioAssay
///
/// # Arguments
/// * `input` - Stream positioned on the column header line
/// * `layout` - Column layout of the format
/// * `options` - Field selection and decimal separator
/// * `lines_before` - Lines already consumed from the file (for error lines)
pub fn read_table<R: Read>(
    input: R,
    layout: &TabularLayout,
    options: TabularOptions,
    lines_before: usize,
) -> Result<BioAssay, ReadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::EmptyFile);
    }

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(ReadError::DuplicateColumn(header.clone()));
        }
    }

    // Columns to keep: (index in row, column name)
    let selected: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| options.all_fields || layout.reads_by_default(h))
        .map(|(i, h)| (i, h.as_str()))
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); selected.len()];
    let mut line_numbers = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0)
            + lines_before;

        for (slot, (index, _)) in selected.iter().enumerate() {
            let value = record.get(*index).unwrap_or("");
            cells[slot].push(value.trim_matches('"').to_string());
        }
        line_numbers.push(line);
    }

    debug!(
        "Read {} rows, {} of {} columns",
        line_numbers.len(),
        selected.len(),
        headers.len()
    );

    let mut bioassay = BioAssay::new();
    for ((_, column), values) in selected.into_iter().zip(cells) {
        let data = convert_column(column, values, layout.column_type(column), options, &line_numbers)?;
        bioassay.set_field(layout.field_name(column), data)?;
    }

    Ok(bioassay)
}

/// Convert raw cells of one column to typed data
fn convert_column(
    column: &str,
    values: Vec<String>,
    column_type: ColumnType,
    options: TabularOptions,
    line_numbers: &[usize],
) -> Result<FieldData, ReadError> {
    let invalid = |row: usize, value: &str| ReadError::InvalidNumber {
        line: line_numbers.get(row).copied().unwrap_or(0),
        column: column.to_string(),
        value: value.to_string(),
    };

    match column_type {
        ColumnType::String => Ok(FieldData::String(values)),
        ColumnType::Int => {
            let mut ints = Vec::with_capacity(values.len());
            for (row, value) in values.iter().enumerate() {
                ints.push(parse_int(value).ok_or_else(|| invalid(row, value))?);
            }
            Ok(FieldData::Int(ints))
        }
        ColumnType::Double => {
            let mut doubles = Vec::with_capacity(values.len());
            for (row, value) in values.iter().enumerate() {
                doubles.push(
                    parse_double(value, options.comma_decimal).ok_or_else(|| invalid(row, value))?,
                );
            }
            Ok(FieldData::Double(doubles))
        }
        ColumnType::Inferred => Ok(infer_column(values, options.comma_decimal)),
    }
}

/// Doubles if every non-empty cell is numeric, strings otherwise
fn infer_column(values: Vec<String>, comma_decimal: bool) -> FieldData {
    let parsed: Option<Vec<f64>> = values
        .iter()
        .map(|v| parse_double(v, comma_decimal))
        .collect();

    match parsed {
        Some(doubles) if values.iter().any(|v| !is_missing(v)) => FieldData::Double(doubles),
        _ => FieldData::String(values),
    }
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || MISSING_VALUES.contains(&value.to_uppercase().as_str())
}

/// Parse an integer cell (GenePix sometimes writes "123.0")
pub(crate) fn parse_int(value: &str) -> Option<i32> {
    let value = value.trim();
    value.parse::<i32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
            .map(|v| v as i32)
    })
}

/// Parse a double cell; missing markers become NaN
pub(crate) fn parse_double(value: &str, comma_decimal: bool) -> Option<f64> {
    if is_missing(value) {
        return Some(f64::NAN);
    }
    let value = value.trim();
    if comma_decimal {
        value.replace(',', ".").parse::<f64>().ok()
    } else {
        value.parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{GENERIC_LAYOUT, IDMA_LAYOUT};

    #[test]
    fn test_default_fields_only() {
        let contents = "ID\tName\tR\tRb\tG\tGb\tMnorm\tA\n\
g1\tgene one\t1200\t80\t900\t75\t0.41\t10.1\n\
g2\tgene two\t300\t82\t700\t70\t-1.22\t8.7\n";

        let ba = read_table(contents.as_bytes(), &IDMA_LAYOUT, TabularOptions::default(), 0).unwrap();

        assert_eq!(ba.size(), 2);
        assert!(ba.contains_field("id"));
        assert!(ba.contains_field("description"));
        assert!(ba.contains_field("R"));
        assert!(!ba.contains_field("Rb"));
        assert_eq!(ba.doubles("m").unwrap(), &[0.41, -1.22]);
        assert_eq!(ba.ints("G").unwrap(), &[900, 700]);
    }

    #[test]
    fn test_all_fields() {
        let contents = "ID\tR\tRb\tMnorm\tComment\n\
g1\t1200\t80\t0.41\tok\n";
        let options = TabularOptions {
            all_fields: true,
            ..Default::default()
        };

        let ba = read_table(contents.as_bytes(), &IDMA_LAYOUT, options, 0).unwrap();
        assert_eq!(ba.field_names(), vec!["id", "R", "Rb", "m", "Comment"]);
        assert_eq!(ba.strings("Comment").unwrap(), &["ok"]);
    }

    #[test]
    fn test_comma_decimal_separator() {
        let contents = "ID\tMnorm\tA\ng1\t0,5\t10,25\n";
        let options = TabularOptions {
            comma_decimal: true,
            ..Default::default()
        };

        let ba = read_table(contents.as_bytes(), &IDMA_LAYOUT, options, 0).unwrap();
        assert_eq!(ba.doubles("m").unwrap(), &[0.5]);
        assert_eq!(ba.doubles("a").unwrap(), &[10.25]);
    }

    #[test]
    fn test_comma_without_flag_is_an_error() {
        let contents = "ID\tMnorm\ng1\t0,5\n";

        let result = read_table(contents.as_bytes(), &IDMA_LAYOUT, TabularOptions::default(), 3);
        match result.unwrap_err() {
            ReadError::InvalidNumber { line, column, value } => {
                assert_eq!(line, 5);
                assert_eq!(column, "Mnorm");
                assert_eq!(value, "0,5");
            }
            other => panic!("Expected InvalidNumber error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_values_are_nan() {
        let contents = "ID\tMnorm\tA\ng1\tNA\t\ng2\t1.5\tNaN\n";

        let ba = read_table(contents.as_bytes(), &IDMA_LAYOUT, TabularOptions::default(), 0).unwrap();
        let m = ba.doubles("m").unwrap();
        assert!(m[0].is_nan());
        assert_eq!(m[1], 1.5);
        assert!(ba.doubles("a").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_duplicate_columns() {
        let contents = "ID\tMnorm\tMnorm\ng1\t1\t2\n";

        let result = read_table(contents.as_bytes(), &IDMA_LAYOUT, TabularOptions::default(), 0);
        match result.unwrap_err() {
            ReadError::DuplicateColumn(name) => assert_eq!(name, "Mnorm"),
            other => panic!("Expected DuplicateColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_headers_and_short_rows() {
        let contents = "\"ID\"\t\"Name\"\t\"Mnorm\"\n\"g1\"\t\"gene one\"\t0.25\n\"g2\"\t\"gene two\"\n";

        let result = read_table(contents.as_bytes(), &IDMA_LAYOUT, TabularOptions::default(), 0);
        let ba = result.unwrap();
        assert_eq!(ba.strings("id").unwrap(), &["g1", "g2"]);
        assert_eq!(ba.strings("description").unwrap()[0], "gene one");
        assert!(ba.doubles("m").unwrap()[1].is_nan());
    }

    #[test]
    fn test_generic_layout_infers_types() {
        let contents = "id\tscore\tlabel\ng1\t1.5\tup\ng2\t\tdown\n";

        let ba = read_table(contents.as_bytes(), &GENERIC_LAYOUT, TabularOptions::default(), 0).unwrap();
        assert_eq!(ba.strings("id").unwrap(), &["g1", "g2"]);
        assert_eq!(ba.doubles("score").unwrap()[0], 1.5);
        assert!(ba.doubles("score").unwrap()[1].is_nan());
        assert_eq!(ba.strings("label").unwrap(), &["up", "down"]);
    }

    #[test]
    fn test_parse_int_accepts_integral_floats() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("42.0"), Some(42));
        assert_eq!(parse_int("42.5"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-2147483648"), Some(i32::MIN));
    }

    #[test]
    fn test_parse_int_rejects_out_of_range_values() {
        assert_eq!(parse_int("3000000000"), None);
        assert_eq!(parse_int("1e12"), None);
        assert_eq!(parse_int("inf"), None);
    }

    #[test]
    fn test_out_of_range_int_cell_is_an_error() {
        let contents = "ID\tR\ng1\t12\ng2\t3000000000\n";
        let options = TabularOptions {
            all_fields: true,
            ..Default::default()
        };

        let result = read_table(contents.as_bytes(), &IDMA_LAYOUT, options, 0);
        match result.unwrap_err() {
            ReadError::InvalidNumber { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "3000000000");
            }
            other => panic!("Expected InvalidNumber error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_marker_is_not_missing() {
        assert!(is_missing("na"));
        assert!(is_missing("Error"));
        assert!(!is_missing("NULL"));
    }
}
