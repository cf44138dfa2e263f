// ==============================================================================
// parsers/delimited.rs - Goulphar and Generic Table Parsers
// ==============================================================================
// Description: Readers for single-header tab files (IDMA, total.summary, other)
// Created: 2025-11-06
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================
// Formats:
//   IDMA:          ID  Name  R  Rb  G  Gb  Mnorm  A
//   total.summary: Name  medianMnorm  medianA  SDMnorm  n  total n
// ==============================================================================

use std::io::BufRead;

use crate::formats::{TabularLayout, GENERIC_LAYOUT, IDMA_LAYOUT, TOTAL_SUMMARY_LAYOUT};
use crate::models::BioAssay;

use super::tabular::{read_table, TabularOptions};
use super::{BioAssayReader, ReadError};

/// Reader for tab files whose first line holds the column names
pub struct DelimitedReader<R> {
    input: R,
    layout: &'static TabularLayout,
    options: TabularOptions,
}

impl<R: BufRead> DelimitedReader<R> {
    /// Goulphar ID-M-A reader
    pub fn idma(input: R) -> Self {
        Self::with_layout(input, &IDMA_LAYOUT)
    }

    /// Goulphar total.summary reader
    pub fn total_summary(input: R) -> Self {
        Self::with_layout(input, &TOTAL_SUMMARY_LAYOUT)
    }

    /// Reader for any tab table, every column read and typed from content
    pub fn generic(input: R) -> Self {
        Self::with_layout(input, &GENERIC_LAYOUT)
    }

    pub fn with_layout(input: R, layout: &'static TabularLayout) -> Self {
        Self {
            input,
            layout,
            options: TabularOptions::default(),
        }
    }
}

impl<R: BufRead> BioAssayReader for DelimitedReader<R> {
    fn add_all_fields_to_read(&mut self) {
        self.options.all_fields = true;
    }

    fn set_comma_decimal_separator(&mut self, comma: bool) {
        self.options.comma_decimal = comma;
    }

    fn read(self: Box<Self>) -> Result<BioAssay, ReadError> {
        read_table(self.input, self.layout, self.options, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field;
    use std::io::Cursor;

    #[test]
    fn test_parse_idma() {
        let contents = "ID\tName\tR\tRb\tG\tGb\tMnorm\tA\n\
g1\tgene one\t1200\t80\t900\t75\t0.41\t10.1\n";

        let reader: Box<dyn BioAssayReader> = Box::new(DelimitedReader::idma(Cursor::new(contents)));
        let ba = reader.read().unwrap();

        assert_eq!(ba.field_names(), vec!["id", "description", "R", "G", "m", "a"]);
        assert_eq!(ba.doubles(field::A).unwrap(), &[10.1]);
    }

    #[test]
    fn test_parse_total_summary() {
        let contents = "\"Name\"\t\"medianMnorm\"\t\"medianA\"\t\"SDMnorm\"\t\"n\"\t\"total n\"\t\"extra\"\n\
\"g1\"\t0.5\t10.5\t0.12\t3\t4\tx\n\
\"g2\"\t-0.25\t9.75\tNA\t1\t4\ty\n";

        let reader: Box<dyn BioAssayReader> = Box::new(DelimitedReader::total_summary(Cursor::new(contents)));
        let ba = reader.read().unwrap();

        assert_eq!(ba.size(), 2);
        assert_eq!(ba.strings(field::ID).unwrap(), &["g1", "g2"]);
        assert_eq!(ba.doubles(field::M).unwrap(), &[0.5, -0.25]);
        assert_eq!(ba.doubles(field::A).unwrap(), &[10.5, 9.75]);
        assert!(ba.doubles(field::STD_DEV_M).unwrap()[1].is_nan());
        assert_eq!(ba.ints("total n").unwrap(), &[4, 4]);
        assert!(!ba.contains_field("extra"));
    }

    #[test]
    fn test_total_summary_comma_decimal() {
        let contents = "Name\tmedianMnorm\tmedianA\ng1\t0,5\t10,5\n";

        let mut reader: Box<dyn BioAssayReader> = Box::new(DelimitedReader::total_summary(Cursor::new(contents)));
        reader.set_comma_decimal_separator(true);
        let ba = reader.read().unwrap();

        assert_eq!(ba.doubles(field::M).unwrap(), &[0.5]);
    }

    #[test]
    fn test_empty_total_summary() {
        let reader: Box<dyn BioAssayReader> = Box::new(DelimitedReader::total_summary(Cursor::new("")));
        assert!(matches!(reader.read().unwrap_err(), ReadError::EmptyFile));
    }
}
