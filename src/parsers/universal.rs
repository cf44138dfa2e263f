// ==============================================================================
// parsers/universal.rs - Format-Sniffing BioAssay Reader
// ==============================================================================
// Description: Reads a BioAssay file of unknown type by inspecting its header
// Created: 2025-11-07
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================
// Detection order (first non-empty line):
//   1. "ATF ..."          -> GPR if a "Type=GenePix Results" record exists, else GAL
//   2. contains medianMnorm -> total.summary
//   3. contains Mnorm       -> IDMA
//   4. anything else        -> generic tab table
// ==============================================================================

use std::io::{BufRead, Cursor};
use tracing::debug;

use crate::models::BioAssay;

use super::atf::{AtfReader, ATF_MAGIC};
use super::delimited::DelimitedReader;
use super::tabular::TabularOptions;
use super::{BioAssayReader, ReadError};

/// Detected layout of a file read by the universal reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Gpr,
    Gal,
    Idma,
    TotalSummary,
    Generic,
}

/// Inspect the beginning of a file and guess its format
pub fn detect_format(contents: &str) -> DetectedFormat {
    let mut lines = contents.lines().filter(|l| !l.trim().is_empty());

    let first = match lines.next() {
        Some(line) => line.trim(),
        None => return DetectedFormat::Generic,
    };

    if first.starts_with(ATF_MAGIC) {
        let is_gpr = lines
            .take_while(|l| l.trim_start().starts_with('"') || l.trim_start().starts_with(char::is_numeric))
            .any(|l| l.trim().trim_matches('"').starts_with("Type=GenePix Results"));
        return if is_gpr {
            DetectedFormat::Gpr
        } else {
            DetectedFormat::Gal
        };
    }

    let columns: Vec<&str> = first.split('\t').map(|c| c.trim().trim_matches('"')).collect();
    if columns.contains(&"medianMnorm") {
        DetectedFormat::TotalSummary
    } else if columns.contains(&"Mnorm") {
        DetectedFormat::Idma
    } else {
        DetectedFormat::Generic
    }
}

/// Reader that delegates to the reader of the detected format
pub struct UniversalReader<R> {
    input: R,
    options: TabularOptions,
}

impl<R: BufRead> UniversalReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            options: TabularOptions::default(),
        }
    }
}

impl<R: BufRead> BioAssayReader for UniversalReader<R> {
    fn add_all_fields_to_read(&mut self) {
        self.options.all_fields = true;
    }

    fn set_comma_decimal_separator(&mut self, comma: bool) {
        self.options.comma_decimal = comma;
    }

    fn read(mut self: Box<Self>) -> Result<BioAssay, ReadError> {
        let mut contents = String::new();
        self.input.read_to_string(&mut contents)?;

        let detected = detect_format(&contents);
        debug!("Universal reader detected {:?}", detected);

        let input = Cursor::new(contents);
        let mut reader: Box<dyn BioAssayReader> = match detected {
            DetectedFormat::Gpr => Box::new(AtfReader::gpr(input)),
            DetectedFormat::Gal => Box::new(AtfReader::gal(input)),
            DetectedFormat::Idma => Box::new(DelimitedReader::idma(input)),
            DetectedFormat::TotalSummary => Box::new(DelimitedReader::total_summary(input)),
            DetectedFormat::Generic => Box::new(DelimitedReader::generic(input)),
        };

        if self.options.all_fields {
            reader.add_all_fields_to_read();
        }
        reader.set_comma_decimal_separator(self.options.comma_decimal);
        reader.read()
    }
}
