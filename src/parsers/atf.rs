// ==============================================================================
// parsers/atf.rs - GenePix ATF Parser (GPR and GAL files)
// ==============================================================================
// Description: Parser for Axon Text File containers used by GenePix
// Created: 2025-11-04
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================
// Format: two fixed lines, N quoted header records, then a tab-delimited table
// Example:
//   ATF    1.0
//   3      5
//   "Type=GenePix Results 3"
//   "DateTime=2006/03/21 15:02:11"
//   "GalFile=array.gal"
//   "Block"  "Column"  "Row"  "Name"  "ID"
//   1        1         1      "gene"  "g1"
// ==============================================================================

use std::io::BufRead;
use tracing::debug;

use crate::formats::{TabularLayout, GAL_LAYOUT, GPR_LAYOUT};
use crate::models::{Annotation, BioAssay};

use super::tabular::{read_table, TabularOptions};
use super::{BioAssayReader, ReadError};

/// First token of every ATF file
pub const ATF_MAGIC: &str = "ATF";

/// Reader for GenePix ATF files (.gpr results and .gal array lists)
pub struct AtfReader<R> {
    input: R,
    layout: &'static TabularLayout,
    options: TabularOptions,
}

impl<R: BufRead> AtfReader<R> {
    /// GenePix Results reader
    pub fn gpr(input: R) -> Self {
        Self {
            input,
            layout: &GPR_LAYOUT,
            options: TabularOptions::default(),
        }
    }

    /// GenePix Array List reader
    pub fn gal(input: R) -> Self {
        Self {
            input,
            layout: &GAL_LAYOUT,
            options: TabularOptions::default(),
        }
    }

    /// Read the ATF preamble and header records
    ///
    /// # Returns
    /// * `Ok((annotation, lines))` - Header records and number of lines consumed
    fn read_header(&mut self) -> Result<(Annotation, usize), ReadError> {
        let mut line_number = 0;

        let magic = next_line(&mut self.input, &mut line_number)?.ok_or(ReadError::EmptyFile)?;
        if !magic.trim().starts_with(ATF_MAGIC) {
            return Err(ReadError::InvalidHeader {
                line: line_number,
                details: format!("Expected '{}' magic, found '{}'", ATF_MAGIC, magic.trim()),
            });
        }

        let counts = next_line(&mut self.input, &mut line_number)?.ok_or(ReadError::InvalidHeader {
            line: 2,
            details: "Missing record counts".to_string(),
        })?;
        let header_records = counts
            .split_whitespace()
            .next()
            .and_then(|n| n.trim_matches('"').parse::<usize>().ok())
            .ok_or_else(|| ReadError::InvalidHeader {
                line: line_number,
                details: format!("Invalid record counts: '{}'", counts.trim()),
            })?;

        let mut annotation = Annotation::new();
        for _ in 0..header_records {
            let record = next_line(&mut self.input, &mut line_number)?.ok_or_else(|| {
                ReadError::InvalidHeader {
                    line: line_number + 1,
                    details: "Unexpected end of header records".to_string(),
                }
            })?;
            let record = record.trim().trim_matches('"');
            match record.split_once('=') {
                Some((key, value)) => annotation.set(key.trim(), value),
                None => annotation.set(record.trim(), ""),
            }
        }

        debug!("Read {} ATF header records", annotation.len());
        Ok((annotation, line_number))
    }
}

impl<R: BufRead> BioAssayReader for AtfReader<R> {
    fn add_all_fields_to_read(&mut self) {
        self.options.all_fields = true;
    }

    fn set_comma_decimal_separator(&mut self, comma: bool) {
        self.options.comma_decimal = comma;
    }

    fn read(mut self: Box<Self>) -> Result<BioAssay, ReadError> {
        let (annotation, lines) = self.read_header()?;
        let mut bioassay = read_table(&mut self.input, self.layout, self.options, lines)?;
        *bioassay.annotation_mut() = annotation;
        Ok(bioassay)
    }
}

/// Read one line without its terminator, counting lines
fn next_line<R: BufRead>(input: &mut R, line_number: &mut usize) -> Result<Option<String>, std::io::Error> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    *line_number += 1;
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
