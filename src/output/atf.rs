// ==============================================================================
// output/atf.rs - GenePix ATF Writer (GPR and GAL files)
// ==============================================================================
// Description: Writes BioAssays as Axon Text Files readable by GenePix
// Created: 2025-11-07
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================

use csv::QuoteStyle;
use std::io::Write;
use std::sync::Arc;

use crate::formats::{TabularLayout, GAL_LAYOUT, GPR_LAYOUT};
use crate::models::BioAssay;
use crate::parsers::atf::ATF_MAGIC;
use crate::translator::Translator;

use super::table::Table;
use super::{BioAssayWriter, WriteError};

/// ATF version written in the first line
pub const ATF_VERSION: &str = "1.0";

/// Header key holding the file type
pub const TYPE_KEY: &str = "Type";

/// Type record of GenePix Results files
pub const GPR_TYPE: &str = "GenePix Results 3";

/// Type record of GenePix Array List files
pub const GAL_TYPE: &str = "GenePix ArrayList V1.0";

/// Writer for GenePix ATF files (.gpr results and .gal array lists)
pub struct AtfWriter<W> {
    output: W,
    layout: &'static TabularLayout,
    file_type: &'static str,
    all_fields: bool,
    translator: Option<Arc<dyn Translator>>,
}

impl<W: Write> AtfWriter<W> {
    pub fn gpr(output: W) -> Self {
        Self::new(output, &GPR_LAYOUT, GPR_TYPE)
    }

    pub fn gal(output: W) -> Self {
        Self::new(output, &GAL_LAYOUT, GAL_TYPE)
    }

    fn new(output: W, layout: &'static TabularLayout, file_type: &'static str) -> Self {
        Self {
            output,
            layout,
            file_type,
            all_fields: false,
            translator: None,
        }
    }

    /// Header records to write, with the Type record first when it was absent
    fn header_records(&self, bioassay: &BioAssay) -> Vec<(String, String)> {
        let annotation = bioassay.annotation();
        let mut records = Vec::with_capacity(annotation.len() + 1);
        if !annotation.contains(TYPE_KEY) {
            records.push((TYPE_KEY.to_string(), self.file_type.to_string()));
        }
        records.extend(annotation.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        records
    }
}

impl<W: Write> BioAssayWriter for AtfWriter<W> {
    fn add_all_fields_to_write(&mut self) {
        self.all_fields = true;
    }

    fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translator = Some(translator);
    }

    fn write(mut self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError> {
        let mut table = Table::new(bioassay, self.layout, self.all_fields);
        if let Some(translator) = &self.translator {
            table.add_translation(bioassay, translator.as_ref());
        }

        let records = self.header_records(bioassay);
        writeln!(self.output, "{}\t{}", ATF_MAGIC, ATF_VERSION)?;
        writeln!(self.output, "{}\t{}", records.len(), table.headers().len())?;
        for (key, value) in &records {
            writeln!(self.output, "\"{}={}\"", key, value)?;
        }

        table.write_tsv(&mut self.output, QuoteStyle::NonNumeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field;
    use crate::parsers::{AtfReader, BioAssayReader};
    use std::io::Cursor;

    fn gpr_sample() -> BioAssay {
        let mut ba = BioAssay::with_name("slide.gpr");
        ba.annotation_mut().set("Type", "GenePix Results 3");
        ba.annotation_mut().set("Creator", "GenePix Pro 6.0");
        ba.set_ints("Block", vec![1, 1]).unwrap();
        ba.set_strings(field::ID, vec!["g1".into(), "g2".into()]).unwrap();
        ba.set_strings(field::DESCRIPTION, vec!["gene one".into(), "gene two".into()]).unwrap();
        ba.set_ints(field::RED, vec![1200, 340]).unwrap();
        ba.set_ints(field::GREEN, vec![900, 410]).unwrap();
        ba.set_ints(field::FLAGS, vec![0, -100]).unwrap();
        ba
    }

    fn write_to_string(writer: Box<AtfWriter<&mut Vec<u8>>>, ba: &BioAssay) {
        writer.write(ba).unwrap();
    }

    #[test]
    fn test_write_gpr_header_and_table() {
        let ba = gpr_sample();
        let mut out = Vec::new();
        write_to_string(Box::new(AtfWriter::gpr(&mut out)), &ba);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ATF\t1.0");
        assert_eq!(lines[1], "2\t6");
        assert_eq!(lines[2], "\"Type=GenePix Results 3\"");
        assert_eq!(lines[3], "\"Creator=GenePix Pro 6.0\"");
        assert_eq!(
            lines[4],
            "\"Block\"\t\"Name\"\t\"ID\"\t\"F635 Median\"\t\"F532 Median\"\t\"Flags\""
        );
        assert_eq!(lines[5], "1\t\"gene one\"\t\"g1\"\t1200\t900\t0");
    }

    #[test]
    fn test_gal_type_added_when_absent() {
        let mut ba = BioAssay::with_name("array.gal");
        ba.set_strings(field::ID, vec!["g1".into()]).unwrap();

        let mut out = Vec::new();
        write_to_string(Box::new(AtfWriter::gal(&mut out)), &ba);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ATF\t1.0\n1\t1\n\"Type=GenePix ArrayList V1.0\"\n"));
    }

    #[test]
    fn test_written_gpr_reads_back() {
        let ba = gpr_sample();
        let mut out = Vec::new();
        write_to_string(Box::new(AtfWriter::gpr(&mut out)), &ba);

        let reader: Box<dyn BioAssayReader> = Box::new(AtfReader::gpr(Cursor::new(out)));
        let read = reader.read().unwrap();

        assert_eq!(read.annotation().get("Creator"), Some("GenePix Pro 6.0"));
        assert_eq!(read.strings(field::ID).unwrap(), &["g1", "g2"]);
        assert_eq!(read.ints(field::FLAGS).unwrap(), &[0, -100]);
    }
}
