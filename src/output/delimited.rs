// ==============================================================================
// output/delimited.rs - Goulphar IDMA Writer
// ==============================================================================
// Description: Writes BioAssays as single-header tab files (ID, Mnorm, A, ...)
// Created: 2025-11-07
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================

use csv::QuoteStyle;
use std::io::Write;
use std::sync::Arc;

use crate::formats::{TabularLayout, IDMA_LAYOUT};
use crate::models::BioAssay;
use crate::translator::Translator;

use super::table::Table;
use super::{BioAssayWriter, WriteError};

/// Writer for Goulphar ID-M-A files
pub struct IdmaWriter<W> {
    output: W,
    layout: &'static TabularLayout,
    all_fields: bool,
    translator: Option<Arc<dyn Translator>>,
}

impl<W: Write> IdmaWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            layout: &IDMA_LAYOUT,
            all_fields: false,
            translator: None,
        }
    }
}

impl<W: Write> BioAssayWriter for IdmaWriter<W> {
    fn add_all_fields_to_write(&mut self) {
        self.all_fields = true;
    }

    fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translator = Some(translator);
    }

    fn write(self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError> {
        let mut table = Table::new(bioassay, self.layout, self.all_fields);
        if let Some(translator) = &self.translator {
            table.add_translation(bioassay, translator.as_ref());
        }
        table.write_tsv(self.output, QuoteStyle::Necessary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field;
    use crate::translator::MultiColumnTranslator;

    fn sample() -> BioAssay {
        let mut ba = BioAssay::with_name("slide.idma");
        ba.set_strings(field::ID, vec!["g1".into(), "g2".into()]).unwrap();
        ba.set_strings(field::DESCRIPTION, vec!["gene one".into(), "gene two".into()]).unwrap();
        ba.set_ints("Rb", vec![80, 90]).unwrap();
        ba.set_ints("R", vec![1200, 340]).unwrap();
        ba.set_doubles(field::A, vec![10.1, 8.25]).unwrap();
        ba.set_doubles(field::M, vec![0.41, f64::NAN]).unwrap();
        ba
    }

    #[test]
    fn test_write_default_fields() {
        let mut out = Vec::new();
        let writer: Box<dyn BioAssayWriter + '_> = Box::new(IdmaWriter::new(&mut out));
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "ID\tR\tMnorm\tA\ng1\t1200\t0.41\t10.1\ng2\t340\tNA\t8.25\n");
    }

    #[test]
    fn test_write_all_fields_in_idma_order() {
        let mut out = Vec::new();
        let mut writer: Box<dyn BioAssayWriter + '_> = Box::new(IdmaWriter::new(&mut out));
        writer.add_all_fields_to_write();
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, "ID\tName\tR\tRb\tMnorm\tA");
        assert!(text.contains("g1\tgene one\t1200\t80\t0.41\t10.1\n"));
    }

    #[test]
    fn test_write_with_translator() {
        let mut translator = MultiColumnTranslator::new(vec!["ID".into(), "Gene".into()]).unwrap();
        translator.add_row(vec!["g2".into(), "TUB2".into()]);

        let mut out = Vec::new();
        let mut writer: Box<dyn BioAssayWriter + '_> = Box::new(IdmaWriter::new(&mut out));
        writer.set_translator(Arc::new(translator));
        writer.write(&sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID\tR\tMnorm\tA\tGene");
        assert_eq!(lines[1], "g1\t1200\t0.41\t10.1\t");
        assert_eq!(lines[2], "g2\t340\tNA\t8.25\tTUB2");
    }
}
