// ==============================================================================
// output/soft.rs - GEO SOFT Sample Writer
// ==============================================================================
// Description: Writes a BioAssay as a GEO SOFT sample block
// Created: 2025-11-08
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================
// Output:
//   ^SAMPLE = slide1
//   !Sample_title = slide1
//   !Sample_data_row_count = 2
//   #ID_REF = Spot identifier
//   #VALUE = Normalized log2 ratio (red/green)
//   !sample_table_begin
//   ID_REF  VALUE
//   g1      0.41
//   g2      -1.2
//   !sample_table_end
// ==============================================================================

use csv::QuoteStyle;
use std::io::Write;
use std::sync::Arc;

use crate::formats::TabularLayout;
use crate::models::{field, BioAssay};
use crate::translator::Translator;

use super::table::Table;
use super::{BioAssayWriter, WriteError};

/// Column layout of SOFT sample tables (write only)
pub const SOFT_LAYOUT: TabularLayout = TabularLayout {
    converter: &[
        ("ID_REF", field::ID),
        ("VALUE", field::M),
        ("A", field::A),
        ("RED", field::RED),
        ("GREEN", field::GREEN),
    ],
    default_read: &[],
    default_write: &["ID_REF", "VALUE", "A", "RED", "GREEN"],
    order: &["ID_REF", "VALUE", "A", "RED", "GREEN"],
    int_columns: &[],
    double_columns: &[],
    string_columns: &[],
};

/// Description line of a known SOFT column
fn column_description(column: &str) -> &str {
    match column {
        "ID_REF" => "Spot identifier",
        "VALUE" => "Normalized log2 ratio (red/green)",
        "A" => "Average log2 intensity",
        "RED" => "Red channel intensity",
        "GREEN" => "Green channel intensity",
        _ => "",
    }
}

/// Writer for GEO SOFT samples
pub struct SoftWriter<W> {
    output: W,
    all_fields: bool,
    translator: Option<Arc<dyn Translator>>,
}

impl<W: Write> SoftWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            all_fields: false,
            translator: None,
        }
    }
}

impl<W: Write> BioAssayWriter for SoftWriter<W> {
    fn add_all_fields_to_write(&mut self) {
        self.all_fields = true;
    }

    fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translator = Some(translator);
    }

    fn write(mut self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError> {
        let mut table = Table::new(bioassay, &SOFT_LAYOUT, self.all_fields);
        if let Some(translator) = &self.translator {
            table.add_translation(bioassay, translator.as_ref());
        }

        writeln!(self.output, "^SAMPLE = {}", bioassay.name())?;
        writeln!(self.output, "!Sample_title = {}", bioassay.name())?;
        writeln!(self.output, "!Sample_data_row_count = {}", table.rows())?;
        for column in table.headers() {
            writeln!(self.output, "#{} = {}", column, column_description(column))?;
        }

        writeln!(self.output, "!sample_table_begin")?;
        table.write_tsv(&mut self.output, QuoteStyle::Necessary)?;
        writeln!(self.output, "!sample_table_end")?;
        self.output.flush()?;
        Ok(())
    }
}
