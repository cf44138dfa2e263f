// ==============================================================================
// output/table.rs - Tabular Output Core
// ==============================================================================
// Description: Column selection, cell formatting and tab-delimited writing
// Created: 2025-11-06
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================

use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

use crate::formats::TabularLayout;
use crate::models::{field, BioAssay, FieldData};
use crate::translator::Translator;

use super::WriteError;

/// Text written for missing numeric values
pub const MISSING_VALUE: &str = "NA";

/// Value of one output cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i32),
    Double(f64),
    Text(String),
}

impl CellValue {
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Int(v) => v.to_string(),
            CellValue::Double(v) => format_double(*v),
            CellValue::Text(v) => v.clone(),
        }
    }
}

/// Format a double; NaN becomes "NA"
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        MISSING_VALUE.to_string()
    } else if value == f64::INFINITY {
        "Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Selected columns of a BioAssay, ready to be written
pub struct Table<'a> {
    headers: Vec<String>,
    columns: Vec<&'a FieldData>,
    /// Translator columns, one Vec per column
    extra: Vec<Vec<String>>,
    rows: usize,
}

impl<'a> Table<'a> {
    /// Select the columns of `bioassay` to write with `layout`
    ///
    /// Columns listed in the layout order come first, others follow in
    /// BioAssay order.
    pub fn new(bioassay: &'a BioAssay, layout: &TabularLayout, all_fields: bool) -> Self {
        let mut selected: Vec<(String, &'a FieldData)> = bioassay
            .fields()
            .iter()
            .map(|f| (layout.column_name(&f.name), &f.data))
            .filter(|(column, _)| all_fields || layout.writes_by_default(column))
            .collect();

        selected.sort_by_key(|(column, _)| {
            layout
                .order
                .iter()
                .position(|c| c == column)
                .unwrap_or(usize::MAX)
        });

        let (headers, columns): (Vec<String>, Vec<&'a FieldData>) = selected.into_iter().unzip();
        Self {
            headers,
            columns,
            extra: Vec::new(),
            rows: bioassay.size(),
        }
    }

    /// Append one column per translator field, keyed by the BioAssay ids
    pub fn add_translation(&mut self, bioassay: &BioAssay, translator: &dyn Translator) {
        let ids = bioassay.field(field::ID);
        let fields = translator.fields();

        let mut extra = vec![Vec::with_capacity(self.rows); fields.len()];
        for row in 0..self.rows {
            let id = ids.and_then(|data| data.text_at(row));
            for (slot, name) in fields.iter().enumerate() {
                let value = id
                    .as_deref()
                    .and_then(|id| translator.translate_field(id, name))
                    .unwrap_or_default();
                extra[slot].push(value);
            }
        }

        self.headers.extend(fields);
        self.extra.extend(extra);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn value(&self, column: usize, row: usize) -> CellValue {
        if column < self.columns.len() {
            match self.columns[column] {
                FieldData::Int(v) => CellValue::Int(v[row]),
                FieldData::Double(v) => CellValue::Double(v[row]),
                FieldData::String(v) => CellValue::Text(v[row].clone()),
            }
        } else {
            CellValue::Text(self.extra[column - self.columns.len()][row].clone())
        }
    }

    pub fn row(&self, row: usize) -> Vec<String> {
        (0..self.headers.len())
            .map(|column| self.value(column, row).to_text())
            .collect()
    }

    /// Write the header line and rows as tab-delimited text
    pub fn write_tsv<W: Write>(&self, out: W, quote_style: QuoteStyle) -> Result<(), WriteError> {
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(quote_style)
            .from_writer(out);

        writer.write_record(&self.headers)?;
        for row in 0..self.rows {
            writer.write_record(self.row(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}
