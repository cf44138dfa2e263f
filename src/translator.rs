// ==============================================================================
// translator.rs - Identifier Annotation Translators
// ==============================================================================
// Description: Map spot identifiers to annotation values (gene names, etc.)
// Created: 2025-11-10
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================
// Annotation file format (tab-delimited, first column is the key):
//   ID      Gene      Description
//   g1      ACT1      actin
//   g2      TUB2      beta-tubulin
// ==============================================================================

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Source of per-identifier annotation values
pub trait Translator: Send + Sync {
    /// Annotation fields provided by the translator
    fn fields(&self) -> Vec<String>;

    /// Value of `field` for identifier `id`
    fn translate_field(&self, id: &str, field: &str) -> Option<String>;

    /// All values for `id`, in `fields()` order (empty strings when unknown)
    fn translate(&self, id: &str) -> Vec<String> {
        self.fields()
            .iter()
            .map(|f| self.translate_field(id, f).unwrap_or_default())
            .collect()
    }
}

/// Errors that can occur while loading a translator
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Translator file is empty")]
    EmptyFile,

    #[error("Translator header has no columns")]
    EmptyHeader,
}

/// Translator backed by a table whose first column holds the identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct MultiColumnTranslator {
    key_column: String,
    fields: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl MultiColumnTranslator {
    /// Create a translator from a header row; the first column is the key
    pub fn new(header: Vec<String>) -> Result<Self, TranslatorError> {
        let mut columns = header.into_iter();
        let key_column = columns.next().ok_or(TranslatorError::EmptyHeader)?;
        Ok(Self {
            key_column,
            fields: columns.collect(),
            rows: HashMap::new(),
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Add a row; the first cell is the identifier. Later rows replace earlier ones.
    pub fn add_row(&mut self, row: Vec<String>) {
        let mut cells = row.into_iter();
        let Some(id) = cells.next() else {
            return;
        };
        let mut values: Vec<String> = cells.take(self.fields.len()).collect();
        values.resize(self.fields.len(), String::new());
        self.rows.insert(id, values);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Translator for MultiColumnTranslator {
    fn fields(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn translate_field(&self, id: &str, field: &str) -> Option<String> {
        let index = self.fields.iter().position(|f| f == field)?;
        self.rows
            .get(id)
            .map(|values| values[index].clone())
            .filter(|v| !v.is_empty())
    }
}

/// Loader of MultiColumnTranslator tables
pub struct MultiColumnTranslatorReader<R> {
    input: R,
    remove_quotes: bool,
    no_header: bool,
}

impl MultiColumnTranslatorReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TranslatorError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> MultiColumnTranslatorReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            remove_quotes: true,
            no_header: false,
        }
    }

    /// Keep double quotes and surrounding spaces in cells
    pub fn with_remove_quotes(mut self, remove_quotes: bool) -> Self {
        self.remove_quotes = remove_quotes;
        self
    }

    /// The file has no header: columns are named "#0", "#1", ...
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    pub fn read(self) -> Result<MultiColumnTranslator, TranslatorError> {
        let remove_quotes = self.remove_quotes;
        let mut translator: Option<MultiColumnTranslator> = None;

        for line in self.input.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let cells: Vec<String> = line
                .split('\t')
                .map(|c| {
                    if remove_quotes {
                        c.trim().trim_matches('"').trim().to_string()
                    } else {
                        c.to_string()
                    }
                })
                .collect();

            match translator.as_mut() {
                Some(t) => t.add_row(cells),
                None if self.no_header => {
                    let header = (0..cells.len()).map(|i| format!("#{}", i)).collect();
                    let mut t = MultiColumnTranslator::new(header)?;
                    t.add_row(cells);
                    translator = Some(t);
                }
                None => translator = Some(MultiColumnTranslator::new(cells)?),
            }
        }

        let translator = translator.ok_or(TranslatorError::EmptyFile)?;
        debug!(
            "Loaded translator with {} identifiers and {} fields",
            translator.len(),
            translator.fields.len()
        );
        Ok(translator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_translator() {
        let contents = "\"ID\"\t\"Gene\"\t\"Description\"\n\ng1\tACT1\tactin\ng2\t TUB2 \n";

        let translator = MultiColumnTranslatorReader::new(Cursor::new(contents))
            .read()
            .unwrap();

        assert_eq!(translator.key_column(), "ID");
        assert_eq!(translator.fields(), vec!["Gene", "Description"]);
        assert_eq!(translator.translate_field("g1", "Description"), Some("actin".to_string()));
        assert_eq!(translator.translate_field("g2", "Gene"), Some("TUB2".to_string()));
        assert_eq!(translator.translate_field("g2", "Description"), None);
        assert_eq!(translator.translate_field("g3", "Gene"), None);
        assert_eq!(translator.translate("g2"), vec!["TUB2".to_string(), String::new()]);
    }

    #[test]
    fn test_read_translator_without_header() {
        let contents = "g1\tACT1\ng2\tTUB2\n";

        let translator = MultiColumnTranslatorReader::new(Cursor::new(contents))
            .with_no_header(true)
            .read()
            .unwrap();

        assert_eq!(translator.key_column(), "#0");
        assert_eq!(translator.fields(), vec!["#1"]);
        assert_eq!(translator.len(), 2);
        assert_eq!(translator.translate_field("g1", "#1"), Some("ACT1".to_string()));
    }

    #[test]
    fn test_keep_quotes() {
        let contents = "ID\tGene\ng1\t\"ACT1\"\n";

        let translator = MultiColumnTranslatorReader::new(Cursor::new(contents))
            .with_remove_quotes(false)
            .read()
            .unwrap();

        assert_eq!(translator.translate_field("g1", "Gene"), Some("\"ACT1\"".to_string()));
    }

    #[test]
    fn test_empty_translator_file() {
        let result = MultiColumnTranslatorReader::new(Cursor::new("\n\n")).read();
        assert!(matches!(result.unwrap_err(), TranslatorError::EmptyFile));
    }
}
