// ==============================================================================
// parsers/mod.rs - BioAssay Readers and Reader Dispatcher
// ==============================================================================
// Description: Reader trait, format dispatch and batch reading
// Created: 2025-11-03
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================

pub mod atf;
pub mod delimited;
pub mod tabular;
pub mod universal;

pub use atf::AtfReader;
pub use delimited::DelimitedReader;
pub use tabular::TabularOptions;
pub use universal::{detect_format, DetectedFormat, UniversalReader};

use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::formats::ReaderFormat;
use crate::models::{BioAssay, BioAssayError};

/// Gzip magic number
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors that can occur while reading a BioAssay
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid header at line {line}: {details}")]
    InvalidHeader { line: usize, details: String },

    #[error("Two columns have the same name: {0}")]
    DuplicateColumn(String),

    #[error("Invalid numeric value at line {line}, column '{column}': {value}")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("File is empty or contains no column header")]
    EmptyFile,

    #[error(transparent)]
    BioAssay(#[from] BioAssayError),
}

/// Single-use BioAssay reader
///
/// A reader is configured with the flag methods, then consumed by `read`.
pub trait BioAssayReader {
    /// Read every column instead of the format's default fields
    fn add_all_fields_to_read(&mut self);

    /// Use ',' as decimal separator for numeric columns
    fn set_comma_decimal_separator(&mut self, comma: bool);

    /// Parse the input
    fn read(self: Box<Self>) -> Result<BioAssay, ReadError>;
}

/// Reader flags applied before reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub all_fields: bool,
    pub comma_decimal: bool,
}

/// Open a file for reading, decompressing gzip content transparently
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>, std::io::Error> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);

    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        debug!("Decompressing gzip input: {:?}", path.as_ref());
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Build the reader for a format on top of an input stream
pub fn reader_for(format: ReaderFormat, input: Box<dyn BufRead>) -> Box<dyn BioAssayReader> {
    match format {
        ReaderFormat::Gpr => Box::new(AtfReader::gpr(input)),
        ReaderFormat::Gal => Box::new(AtfReader::gal(input)),
        ReaderFormat::Idma => Box::new(DelimitedReader::idma(input)),
        ReaderFormat::TotalSummary => Box::new(DelimitedReader::total_summary(input)),
        ReaderFormat::Universal => Box::new(UniversalReader::new(input)),
    }
}

/// Open `path` and build the reader for `format`
pub fn create_reader(path: impl AsRef<Path>, format: ReaderFormat) -> Result<Box<dyn BioAssayReader>, ReadError> {
    let input = open_input(path)?;
    Ok(reader_for(format, input))
}

/// Apply the flags, read, and name the result after `name`
pub fn configure_and_read(
    mut reader: Box<dyn BioAssayReader>,
    name: &str,
    options: ReadOptions,
) -> Result<BioAssay, ReadError> {
    if options.all_fields {
        reader.add_all_fields_to_read();
    }
    if options.comma_decimal {
        reader.set_comma_decimal_separator(true);
    }

    let mut bioassay = reader.read()?;
    bioassay.set_name(name);
    Ok(bioassay)
}

/// File name of a path, used as BioAssay name
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read one file; the BioAssay is named after the file
///
/// # Example
/// ```no_run
/// use bioassay_kit::formats::ReaderFormat;
/// use bioassay_kit::parsers::{read_bioassay, ReadOptions};
///
/// let ba = read_bioassay("slide1.gpr", ReaderFormat::Gpr, ReadOptions::default())?;
/// assert_eq!(ba.name(), "slide1.gpr");
/// # Ok::<(), bioassay_kit::parsers::ReadError>(())
/// ```
pub fn read_bioassay(
    path: impl AsRef<Path>,
    format: ReaderFormat,
    options: ReadOptions,
) -> Result<BioAssay, ReadError> {
    let path = path.as_ref();
    info!("Reading {} file: {:?}", format, path);

    let reader = create_reader(path, format)?;
    let bioassay = configure_and_read(reader, &file_name(path), options)?;

    debug!(
        "Read {} rows and {} fields from {:?}",
        bioassay.size(),
        bioassay.field_names().len(),
        path
    );
    Ok(bioassay)
}

/// Read files in order; results keep the input order
///
/// The first failure aborts the batch.
pub fn read_bioassays<P: AsRef<Path>>(
    paths: &[P],
    format: ReaderFormat,
    options: ReadOptions,
) -> Result<Vec<BioAssay>, ReadError> {
    paths
        .iter()
        .map(|path| read_bioassay(path, format, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const IDMA_CONTENTS: &str = "ID\tName\tMnorm\tA\ng1\tgene one\t0,5\t10\n";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Reader that records the calls it receives
    struct RecordingReader {
        calls: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl BioAssayReader for RecordingReader {
        fn add_all_fields_to_read(&mut self) {
            self.calls.borrow_mut().push("all_fields".to_string());
        }

        fn set_comma_decimal_separator(&mut self, comma: bool) {
            self.calls.borrow_mut().push(format!("comma={}", comma));
        }

        fn read(self: Box<Self>) -> Result<BioAssay, ReadError> {
            self.calls.borrow_mut().push("read".to_string());
            Ok(BioAssay::with_name("parsed name"))
        }
    }

    #[test]
    fn test_configure_and_read_applies_flags_before_read() {
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let reader = Box::new(RecordingReader { calls: calls.clone() });

        let options = ReadOptions {
            all_fields: true,
            comma_decimal: true,
        };
        let ba = configure_and_read(reader, "slide.gpr", options).unwrap();

        assert_eq!(ba.name(), "slide.gpr");
        assert_eq!(*calls.borrow(), vec!["all_fields", "comma=true", "read"]);
    }

    #[test]
    fn test_configure_and_read_without_flags() {
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let reader = Box::new(RecordingReader { calls: calls.clone() });

        configure_and_read(reader, "x", ReadOptions::default()).unwrap();
        assert_eq!(*calls.borrow(), vec!["read"]);
    }

    #[test]
    fn test_read_bioassay_names_after_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "slide1.idma", IDMA_CONTENTS);

        let options = ReadOptions {
            comma_decimal: true,
            ..Default::default()
        };
        let ba = read_bioassay(&path, ReaderFormat::Idma, options).unwrap();

        assert_eq!(ba.name(), "slide1.idma");
        assert_eq!(ba.doubles("m").unwrap(), &[0.5]);
    }

    #[test]
    fn test_read_gzip_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slide1.idma.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"ID\tMnorm\ng1\t1.25\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let ba = read_bioassay(&path, ReaderFormat::Idma, ReadOptions::default()).unwrap();
        assert_eq!(ba.doubles("m").unwrap(), &[1.25]);
        assert_eq!(ba.name(), "slide1.idma.gz");
    }

    #[test]
    fn test_read_bioassays_keeps_order() {
        let dir = TempDir::new().unwrap();
        let gpr = "ATF\t1.0\n0\t2\n\"ID\"\t\"Name\"\n\"g1\"\t\"gene\"\n";
        let a = write_file(&dir, "a.gpr", gpr);
        let b = write_file(&dir, "b.gpr", gpr);

        let results = read_bioassays(&[a, b], ReaderFormat::Gpr, ReadOptions::default()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name(), "a.gpr");
        assert_eq!(results[1].name(), "b.gpr");
    }

    #[test]
    fn test_read_bioassays_aborts_on_first_error() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "good.idma", "ID\tName\tMnorm\tA\ng1\tgene one\t0.5\t10\n");
        let missing = dir.path().join("missing.idma");

        assert!(read_bioassay(&good, ReaderFormat::Idma, ReadOptions::default()).is_ok());

        let result = read_bioassays(&[good, missing], ReaderFormat::Idma, ReadOptions::default());
        match result.unwrap_err() {
            ReadError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected IoError for the missing file, got {:?}", other),
        }
    }

    #[test]
    fn test_every_format_names_after_file() {
        let dir = TempDir::new().unwrap();
        let fixtures = [
            (ReaderFormat::Gpr, "s.gpr", "ATF\t1.0\n0\t1\n\"ID\"\ng1\n"),
            (ReaderFormat::Gal, "s.gal", "ATF\t1.0\n0\t1\n\"ID\"\ng1\n"),
            (ReaderFormat::Idma, "s.idma", "ID\tMnorm\ng1\t1.0\n"),
            (ReaderFormat::TotalSummary, "s.total.summary", "Name\tmedianMnorm\ng1\t1.0\n"),
            (ReaderFormat::Universal, "s.txt", "id\tm\ng1\t1.0\n"),
        ];

        for (format, name, contents) in fixtures {
            let path = write_file(&dir, name, contents);
            let ba = read_bioassay(&path, format, ReadOptions::default()).unwrap();
            assert_eq!(ba.name(), name, "format {}", format);
            assert_eq!(ba.size(), 1, "format {}", format);

            let first = write_file(&dir, &format!("a.{}", name), contents);
            let second = write_file(&dir, &format!("b.{}", name), contents);
            let batch = read_bioassays(&[first, second], format, ReadOptions::default()).unwrap();
            let names: Vec<&str> = batch.iter().map(|ba| ba.name()).collect();
            assert_eq!(
                names,
                vec![format!("a.{}", name), format!("b.{}", name)],
                "format {}",
                format
            );
        }
    }
}
