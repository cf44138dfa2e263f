// ==============================================================================
// output/mod.rs - BioAssay Writers and Writer Dispatcher
// ==============================================================================
// Description: Writer trait, format dispatch and file creation
// Created: 2025-11-06
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================

pub mod atf;
pub mod delimited;
pub mod soft;
pub mod table;
pub mod total_summary;

pub use atf::AtfWriter;
pub use delimited::IdmaWriter;
pub use soft::SoftWriter;
pub use table::{format_double, CellValue, Table, MISSING_VALUE};
pub use total_summary::TotalSummaryWriter;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::formats::WriterFormat;
use crate::models::{BioAssay, BioAssayError};
use crate::translator::Translator;

/// Errors that can occur while writing a BioAssay
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV writing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    BioAssay(#[from] BioAssayError),
}

/// Single-use BioAssay writer
///
/// A writer is configured with the setter methods, then consumed by `write`.
pub trait BioAssayWriter {
    /// Write every field instead of the format's default fields
    fn add_all_fields_to_write(&mut self);

    /// Append the annotation columns of `translator` to each row
    fn set_translator(&mut self, translator: Arc<dyn Translator>);

    /// Switch to the spreadsheet backend (total.summary only)
    fn enable_xsl_backend(&mut self) {}

    /// Write `bioassay` to the output
    fn write(self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError>;
}

/// Writer flags applied before writing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub all_fields: bool,
}

/// Build the writer for a format on top of an output stream
pub fn writer_for(format: WriterFormat, output: Box<dyn Write>) -> Box<dyn BioAssayWriter> {
    let writer: Box<dyn BioAssayWriter> = match format {
        WriterFormat::Gpr => Box::new(AtfWriter::gpr(output)),
        WriterFormat::Gal => Box::new(AtfWriter::gal(output)),
        WriterFormat::Idma => Box::new(IdmaWriter::new(output)),
        WriterFormat::Soft => Box::new(SoftWriter::new(output)),
        WriterFormat::TotalSummary | WriterFormat::TotalSummaryXsl => {
            Box::new(TotalSummaryWriter::new(output))
        }
    };
    prepare_writer(writer, format)
}

/// Apply the format-specific setup of a freshly built writer
///
/// `total.summary.xsl` is a total.summary writer with the spreadsheet
/// backend enabled, exactly once.
pub fn prepare_writer(mut writer: Box<dyn BioAssayWriter>, format: WriterFormat) -> Box<dyn BioAssayWriter> {
    if format == WriterFormat::TotalSummaryXsl {
        writer.enable_xsl_backend();
    }
    writer
}

/// Create `path` and build the writer for `format`
pub fn create_writer(path: impl AsRef<Path>, format: WriterFormat) -> Result<Box<dyn BioAssayWriter>, WriteError> {
    let file = File::create(path.as_ref())?;
    Ok(writer_for(format, Box::new(BufWriter::new(file))))
}

/// Apply the flags and the translator, then write
///
/// A `None` translator leaves the writer untouched.
pub fn configure_and_write(
    mut writer: Box<dyn BioAssayWriter>,
    options: WriteOptions,
    translator: Option<Arc<dyn Translator>>,
    bioassay: &BioAssay,
) -> Result<(), WriteError> {
    if options.all_fields {
        writer.add_all_fields_to_write();
    }
    if let Some(translator) = translator {
        writer.set_translator(translator);
    }
    writer.write(bioassay)
}

/// Write one BioAssay to `path`
///
/// # Example
/// ```no_run
/// use bioassay_kit::formats::WriterFormat;
/// use bioassay_kit::models::BioAssay;
/// use bioassay_kit::output::{write_bioassay, WriteOptions};
///
/// let ba = BioAssay::with_name("slide1");
/// write_bioassay(&ba, "slide1.idma", WriterFormat::Idma, WriteOptions::default(), None)?;
/// # Ok::<(), bioassay_kit::output::WriteError>(())
/// ```
pub fn write_bioassay(
    bioassay: &BioAssay,
    path: impl AsRef<Path>,
    format: WriterFormat,
    options: WriteOptions,
    translator: Option<Arc<dyn Translator>>,
) -> Result<(), WriteError> {
    let path = path.as_ref();
    info!("Writing {} file: {:?}", format, path);

    let writer = create_writer(path, format)?;
    configure_and_write(writer, options, translator, bioassay)?;

    debug!("Wrote {} rows of '{}' to {:?}", bioassay.size(), bioassay.name(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field;
    use crate::translator::MultiColumnTranslator;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Writer that records the calls it receives
    struct RecordingWriter {
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl BioAssayWriter for RecordingWriter {
        fn add_all_fields_to_write(&mut self) {
            self.calls.borrow_mut().push("all_fields".to_string());
        }

        fn set_translator(&mut self, _translator: Arc<dyn Translator>) {
            self.calls.borrow_mut().push("translator".to_string());
        }

        fn enable_xsl_backend(&mut self) {
            self.calls.borrow_mut().push("xsl".to_string());
        }

        fn write(self: Box<Self>, bioassay: &BioAssay) -> Result<(), WriteError> {
            self.calls.borrow_mut().push(format!("write {}", bioassay.name()));
            Ok(())
        }
    }

    fn recording() -> (Rc<RefCell<Vec<String>>>, Box<dyn BioAssayWriter>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let writer = Box::new(RecordingWriter { calls: calls.clone() });
        (calls, writer)
    }

    fn sample() -> BioAssay {
        let mut ba = BioAssay::with_name("slide");
        ba.set_strings(field::ID, vec!["g1".into(), "g2".into()]).unwrap();
        ba.set_doubles(field::M, vec![0.5, -1.0]).unwrap();
        ba.set_doubles(field::A, vec![10.0, 11.5]).unwrap();
        ba
    }

    #[test]
    fn test_xsl_backend_enabled_once_before_write() {
        let (calls, writer) = recording();
        let writer = prepare_writer(writer, WriterFormat::TotalSummaryXsl);
        configure_and_write(writer, WriteOptions::default(), None, &sample()).unwrap();

        assert_eq!(*calls.borrow(), vec!["xsl", "write slide"]);
    }

    #[test]
    fn test_plain_formats_do_not_enable_xsl() {
        for format in WriterFormat::ALL {
            if format == WriterFormat::TotalSummaryXsl {
                continue;
            }
            let (calls, writer) = recording();
            prepare_writer(writer, format);
            assert!(calls.borrow().is_empty(), "format {}", format);
        }
    }

    #[test]
    fn test_no_translator_when_none_supplied() {
        let (calls, writer) = recording();
        let options = WriteOptions { all_fields: true };
        configure_and_write(writer, options, None, &sample()).unwrap();

        assert_eq!(*calls.borrow(), vec!["all_fields", "write slide"]);
    }

    #[test]
    fn test_empty_translator_is_still_set() {
        let (calls, writer) = recording();
        let translator = MultiColumnTranslator::new(vec!["ID".into()]).unwrap();
        configure_and_write(writer, WriteOptions::default(), Some(Arc::new(translator)), &sample()).unwrap();

        assert_eq!(*calls.borrow(), vec!["translator", "write slide"]);
    }

    #[test]
    fn test_write_bioassay_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slide.idma");

        write_bioassay(&sample(), &path, WriterFormat::Idma, WriteOptions::default(), None).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "ID\tMnorm\tA\ng1\t0.5\t10\ng2\t-1\t11.5\n");
    }

    #[test]
    fn test_every_format_writes_a_file() {
        let dir = TempDir::new().unwrap();
        for format in WriterFormat::ALL {
            let path = dir.path().join(format!("slide.{}", format.extension()));
            write_bioassay(&sample(), &path, format, WriteOptions { all_fields: true }, None).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("g2"), "format {}", format);
        }
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("slide.idma");
        let result = write_bioassay(&sample(), &path, WriterFormat::Idma, WriteOptions::default(), None);
        assert!(matches!(result.unwrap_err(), WriteError::IoError(_)));
    }
}
