// ==============================================================================
// scripting.rs - BioAssay Scripting Facade
// ==============================================================================
// Description: Tag-based read/write functions and one-line shortcuts over the
//              readers, writers, filters and utilities of the crate
// Created: 2025-11-15
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::bioassay_utils;
use crate::formats::{ReaderFormat, UnknownFormatError, WriterFormat};
use crate::models::{BioAssay, BioAssayError};
use crate::output::{self, WriteError, WriteOptions};
use crate::parsers::{self, ReadError, ReadOptions};
use crate::sorter::MaSorter;
use crate::translator::Translator;

pub use crate::filters::{
    create_a_inf_filter, create_a_sup_filter, create_inf_filter, create_m_inf_filter, create_m_sup_filter,
    create_sup_filter, create_threshold_filter, FilterError, MFloorFilter,
};
pub use crate::models::{field, Flag};

/// Any error raised through the facade
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormatError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    BioAssay(#[from] BioAssayError),
}

// ------------------------------------------------------------------------------
// Read
// ------------------------------------------------------------------------------

/// Read one file of type `tag`; the BioAssay is named after the file
pub fn read_bioassay(
    path: impl AsRef<Path>,
    tag: &str,
    all_fields: bool,
    comma: bool,
) -> Result<BioAssay, ScriptError> {
    let format: ReaderFormat = tag.parse()?;
    let options = ReadOptions {
        all_fields,
        comma_decimal: comma,
    };
    Ok(parsers::read_bioassay(path, format, options)?)
}

/// Read files of type `tag`, in order; the first failure aborts the batch
pub fn read_bioassays<P: AsRef<Path>>(
    paths: &[P],
    tag: &str,
    all_fields: bool,
    comma: bool,
) -> Result<Vec<BioAssay>, ScriptError> {
    let format: ReaderFormat = tag.parse()?;
    let options = ReadOptions {
        all_fields,
        comma_decimal: comma,
    };
    Ok(parsers::read_bioassays(paths, format, options)?)
}

pub fn read_gpr(path: impl AsRef<Path>, all_fields: bool) -> Result<BioAssay, ScriptError> {
    read_bioassay(path, ReaderFormat::Gpr.tag(), all_fields, false)
}

pub fn read_gal(path: impl AsRef<Path>, all_fields: bool) -> Result<BioAssay, ScriptError> {
    read_bioassay(path, ReaderFormat::Gal.tag(), all_fields, false)
}

pub fn read_idma(path: impl AsRef<Path>, all_fields: bool, comma: bool) -> Result<BioAssay, ScriptError> {
    read_bioassay(path, ReaderFormat::Idma.tag(), all_fields, comma)
}

pub fn read_total_summary(path: impl AsRef<Path>, comma: bool) -> Result<BioAssay, ScriptError> {
    read_bioassay(path, ReaderFormat::TotalSummary.tag(), false, comma)
}

/// Read a file whose format is detected from its content
pub fn read_undefined_bioassay(path: impl AsRef<Path>, comma: bool) -> Result<BioAssay, ScriptError> {
    read_bioassay(path, ReaderFormat::Universal.tag(), false, comma)
}

// ------------------------------------------------------------------------------
// Write
// ------------------------------------------------------------------------------

/// Write `bioassay` to `path` as `tag`
///
/// `translator` is only handed to the writer when it is `Some`.
pub fn write_bioassay(
    bioassay: &BioAssay,
    path: impl AsRef<Path>,
    tag: &str,
    all_fields: bool,
    translator: Option<Arc<dyn Translator>>,
) -> Result<(), ScriptError> {
    let format: WriterFormat = tag.parse()?;
    output::write_bioassay(bioassay, path, format, WriteOptions { all_fields }, translator)?;
    Ok(())
}

pub fn write_gpr(bioassay: &BioAssay, path: impl AsRef<Path>) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::Gpr.tag(), true, None)
}

pub fn write_gal(bioassay: &BioAssay, path: impl AsRef<Path>) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::Gal.tag(), true, None)
}

pub fn write_idma(bioassay: &BioAssay, path: impl AsRef<Path>) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::Idma.tag(), true, None)
}

pub fn write_soft(bioassay: &BioAssay, path: impl AsRef<Path>) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::Soft.tag(), true, None)
}

pub fn write_total_summary(
    bioassay: &BioAssay,
    path: impl AsRef<Path>,
    translator: Option<Arc<dyn Translator>>,
) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::TotalSummary.tag(), true, translator)
}

/// total.summary written as a spreadsheet workbook
pub fn write_total_summary_xsl(
    bioassay: &BioAssay,
    path: impl AsRef<Path>,
    translator: Option<Arc<dyn Translator>>,
) -> Result<(), ScriptError> {
    write_bioassay(bioassay, path, WriterFormat::TotalSummaryXsl.tag(), true, translator)
}

/// M floor filter over replicates; `None` arguments take the defaults
pub fn create_m_floor_filter(floor: impl Into<Option<f64>>, rate: impl Into<Option<f64>>) -> MFloorFilter {
    let defaults = MFloorFilter::default();
    MFloorFilter::new(
        floor.into().unwrap_or(defaults.floor()),
        rate.into().unwrap_or(defaults.rate()),
    )
}

// ------------------------------------------------------------------------------
// Sort and modify
// ------------------------------------------------------------------------------

pub fn create_ma_sorter() -> MaSorter {
    MaSorter::new()
}

pub fn merge_inner_ids_replicates(bioassay: &BioAssay) -> BioAssay {
    bioassay_utils::merge_inner_ids_replicates(bioassay)
}

pub fn merge_inner_descriptions_replicates(bioassay: &BioAssay) -> BioAssay {
    bioassay_utils::merge_inner_descriptions_replicates(bioassay)
}

/// Make the ids of `bioassay` unique, in place
pub fn rename_bioassay_ids_with_unique_identifiers(bioassay: &mut BioAssay) -> Result<(), ScriptError> {
    bioassay_utils::rename_ids_with_unique_identifiers(bioassay)?;
    Ok(())
}

pub fn swap_bioassay(bioassay: &mut BioAssay) -> Result<(), ScriptError> {
    Ok(bioassay_utils::swap(bioassay)?)
}

/// Empty BioAssay, named when `name` is given
pub fn create_bioassay(name: Option<&str>) -> BioAssay {
    match name {
        Some(name) => BioAssay::with_name(name),
        None => BioAssay::new(),
    }
}
