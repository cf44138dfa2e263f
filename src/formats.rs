// ==============================================================================
// formats.rs - BioAssay File Formats
// ==============================================================================
// Description: Format tags and tabular column layouts shared by readers/writers
// Created: 2025-11-06
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================
// Layouts describe how file columns map to BioAssay fields:
//   - converter: file column name -> BioAssay field name
//   - default_read / default_write: columns handled unless "all fields" is set
//     (an empty default_read means every column is read)
//   - order: preferred output column order
//   - int/double/string columns: declared column types, other columns are
//     inferred from their content
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::field;

/// Format tag that matches no reader or writer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown bioassay format: '{0}'")]
pub struct UnknownFormatError(pub String);

/// Input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderFormat {
    #[serde(rename = "gpr")]
    Gpr,
    #[serde(rename = "gal")]
    Gal,
    #[serde(rename = "idma")]
    Idma,
    #[serde(rename = "total.summary")]
    TotalSummary,
    #[serde(rename = "universal")]
    Universal,
}

impl ReaderFormat {
    pub const ALL: [ReaderFormat; 5] = [
        ReaderFormat::Gpr,
        ReaderFormat::Gal,
        ReaderFormat::Idma,
        ReaderFormat::TotalSummary,
        ReaderFormat::Universal,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ReaderFormat::Gpr => "gpr",
            ReaderFormat::Gal => "gal",
            ReaderFormat::Idma => "idma",
            ReaderFormat::TotalSummary => "total.summary",
            ReaderFormat::Universal => "universal",
        }
    }

    /// Usual file name suffix (None: any file)
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ReaderFormat::Gpr => Some("gpr"),
            ReaderFormat::Gal => Some("gal"),
            ReaderFormat::Idma => Some("idma"),
            ReaderFormat::TotalSummary => Some("total.summary"),
            ReaderFormat::Universal => None,
        }
    }
}

impl FromStr for ReaderFormat {
    type Err = UnknownFormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ReaderFormat::ALL
            .iter()
            .copied()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| UnknownFormatError(tag.to_string()))
    }
}

impl fmt::Display for ReaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriterFormat {
    #[serde(rename = "gpr")]
    Gpr,
    #[serde(rename = "gal")]
    Gal,
    #[serde(rename = "idma")]
    Idma,
    #[serde(rename = "soft")]
    Soft,
    #[serde(rename = "total.summary")]
    TotalSummary,
    /// total.summary written through the spreadsheet (XSL) backend
    #[serde(rename = "total.summary.xsl")]
    TotalSummaryXsl,
}

impl WriterFormat {
    pub const ALL: [WriterFormat; 6] = [
        WriterFormat::Gpr,
        WriterFormat::Gal,
        WriterFormat::Idma,
        WriterFormat::Soft,
        WriterFormat::TotalSummary,
        WriterFormat::TotalSummaryXsl,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            WriterFormat::Gpr => "gpr",
            WriterFormat::Gal => "gal",
            WriterFormat::Idma => "idma",
            WriterFormat::Soft => "soft",
            WriterFormat::TotalSummary => "total.summary",
            WriterFormat::TotalSummaryXsl => "total.summary.xsl",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            WriterFormat::Gpr => "gpr",
            WriterFormat::Gal => "gal",
            WriterFormat::Idma => "idma",
            WriterFormat::Soft => "soft",
            WriterFormat::TotalSummary => "total.summary",
            WriterFormat::TotalSummaryXsl => "total.summary.xml",
        }
    }
}

impl FromStr for WriterFormat {
    type Err = UnknownFormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        WriterFormat::ALL
            .iter()
            .copied()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| UnknownFormatError(tag.to_string()))
    }
}

impl fmt::Display for WriterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Column layout of a tab-delimited format
#[derive(Debug, Clone, Copy)]
pub struct TabularLayout {
    pub converter: &'static [(&'static str, &'static str)],
    pub default_read: &'static [&'static str],
    pub default_write: &'static [&'static str],
    pub order: &'static [&'static str],
    pub int_columns: &'static [&'static str],
    pub double_columns: &'static [&'static str],
    pub string_columns: &'static [&'static str],
}

/// Declared or inferred type of a file column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Double,
    String,
    Inferred,
}

impl TabularLayout {
    /// BioAssay field name for a file column
    pub fn field_name(&self, column: &str) -> String {
        self.converter
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, f)| f.to_string())
            .unwrap_or_else(|| column.to_string())
    }

    /// File column name for a BioAssay field
    pub fn column_name(&self, field: &str) -> String {
        self.converter
            .iter()
            .find(|(_, f)| *f == field)
            .map(|(c, _)| c.to_string())
            .unwrap_or_else(|| field.to_string())
    }

    pub fn column_type(&self, column: &str) -> ColumnType {
        if self.int_columns.contains(&column) {
            ColumnType::Int
        } else if self.double_columns.contains(&column) {
            ColumnType::Double
        } else if self.string_columns.contains(&column) {
            ColumnType::String
        } else {
            ColumnType::Inferred
        }
    }

    pub fn reads_by_default(&self, column: &str) -> bool {
        self.default_read.is_empty() || self.default_read.contains(&column)
    }

    pub fn writes_by_default(&self, column: &str) -> bool {
        self.default_write.contains(&column)
    }
}

/// GenePix Results (.gpr)
pub const GPR_LAYOUT: TabularLayout = TabularLayout {
    converter: &[
        ("ID", field::ID),
        ("Name", field::DESCRIPTION),
        ("F635 Median", field::RED),
        ("F532 Median", field::GREEN),
        ("Flags", field::FLAGS),
        ("Ratio of Medians (635/532)", field::RATIO),
    ],
    default_read: &[
        "Block",
        "Column",
        "Row",
        "Name",
        "ID",
        "F635 Median",
        "B635 Median",
        "F532 Median",
        "B532 Median",
        "Flags",
    ],
    default_write: &[
        "Block",
        "Column",
        "Row",
        "Name",
        "ID",
        "F635 Median",
        "B635 Median",
        "F532 Median",
        "B532 Median",
        "Flags",
    ],
    order: &[
        "Block",
        "Column",
        "Row",
        "Name",
        "ID",
        "X",
        "Y",
        "Dia.",
        "F635 Median",
        "F635 Mean",
        "F635 SD",
        "B635 Median",
        "B635 Mean",
        "B635 SD",
        "F532 Median",
        "F532 Mean",
        "F532 SD",
        "B532 Median",
        "B532 Mean",
        "B532 SD",
        "Ratio of Medians (635/532)",
        "Ratio of Means (635/532)",
        "Log Ratio (635/532)",
        "F Pixels",
        "B Pixels",
        "Flags",
    ],
    int_columns: &[
        "Block",
        "Column",
        "Row",
        "X",
        "Y",
        "Dia.",
        "F635 Median",
        "F635 Mean",
        "F635 SD",
        "B635 Median",
        "B635 Mean",
        "B635 SD",
        "F532 Median",
        "F532 Mean",
        "F532 SD",
        "B532 Median",
        "B532 Mean",
        "B532 SD",
        "F Pixels",
        "B Pixels",
        "Flags",
    ],
    double_columns: &[
        "Ratio of Medians (635/532)",
        "Ratio of Means (635/532)",
        "Median of Ratios (635/532)",
        "Mean of Ratios (635/532)",
        "Ratios SD (635/532)",
        "Rgn Ratio (635/532)",
        "Rgn R2 (635/532)",
        "Log Ratio (635/532)",
    ],
    string_columns: &["Name", "ID"],
};

/// GenePix Array List (.gal)
pub const GAL_LAYOUT: TabularLayout = TabularLayout {
    converter: &[("ID", field::ID), ("Name", field::DESCRIPTION)],
    default_read: &["Block", "Column", "Row", "ID", "Name"],
    default_write: &["Block", "Column", "Row", "ID", "Name"],
    order: &["Block", "Column", "Row", "ID", "Name"],
    int_columns: &["Block", "Column", "Row"],
    double_columns: &[],
    string_columns: &["ID", "Name"],
};

/// Goulphar ID-M-A files
pub const IDMA_LAYOUT: TabularLayout = TabularLayout {
    converter: &[
        ("ID", field::ID),
        ("Name", field::DESCRIPTION),
        ("Mnorm", field::M),
        ("A", field::A),
        ("Flag", field::FLAGS),
    ],
    default_read: &["ID", "Name", "R", "G", "Mnorm", "A"],
    default_write: &["ID", "Mnorm", "A", "R", "G"],
    order: &["ID", "Name", "R", "Rb", "G", "Gb", "Mnorm", "A", "Flag"],
    int_columns: &["R", "Rb", "G", "Gb", "Flag"],
    double_columns: &["Mnorm", "A"],
    string_columns: &["ID", "Name"],
};

/// Goulphar total.summary files
pub const TOTAL_SUMMARY_LAYOUT: TabularLayout = TabularLayout {
    converter: &[
        ("Name", field::ID),
        ("medianMnorm", field::M),
        ("medianA", field::A),
        ("SDMnorm", field::STD_DEV_M),
    ],
    default_read: &["Name", "medianMnorm", "medianA", "SDMnorm", "n", "total n"],
    default_write: &["Name", "medianMnorm", "medianA", "SDMnorm", "n", "total n"],
    order: &["Name", "medianMnorm", "medianA", "SDMnorm", "n", "total n"],
    int_columns: &["n", "total n"],
    double_columns: &["medianMnorm", "medianA", "SDMnorm"],
    string_columns: &["Name"],
};

/// Any tab-delimited table: every column read, types inferred
pub const GENERIC_LAYOUT: TabularLayout = TabularLayout {
    converter: &[],
    default_read: &[],
    default_write: &[],
    order: &[],
    int_columns: &[],
    double_columns: &[],
    string_columns: &[field::ID, field::DESCRIPTION],
};
