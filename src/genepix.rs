// ==============================================================================
// genepix.rs - GenePix Results Header View
// ==============================================================================
// Description: Typed access to the GPR header records of a BioAssay annotation
// Created: 2025-11-14
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, BorrowMut};
use std::fmt;

use crate::models::BioAssay;

/// Prefix of the Type record of GenePix Results files
pub const GPR_MAGIC: &str = "GenePix Results";

/// DateTime record format
pub const DATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Filter value of an empty filter wheel slot
pub const FILTER_EMPTY: &str = "<Empty>";

/// NormalizationMethod value when no normalization was applied
pub const NORMALIZATION_METHOD_NONE: &str = "None";

/// Usual RatioFormulation value
pub const STANDARD_RATIO_FORMULATION: &str = "W1/W2 (635/532)";

/// GPR header record keys
pub mod header {
    pub const TYPE: &str = "Type";
    pub const DATE_TIME: &str = "DateTime";
    pub const SETTINGS: &str = "Settings";
    pub const GAL_FILE: &str = "GalFile";
    pub const PIXEL_SIZE: &str = "PixelSize";
    pub const WAVELENGTHS: &str = "Wavelengths";
    pub const IMAGE_FILES: &str = "ImageFiles";
    pub const NORMALIZATION_METHOD: &str = "NormalisationMethod";
    pub const NORMALIZATION_FACTORS: &str = "NormalizationFactors";
    pub const JPEG_IMAGE: &str = "JpegImage";
    pub const STD_DEV: &str = "StdDev";
    pub const RATIO_FORMULATION: &str = "RatioFormulation";
    pub const FEATURE_TYPE: &str = "FeatureType";
    pub const BARCODE: &str = "Barcode";
    pub const BACKGROUND_SUBTRACTION: &str = "BackgroundSubstraction";
    pub const IMAGE_ORIGIN: &str = "ImageOrigin";
    pub const CREATOR: &str = "Creator";
    pub const SCANNER: &str = "Scanner";
    pub const FOCUS_POSITION: &str = "FocusPosition";
    pub const TEMPERATURE: &str = "Temperature";
    pub const LINES_AVERAGED: &str = "LinesAveraged";
    pub const COMMENT: &str = "Comment";
    pub const PMT_GAIN: &str = "PMTGain";
    pub const SCAN_POWER: &str = "ScanPower";
    pub const LASER_ON_TIME: &str = "LaserOnTime";
    pub const FILTERS: &str = "FILTERS";
    pub const SCAN_REGION: &str = "ScanRegion";
    pub const SUPPLIER: &str = "Supplier";
}

/// Spot shape of the FeatureType record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotShape {
    Circular,
    Square,
    IrregularNotFilled,
    IrregularFilled,
}

impl SpotShape {
    pub fn name(&self) -> &'static str {
        match self {
            SpotShape::Circular => "Circular",
            SpotShape::Square => "Square",
            SpotShape::IrregularNotFilled => "Irregular, not Filled",
            SpotShape::IrregularFilled => "Irregular, Filled",
        }
    }

    pub fn from_name(name: &str) -> Option<SpotShape> {
        [
            SpotShape::Circular,
            SpotShape::Square,
            SpotShape::IrregularNotFilled,
            SpotShape::IrregularFilled,
        ]
        .into_iter()
        .find(|s| s.name() == name.trim())
    }
}

impl fmt::Display for SpotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed view over the GenePix header records of a BioAssay
///
/// Wraps `&BioAssay` for reading or `&mut BioAssay` to also update records.
pub struct GenepixResults<A> {
    bioassay: A,
}

macro_rules! text_records {
    ($(($getter:ident, $setter:ident, $key:expr)),* $(,)?) => {
        impl<A: Borrow<BioAssay>> GenepixResults<A> {
            $(
                pub fn $getter(&self) -> Option<&str> {
                    self.record($key)
                }
            )*
        }

        impl<A: BorrowMut<BioAssay>> GenepixResults<A> {
            $(
                pub fn $setter(&mut self, value: impl Into<String>) {
                    self.set_record($key, value);
                }
            )*
        }
    };
}

text_records!(
    (file_type, set_file_type, header::TYPE),
    (settings, set_settings, header::SETTINGS),
    (gal_file, set_gal_file, header::GAL_FILE),
    (pixel_size, set_pixel_size, header::PIXEL_SIZE),
    (wavelengths, set_wavelengths, header::WAVELENGTHS),
    (image_files, set_image_files, header::IMAGE_FILES),
    (normalization_method, set_normalization_method, header::NORMALIZATION_METHOD),
    (normalization_factors, set_normalization_factors, header::NORMALIZATION_FACTORS),
    (jpeg_image, set_jpeg_image, header::JPEG_IMAGE),
    (std_dev, set_std_dev, header::STD_DEV),
    (ratio_formulation, set_ratio_formulation, header::RATIO_FORMULATION),
    (barcode, set_barcode, header::BARCODE),
    (background_subtraction, set_background_subtraction, header::BACKGROUND_SUBTRACTION),
    (image_origin, set_image_origin, header::IMAGE_ORIGIN),
    (creator, set_creator, header::CREATOR),
    (scanner, set_scanner, header::SCANNER),
    (temperature, set_temperature, header::TEMPERATURE),
    (lines_averaged, set_lines_averaged, header::LINES_AVERAGED),
    (comment, set_comment, header::COMMENT),
    (pmt_gain, set_pmt_gain, header::PMT_GAIN),
    (scan_power, set_scan_power, header::SCAN_POWER),
    (laser_on_time, set_laser_on_time, header::LASER_ON_TIME),
    (scan_region, set_scan_region, header::SCAN_REGION),
    (supplier, set_supplier, header::SUPPLIER),
);

impl<A: Borrow<BioAssay>> GenepixResults<A> {
    pub fn new(bioassay: A) -> Self {
        Self { bioassay }
    }

    pub fn bioassay(&self) -> &BioAssay {
        self.bioassay.borrow()
    }

    pub fn into_inner(self) -> A {
        self.bioassay
    }

    fn record(&self, key: &str) -> Option<&str> {
        self.bioassay.borrow().annotation().get(key)
    }

    /// Whether the Type record names a GenePix Results file
    pub fn is_gpr_data(&self) -> bool {
        self.file_type().is_some_and(|t| t.trim().starts_with(GPR_MAGIC))
    }

    /// Scan date; None when absent or unparsable
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        let value = self.record(header::DATE_TIME)?;
        NaiveDateTime::parse_from_str(value.trim(), DATE_TIME_FORMAT).ok()
    }

    pub fn feature_type(&self) -> Option<SpotShape> {
        self.record(header::FEATURE_TYPE).and_then(SpotShape::from_name)
    }

    /// Filter names, one per channel
    pub fn filters(&self) -> Vec<&str> {
        self.record(header::FILTERS)
            .map(|f| f.split('\t').collect())
            .unwrap_or_default()
    }

    /// Focus position in microns; an empty record means 0
    pub fn focus_position(&self) -> Option<i32> {
        let value = self.record(header::FOCUS_POSITION)?.trim();
        if value.is_empty() {
            return Some(0);
        }
        value.parse().ok()
    }
}

impl<A: BorrowMut<BioAssay>> GenepixResults<A> {
    fn set_record(&mut self, key: &str, value: impl Into<String>) {
        self.bioassay.borrow_mut().annotation_mut().set(key, value);
    }

    pub fn set_date_time(&mut self, date_time: Option<NaiveDateTime>) {
        let value = date_time
            .map(|d| d.format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_default();
        self.set_record(header::DATE_TIME, value);
    }

    pub fn set_feature_type(&mut self, shape: SpotShape) {
        self.set_record(header::FEATURE_TYPE, shape.name());
    }

    pub fn set_filters(&mut self, filters: &[&str]) {
        self.set_record(header::FILTERS, filters.join("\t"));
    }

    pub fn set_focus_position(&mut self, microns: i32) {
        self.set_record(header::FOCUS_POSITION, microns.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{AtfReader, BioAssayReader};
    use chrono::{Datelike, Timelike};
    use std::io::Cursor;

    const GPR_CONTENTS: &str = "ATF\t1.0\n\
6\t2\n\
\"Type=GenePix Results 3\"\n\
\"DateTime=2006/03/21 15:02:11\"\n\
\"FeatureType=Circular\"\n\
\"FocusPosition=\"\n\
\"FILTERS=<Empty>\t<Empty>\"\n\
\"Creator=GenePix Pro 6.0.1.25\"\n\
\"ID\"\t\"Name\"\n\
\"g1\"\t\"gene\"\n";

    fn read_gpr() -> BioAssay {
        let reader: Box<dyn BioAssayReader> = Box::new(AtfReader::gpr(Cursor::new(GPR_CONTENTS)));
        reader.read().unwrap()
    }

    #[test]
    fn test_header_view() {
        let ba = read_gpr();
        let gpr = GenepixResults::new(&ba);

        assert!(gpr.is_gpr_data());
        assert_eq!(gpr.creator(), Some("GenePix Pro 6.0.1.25"));
        assert_eq!(gpr.feature_type(), Some(SpotShape::Circular));
        assert_eq!(gpr.focus_position(), Some(0));
        assert_eq!(gpr.filters(), vec![FILTER_EMPTY, FILTER_EMPTY]);
        assert_eq!(gpr.scanner(), None);

        let date = gpr.date_time().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2006, 3, 21));
        assert_eq!((date.hour(), date.minute(), date.second()), (15, 2, 11));
    }

    #[test]
    fn test_unparsable_date() {
        let mut ba = BioAssay::new();
        ba.annotation_mut().set(header::DATE_TIME, "yesterday");
        assert_eq!(GenepixResults::new(&ba).date_time(), None);
        assert!(!GenepixResults::new(&ba).is_gpr_data());
    }

    #[test]
    fn test_setters_update_annotation() {
        let mut ba = BioAssay::new();
        {
            let mut gpr = GenepixResults::new(&mut ba);
            gpr.set_file_type("GenePix Results 3");
            gpr.set_feature_type(SpotShape::IrregularFilled);
            gpr.set_focus_position(-10);
            gpr.set_filters(&["<Empty>", "Cy3"]);
            let date = NaiveDateTime::parse_from_str("2007/01/02 03:04:05", DATE_TIME_FORMAT).unwrap();
            gpr.set_date_time(Some(date));
        }

        assert_eq!(ba.annotation().get("Type"), Some("GenePix Results 3"));
        assert_eq!(ba.annotation().get("FeatureType"), Some("Irregular, Filled"));
        assert_eq!(ba.annotation().get("FocusPosition"), Some("-10"));
        assert_eq!(ba.annotation().get("FILTERS"), Some("<Empty>\tCy3"));
        assert_eq!(ba.annotation().get("DateTime"), Some("2007/01/02 03:04:05"));
    }
}
