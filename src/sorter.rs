// ==============================================================================
// sorter.rs - BioAssay Row Ordering
// ==============================================================================
// Description: Row comparators and stable in-place sorting of BioAssays
// Created: 2025-11-13
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================

use std::cmp::Ordering;
use tracing::debug;

use crate::models::{field, BioAssay, BioAssayError};

/// Compares two rows of the same BioAssay
pub trait BioAssayComparator {
    fn compare(&self, bioassay: &BioAssay, i: usize, j: usize) -> Ordering;
}

/// Orders rows by M, then by A (ascending, NaN last)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaSorter;

impl MaSorter {
    pub fn new() -> Self {
        MaSorter
    }
}

impl BioAssayComparator for MaSorter {
    fn compare(&self, bioassay: &BioAssay, i: usize, j: usize) -> Ordering {
        compare_field(bioassay, field::M, i, j).then_with(|| compare_field(bioassay, field::A, i, j))
    }
}

/// Numeric comparison of one field; missing values and NaN sort last
fn compare_field(bioassay: &BioAssay, name: &str, i: usize, j: usize) -> Ordering {
    let a = bioassay.double_at(name, i).filter(|v| !v.is_nan());
    let b = bioassay.double_at(name, j).filter(|v| !v.is_nan());
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of the rows of `bioassay` with `comparator`
pub fn sort_bioassay(bioassay: &mut BioAssay, comparator: &dyn BioAssayComparator) -> Result<(), BioAssayError> {
    let rows: &BioAssay = bioassay;
    let mut order: Vec<usize> = (0..rows.size()).collect();
    order.sort_by(|&i, &j| comparator.compare(rows, i, j));

    debug!("Sorted {} rows of '{}'", order.len(), bioassay.name());
    bioassay.permute_rows(&order)
}
