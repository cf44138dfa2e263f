// ==============================================================================
// filters.rs - BioAssay Row Filters
// ==============================================================================
// Description: Threshold and identifier-list filters over BioAssay rows
// Created: 2025-11-12
// Modified: 2026-01-17
// Version: 1.1.0
// ==============================================================================
// A row is "positive" when it matches the filter test. filter() removes the
// positive rows; count() reports how many rows are positive.
//
// The M floor filter works on a set of replicate slides: an id is positive
// when at least `rate` of its replicate M values reach `floor`, and only the
// positive rows are kept.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::biolist::BiologicalList;
use crate::models::{field, BioAssay};

/// Errors raised when building a filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Missing filter argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid filter condition: '{0}' (expected '<=' or '>=')")]
    InvalidCondition(String),
}

/// Comparison applied between a value and the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Condition {
    pub fn symbol(&self) -> &'static str {
        match self {
            Condition::LessOrEqual => "<=",
            Condition::GreaterOrEqual => ">=",
        }
    }

    /// NaN never satisfies a condition
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Condition::LessOrEqual => value <= threshold,
            Condition::GreaterOrEqual => value >= threshold,
        }
    }
}

impl FromStr for Condition {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(Condition::LessOrEqual),
            ">=" => Ok(Condition::GreaterOrEqual),
            other => Err(FilterError::InvalidCondition(other.to_string())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Row filter over a BioAssay
pub trait BioAssayFilter {
    /// Whether `row` of `bioassay` is positive
    fn test(&self, bioassay: &BioAssay, row: usize) -> bool;

    /// Whether filter() drops positive rows (true) or keeps only them
    fn remove_positive_rows(&self) -> bool {
        true
    }

    /// New BioAssay without the filtered rows
    fn filter(&self, bioassay: &BioAssay) -> BioAssay {
        let remove = self.remove_positive_rows();
        let kept: Vec<usize> = (0..bioassay.size())
            .filter(|&row| self.test(bioassay, row) != remove)
            .collect();

        debug!(
            "Filter kept {} of {} rows of '{}'",
            kept.len(),
            bioassay.size(),
            bioassay.name()
        );
        bioassay.select_rows(&kept)
    }

    /// Number of positive rows
    fn count(&self, bioassay: &BioAssay) -> usize {
        (0..bioassay.size())
            .filter(|&row| self.test(bioassay, row))
            .count()
    }
}

/// Filter testing `field condition threshold` on each row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFilter {
    field: String,
    condition: Condition,
    threshold: f64,
}

impl ThresholdFilter {
    pub fn new(field: impl Into<String>, condition: Condition, threshold: f64) -> Self {
        Self {
            field: field.into(),
            condition,
            threshold,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl BioAssayFilter for ThresholdFilter {
    fn test(&self, bioassay: &BioAssay, row: usize) -> bool {
        bioassay
            .double_at(&self.field, row)
            .is_some_and(|value| self.condition.holds(value, self.threshold))
    }
}

impl fmt::Display for ThresholdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.condition, self.threshold)
    }
}

/// Filter whose positive rows are those with an id in a list
#[derive(Debug, Clone, PartialEq)]
pub struct IdListFilter {
    list: BiologicalList,
    field: String,
}

impl IdListFilter {
    pub fn new(list: BiologicalList) -> Self {
        Self {
            list,
            field: field::ID.to_string(),
        }
    }

    /// Match the list against another string field (e.g. description)
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

impl BioAssayFilter for IdListFilter {
    fn test(&self, bioassay: &BioAssay, row: usize) -> bool {
        bioassay
            .field(&self.field)
            .and_then(|data| data.text_at(row))
            .is_some_and(|id| self.list.contains(&id))
    }
}

/// Build a threshold filter; every argument is required
///
/// # Example
/// ```
/// use bioassay_kit::filters::{create_threshold_filter, BioAssayFilter};
///
/// let filter = create_threshold_filter("a", "<=", 8.0)?;
/// assert_eq!(filter.to_string(), "a <= 8");
/// assert!(create_threshold_filter("a", None::<&str>, 8.0).is_err());
/// # Ok::<(), bioassay_kit::filters::FilterError>(())
/// ```
pub fn create_threshold_filter<'a>(
    field: impl Into<Option<&'a str>>,
    condition: impl Into<Option<&'a str>>,
    threshold: impl Into<Option<f64>>,
) -> Result<ThresholdFilter, FilterError> {
    let field = field.into().ok_or(FilterError::MissingArgument("field"))?;
    let condition = condition.into().ok_or(FilterError::MissingArgument("condition"))?;
    let threshold = threshold.into().ok_or(FilterError::MissingArgument("threshold"))?;

    Ok(ThresholdFilter::new(field, condition.parse()?, threshold))
}

/// Filter matching rows where `field <= threshold`
pub fn create_inf_filter<'a>(
    field: impl Into<Option<&'a str>>,
    threshold: impl Into<Option<f64>>,
) -> Result<ThresholdFilter, FilterError> {
    create_threshold_filter(field, "<=", threshold)
}

/// Filter matching rows where `field >= threshold`
pub fn create_sup_filter<'a>(
    field: impl Into<Option<&'a str>>,
    threshold: impl Into<Option<f64>>,
) -> Result<ThresholdFilter, FilterError> {
    create_threshold_filter(field, ">=", threshold)
}

pub fn create_a_inf_filter(threshold: impl Into<Option<f64>>) -> Result<ThresholdFilter, FilterError> {
    create_inf_filter(field::A, threshold)
}

pub fn create_a_sup_filter(threshold: impl Into<Option<f64>>) -> Result<ThresholdFilter, FilterError> {
    create_sup_filter(field::A, threshold)
}

pub fn create_m_inf_filter(threshold: impl Into<Option<f64>>) -> Result<ThresholdFilter, FilterError> {
    create_inf_filter(field::M, threshold)
}

pub fn create_m_sup_filter(threshold: impl Into<Option<f64>>) -> Result<ThresholdFilter, FilterError> {
    create_sup_filter(field::M, threshold)
}

/// Default M floor of `MFloorFilter`
pub const M_FLOOR_DEFAULT: f64 = 4.0;

/// Default share of replicates that must reach the floor
pub const M_FLOOR_RATE_DEFAULT: f64 = 2.0 / 3.0;

/// Floor filter over the M values of replicate BioAssays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MFloorFilter {
    floor: f64,
    rate: f64,
}

impl Default for MFloorFilter {
    fn default() -> Self {
        Self {
            floor: M_FLOOR_DEFAULT,
            rate: M_FLOOR_RATE_DEFAULT,
        }
    }
}

impl MFloorFilter {
    pub fn new(floor: f64, rate: f64) -> Self {
        Self { floor, rate }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether enough of `values` reach the floor (NaN never does)
    pub fn test_values(&self, values: &[f64]) -> bool {
        if values.is_empty() {
            return false;
        }
        let upper = values.iter().filter(|&&m| m >= self.floor).count();
        upper as f64 / values.len() as f64 >= self.rate
    }

    /// Ids of the replicates that pass the floor, in first-seen order
    ///
    /// Each replicate contributes the M value of the first row holding the
    /// id; an id absent from a replicate counts as NaN there.
    pub fn passing_ids(&self, replicates: &[BioAssay]) -> BiologicalList {
        let mut order: Vec<&str> = Vec::new();
        let mut per_replicate: Vec<HashMap<&str, f64>> = Vec::with_capacity(replicates.len());

        for replicate in replicates {
            let mut values = HashMap::new();
            match (replicate.strings(field::ID), replicate.doubles(field::M)) {
                (Some(ids), Some(m)) => {
                    for (id, &value) in ids.iter().zip(m) {
                        if !values.contains_key(id.as_str()) {
                            if !per_replicate.iter().any(|seen| seen.contains_key(id.as_str())) {
                                order.push(id.as_str());
                            }
                            values.insert(id.as_str(), value);
                        }
                    }
                }
                _ => warn!(
                    "BioAssay '{}' has no {} or {} field, its M values count as missing",
                    replicate.name(),
                    field::ID,
                    field::M
                ),
            }
            per_replicate.push(values);
        }

        let passing: BiologicalList = order
            .into_iter()
            .filter(|id| {
                let values: Vec<f64> = per_replicate
                    .iter()
                    .map(|values| values.get(id).copied().unwrap_or(f64::NAN))
                    .collect();
                self.test_values(&values)
            })
            .collect();

        debug!(
            "M floor {} (rate {}) passed {} ids over {} replicates",
            self.floor,
            self.rate,
            passing.len(),
            replicates.len()
        );
        passing
    }

    /// Row filter selecting the passing ids of `replicates`
    pub fn bind(&self, replicates: &[BioAssay]) -> MFloorSelection {
        MFloorSelection {
            passing: self.passing_ids(replicates),
        }
    }

    /// Keep in every replicate only the rows of passing ids
    pub fn filter_replicates(&self, replicates: &[BioAssay]) -> Vec<BioAssay> {
        let selection = self.bind(replicates);
        replicates.iter().map(|ba| selection.filter(ba)).collect()
    }

    /// Number of passing ids
    pub fn count_replicates(&self, replicates: &[BioAssay]) -> usize {
        self.passing_ids(replicates).len()
    }
}

/// Ids passing an `MFloorFilter`; filter() keeps the positive rows
#[derive(Debug, Clone, PartialEq)]
pub struct MFloorSelection {
    passing: BiologicalList,
}

impl MFloorSelection {
    pub fn passing(&self) -> &BiologicalList {
        &self.passing
    }
}

impl BioAssayFilter for MFloorSelection {
    fn test(&self, bioassay: &BioAssay, row: usize) -> bool {
        bioassay
            .field(field::ID)
            .and_then(|data| data.text_at(row))
            .is_some_and(|id| self.passing.contains(&id))
    }

    fn remove_positive_rows(&self) -> bool {
        false
    }
}
