// ==============================================================================
// bioassay_utils.rs - BioAssay Transformations
// ==============================================================================
// Description: Replicate merging, identifier renaming, dye-swap and MA values
// Created: 2025-11-13
// Modified: 2026-01-17
// Version: 1.2.0
// ==============================================================================
// Replicate merging, per column type:
//   double  -> median of the finite values (NaN when none)
//   int     -> first value; "flags" keeps the minimum (worst flag wins)
//   string  -> first value
// stddevm / stddeva are added from the m / a replicates when absent.
// ==============================================================================

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::models::{field, BioAssay, BioAssayError, FieldData, FieldKind};

/// Collapse rows sharing the same id into one row
pub fn merge_inner_ids_replicates(bioassay: &BioAssay) -> BioAssay {
    merge_replicates(bioassay, field::ID)
}

/// Collapse rows sharing the same description into one row
pub fn merge_inner_descriptions_replicates(bioassay: &BioAssay) -> BioAssay {
    merge_replicates(bioassay, field::DESCRIPTION)
}

/// Collapse rows sharing the same `key` value; groups keep first-appearance order
pub fn merge_replicates(bioassay: &BioAssay, key: &str) -> BioAssay {
    let Some(keys) = bioassay.field(key) else {
        warn!("Cannot merge replicates of '{}': no '{}' field", bioassay.name(), key);
        return bioassay.clone();
    };

    let groups = group_rows(keys, bioassay.size());
    let mut merged = BioAssay::with_name(bioassay.name());
    *merged.annotation_mut() = bioassay.annotation().clone();

    for f in bioassay.fields() {
        let data = merge_column(&f.name, &f.data, &groups);
        // Every merged column has one row per group
        if let Err(e) = merged.set_field(f.name.clone(), data) {
            warn!("Skipping merged field '{}': {}", f.name, e);
        }
    }

    for (source, target) in [(field::M, field::STD_DEV_M), (field::A, field::STD_DEV_A)] {
        if bioassay.contains_field(target) {
            continue;
        }
        if let Some(values) = bioassay.doubles(source) {
            let deviations = groups.iter().map(|g| std_dev(values, g)).collect();
            if let Err(e) = merged.set_doubles(target, deviations) {
                warn!("Skipping '{}': {}", target, e);
            }
        }
    }

    info!(
        "Merged {} rows of '{}' into {} {} groups",
        bioassay.size(),
        bioassay.name(),
        groups.len(),
        key
    );
    merged
}

/// Row indices grouped by key text, in first-appearance order
fn group_rows(keys: &FieldData, rows: usize) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in 0..rows {
        let key = keys.text_at(row).unwrap_or_default();
        match index.get(&key) {
            Some(&g) => groups[g].push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }
    groups
}

fn merge_column(name: &str, data: &FieldData, groups: &[Vec<usize>]) -> FieldData {
    match data {
        FieldData::Double(values) => FieldData::Double(groups.iter().map(|g| median(values, g)).collect()),
        FieldData::Int(values) if name == field::FLAGS => FieldData::Int(
            groups
                .iter()
                .map(|g| g.iter().map(|&r| values[r]).min().unwrap_or_default())
                .collect(),
        ),
        FieldData::Int(values) => FieldData::Int(groups.iter().map(|g| values[g[0]]).collect()),
        FieldData::String(values) => {
            FieldData::String(groups.iter().map(|g| values[g[0]].clone()).collect())
        }
    }
}

fn finite_values(values: &[f64], rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&r| values[r]).filter(|v| v.is_finite()).collect()
}

/// Median of the finite values at `rows`
fn median(values: &[f64], rows: &[usize]) -> f64 {
    let mut finite = finite_values(values, rows);
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(f64::total_cmp);

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// Population standard deviation of the finite values at `rows`
fn std_dev(values: &[f64], rows: &[usize]) -> f64 {
    let finite = finite_values(values, rows);
    if finite.is_empty() {
        return f64::NAN;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Make ids unique: later duplicates of "g1" become "g1#2", "g1#3", ...
///
/// # Returns
/// * `Ok(n)` - Number of renamed rows (0 when there is no id field)
pub fn rename_ids_with_unique_identifiers(bioassay: &mut BioAssay) -> Result<usize, BioAssayError> {
    let Some(data) = bioassay.field_mut(field::ID) else {
        return Ok(0);
    };
    let FieldData::String(ids) = data else {
        return Err(BioAssayError::WrongType {
            field: field::ID.to_string(),
            expected: FieldKind::String,
        });
    };

    let existing: HashSet<String> = ids.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(ids.len());
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut renamed = 0;

    for id in ids.iter_mut() {
        if used.insert(id.clone()) {
            continue;
        }

        let suffix = next_suffix.entry(id.clone()).or_insert(2);
        let unique = loop {
            let candidate = format!("{}#{}", id, suffix);
            *suffix += 1;
            if !existing.contains(&candidate) && !used.contains(&candidate) {
                break candidate;
            }
        };

        used.insert(unique.clone());
        *id = unique;
        renamed += 1;
    }

    debug!("Renamed {} duplicate identifiers", renamed);
    Ok(renamed)
}

/// Dye-swap in place: exchange red and green, negate m and invert ratio
pub fn swap(bioassay: &mut BioAssay) -> Result<(), BioAssayError> {
    let red = bioassay.field(field::RED).cloned();
    let green = bioassay.field(field::GREEN).cloned();
    match (red, green) {
        (Some(red), Some(green)) => {
            bioassay.set_field(field::RED, green)?;
            bioassay.set_field(field::GREEN, red)?;
        }
        (Some(_), None) => bioassay.rename_field(field::RED, field::GREEN)?,
        (None, Some(_)) => bioassay.rename_field(field::GREEN, field::RED)?,
        (None, None) => {}
    }

    if let Some(m) = bioassay.doubles_mut(field::M) {
        m.iter_mut().for_each(|v| *v = -*v);
    }
    if let Some(ratio) = bioassay.doubles_mut(field::RATIO) {
        ratio.iter_mut().for_each(|v| *v = 1.0 / *v);
    }

    debug!("Swapped dyes of '{}'", bioassay.name());
    Ok(())
}

/// Set m = log2(red/green) and a = log2(red*green)/2
///
/// Rows with a non-positive intensity get NaN.
pub fn compute_ma(bioassay: &mut BioAssay) -> Result<(), BioAssayError> {
    for name in [field::RED, field::GREEN] {
        if !bioassay.contains_field(name) {
            return Err(BioAssayError::FieldNotFound(name.to_string()));
        }
    }

    let (m, a): (Vec<f64>, Vec<f64>) = (0..bioassay.size())
        .map(|row| {
            let red = bioassay.double_at(field::RED, row).unwrap_or(f64::NAN);
            let green = bioassay.double_at(field::GREEN, row).unwrap_or(f64::NAN);
            if red > 0.0 && green > 0.0 {
                ((red / green).log2(), (red * green).log2() / 2.0)
            } else {
                (f64::NAN, f64::NAN)
            }
        })
        .unzip();

    bioassay.set_doubles(field::M, m)?;
    bioassay.set_doubles(field::A, a)?;
    Ok(())
}
