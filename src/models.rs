// ==============================================================================
// models.rs - BioAssay Data Model
// ==============================================================================
// Description: In-memory representation of one microarray sample (BioAssay)
// Created: 2025-11-12
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known BioAssay field names
pub mod field {
    /// Red channel intensity
    pub const RED: &str = "red";
    /// Green channel intensity
    pub const GREEN: &str = "green";
    /// Spot flags
    pub const FLAGS: &str = "flags";
    /// Spot identifier
    pub const ID: &str = "id";
    /// Red/green ratio
    pub const RATIO: &str = "ratio";
    /// Spot brightness
    pub const BRIGHT: &str = "bright";
    /// Spot description (GenePix "Name")
    pub const DESCRIPTION: &str = "description";
    /// A coordinate of an MA plot
    pub const A: &str = "a";
    /// M coordinate of an MA plot
    pub const M: &str = "m";
    /// Standard deviation of A values
    pub const STD_DEV_A: &str = "stddeva";
    /// Standard deviation of M values
    pub const STD_DEV_M: &str = "stddevm";

    pub const ALL: [&str; 11] = [
        RED,
        GREEN,
        FLAGS,
        ID,
        RATIO,
        BRIGHT,
        DESCRIPTION,
        A,
        M,
        STD_DEV_A,
        STD_DEV_M,
    ];
}

/// Spot flag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Bad,
    Absent,
    NotFound,
    Unflagged,
    Normalized,
    Good,
}

impl Flag {
    pub const ALL: [Flag; 6] = [
        Flag::Bad,
        Flag::Absent,
        Flag::NotFound,
        Flag::Unflagged,
        Flag::Normalized,
        Flag::Good,
    ];

    /// Integer value stored in the flags column
    pub fn value(&self) -> i32 {
        match self {
            Flag::Bad => -100,
            Flag::Absent => -75,
            Flag::NotFound => -50,
            Flag::Unflagged => 0,
            Flag::Normalized => 1,
            Flag::Good => 100,
        }
    }

    pub fn from_value(value: i32) -> Option<Flag> {
        Flag::ALL.iter().copied().find(|f| f.value() == value)
    }
}

/// Type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int,
    Double,
    String,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Int => write!(f, "int"),
            FieldKind::Double => write!(f, "double"),
            FieldKind::String => write!(f, "string"),
        }
    }
}

/// Values of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum FieldData {
    Int(Vec<i32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl FieldData {
    pub fn len(&self) -> usize {
        match self {
            FieldData::Int(v) => v.len(),
            FieldData::Double(v) => v.len(),
            FieldData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldData::Int(_) => FieldKind::Int,
            FieldData::Double(_) => FieldKind::Double,
            FieldData::String(_) => FieldKind::String,
        }
    }

    /// Numeric value at `row` (ints are widened, strings have none)
    pub fn double_at(&self, row: usize) -> Option<f64> {
        match self {
            FieldData::Int(v) => v.get(row).map(|&x| x as f64),
            FieldData::Double(v) => v.get(row).copied(),
            FieldData::String(_) => None,
        }
    }

    /// Textual value at `row`, used for keys and identifiers
    pub fn text_at(&self, row: usize) -> Option<String> {
        match self {
            FieldData::Int(v) => v.get(row).map(|x| x.to_string()),
            FieldData::Double(v) => v.get(row).map(|x| x.to_string()),
            FieldData::String(v) => v.get(row).cloned(),
        }
    }

    /// New column holding the rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> FieldData {
        match self {
            FieldData::Int(v) => FieldData::Int(indices.iter().map(|&i| v[i]).collect()),
            FieldData::Double(v) => FieldData::Double(indices.iter().map(|&i| v[i]).collect()),
            FieldData::String(v) => {
                FieldData::String(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// Named column of a BioAssay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data: FieldData,
}

/// Ordered key/value properties (e.g. GenePix header records)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    properties: Vec<(String, String)>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Errors raised when manipulating a BioAssay
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BioAssayError {
    #[error("Field '{field}' has {actual} rows, expected {expected}")]
    SizeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field '{field}' is not of type {expected}")]
    WrongType { field: String, expected: FieldKind },

    #[error("Field already exists: {0}")]
    DuplicateField(String),

    #[error("Invalid row order: expected a permutation of {size} rows")]
    InvalidPermutation { size: usize },
}

/// One microarray sample: a name, an annotation and equally sized columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BioAssay {
    name: String,
    annotation: Annotation,
    fields: Vec<Field>,
}

impl BioAssay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn annotation_mut(&mut self) -> &mut Annotation {
        &mut self.annotation
    }

    /// Number of rows (0 when no field is set)
    pub fn size(&self) -> usize {
        self.fields.first().map(|f| f.data.len()).unwrap_or(0)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldData> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.data)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldData> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| &mut f.data)
    }

    /// Set or replace a column
    ///
    /// The column length must match the current row count, unless the
    /// column replaces the only field of the assay.
    pub fn set_field(&mut self, name: impl Into<String>, data: FieldData) -> Result<(), BioAssayError> {
        let name = name.into();
        let replaces_only_field = self.fields.len() == 1 && self.fields[0].name == name;

        if !self.fields.is_empty() && !replaces_only_field && data.len() != self.size() {
            return Err(BioAssayError::SizeMismatch {
                field: name,
                expected: self.size(),
                actual: data.len(),
            });
        }

        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.data = data,
            None => self.fields.push(Field { name, data }),
        }
        Ok(())
    }

    pub fn set_ints(&mut self, name: impl Into<String>, values: Vec<i32>) -> Result<(), BioAssayError> {
        self.set_field(name, FieldData::Int(values))
    }

    pub fn set_doubles(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), BioAssayError> {
        self.set_field(name, FieldData::Double(values))
    }

    pub fn set_strings(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<(), BioAssayError> {
        self.set_field(name, FieldData::String(values))
    }

    pub fn ints(&self, name: &str) -> Option<&[i32]> {
        match self.field(name)? {
            FieldData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn doubles(&self, name: &str) -> Option<&[f64]> {
        match self.field(name)? {
            FieldData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn strings(&self, name: &str) -> Option<&[String]> {
        match self.field(name)? {
            FieldData::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn doubles_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        match self.field_mut(name)? {
            FieldData::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn strings_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match self.field_mut(name)? {
            FieldData::String(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value of `field` at `row` (None for missing fields or strings)
    pub fn double_at(&self, field: &str, row: usize) -> Option<f64> {
        self.field(field)?.double_at(row)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<FieldData> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos).data)
    }

    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), BioAssayError> {
        if old == new {
            return Ok(());
        }
        if self.contains_field(new) {
            return Err(BioAssayError::DuplicateField(new.to_string()));
        }
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == old)
            .ok_or_else(|| BioAssayError::FieldNotFound(old.to_string()))?;
        field.name = new.to_string();
        Ok(())
    }

    /// New BioAssay with the rows at `indices`, keeping name and annotation
    pub fn select_rows(&self, indices: &[usize]) -> BioAssay {
        BioAssay {
            name: self.name.clone(),
            annotation: self.annotation.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| Field {
                    name: f.name.clone(),
                    data: f.data.select(indices),
                })
                .collect(),
        }
    }

    /// Reorder rows in place; `order[k]` is the old index of new row `k`
    pub fn permute_rows(&mut self, order: &[usize]) -> Result<(), BioAssayError> {
        let size = self.size();
        let mut seen = vec![false; size];
        if order.len() != size {
            return Err(BioAssayError::InvalidPermutation { size });
        }
        for &i in order {
            if i >= size || seen[i] {
                return Err(BioAssayError::InvalidPermutation { size });
            }
            seen[i] = true;
        }

        for field in &mut self.fields {
            field.data = field.data.select(order);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BioAssay {
        let mut ba = BioAssay::with_name("sample");
        ba.set_strings(field::ID, vec!["g1".into(), "g2".into(), "g3".into()])
            .unwrap();
        ba.set_doubles(field::M, vec![0.5, -1.0, 2.0]).unwrap();
        ba.set_ints(field::FLAGS, vec![0, -100, 100]).unwrap();
        ba
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(Flag::Bad.value(), -100);
        assert_eq!(Flag::Absent.value(), -75);
        assert_eq!(Flag::NotFound.value(), -50);
        assert_eq!(Flag::Unflagged.value(), 0);
        assert_eq!(Flag::Normalized.value(), 1);
        assert_eq!(Flag::Good.value(), 100);
        assert_eq!(Flag::from_value(-75), Some(Flag::Absent));
        assert_eq!(Flag::from_value(42), None);
    }

    #[test]
    fn test_field_size_mismatch() {
        let mut ba = sample();
        let result = ba.set_doubles(field::A, vec![1.0]);
        match result.unwrap_err() {
            BioAssayError::SizeMismatch { expected, actual, .. } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected SizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_replace_only_field_with_other_size() {
        let mut ba = BioAssay::new();
        ba.set_doubles(field::M, vec![1.0, 2.0]).unwrap();
        ba.set_doubles(field::M, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ba.size(), 3);
    }

    #[test]
    fn test_typed_accessors() {
        let ba = sample();
        assert_eq!(ba.size(), 3);
        assert_eq!(ba.doubles(field::M).unwrap()[2], 2.0);
        assert!(ba.ints(field::M).is_none());
        assert_eq!(ba.double_at(field::FLAGS, 1), Some(-100.0));
        assert_eq!(ba.double_at(field::ID, 0), None);
        assert_eq!(ba.field_names(), vec!["id", "m", "flags"]);
    }

    #[test]
    fn test_select_rows_keeps_name_and_annotation() {
        let mut ba = sample();
        ba.annotation_mut().set("Type", "GenePix Results 3");

        let subset = ba.select_rows(&[2, 0]);
        assert_eq!(subset.name(), "sample");
        assert_eq!(subset.annotation().get("Type"), Some("GenePix Results 3"));
        assert_eq!(subset.strings(field::ID).unwrap(), &["g3", "g1"]);
        assert_eq!(subset.ints(field::FLAGS).unwrap(), &[100, 0]);
    }

    #[test]
    fn test_permute_rows_rejects_bad_order() {
        let mut ba = sample();
        assert!(ba.permute_rows(&[0, 0, 1]).is_err());
        assert!(ba.permute_rows(&[0, 1]).is_err());

        ba.permute_rows(&[1, 2, 0]).unwrap();
        assert_eq!(ba.doubles(field::M).unwrap(), &[-1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_rename_field() {
        let mut ba = sample();
        ba.rename_field(field::M, "Mnorm").unwrap();
        assert!(ba.contains_field("Mnorm"));
        assert_eq!(
            ba.rename_field("Mnorm", field::ID).unwrap_err(),
            BioAssayError::DuplicateField("id".to_string())
        );
        assert!(ba.rename_field("missing", "x").is_err());
    }

    #[test]
    fn test_annotation_keeps_order() {
        let mut annotation = Annotation::new();
        annotation.set("Type", "GenePix Results 3");
        annotation.set("Creator", "GenePix Pro");
        annotation.set("Type", "GenePix Results 4");

        let keys: Vec<&str> = annotation.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Type", "Creator"]);
        assert_eq!(annotation.get("Type"), Some("GenePix Results 4"));
        assert_eq!(annotation.remove("Creator"), Some("GenePix Pro".to_string()));
        assert_eq!(annotation.len(), 1);
    }
}
