// ==============================================================================
// biolist.rs - Biological Identifier Lists
// ==============================================================================
// Description: Ordered lists of identifiers (one per line) used by filters
// Created: 2025-11-10
// Modified: 2026-01-17
// Version: 1.0.0
// ==============================================================================

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Ordered list of identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiologicalList {
    ids: Vec<String>,
    index: HashSet<String>,
}

impl BiologicalList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.index.insert(id.clone());
        self.ids.push(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for BiologicalList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = BiologicalList::new();
        for id in iter {
            list.add(id);
        }
        list
    }
}

/// Reads one identifier per line; '#' lines are comments
pub struct BiologicalListReader<R> {
    input: R,
    source: String,
    trim: bool,
}

impl BiologicalListReader<BufReader<File>> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)).with_source(path.to_string_lossy()))
    }
}

impl<R: BufRead> BiologicalListReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            source: "stream".to_string(),
            trim: true,
        }
    }

    /// Name of the input, reported in the log
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn read(self) -> Result<BiologicalList, std::io::Error> {
        let mut list = BiologicalList::new();

        for line in self.input.lines() {
            let line = line?;
            if line.starts_with('#') {
                continue;
            }
            let id = if self.trim { line.trim() } else { line.as_str() };
            if id.is_empty() {
                continue;
            }
            list.add(id);
        }

        info!("Read biological list from {} ({} rows)", self.source, list.len());
        Ok(list)
    }
}

/// Write one identifier per line
pub fn write_biological_list<W: Write>(list: &BiologicalList, mut output: W) -> Result<(), std::io::Error> {
    for id in list.ids() {
        writeln!(output, "{}", id)?;
    }
    output.flush()
}

pub fn write_biological_list_file(list: &BiologicalList, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
    let file = File::create(path.as_ref())?;
    write_biological_list(list, BufWriter::new(file))
}
