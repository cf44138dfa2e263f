// ==============================================================================
// processor.rs - BioAssay Job Processing
// ==============================================================================
// Description: Runs JSON job descriptions: read inputs, apply steps, write results
// Created: 2025-11-15
// Modified: 2026-01-17
// Version: 2.0.0
// ==============================================================================
// Job file example:
//   {
//     "inputs": ["slides/"],
//     "input_type": "gpr",
//     "steps": [
//       { "op": "compute_ma" },
//       { "op": "merge_ids" },
//       { "op": "filter", "field": "a", "condition": "<=", "threshold": 8.0 },
//       { "op": "sort_ma" }
//     ],
//     "output_dir": "results/",
//     "output_type": "total.summary",
//     "translator": "annotation.txt"
//   }
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::biolist::BiologicalListReader;
use crate::bioassay_utils;
use crate::filters::{BioAssayFilter, Condition, IdListFilter, ThresholdFilter};
use crate::formats::{ReaderFormat, WriterFormat};
use crate::genepix::GenepixResults;
use crate::models::BioAssay;
use crate::output::{self, WriteOptions};
use crate::parsers::{self, ReadOptions};
use crate::sorter::{sort_bioassay, MaSorter};
use crate::translator::{MultiColumnTranslatorReader, Translator};

fn default_input_type() -> ReaderFormat {
    ReaderFormat::Universal
}

/// Batch of BioAssay files processed with the same steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Files or directories (directories are walked for the input type)
    pub inputs: Vec<PathBuf>,

    #[serde(default = "default_input_type")]
    pub input_type: ReaderFormat,

    /// Read every column
    #[serde(default)]
    pub all_fields: bool,

    /// Numbers use ',' as decimal separator
    #[serde(default)]
    pub comma: bool,

    #[serde(default)]
    pub steps: Vec<Step>,

    pub output_dir: PathBuf,

    pub output_type: WriterFormat,

    /// Write every column
    #[serde(default)]
    pub write_all_fields: bool,

    /// Annotation table appended to written rows
    #[serde(default)]
    pub translator: Option<PathBuf>,
}

/// One transformation applied to each BioAssay of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    MergeIds,
    MergeDescriptions,
    RenameIds,
    Swap,
    ComputeMa,
    /// Remove rows where `field condition threshold` holds
    Filter {
        field: String,
        condition: Condition,
        threshold: f64,
    },
    /// Remove rows whose id is listed in a file
    RemoveIds { list: PathBuf },
    SortMa,
}

impl Job {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| format!("Invalid job file {:?}", path))
    }
}

pub struct JobProcessor {
    job: Job,
}

impl JobProcessor {
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Run the job; the first failure aborts it
    ///
    /// # Returns
    /// * `Ok(paths)` - Written files, in input order
    pub fn process(&self) -> Result<Vec<PathBuf>> {
        let job = &self.job;
        info!(
            "Processing job: {} inputs, {} steps, {} -> {}",
            job.inputs.len(),
            job.steps.len(),
            job.input_type,
            job.output_type
        );

        // 1. Locate input files and plan their outputs
        let inputs = collect_inputs(&job.inputs, job.input_type)?;
        if inputs.is_empty() {
            anyhow::bail!("No {} input files found", job.input_type);
        }
        let targets = plan_outputs(&inputs, &job.output_dir, job.output_type)?;
        let files: Vec<&Path> = inputs.iter().map(|input| input.path.as_path()).collect();

        // 2. Read them all
        let options = ReadOptions {
            all_fields: job.all_fields,
            comma_decimal: job.comma,
        };
        let bioassays = parsers::read_bioassays(&files, job.input_type, options)
            .context("Failed to read input files")?;

        // 3. Load the translator
        let translator: Option<Arc<dyn Translator>> = match &job.translator {
            Some(path) => {
                let translator = MultiColumnTranslatorReader::from_path(path)
                    .and_then(|reader| reader.read())
                    .with_context(|| format!("Failed to load translator {:?}", path))?;
                Some(Arc::new(translator))
            }
            None => None,
        };

        // 4. Transform and write
        let mut written = Vec::with_capacity(bioassays.len());
        for (bioassay, path) in bioassays.into_iter().zip(targets) {
            let result = self.apply_steps(bioassay)?;

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory {:?}", parent))?;
            }
            let options = WriteOptions {
                all_fields: job.write_all_fields,
            };
            output::write_bioassay(&result, &path, job.output_type, options, translator.clone())
                .with_context(|| format!("Failed to write {:?}", path))?;
            written.push(path);
        }

        info!("Job complete: {} files written", written.len());
        Ok(written)
    }

    fn apply_steps(&self, mut bioassay: BioAssay) -> Result<BioAssay> {
        for step in &self.job.steps {
            let name = bioassay.name().to_string();
            debug!("Applying {} to '{}'", step_name(step), name);
            bioassay = apply_step(bioassay, step)
                .with_context(|| format!("Step '{}' failed on '{}'", step_name(step), name))?;
        }
        Ok(bioassay)
    }
}

fn step_name(step: &Step) -> &'static str {
    match step {
        Step::MergeIds => "merge_ids",
        Step::MergeDescriptions => "merge_descriptions",
        Step::RenameIds => "rename_ids",
        Step::Swap => "swap",
        Step::ComputeMa => "compute_ma",
        Step::Filter { .. } => "filter",
        Step::RemoveIds { .. } => "remove_ids",
        Step::SortMa => "sort_ma",
    }
}

/// Apply one step, returning the transformed BioAssay
pub fn apply_step(mut bioassay: BioAssay, step: &Step) -> Result<BioAssay> {
    match step {
        Step::MergeIds => Ok(bioassay_utils::merge_inner_ids_replicates(&bioassay)),
        Step::MergeDescriptions => Ok(bioassay_utils::merge_inner_descriptions_replicates(&bioassay)),
        Step::RenameIds => {
            let renamed = bioassay_utils::rename_ids_with_unique_identifiers(&mut bioassay)?;
            debug!("Renamed {} ids of '{}'", renamed, bioassay.name());
            Ok(bioassay)
        }
        Step::Swap => {
            bioassay_utils::swap(&mut bioassay)?;
            Ok(bioassay)
        }
        Step::ComputeMa => {
            bioassay_utils::compute_ma(&mut bioassay)?;
            Ok(bioassay)
        }
        Step::Filter {
            field,
            condition,
            threshold,
        } => {
            let filter = ThresholdFilter::new(field.as_str(), *condition, *threshold);
            info!("Filter {} removes {} rows of '{}'", filter, filter.count(&bioassay), bioassay.name());
            Ok(filter.filter(&bioassay))
        }
        Step::RemoveIds { list } => {
            let list = BiologicalListReader::from_path(list)
                .and_then(|reader| reader.read())
                .with_context(|| format!("Failed to read id list {:?}", list))?;
            Ok(IdListFilter::new(list).filter(&bioassay))
        }
        Step::SortMa => {
            sort_bioassay(&mut bioassay, &MaSorter::new())?;
            Ok(bioassay)
        }
    }
}

/// Input file located by `collect_inputs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Directory of the file relative to the walked input directory
    /// (empty for plain file arguments)
    pub relative_dir: PathBuf,
}

/// Expand directories into the files of `format`, sorted by name
///
/// Plain file arguments are kept as given, in order.
pub fn collect_inputs(inputs: &[PathBuf], format: ReaderFormat) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(InputFile {
                path: input.clone(),
                relative_dir: PathBuf::new(),
            });
            continue;
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {:?}", input))?;
            if entry.file_type().is_file() && matches_format(entry.path(), format) {
                let relative_dir = entry
                    .path()
                    .parent()
                    .and_then(|parent| parent.strip_prefix(input).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                files.push(InputFile {
                    path: entry.path().to_path_buf(),
                    relative_dir,
                });
            }
        }
    }

    debug!("Collected {} input files", files.len());
    Ok(files)
}

/// Output file of every input; two inputs may not share an output
///
/// Files found in subdirectories keep their subdirectory under `dir`.
pub fn plan_outputs(inputs: &[InputFile], dir: &Path, format: WriterFormat) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(inputs.len());

    for input in inputs {
        let name = parsers::file_name(&input.path);
        let target = output_path(&dir.join(&input.relative_dir), &name, format);
        if !seen.insert(target.clone()) {
            anyhow::bail!("Input {:?} would overwrite output {:?} of another input", input.path, target);
        }
        targets.push(target);
    }

    Ok(targets)
}

/// Whether a file name ends with the format extension (optionally gzipped)
fn matches_format(path: &Path, format: ReaderFormat) -> bool {
    let Some(extension) = format.extension() else {
        return true;
    };
    let name = parsers::file_name(path);
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    name.ends_with(&format!(".{}", extension))
}

/// Output file for an input named `name`: input extension replaced
pub fn output_path(dir: &Path, name: &str, format: WriterFormat) -> PathBuf {
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let stem = ReaderFormat::ALL
        .iter()
        .filter_map(|f| f.extension())
        .find_map(|ext| name.strip_suffix(&format!(".{}", ext)))
        .or_else(|| name.rsplit_once('.').map(|(stem, _)| stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(name);

    dir.join(format!("{}.{}", stem, format.extension()))
}

/// JSON summary of a BioAssay: name, size, fields, annotation, GenePix header
pub fn summarize(bioassay: &BioAssay) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = bioassay
        .fields()
        .iter()
        .map(|f| json!({ "name": f.name, "type": f.data.kind() }))
        .collect();

    let annotation: serde_json::Map<String, serde_json::Value> = bioassay
        .annotation()
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();

    let mut summary = json!({
        "name": bioassay.name(),
        "rows": bioassay.size(),
        "fields": fields,
        "annotation": annotation,
    });

    let gpr = GenepixResults::new(bioassay);
    if gpr.is_gpr_data() {
        summary["genepix"] = json!({
            "type": gpr.file_type(),
            "date_time": gpr.date_time().map(|d| d.to_string()),
            "creator": gpr.creator(),
            "scanner": gpr.scanner(),
            "feature_type": gpr.feature_type(),
            "gal_file": gpr.gal_file(),
        });
    }
    summary
}
