use std::io::BufRead;
use std::path::{Component, Path, PathBuf};

use tsp_bench_summary_model::{AggregateRecord, StatSummary};

use crate::error::SeriesError;
use crate::fields::{self, NAME};

/// One problem instance under benchmark, together with the observations gathered from its
/// run series.
///
/// Observations are only ever recorded as `(distance, time)` pairs so the two sample sequences
/// always have the same length and index alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCase {
    source_path: PathBuf,
    label: String,
    distances: Vec<i64>,
    times: Vec<f64>,
}

impl InstanceCase {
    /// Read the instance header at `source_path` to discover its label.
    ///
    /// The label becomes a directory name, so it must be a single, normal path component. When
    /// several `NAME` fields are present the last one wins.
    pub fn from_file(source_path: impl Into<PathBuf>) -> Result<Self, SeriesError> {
        let source_path = source_path.into();
        let file = std::fs::File::open(&source_path).map_err(|source| {
            SeriesError::InstanceRead {
                path: source_path.clone(),
                source,
            }
        })?;

        let mut label = None;
        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(|source| SeriesError::InstanceRead {
                path: source_path.clone(),
                source,
            })?;
            if let Some(value) = fields::field_value(&line, NAME) {
                label = Some(value.to_string());
            }
        }

        match label {
            Some(label) if is_path_component(&label) => Ok(Self::new(source_path, label)),
            Some(label) => {
                log::warn!(
                    "Ignoring NAME '{label}' in {}: not usable as a directory name",
                    source_path.display()
                );
                Err(SeriesError::MissingLabel { path: source_path })
            }
            None => Err(SeriesError::MissingLabel { path: source_path }),
        }
    }

    pub(crate) fn new(source_path: PathBuf, label: String) -> Self {
        Self {
            source_path,
            label,
            distances: Vec::new(),
            times: Vec::new(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn distances(&self) -> &[i64] {
        &self.distances
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of recorded runs.
    pub fn run_count(&self) -> usize {
        self.distances.len()
    }

    /// Record the outcome of one run.
    pub fn record_run(&mut self, distance: i64, time: f64) {
        self.distances.push(distance);
        self.times.push(time);
    }

    /// Compute the aggregate record for this instance.
    ///
    /// Fails if fewer than two runs were recorded; a benchmark that produced no usable data is
    /// never reported as zero or `NaN`.
    pub fn summarize(&self) -> Result<AggregateRecord, SeriesError> {
        let distances = self
            .distances
            .iter()
            .map(|&distance| distance as f64)
            .collect::<Vec<_>>();

        Ok(AggregateRecord {
            name: self.label.clone(),
            distance: StatSummary::from_samples(&distances)?,
            time: StatSummary::from_samples(&self.times)?,
            samples: self.run_count(),
        })
    }
}

fn is_path_component(label: &str) -> bool {
    let mut components = Path::new(label).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !label.contains(['/', '\\'])
}
