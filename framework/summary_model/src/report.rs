use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::stats::{mean, sample_std_dev, StatsError};
use crate::RunSummary;

/// Placeholder written to [BenchmarkReport::notes] until someone edits the report by hand.
pub const DEFAULT_NOTES: &str = "Add notes here...";

/// Mean and sample standard deviation of one sample sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatSummary {
    pub average: f64,
    pub std_dev: f64,
}

impl StatSummary {
    /// Summarise `samples`, failing unless there are at least two of them.
    pub fn from_samples(samples: &[f64]) -> Result<Self, StatsError> {
        // Check the stricter requirement first so a short series reports how many samples it had.
        let std_dev = sample_std_dev(samples)?;
        Ok(Self {
            average: mean(samples)?,
            std_dev,
        })
    }
}

/// The summarised statistics for one instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateRecord {
    /// The instance label, read from its `NAME` header
    pub name: String,
    /// Tour distance statistics
    pub distance: StatSummary,
    /// Wall-clock time statistics, in seconds
    pub time: StatSummary,
    /// Number of paired observations the statistics were computed from
    pub samples: usize,
}

/// The stage an instance had reached when it failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Discovery,
    RunningSeries,
    CollectingSeries,
    Profiling,
    Rendering,
    Summarizing,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Discovery => "discovery",
            FailureStage::RunningSeries => "running series",
            FailureStage::CollectingSeries => "collecting series",
            FailureStage::Profiling => "profiling",
            FailureStage::Rendering => "rendering",
            FailureStage::Summarizing => "summarizing",
        };
        f.write_str(name)
    }
}

/// An instance that did not make it into [BenchmarkReport::results].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedInstance {
    /// Path of the instance file
    pub source: String,
    /// The instance label, if it could be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub stage: FailureStage,
    pub reason: String,
}

/// The document written at the end of a benchmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkReport {
    pub notes: String,
    /// One record per summarised instance, in instance enumeration order
    pub results: Vec<AggregateRecord>,
    #[serde(default)]
    pub failures: Vec<FailedInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSummary>,
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new(DEFAULT_NOTES)
    }
}

impl BenchmarkReport {
    pub fn new(notes: impl Into<String>) -> Self {
        Self {
            notes: notes.into(),
            results: Vec::new(),
            failures: Vec::new(),
            run: None,
        }
    }

    pub fn with_run(mut self, run: RunSummary) -> Self {
        self.run = Some(run);
        self
    }

    pub fn add_result(&mut self, record: AggregateRecord) {
        self.results.push(record);
    }

    pub fn add_failure(&mut self, failure: FailedInstance) {
        self.failures.push(failure);
    }

    pub fn run_mut(&mut self) -> Option<&mut RunSummary> {
        self.run.as_mut()
    }
}

/// Serialize the report to a writer as YAML
pub fn store_report<W: Write>(report: &BenchmarkReport, writer: W) -> anyhow::Result<()> {
    serde_yaml::to_writer(writer, report)?;
    Ok(())
}

/// Load a report from a YAML reader
pub fn load_report<R: Read>(reader: R) -> anyhow::Result<BenchmarkReport> {
    Ok(serde_yaml::from_reader(reader)?)
}

/// Write the report to `path`, replacing any previous report at that location.
///
/// The document is written to a sibling temporary file first and then renamed into place, so an
/// interrupted write never leaves a truncated report behind.
pub fn write_report(report: &BenchmarkReport, path: &Path) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("yml.partial");
    {
        let file = std::fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        store_report(report, &mut writer)?;
        writer.flush()?;
    }
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move report into place at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(name: &str) -> AggregateRecord {
        AggregateRecord {
            name: name.to_string(),
            distance: StatSummary {
                average: 20.0,
                std_dev: 10.0,
            },
            time: StatSummary {
                average: 1.5,
                std_dev: 0.5,
            },
            samples: 3,
        }
    }

    #[test]
    fn stat_summary_of_series() {
        let summary = StatSummary::from_samples(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(
            summary,
            StatSummary {
                average: 20.0,
                std_dev: 10.0
            }
        );
    }

    #[test]
    fn stat_summary_rejects_short_series() {
        assert_eq!(
            StatSummary::from_samples(&[4.0]),
            Err(StatsError::InsufficientSamples { count: 1 })
        );
        assert_eq!(
            StatSummary::from_samples(&[]),
            Err(StatsError::InsufficientSamples { count: 0 })
        );
    }

    #[test]
    fn report_uses_expected_keys() {
        let mut report = BenchmarkReport::default();
        report.add_result(record("TOUR_42"));

        let mut buf = Vec::new();
        store_report(&report, &mut buf).unwrap();
        let yaml = String::from_utf8(buf).unwrap();

        assert!(yaml.starts_with("notes: "));
        assert!(yaml.contains("results:\n- name: TOUR_42\n"));
        assert!(yaml.contains("  distance:\n    average: 20.0\n    std_dev: 10.0\n"));
        assert!(yaml.contains("  time:\n    average: 1.5\n    std_dev: 0.5\n"));
        assert!(yaml.contains("failures: []\n"));
        assert!(!yaml.contains("run:"));
    }

    #[test]
    fn failures_are_listed_with_their_stage() {
        let mut report = BenchmarkReport::new("smoke");
        report.add_failure(FailedInstance {
            source: "tours/broken.tsp".to_string(),
            name: None,
            stage: FailureStage::Discovery,
            reason: "no NAME field".to_string(),
        });

        let mut buf = Vec::new();
        store_report(&report, &mut buf).unwrap();
        let yaml = String::from_utf8(buf).unwrap();

        assert!(yaml.contains("stage: discovery"));
        assert!(!yaml.contains("name:"));
    }

    #[test]
    fn written_report_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.yml");

        let run = RunSummary::new(
            "run".to_string(),
            "nightly".to_string(),
            1,
            "./tsp".to_string(),
            10,
            5,
        );
        let mut report = BenchmarkReport::default().with_run(run);
        report.add_result(record("A"));
        report.add_result(record("B"));
        report.add_failure(FailedInstance {
            source: "tours/c.tsp".to_string(),
            name: Some("C".to_string()),
            stage: FailureStage::Summarizing,
            reason: "too few samples".to_string(),
        });

        write_report(&report, &path).unwrap();
        assert!(!path.with_extension("yml.partial").exists());

        let loaded = load_report(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
