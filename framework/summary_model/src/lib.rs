use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::io::{BufRead, Write};
use std::path::Path;

mod report;
pub mod stats;

pub use report::{
    load_report, store_report, write_report, AggregateRecord, BenchmarkReport, FailedInstance,
    FailureStage, StatSummary, DEFAULT_NOTES,
};

/// Summary of one benchmark invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each invocation, even when the output name is reused.
    pub run_id: String,
    /// The output name given on the command line
    pub output_name: String,
    /// The time the benchmark started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The time the report was assembled, as a Unix timestamp in seconds
    ///
    /// Not set until the benchmark finishes or is interrupted.
    pub finished_at: Option<i64>,
    /// The solver command, as given on the command line
    pub solver_command: String,
    /// The repetitions value forwarded to every solver invocation
    pub repetitions: u32,
    /// How many times the solver was run against each instance
    pub runs_per_instance: usize,
    /// Whether the benchmark was stopped before every instance was processed
    pub interrupted: bool,
    /// See [RunSummary::fingerprint]
    pub fingerprint: String,
}

impl RunSummary {
    /// Create a new run summary
    pub fn new(
        run_id: String,
        output_name: String,
        started_at: i64,
        solver_command: String,
        repetitions: u32,
        runs_per_instance: usize,
    ) -> Self {
        let mut summary = Self {
            run_id,
            output_name,
            started_at,
            finished_at: None,
            solver_command,
            repetitions,
            runs_per_instance,
            interrupted: false,
            fingerprint: String::new(),
        };
        summary.fingerprint = summary.compute_fingerprint();
        summary
    }

    /// Mark the run as finished at the given Unix timestamp
    pub fn finish(&mut self, finished_at: i64, interrupted: bool) {
        self.finished_at = Some(finished_at);
        self.interrupted = interrupted;
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint identifies the configuration the solver was benchmarked with, so that
    /// reports from separate invocations can be compared like for like. It uses the
    ///     - Solver command
    ///     - Repetitions
    ///     - Runs per instance
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn compute_fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.solver_command.as_bytes());
        Digest::update(&mut hasher, self.repetitions.to_le_bytes());
        Digest::update(&mut hasher, (self.runs_per_instance as u64).to_le_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary]. Blank lines are skipped.
pub fn load_summary_runs(path: &Path) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
