use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use tsp_bench_summary_model::DEFAULT_NOTES;
use tsp_summariser::{DEFAULT_ARTIFACT_EXTENSION, DEFAULT_INSTANCE_EXTENSION};

use crate::cli::BenchCli;

/// Number of solver runs per instance when none is configured.
pub const DEFAULT_RUNS: usize = 30;

/// The builder for a benchmark definition.
///
/// Start from the three required values, or from parsed command line arguments with
/// [BenchmarkDefinitionBuilder::from_cli], then call [BenchmarkDefinitionBuilder::build] to
/// validate.
#[derive(Debug, Clone)]
pub struct BenchmarkDefinitionBuilder {
    /// The solver command, split on whitespace into a program and leading arguments.
    solver_command: String,
    /// Forwarded to every solver invocation as `-r <repetitions>`.
    repetitions: u32,
    /// Name of the run output directory under [BenchmarkDefinitionBuilder::output_root].
    output_name: String,
    tours_dir: PathBuf,
    instance_extension: String,
    output_root: PathBuf,
    /// Length of each run series. Must be at least 2 so a sample standard deviation exists.
    runs: usize,
    artifact_extension: String,
    /// Upper bound on concurrent solver runs within one series.
    jobs: usize,
    profiler: Option<String>,
    renderer: Option<String>,
    notes: String,
    timeout: Option<Duration>,
    no_progress: bool,
}

/// A validated benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkDefinition {
    pub solver_command: String,
    pub repetitions: u32,
    pub output_name: String,
    pub tours_dir: PathBuf,
    pub instance_extension: String,
    pub output_root: PathBuf,
    pub runs: usize,
    pub artifact_extension: String,
    pub jobs: usize,
    /// `None` when profiling is skipped
    pub profiler: Option<String>,
    /// `None` when rendering is skipped
    pub renderer: Option<String>,
    pub notes: String,
    pub timeout: Option<Duration>,
    pub no_progress: bool,
}

impl BenchmarkDefinitionBuilder {
    pub fn new(solver_command: &str, repetitions: u32, output_name: &str) -> Self {
        Self {
            solver_command: solver_command.to_string(),
            repetitions,
            output_name: output_name.to_string(),
            tours_dir: PathBuf::from("tours"),
            instance_extension: DEFAULT_INSTANCE_EXTENSION.to_string(),
            output_root: PathBuf::from("output"),
            runs: DEFAULT_RUNS,
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
            jobs: 1,
            profiler: Some("valgrind".to_string()),
            renderer: Some("polygonfy".to_string()),
            notes: DEFAULT_NOTES.to_string(),
            timeout: None,
            no_progress: false,
        }
    }

    pub fn from_cli(cli: BenchCli) -> Self {
        Self {
            solver_command: cli.solver_command,
            repetitions: cli.repetitions,
            output_name: cli.output_name,
            tours_dir: cli.tours_dir,
            instance_extension: cli.instance_extension,
            output_root: cli.output_root,
            runs: cli.runs,
            artifact_extension: cli.artifact_extension,
            jobs: cli.jobs,
            profiler: (!cli.skip_profile).then_some(cli.profiler),
            renderer: (!cli.skip_render).then_some(cli.renderer),
            notes: cli.notes,
            timeout: cli.timeout.map(Duration::from_secs),
            no_progress: cli.no_progress,
        }
    }

    pub fn with_tours_dir(mut self, tours_dir: impl Into<PathBuf>) -> Self {
        self.tours_dir = tours_dir.into();
        self
    }

    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_artifact_extension(mut self, extension: &str) -> Self {
        self.artifact_extension = extension.to_string();
        self
    }

    /// Set the profiler command, or `None` to skip profiling.
    pub fn with_profiler(mut self, profiler: Option<&str>) -> Self {
        self.profiler = profiler.map(str::to_string);
        self
    }

    /// Set the renderer command, or `None` to skip rendering.
    pub fn with_renderer(mut self, renderer: Option<&str>) -> Self {
        self.renderer = renderer.map(str::to_string);
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_no_progress(mut self) -> Self {
        self.no_progress = true;
        self
    }

    pub fn build(self) -> anyhow::Result<BenchmarkDefinition> {
        if self.solver_command.split_whitespace().next().is_none() {
            bail!("The solver command is empty");
        }
        if self.repetitions == 0 {
            bail!("Repetitions must be at least 1");
        }
        if self.runs < 2 {
            bail!(
                "At least 2 runs per instance are needed for a standard deviation, got {}",
                self.runs
            );
        }
        if self.jobs == 0 {
            bail!("Jobs must be at least 1");
        }
        if !is_single_component(&self.output_name) {
            bail!(
                "Output name '{}' must be a plain directory name",
                self.output_name
            );
        }
        if self.artifact_extension.is_empty() || self.artifact_extension.contains(['/', '\\']) {
            bail!("Invalid artifact extension '{}'", self.artifact_extension);
        }
        for (what, command) in [("profiler", &self.profiler), ("renderer", &self.renderer)] {
            if command
                .as_deref()
                .is_some_and(|c| c.split_whitespace().next().is_none())
            {
                bail!("The {what} command is empty, skip the stage instead");
            }
        }

        Ok(BenchmarkDefinition {
            solver_command: self.solver_command,
            repetitions: self.repetitions,
            output_name: self.output_name,
            tours_dir: self.tours_dir,
            instance_extension: self.instance_extension,
            output_root: self.output_root,
            runs: self.runs,
            artifact_extension: self.artifact_extension,
            jobs: self.jobs,
            profiler: self.profiler,
            renderer: self.renderer,
            notes: self.notes,
            timeout: self.timeout,
            no_progress: self.no_progress,
        })
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
