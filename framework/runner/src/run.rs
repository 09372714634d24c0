use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use futures::StreamExt;
use tsp_bench_core::prelude::{ShutdownHandle, ShutdownSignalError};
use tsp_bench_summary_model::{
    append_run_summary, write_report, AggregateRecord, BenchmarkReport, FailedInstance,
    FailureStage, RunSummary,
};
use tsp_summariser::{discover_instances, InstanceCase, RunSeriesCollector};

use crate::definition::BenchmarkDefinition;
use crate::executor::Executor;
use crate::layout::OutputLayout;
use crate::progress::BenchProgress;
use crate::shutdown::start_shutdown_listener;
use crate::tools::{BenchTools, ProcessTools};

/// Where an instance is in its trip through the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Discovered,
    RunningSeries { run: usize, of: usize },
    SeriesComplete,
    ProfilingComplete,
    RenderingComplete,
    Summarized,
    Failed(FailureStage),
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Discovered => write!(f, "discovered"),
            InstanceState::RunningSeries { run, of } => {
                write!(f, "running series ({run} of {of})")
            }
            InstanceState::SeriesComplete => write!(f, "series complete"),
            InstanceState::ProfilingComplete => write!(f, "profiling complete"),
            InstanceState::RenderingComplete => write!(f, "rendering complete"),
            InstanceState::Summarized => write!(f, "summarized"),
            InstanceState::Failed(stage) => write!(f, "failed while {stage}"),
        }
    }
}

/// What a finished benchmark produced.
#[derive(Debug)]
pub struct BenchmarkOutcome {
    pub report: BenchmarkReport,
    pub report_path: PathBuf,
    /// Number of instance files found
    pub discovered: usize,
}

impl BenchmarkOutcome {
    /// True when instances were found but none of them could be summarised.
    pub fn all_failed(&self) -> bool {
        self.discovered > 0 && self.report.results.is_empty()
    }

    pub fn interrupted(&self) -> bool {
        self.report.run.as_ref().is_some_and(|run| run.interrupted)
    }
}

/// Run the benchmark described by `definition` with real subprocesses.
///
/// Ctrl-C, or the configured timeout, abandons the instance in progress and skips the rest; the
/// report still lists everything completed until then.
pub fn run(definition: BenchmarkDefinition) -> anyhow::Result<BenchmarkOutcome> {
    log::info!(
        "Benchmarking '{}' as '{}': {} runs per instance, repetitions {}",
        definition.solver_command,
        definition.output_name,
        definition.runs,
        definition.repetitions
    );

    let shutdown_handle = ShutdownHandle::new();
    let executor = Executor::with_new_runtime(shutdown_handle.clone())
        .context("Failed to create Tokio runtime")?;
    start_shutdown_listener(executor.runtime(), &shutdown_handle, definition.timeout);

    let tools = ProcessTools::from_definition(&definition)?;

    run_with_tools(&definition, &tools, &executor)
}

/// Run the benchmark with the given collaborators.
pub fn run_with_tools<T: BenchTools>(
    definition: &BenchmarkDefinition,
    tools: &T,
    executor: &Executor,
) -> anyhow::Result<BenchmarkOutcome> {
    let layout = OutputLayout::new(
        &definition.output_root,
        &definition.output_name,
        &definition.artifact_extension,
    );
    layout.create_run_dirs()?;

    let instances = discover_instances(&definition.tours_dir, &definition.instance_extension)
        .with_context(|| {
            format!(
                "Failed to list instances in {}",
                definition.tours_dir.display()
            )
        })?;
    if instances.is_empty() {
        log::warn!(
            "No *.{} instances found in {}",
            definition.instance_extension,
            definition.tours_dir.display()
        );
    }

    let run_summary = RunSummary::new(
        nanoid::nanoid!(),
        definition.output_name.clone(),
        Utc::now().timestamp(),
        definition.solver_command.clone(),
        definition.repetitions,
        definition.runs,
    );
    log::debug!("Run id {}", run_summary.run_id);
    let mut report = BenchmarkReport::new(definition.notes.clone()).with_run(run_summary);

    let collector = RunSeriesCollector::new(definition.artifact_extension.clone());
    let progress = BenchProgress::new(
        (instances.len() * definition.runs) as u64,
        definition.no_progress,
    );
    let mut seen_labels = HashSet::new();
    let mut interrupted = false;

    for path in &instances {
        if executor.shutdown_handle().is_shutdown() {
            interrupted = true;
            log::warn!("Skipping {}, the benchmark was interrupted", path.display());
            progress.skip_runs(definition.runs as u64);
            report.add_failure(FailedInstance {
                source: path.display().to_string(),
                name: None,
                stage: FailureStage::Discovery,
                reason: "Not run, the benchmark was interrupted".to_string(),
            });
            continue;
        }

        let instance_run = InstanceRun {
            path,
            definition,
            layout: &layout,
            collector: &collector,
            tools,
            executor,
            progress: &progress,
        };
        match instance_run.process(&mut seen_labels) {
            Ok(record) => report.add_result(record),
            Err(failure) => {
                interrupted |= failure.is_interrupt();
                report.add_failure(failure.into_failed_instance(path));
            }
        }
    }
    progress.finish();

    if let Some(run) = report.run_mut() {
        run.finish(Utc::now().timestamp(), interrupted);
    }

    let report_path = layout.report_path();
    write_report(&report, &report_path)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    log::info!(
        "Wrote {} result(s) and {} failure(s) to {}",
        report.results.len(),
        report.failures.len(),
        report_path.display()
    );

    if let Some(run) = &report.run {
        let history = layout.run_history_path();
        if let Err(e) = append_run_summary(run, &history) {
            log::warn!("Failed to append to run history {}: {e:#}", history.display());
        }
    }

    Ok(BenchmarkOutcome {
        report,
        report_path,
        discovered: instances.len(),
    })
}

struct InstanceFailure {
    stage: FailureStage,
    name: Option<String>,
    error: anyhow::Error,
}

impl InstanceFailure {
    fn is_interrupt(&self) -> bool {
        self.error.is::<ShutdownSignalError>()
    }

    fn into_failed_instance(self, path: &Path) -> FailedInstance {
        let error = if self.is_interrupt() {
            self.error.context("interrupted")
        } else {
            self.error
        };
        FailedInstance {
            source: path.display().to_string(),
            name: self.name,
            stage: self.stage,
            reason: format!("{error:#}"),
        }
    }
}

/// One instance's trip through the benchmark. Owns nothing that outlives the instance.
struct InstanceRun<'a, T: BenchTools> {
    path: &'a Path,
    definition: &'a BenchmarkDefinition,
    layout: &'a OutputLayout,
    collector: &'a RunSeriesCollector,
    tools: &'a T,
    executor: &'a Executor,
    progress: &'a BenchProgress,
}

impl<T: BenchTools> InstanceRun<'_, T> {
    fn process(
        &self,
        seen_labels: &mut HashSet<String>,
    ) -> Result<AggregateRecord, InstanceFailure> {
        let instance = match self.discover(seen_labels) {
            Ok(instance) => instance,
            Err(error) => {
                self.progress.skip_runs(self.definition.runs as u64);
                return Err(self.failed(FailureStage::Discovery, None, error));
            }
        };
        let label = instance.label().to_string();
        self.progress.start_instance(&label);
        self.transition(&label, InstanceState::Discovered);

        let fail = |stage: FailureStage, error: anyhow::Error| {
            self.failed(stage, Some(label.clone()), error)
        };

        self.run_series(&instance)
            .map_err(|e| fail(FailureStage::RunningSeries, e))?;
        self.transition(&label, InstanceState::SeriesComplete);

        let instance = self
            .collector
            .collect(instance, &self.layout.series_root())
            .map_err(|e| fail(e.stage(), e.into()))?;
        log::debug!("{label}: collected {} run(s)", instance.run_count());

        self.profile(&instance)
            .map_err(|e| fail(FailureStage::Profiling, e))?;
        self.transition(&label, InstanceState::ProfilingComplete);

        self.render(&instance)
            .map_err(|e| fail(FailureStage::Rendering, e))?;
        self.transition(&label, InstanceState::RenderingComplete);

        let record = instance
            .summarize()
            .map_err(|e| fail(e.stage(), e.into()))?;
        self.transition(&label, InstanceState::Summarized);

        Ok(record)
    }

    fn discover(&self, seen_labels: &mut HashSet<String>) -> anyhow::Result<InstanceCase> {
        let instance = InstanceCase::from_file(self.path)?;
        if !seen_labels.insert(instance.label().to_string()) {
            anyhow::bail!(
                "Another instance already uses the label '{}'",
                instance.label()
            );
        }
        Ok(instance)
    }

    /// Run the solver `runs` times, at most `jobs` at once.
    ///
    /// A failed run is logged and yields one sample fewer; whatever it wrote is removed so it
    /// cannot be mistaken for a result.
    fn run_series(&self, instance: &InstanceCase) -> anyhow::Result<()> {
        let label = instance.label();
        self.layout.prepare_series_dir(label)?;

        let runs = self.definition.runs;
        let failed_runs = self.executor.execute_in_place(async {
            let mut results = futures::stream::iter(1..=runs)
                .map(|index| {
                    let artifact = self.layout.run_artifact(label, index);
                    async move {
                        let result = self
                            .tools
                            .run_solver(instance.source_path(), &artifact)
                            .await;
                        (index, artifact, result)
                    }
                })
                .buffer_unordered(self.definition.jobs);

            let mut finished = 0;
            let mut failed = 0usize;
            while let Some((index, artifact, result)) = results.next().await {
                finished += 1;
                self.progress.run_finished();
                log::debug!(
                    "{label}: {}",
                    InstanceState::RunningSeries {
                        run: finished,
                        of: runs
                    }
                );

                if let Err(e) = result {
                    failed += 1;
                    log::warn!("{label}: run {index} failed: {:#}", anyhow::Error::from(e));
                    if artifact.exists() {
                        std::fs::remove_file(&artifact).with_context(|| {
                            format!("Failed to remove output of failed run {}", artifact.display())
                        })?;
                    }
                }
            }

            anyhow::Ok(failed)
        })?;

        if failed_runs > 0 {
            log::warn!("{label}: {failed_runs} of {runs} runs failed");
        }
        Ok(())
    }

    fn profile(&self, instance: &InstanceCase) -> anyhow::Result<()> {
        if self.definition.profiler.is_none() {
            log::debug!("{}: profiling skipped", instance.label());
            return Ok(());
        }

        let log_path = self.layout.profile_log(instance.label());
        self.executor.execute_in_place(async {
            self.tools
                .profile(instance.source_path(), &log_path)
                .await
                .map_err(anyhow::Error::from)
        })
    }

    fn render(&self, instance: &InstanceCase) -> anyhow::Result<()> {
        if self.definition.renderer.is_none() {
            log::debug!("{}: rendering skipped", instance.label());
            return Ok(());
        }

        let image = self.layout.map_image(instance.label());
        self.executor.execute_in_place(async {
            self.tools
                .render(instance.source_path(), &image)
                .await
                .map_err(anyhow::Error::from)
        })
    }

    fn transition(&self, label: &str, state: InstanceState) {
        log::info!("{label}: {state}");
    }

    fn failed(
        &self,
        stage: FailureStage,
        name: Option<String>,
        error: anyhow::Error,
    ) -> InstanceFailure {
        log::warn!(
            "{}: {} ({:#})",
            name.as_deref().unwrap_or_else(|| self.path.to_str().unwrap_or("instance")),
            InstanceState::Failed(stage),
            error
        );
        InstanceFailure { stage, name, error }
    }
}
