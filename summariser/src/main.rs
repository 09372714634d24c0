use std::path::PathBuf;

use anyhow::anyhow;
use chrono::Utc;
use clap::Parser;
use tsp_bench_summary_model::{write_report, BenchmarkReport, FailedInstance, DEFAULT_NOTES};
use tsp_summariser::{
    discover_instances, InstanceCase, RunSeriesCollector, DEFAULT_ARTIFACT_EXTENSION,
    DEFAULT_INSTANCE_EXTENSION,
};

/// Summarise the run series already stored in a benchmark output directory, without running the
/// solver again.
#[derive(Parser)]
#[command(about, long_about = None)]
struct SummariserCli {
    /// The benchmark output directory, containing a `series` directory
    output_dir: PathBuf,

    /// Directory containing the instance files
    #[arg(long, default_value = "tours")]
    tours_dir: PathBuf,

    /// File extension of instance files
    #[arg(long, default_value = DEFAULT_INSTANCE_EXTENSION)]
    instance_extension: String,

    /// File extension of run artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACT_EXTENSION)]
    artifact_extension: String,

    /// Free text stored in the report's `notes` field
    #[arg(long, default_value = DEFAULT_NOTES)]
    notes: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = SummariserCli::parse();
    let ignore_errors = std::env::var("IGNORE_SUMMARY_ERRORS").is_ok();

    let series_root = cli.output_dir.join("series");
    let collector = RunSeriesCollector::new(cli.artifact_extension);
    let instances = discover_instances(&cli.tours_dir, &cli.instance_extension)?;

    let mut report = BenchmarkReport::new(cli.notes);
    for path in &instances {
        let mut label = None;
        let summarised = InstanceCase::from_file(path)
            .and_then(|instance| {
                label = Some(instance.label().to_string());
                collector.collect(instance, &series_root)
            })
            .and_then(|instance| instance.summarize());

        match summarised {
            Ok(record) => {
                log::info!("Summarised {} over {} runs", record.name, record.samples);
                report.add_result(record);
            }
            Err(e) => {
                log::warn!("Could not summarise {}: {e:#}", path.display());
                report.add_failure(FailedInstance {
                    source: path.display().to_string(),
                    name: label,
                    stage: e.stage(),
                    reason: format!("{:#}", anyhow::Error::from(e)),
                });
            }
        }
    }

    let report_path = cli.output_dir.join(format!(
        "summary-{}.yml",
        Utc::now().format("%Y-%m-%dT%H.%M.%S%.fZ")
    ));
    write_report(&report, &report_path)?;
    log::info!("Wrote {}", report_path.display());

    // If any of the summaries failed and errors should not explicitly be ignored, return an error
    if !report.failures.is_empty() {
        let error_message = format!(
            "{} out of {} instances could not be summarised",
            report.failures.len(),
            instances.len(),
        );

        if ignore_errors {
            log::warn!("{}", error_message);
        } else {
            return Err(anyhow!(error_message));
        }
    }

    Ok(())
}
