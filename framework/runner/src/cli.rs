use std::path::PathBuf;

use clap::Parser;
use tsp_bench_summary_model::DEFAULT_NOTES;
use tsp_summariser::{DEFAULT_ARTIFACT_EXTENSION, DEFAULT_INSTANCE_EXTENSION};

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct BenchCli {
    /// The solver command. May include leading arguments, for example `"./tsp -s 20"`.
    pub solver_command: String,

    /// Passed to every solver invocation as `-r <REPETITIONS>`
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub repetitions: u32,

    /// Name of this benchmark run. Results are written to `<OUTPUT_ROOT>/<OUTPUT_NAME>`.
    pub output_name: String,

    /// Directory containing the instance files
    #[arg(long, default_value = "tours")]
    pub tours_dir: PathBuf,

    /// File extension of instance files
    #[arg(long, default_value = DEFAULT_INSTANCE_EXTENSION)]
    pub instance_extension: String,

    /// Directory the run output directory is created in
    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    /// How many times the solver is run against each instance. At least 2 runs are needed for a
    /// standard deviation.
    #[arg(long, default_value = "30")]
    pub runs: usize,

    /// File extension of the result artifact each solver run writes
    #[arg(long, default_value = DEFAULT_ARTIFACT_EXTENSION)]
    pub artifact_extension: String,

    /// How many solver runs of one instance may execute at the same time
    #[arg(long, short, default_value = "1")]
    pub jobs: usize,

    /// Memory profiler wrapped around one solver run per instance
    #[arg(long, default_value = "valgrind")]
    pub profiler: String,

    /// Renderer that reads the solver's plotted tour on stdin and writes an image
    #[arg(long, default_value = "polygonfy")]
    pub renderer: String,

    /// Do not run the memory profiler
    #[arg(long, default_value = "false")]
    pub skip_profile: bool,

    /// Do not render tour images
    #[arg(long, default_value = "false")]
    pub skip_render: bool,

    /// Free text stored in the report's `notes` field
    #[arg(long, default_value = DEFAULT_NOTES)]
    pub notes: String,

    /// Stop the benchmark after this many seconds and report the instances completed so far
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[arg(long, default_value = "false")]
    pub no_progress: bool,
}
