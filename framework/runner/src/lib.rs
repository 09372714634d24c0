mod cli;
mod definition;
mod executor;
mod init;
mod layout;
mod progress;
mod run;
mod shutdown;
mod summary_table;
mod tools;

pub mod prelude {
    pub use crate::cli::BenchCli;
    pub use crate::definition::{BenchmarkDefinition, BenchmarkDefinitionBuilder, DEFAULT_RUNS};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::layout::OutputLayout;
    pub use crate::run::{run, run_with_tools, BenchmarkOutcome, InstanceState};
    pub use crate::summary_table::{print_summary, summary_table};
    pub use crate::tools::{BenchTools, CommandLine, ProcessTools, ToolError};
    pub use tsp_bench_core::prelude::ShutdownHandle;
}
