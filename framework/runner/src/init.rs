use crate::cli::BenchCli;
use clap::Parser;

/// Initialise logging and parse the command line.
///
/// Invalid arguments print usage and exit with a non-zero status.
pub fn init() -> BenchCli {
    env_logger::init();

    BenchCli::parse()
}
