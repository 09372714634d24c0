use std::path::{Path, PathBuf};

use walkdir::WalkDir;

mod error;
pub mod fields;
mod instance;
mod series;

pub use error::SeriesError;
pub use instance::InstanceCase;
pub use series::{parse_artifact, RunObservation, RunSeriesCollector, DEFAULT_ARTIFACT_EXTENSION};

/// The file extension of instance files.
pub const DEFAULT_INSTANCE_EXTENSION: &str = "tsp";

/// List the instance files directly inside `tours_dir`, sorted by file name.
pub fn discover_instances(tours_dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut instances = Vec::new();
    for entry in WalkDir::new(tours_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            instances.push(entry.into_path());
        }
    }

    log::debug!(
        "Discovered {} instance(s) in {}",
        instances.len(),
        tours_dir.display()
    );
    Ok(instances)
}
