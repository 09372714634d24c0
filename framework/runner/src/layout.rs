use std::path::{Path, PathBuf};

use anyhow::Context;

/// Where a benchmark run writes its files.
///
/// ```text
/// <output_root>/run_summary.jsonl
/// <output_root>/<output_name>/series/<label>/<run>.<ext>
/// <output_root>/<output_name>/valgrind/<label>.log
/// <output_root>/<output_name>/map/<label>.svg
/// <output_root>/<output_name>/results.yml
/// ```
///
/// Run artifact paths are distinct for distinct run indices, so runs of one series may execute
/// concurrently.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_root: PathBuf,
    run_dir: PathBuf,
    artifact_extension: String,
}

impl OutputLayout {
    pub fn new(output_root: &Path, output_name: &str, artifact_extension: &str) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            run_dir: output_root.join(output_name),
            artifact_extension: artifact_extension.to_string(),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn series_root(&self) -> PathBuf {
        self.run_dir.join("series")
    }

    pub fn series_dir(&self, label: &str) -> PathBuf {
        self.series_root().join(label)
    }

    /// The artifact written by run `index` (1-based) of the series for `label`.
    pub fn run_artifact(&self, label: &str, index: usize) -> PathBuf {
        self.series_dir(label)
            .join(format!("{index}.{}", self.artifact_extension))
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.run_dir.join("valgrind")
    }

    pub fn profile_log(&self, label: &str) -> PathBuf {
        self.profile_dir().join(format!("{label}.log"))
    }

    pub fn map_dir(&self) -> PathBuf {
        self.run_dir.join("map")
    }

    pub fn map_image(&self, label: &str) -> PathBuf {
        self.map_dir().join(format!("{label}.svg"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.run_dir.join("results.yml")
    }

    /// The run history shared by every run written under the same output root.
    pub fn run_history_path(&self) -> PathBuf {
        self.output_root.join("run_summary.jsonl")
    }

    /// Create the run directory and its fixed subdirectories. Existing directories are reused.
    pub fn create_run_dirs(&self) -> anyhow::Result<()> {
        for dir in [
            self.series_root(),
            self.profile_dir(),
            self.map_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Create the series directory for `label`, removing run artifacts left behind by an earlier
    /// benchmark that used the same output name.
    pub fn prepare_series_dir(&self, label: &str) -> anyhow::Result<PathBuf> {
        let dir = self.series_dir(label);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut removed = 0;
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == self.artifact_extension.as_str())
            {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove stale {}", path.display()))?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::info!("Removed {removed} stale run artifact(s) from {}", dir.display());
        }

        Ok(dir)
    }
}
