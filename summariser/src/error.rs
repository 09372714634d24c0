use std::path::PathBuf;

use tsp_bench_summary_model::stats::StatsError;
use tsp_bench_summary_model::FailureStage;

/// Errors raised while turning an instance and its run series into an aggregate record.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("Failed to read instance file {}", .path.display())]
    InstanceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Instance file {} has no usable NAME field", .path.display())]
    MissingLabel { path: PathBuf },
    #[error("No *.{extension} run artifacts found in {}", .dir.display())]
    NoArtifactsFound { dir: PathBuf, extension: String },
    #[error("Failed to read run artifact {}", .path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed run artifact {}: {reason}", .path.display())]
    MalformedArtifact { path: PathBuf, reason: String },
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl SeriesError {
    /// The benchmark stage this error belongs to.
    pub fn stage(&self) -> FailureStage {
        match self {
            SeriesError::InstanceRead { .. } | SeriesError::MissingLabel { .. } => {
                FailureStage::Discovery
            }
            SeriesError::NoArtifactsFound { .. }
            | SeriesError::ArtifactRead { .. }
            | SeriesError::MalformedArtifact { .. } => FailureStage::CollectingSeries,
            SeriesError::Stats(_) => FailureStage::Summarizing,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
