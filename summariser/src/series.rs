use std::io::BufRead;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::SeriesError;
use crate::fields::{self, DISTANCE, TIME};
use crate::instance::InstanceCase;

/// The file extension solver runs write their results with.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "tour";

/// The `(distance, time)` pair one run artifact reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunObservation {
    pub distance: i64,
    pub time: f64,
}

/// Reads the run artifacts of an instance's series directory back into the instance.
///
/// Artifacts for an instance labelled `L` live in `<series_root>/L/*.<extension>`.
#[derive(Debug, Clone)]
pub struct RunSeriesCollector {
    extension: String,
}

impl Default for RunSeriesCollector {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT_EXTENSION)
    }
}

impl RunSeriesCollector {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The directory holding the run artifacts of the instance labelled `label`.
    pub fn series_dir(&self, series_root: &Path, label: &str) -> PathBuf {
        series_root.join(label)
    }

    /// Parse every run artifact of `instance` and return it with one observation recorded per
    /// artifact.
    ///
    /// Any artifact that cannot be read or does not report exactly one distance and one time
    /// fails the whole collection, so the returned instance never holds unpaired data.
    pub fn collect(
        &self,
        mut instance: InstanceCase,
        series_root: &Path,
    ) -> Result<InstanceCase, SeriesError> {
        let dir = self.series_dir(series_root, instance.label());
        let artifacts = self.find_artifacts(&dir)?;
        if artifacts.is_empty() {
            return Err(SeriesError::NoArtifactsFound {
                dir,
                extension: self.extension.clone(),
            });
        }

        for artifact in &artifacts {
            let observation = parse_artifact(artifact)?;
            log::debug!(
                "{}: distance {} time {}s from {}",
                instance.label(),
                observation.distance,
                observation.time,
                artifact.display()
            );
            instance.record_run(observation.distance, observation.time);
        }

        Ok(instance)
    }

    /// List the run artifacts in `dir`, ordered by run index where the file stem is numeric.
    ///
    /// A missing directory has no artifacts.
    pub fn find_artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>, SeriesError> {
        if !dir.is_dir() {
            log::debug!("Series directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SeriesError::ArtifactRead {
                path: e.path().unwrap_or(dir).to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == self.extension.as_str())
            {
                artifacts.push(path.to_path_buf());
            } else {
                log::trace!("Skipping {} in series directory", path.display());
            }
        }

        artifacts.sort_by(|a, b| run_index(a).cmp(&run_index(b)).then_with(|| a.cmp(b)));
        Ok(artifacts)
    }
}

/// Parse a single run artifact.
pub fn parse_artifact(path: &Path) -> Result<RunObservation, SeriesError> {
    let read_error = |source| SeriesError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(read_error)?;

    let mut distance = None;
    let mut time = None;
    for line in std::io::BufReader::new(file).lines() {
        let line = line.map_err(read_error)?;
        let Some(field) = fields::parse_line(&line) else {
            continue;
        };

        match field.name {
            DISTANCE => {
                if distance.is_some() {
                    return Err(SeriesError::malformed(path, "more than one DISTANCE field"));
                }
                distance = Some(parse_distance(field.value).ok_or_else(|| {
                    SeriesError::malformed(path, format!("invalid DISTANCE '{}'", field.value))
                })?);
            }
            TIME => {
                if time.is_some() {
                    return Err(SeriesError::malformed(path, "more than one TIME field"));
                }
                time = Some(parse_time(field.value).ok_or_else(|| {
                    SeriesError::malformed(path, format!("invalid TIME '{}'", field.value))
                })?);
            }
            _ => {}
        }
    }

    match (distance, time) {
        (Some(distance), Some(time)) => Ok(RunObservation { distance, time }),
        (Some(_), None) => Err(SeriesError::malformed(path, "DISTANCE without TIME")),
        (None, Some(_)) => Err(SeriesError::malformed(path, "TIME without DISTANCE")),
        (None, None) => Err(SeriesError::malformed(path, "no DISTANCE or TIME field")),
    }
}

/// Distances are integers, but solvers commonly print them with a fractional part; that part is
/// truncated.
fn parse_distance(value: &str) -> Option<i64> {
    let distance = match value.parse::<i64>() {
        Ok(distance) => distance,
        Err(_) => {
            let distance = value
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)?;
            if distance.abs() >= i64::MAX as f64 {
                return None;
            }
            distance.trunc() as i64
        }
    };
    (distance >= 0).then_some(distance)
}

fn parse_time(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|time| time.is_finite() && *time >= 0.0)
}

fn run_index(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances_accept_integers_and_truncate_decimals() {
        assert_eq!(parse_distance("7542"), Some(7542));
        assert_eq!(parse_distance("7542.99"), Some(7542));
        assert_eq!(parse_distance("-1"), None);
        assert_eq!(parse_distance("-0.5"), None);
        assert_eq!(parse_distance("0.5"), Some(0));
        assert_eq!(parse_distance("inf"), None);
        assert_eq!(parse_distance("NaN"), None);
        assert_eq!(parse_distance("far"), None);
    }

    #[test]
    fn times_must_be_finite_and_non_negative() {
        assert_eq!(parse_time("1.5"), Some(1.5));
        assert_eq!(parse_time("0"), Some(0.0));
        assert_eq!(parse_time("-0.5"), None);
        assert_eq!(parse_time("inf"), None);
        assert_eq!(parse_time("soon"), None);
    }

    #[test]
    fn run_index_from_stem() {
        assert_eq!(run_index(Path::new("series/A/12.tour")), Some(12));
        assert_eq!(run_index(Path::new("series/A/best.tour")), None);
    }
}
