use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tsp_summariser::{discover_instances, InstanceCase, RunSeriesCollector, SeriesError};

fn write_instance(dir: &Path, file_name: &str, label: &str) -> std::path::PathBuf {
    let path = dir.join(file_name);
    fs::write(
        &path,
        format!("NAME: {label}\nTYPE: TSP\nDIMENSION: 3\nNODE_COORD_SECTION\n1 0 0\n2 3 4\n3 6 8\nEOF\n"),
    )
    .unwrap();
    path
}

fn write_artifact(series_dir: &Path, index: usize, distance: &str, time: &str) {
    fs::create_dir_all(series_dir).unwrap();
    fs::write(
        series_dir.join(format!("{index}.tour")),
        format!(
            "NAME: TOUR_42\nTYPE: TOUR\nDIMENSION: 3\nDISTANCE: {distance}\nTIME: {time}\nTOUR_SECTION\n1\n2\n3\nEOF"
        ),
    )
    .unwrap();
}

#[test]
fn collects_one_observation_per_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let instance_path = write_instance(tmp.path(), "tour42.tsp", "TOUR_42");
    let series_root = tmp.path().join("series");
    let series_dir = series_root.join("TOUR_42");
    write_artifact(&series_dir, 1, "10", "1.0");
    write_artifact(&series_dir, 2, "20", "1.5");
    write_artifact(&series_dir, 3, "30", "2.0");

    let instance = InstanceCase::from_file(&instance_path).unwrap();
    let instance = RunSeriesCollector::default()
        .collect(instance, &series_root)
        .unwrap();

    let mut distances = instance.distances().to_vec();
    distances.sort();
    let mut times = instance.times().to_vec();
    times.sort_by(f64::total_cmp);
    assert_eq!(distances, vec![10, 20, 30]);
    assert_eq!(times, vec![1.0, 1.5, 2.0]);

    let record = instance.summarize().unwrap();
    assert_eq!(record.name, "TOUR_42");
    assert_eq!(record.samples, 3);
    assert_eq!(record.distance.average, 20.0);
    assert_eq!(record.distance.std_dev, 10.0);
    assert!((record.time.average - 1.5).abs() < 1e-12);
    assert!((record.time.std_dev - 0.5).abs() < 1e-12);
}

#[test]
fn artifacts_are_ordered_by_run_index() {
    let tmp = tempfile::tempdir().unwrap();
    let series_dir = tmp.path().join("A");
    for index in [10, 2, 1] {
        write_artifact(&series_dir, index, &index.to_string(), "0.5");
    }

    let artifacts = RunSeriesCollector::default()
        .find_artifacts(&series_dir)
        .unwrap();
    let names = artifacts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["1.tour", "2.tour", "10.tour"]);
}

#[test]
fn other_files_in_the_series_directory_are_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let series_dir = tmp.path().join("A");
    write_artifact(&series_dir, 1, "10", "1.0");
    write_artifact(&series_dir, 2, "12", "1.0");
    fs::write(series_dir.join("notes.txt"), "DISTANCE: 99999\n").unwrap();
    fs::create_dir(series_dir.join("nested.tour")).unwrap();

    let instance = RunSeriesCollector::default()
        .collect(
            InstanceCase::from_file(write_instance(tmp.path(), "a.tsp", "A")).unwrap(),
            tmp.path(),
        )
        .unwrap();
    assert_eq!(instance.run_count(), 2);
}

#[test]
fn empty_series_fails_with_no_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let instance_path = write_instance(tmp.path(), "a.tsp", "A");
    fs::create_dir_all(tmp.path().join("series").join("A")).unwrap();

    let result = RunSeriesCollector::default().collect(
        InstanceCase::from_file(&instance_path).unwrap(),
        &tmp.path().join("series"),
    );
    assert!(matches!(result, Err(SeriesError::NoArtifactsFound { .. })));
}

#[test]
fn missing_series_directory_fails_with_no_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let instance_path = write_instance(tmp.path(), "a.tsp", "A");

    let result = RunSeriesCollector::default().collect(
        InstanceCase::from_file(&instance_path).unwrap(),
        &tmp.path().join("series"),
    );
    assert!(matches!(result, Err(SeriesError::NoArtifactsFound { .. })));
}

#[test]
fn unpaired_fields_fail_the_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let instance_path = write_instance(tmp.path(), "a.tsp", "A");
    let series_dir = tmp.path().join("A");
    write_artifact(&series_dir, 1, "10", "1.0");
    fs::write(series_dir.join("2.tour"), "NAME: A\nDISTANCE: 12\nEOF").unwrap();

    let result = RunSeriesCollector::default().collect(
        InstanceCase::from_file(&instance_path).unwrap(),
        tmp.path(),
    );
    match result {
        Err(SeriesError::MalformedArtifact { path, reason }) => {
            assert!(path.ends_with("2.tour"));
            assert_eq!(reason, "DISTANCE without TIME");
        }
        other => panic!("expected a malformed artifact, got {other:?}"),
    }
}

#[test]
fn duplicate_fields_fail_the_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("1.tour");
    fs::write(&path, "DISTANCE: 1\nTIME: 1\nDISTANCE: 2\n").unwrap();

    assert!(matches!(
        tsp_summariser::parse_artifact(&path),
        Err(SeriesError::MalformedArtifact { .. })
    ));
}

#[test]
fn custom_artifact_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let series_dir = tmp.path().join("A");
    fs::create_dir_all(&series_dir).unwrap();
    fs::write(series_dir.join("1.out"), "DISTANCE: 5\nTIME: 0.1\n").unwrap();
    fs::write(series_dir.join("2.out"), "DISTANCE: 7\nTIME: 0.3\n").unwrap();
    write_artifact(&series_dir, 3, "1000", "9.0");

    let collector = RunSeriesCollector::new("out");
    let instance = collector
        .collect(
            InstanceCase::from_file(write_instance(tmp.path(), "a.tsp", "A")).unwrap(),
            tmp.path(),
        )
        .unwrap();
    assert_eq!(instance.distances(), &[5, 7]);
}

#[test]
fn single_run_cannot_be_summarised() {
    let tmp = tempfile::tempdir().unwrap();
    let instance_path = write_instance(tmp.path(), "a.tsp", "A");
    write_artifact(&tmp.path().join("series").join("A"), 1, "10", "1.0");

    let instance = RunSeriesCollector::default()
        .collect(
            InstanceCase::from_file(&instance_path).unwrap(),
            &tmp.path().join("series"),
        )
        .unwrap();
    assert_eq!(instance.run_count(), 1);
    let result = instance.summarize();
    assert!(matches!(result, Err(SeriesError::Stats(_))));
}

#[test]
fn instances_are_discovered_in_file_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    write_instance(tmp.path(), "b.tsp", "B");
    write_instance(tmp.path(), "a.tsp", "A");
    fs::write(tmp.path().join("readme.md"), "not an instance").unwrap();

    let instances = discover_instances(tmp.path(), "tsp").unwrap();
    assert_eq!(
        instances,
        vec![tmp.path().join("a.tsp"), tmp.path().join("b.tsp")]
    );
}
