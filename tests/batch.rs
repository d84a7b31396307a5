mod common;

use std::fs;
use std::path::PathBuf;

use common::{SyntheticFile, START_TIME};
use wind_profiler::{
    decode_files, DecoderOptions, FailurePolicy, FormatRevision, ProfileSeries, ReaderError,
    SeriesError,
};

fn write_files(dir: &tempfile::TempDir, files: &[(&str, Vec<u8>)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, buf)| {
            let path = dir.path().join(name);
            fs::write(&path, buf).unwrap();
            path
        })
        .collect()
}

fn profile_at(start_time: u32) -> Vec<u8> {
    SyntheticFile::new(FormatRevision::V7_49, 2)
        .start_time(start_time)
        .build()
}

#[test]
fn results_are_ordered_by_start_time() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("c.trw", profile_at(START_TIME + 1800)),
            ("a.trw", profile_at(START_TIME)),
            ("b.trw", profile_at(START_TIME + 900)),
        ],
    );

    let files = decode_files(&paths, DecoderOptions::default(), FailurePolicy::Abort).unwrap();
    let names = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, ["a.trw", "b.trw", "c.trw"]);
}

#[test]
fn failure_policy_decides_between_abort_and_skip() {
    let dir = tempfile::tempdir().unwrap();
    let mut broken = profile_at(START_TIME);
    broken.truncate(broken.len() - 3);
    let paths = write_files(
        &dir,
        &[
            ("good.trw", profile_at(START_TIME + 900)),
            ("broken.trw", broken),
        ],
    );

    let err = decode_files(&paths, DecoderOptions::default(), FailurePolicy::Abort).unwrap_err();
    assert!(matches!(err, ReaderError::Decode { .. }));

    let files = decode_files(&paths, DecoderOptions::default(), FailurePolicy::Skip).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("good.trw"));
}

#[test]
fn series_checks_consistency_and_reports_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(
        &dir,
        &[
            ("late.trw", profile_at(START_TIME + 900)),
            ("early.trw", profile_at(START_TIME)),
        ],
    );
    let files = decode_files(&paths, DecoderOptions::default(), FailurePolicy::Abort).unwrap();
    let series = ProfileSeries::from_files(files).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.times(), vec![START_TIME, START_TIME + 900]);
    assert_eq!(series.altitudes(), vec![Some(100.0), Some(150.0)]);
    assert_eq!(series.file_date().unwrap(), "20160706");
    assert_eq!(series.time_coverage_start().unwrap(), "2016-07-06T09:30:00");
    // 終了日時は最後のファイルの観測開始日時
    assert_eq!(series.time_coverage_end().unwrap(), "2016-07-06T09:45:00");
    assert_eq!(series.archive_records().len(), 2);
    assert!(series.changed_attributes().is_empty());
}

#[test]
fn series_reports_attributes_that_change() {
    let dir = tempfile::tempdir().unwrap();
    let longer = SyntheticFile::new(FormatRevision::V7_49, 2)
        .start_time(START_TIME + 900)
        .header("processing_duration", 60.0)
        .header("lag_between_processing", 30.0)
        .build();
    let paths = write_files(
        &dir,
        &[("base.trw", profile_at(START_TIME)), ("longer.trw", longer)],
    );
    let files = decode_files(&paths, DecoderOptions::default(), FailurePolicy::Abort).unwrap();
    let series = ProfileSeries::from_files(files).unwrap();

    assert_eq!(
        series.changed_attributes(),
        ["averaging_interval", "sampling_interval"]
    );
    // 属性は最初のファイルの値
    let records = series.archive_records();
    assert_eq!(records[0].attributes["averaging_interval"], "30 minutes");
}

#[test]
fn series_rejects_inconsistent_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let moved = SyntheticFile::new(FormatRevision::V7_49, 2)
        .start_time(START_TIME + 900)
        .header("latitude", 53.0)
        .build();
    let regridded = SyntheticFile::new(FormatRevision::V7_49, 2)
        .start_time(START_TIME + 900)
        .header("height_increment", 75.0)
        .build();
    let paths = write_files(
        &dir,
        &[
            ("base.trw", profile_at(START_TIME)),
            ("moved.trw", moved),
            ("regridded.trw", regridded),
            ("tomorrow.trw", profile_at(START_TIME + 86_400)),
        ],
    );
    let decode = |indices: &[usize]| {
        let selected = indices.iter().map(|&i| paths[i].clone()).collect::<Vec<_>>();
        decode_files(&selected, DecoderOptions::default(), FailurePolicy::Abort).unwrap()
    };

    assert!(matches!(
        ProfileSeries::from_files(decode(&[0, 1])),
        Err(SeriesError::LatitudeMismatch(_))
    ));
    assert!(matches!(
        ProfileSeries::from_files(decode(&[0, 2])),
        Err(SeriesError::AltitudeMismatch(_))
    ));
    assert!(matches!(
        ProfileSeries::from_files(decode(&[0, 3])),
        Err(SeriesError::DateMismatch { .. })
    ));
    assert!(matches!(
        ProfileSeries::from_files(Vec::new()),
        Err(SeriesError::Empty)
    ));
}
