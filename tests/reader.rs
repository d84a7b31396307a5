mod common;

use std::io::Write;

use common::SyntheticFile;
use wind_profiler::readers::output_gates_csv;
use wind_profiler::{DecodeError, FormatRevision, ProfileReader, ReaderError};

#[test]
fn reads_a_file_from_disk() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&SyntheticFile::new(FormatRevision::V5_45, 3).build())?;
    file.flush()?;

    let reader = ProfileReader::new(file.path())?;
    assert_eq!(reader.path(), file.path());
    assert_eq!(reader.profile().revision(), FormatRevision::V5_45);
    assert_eq!(reader.profile().gates().len(), 3);

    let mut printed = Vec::new();
    reader.pretty_print(&mut printed)?;
    let printed = String::from_utf8(printed)?;
    assert!(printed.contains("書式改訂: 5.45"));
    assert!(printed.contains("no_heights: 3"));

    let mut csv = Vec::new();
    output_gates_csv(&mut csv, reader.profile())?;
    let csv = String::from_utf8(csv)?;
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap().starts_with("100,3,4,0.25,5,"));

    let profile = reader.into_profile();
    assert_eq!(profile.header().no_heights(), 3);

    Ok(())
}

#[test]
fn missing_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProfileReader::new(dir.path().join("16706930.trw")).unwrap_err();
    assert!(matches!(err, ReaderError::Open { .. }));
    assert!(err.decode_error().is_none());
}

#[test]
fn decode_errors_carry_path_and_revision() -> anyhow::Result<()> {
    let buf = SyntheticFile::new(FormatRevision::V5_45, 2).build();
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&buf[..buf.len() - 8])?;
    file.flush()?;

    let err = ProfileReader::new(file.path()).unwrap_err();
    match &err {
        ReaderError::Decode { path, revision, source } => {
            assert_eq!(path, &file.path().display().to_string());
            assert_eq!(*revision, Some(FormatRevision::V5_45));
            assert!(matches!(source, DecodeError::TruncatedRecord { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("5.45"));
    assert!(message.contains(&file.path().display().to_string()));

    Ok(())
}

#[test]
fn unknown_revision_is_reported_without_revision() -> anyhow::Result<()> {
    let mut buf = SyntheticFile::new(FormatRevision::V5_45, 1).build();
    buf[8..10].copy_from_slice(&0u16.to_le_bytes());
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(&buf)?;
    file.flush()?;

    let err = ProfileReader::new(file.path()).unwrap_err();
    assert_eq!(
        err.decode_error(),
        Some(&DecodeError::UnknownFormatRevision { marker: 0 })
    );
    assert!(err.to_string().contains("不明"));

    Ok(())
}
