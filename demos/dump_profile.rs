use std::borrow::BorrowMut;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;

use time::format_description::FormatItem;
use time::macros::format_description;

use wind_profiler::readers::{output_gates_csv, ProfileReader};

/// ファイル名に付与する日時の書式
const FILE_DATETIME_FMT: &[FormatItem<'_>] =
    format_description!("[year][month][day]T[hour][minute][second]");

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("resources/trw/16706930.trw"));
    let reader = ProfileReader::new(&path)?;

    reader.pretty_print(std::io::stdout().borrow_mut())?;

    let profile = reader.profile();
    let start = profile.preamble().start_date_time();
    let dest_dir_path = Path::new(&path).parent().unwrap_or(Path::new("."));
    let file_name = format!("{}.csv", start.format(FILE_DATETIME_FMT)?);
    let dest_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest_dir_path.join(file_name))?;
    let mut writer = BufWriter::new(dest_file);
    output_gates_csv(&mut writer, profile)?;

    Ok(())
}
