use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use wind_profiler::{
    decode_files, parse_filename_timestamp, ArchiveRecord, DecodedFile, DecoderOptions,
    FailurePolicy, ProfileSeries,
};

/// ウィンド・プロファイラーの出力ファイルをデコードして、JSON形式で出力する。
#[derive(Parser, Debug)]
#[command(name = "wpdecode", version, about)]
struct Cli {
    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// デコードするファイル
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// 出力先ディレクトリ（省略した場合は標準出力）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// デコードに失敗したファイルを読み飛ばして続行する
    #[arg(long, default_value_t = false)]
    keep_going: bool,

    /// すべてのファイルを1つの時系列にまとめる
    #[arg(long, default_value_t = false)]
    series: bool,

    /// 分散・歪度などの統計量を保持しない
    #[arg(long, default_value_t = false)]
    no_variance: bool,

    /// デコーダーの設定を記述したJSONファイル
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// 時系列の出力
#[derive(Debug, Serialize)]
struct SeriesDocument {
    time_coverage_start: String,
    time_coverage_end: String,
    records: Vec<ArchiveRecord>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => DecoderOptions::default(),
    };
    if cli.no_variance {
        options.variance_statistics = false;
    }
    let policy = if cli.keep_going {
        FailurePolicy::Skip
    } else {
        FailurePolicy::Abort
    };

    let files = decode_files(&cli.inputs, options, policy)?;
    files.iter().for_each(check_filename_timestamp);

    if cli.series {
        let series = ProfileSeries::from_files(files)?;
        let document = SeriesDocument {
            time_coverage_start: series.time_coverage_start()?,
            time_coverage_end: series.time_coverage_end()?,
            records: series.archive_records(),
        };
        let name = format!("{}.json", series.file_date()?);
        emit(cli.output.as_deref(), &name, &document)?;
    } else {
        for file in &files {
            let record = ArchiveRecord::from_profile(&file.profile);
            let stem = file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("profile"));
            emit(cli.output.as_deref(), &format!("{stem}.json"), &record)?;
        }
    }

    Ok(())
}

fn load_options(path: &Path) -> anyhow::Result<DecoderOptions> {
    let file = File::open(path)
        .with_context(|| format!("設定ファイル`{}`を開けませんでした。", path.display()))?;
    let options = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("設定ファイル`{}`を読み込めませんでした。", path.display()))?;

    Ok(options)
}

/// ファイル名の日時と、プリアンブルの観測開始日時を照合する。
fn check_filename_timestamp(file: &DecodedFile) {
    let start = file.profile.preamble().start_date_time();
    match parse_filename_timestamp(&file.path) {
        Ok(dt) => {
            if dt.date() != start.date()
                || dt.hour() != start.hour()
                || dt.minute() != start.minute()
            {
                warn!(
                    "`{}`: ファイル名の日時{dt}が観測開始日時{start}と異なります。",
                    file.path.display()
                );
            }
        }
        Err(e) => warn!("{e}"),
    }
}

fn emit<T>(output: Option<&Path>, name: &str, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
{
    match output {
        Some(dir) => {
            let path = dir.join(name);
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)
                .with_context(|| format!("`{}`を作成できませんでした。", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!("`{}`に出力しました。", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}
