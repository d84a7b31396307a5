use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::archive::ArchiveRecord;
use crate::decoder::{DecoderOptions, ProfileRecord};
use crate::errors::ReaderResult;
use crate::readers::ProfileReader;

/// 観測期間の日時の書式
const TIME_COVERAGE_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// 出力ファイル名に付与する日付の書式
const FILE_DATE_FMT: &[FormatItem<'_>] = format_description!("[year][month][day]");

/// デコードに失敗したファイルの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 最初に失敗したファイルのエラーを返す。
    #[default]
    Abort,
    /// 失敗したファイルを警告して読み飛ばす。
    Skip,
}

/// デコードしたファイル
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFile {
    /// パス
    pub path: PathBuf,
    /// プロファイル
    pub profile: ProfileRecord,
}

/// 複数のファイルを並列にデコードする。
///
/// 結果は観測開始日時の順に並べる。
///
/// # 引数
///
/// * `paths` - デコードするファイルのパス
/// * `options` - デコーダーの設定
/// * `policy` - デコードに失敗したファイルの扱い
///
/// # 戻り値
///
/// デコードしたファイル。`FailurePolicy::Abort`の場合は、入力順で最初に失敗したファイルのエラー
pub fn decode_files<P>(
    paths: &[P],
    options: DecoderOptions,
    policy: FailurePolicy,
) -> ReaderResult<Vec<DecodedFile>>
where
    P: AsRef<Path> + Sync,
{
    let results = paths
        .par_iter()
        .map(|path| {
            ProfileReader::with_options(path, options).map(|reader| DecodedFile {
                path: reader.path().to_owned(),
                profile: reader.into_profile(),
            })
        })
        .collect::<Vec<_>>();

    let mut decoded = Vec::with_capacity(results.len());
    for result in results {
        match (result, policy) {
            (Ok(file), _) => decoded.push(file),
            (Err(e), FailurePolicy::Abort) => return Err(e),
            (Err(e), FailurePolicy::Skip) => warn!("{e}"),
        }
    }
    decoded.sort_by_key(|file| file.profile.preamble().start_time);
    info!("{}/{}個のファイルをデコードしました。", decoded.len(), paths.len());

    Ok(decoded)
}

/// SeriesErrorエラー型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    /// プロファイルがない
    #[error("時系列にまとめるプロファイルがありません。")]
    Empty,

    /// 高度の格子が変化している
    #[error("ファイル`{0}`の高度の格子が、最初のファイルと異なります。")]
    AltitudeMismatch(String),

    /// 緯度が変化している
    #[error("ファイル`{0}`の緯度が、最初のファイルと異なります。")]
    LatitudeMismatch(String),

    /// 経度が変化している
    #[error("ファイル`{0}`の経度が、最初のファイルと異なります。")]
    LongitudeMismatch(String),

    /// 複数の日付が含まれている
    #[error("ファイル`{path}`の日付{found}が、最初のファイルの日付{expected}と異なります。")]
    DateMismatch {
        path: String,
        expected: Date,
        found: Date,
    },

    /// 日時の書式化に失敗
    #[error("日時を書式化できませんでした。{0}")]
    Format(String),
}

/// SeriesError結果型
pub type SeriesResult<T> = Result<T, SeriesError>;

/// 同じ日、同じ地点で観測したプロファイルの時系列
#[derive(Debug, Clone)]
pub struct ProfileSeries {
    files: Vec<DecodedFile>,
    changed_attributes: Vec<String>,
}

impl ProfileSeries {
    /// デコードしたファイルを、観測開始日時の順に時系列にまとめる。
    ///
    /// すべてのファイルの高度の格子、緯度、経度、観測日（UTC）が一致していなければならない。
    pub fn from_files(mut files: Vec<DecodedFile>) -> SeriesResult<Self> {
        files.sort_by_key(|file| file.profile.preamble().start_time);
        let first = files.first().ok_or(SeriesError::Empty)?;
        let altitudes = first.profile.altitudes();
        let latitude = first.profile.header().latitude();
        let longitude = first.profile.header().longitude();
        let date = first.profile.preamble().start_date_time().date();

        for file in &files[1..] {
            let path = file.path.display().to_string();
            let header = file.profile.header();
            if file.profile.altitudes() != altitudes {
                return Err(SeriesError::AltitudeMismatch(path));
            }
            if header.latitude() != latitude {
                return Err(SeriesError::LatitudeMismatch(path));
            }
            if header.longitude() != longitude {
                return Err(SeriesError::LongitudeMismatch(path));
            }
            let found = file.profile.preamble().start_date_time().date();
            if found != date {
                return Err(SeriesError::DateMismatch {
                    path,
                    expected: date,
                    found,
                });
            }
        }

        let changed_attributes = warn_changed_attributes(&files);

        Ok(Self {
            files,
            changed_attributes,
        })
    }

    /// プロファイルの数を返す。
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// プロファイルがないかどうかを返す。
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// デコードしたファイルを観測開始日時の順に返す。
    pub fn files(&self) -> &[DecodedFile] {
        &self.files
    }

    /// 時系列の途中で値が変化した属性の名前を返す。
    pub fn changed_attributes(&self) -> &[String] {
        &self.changed_attributes
    }

    /// 観測開始日時（UNIX時間）を返す。
    pub fn times(&self) -> Vec<u32> {
        self.files
            .iter()
            .map(|file| file.profile.preamble().start_time)
            .collect()
    }

    /// 共通の高度の格子を返す。
    pub fn altitudes(&self) -> Vec<Option<f32>> {
        self.files
            .first()
            .map(|file| file.profile.altitudes())
            .unwrap_or_default()
    }

    /// 観測日（UTC）を返す。
    pub fn date(&self) -> Option<Date> {
        self.files
            .first()
            .map(|file| file.profile.preamble().start_date_time().date())
    }

    /// 観測日を`YYYYMMDD`形式で返す。
    pub fn file_date(&self) -> SeriesResult<String> {
        match self.date() {
            Some(date) => date
                .format(FILE_DATE_FMT)
                .map_err(|e| SeriesError::Format(format!("{e}"))),
            None => Err(SeriesError::Empty),
        }
    }

    /// 観測期間の開始日時を返す。
    pub fn time_coverage_start(&self) -> SeriesResult<String> {
        let start = self
            .files
            .iter()
            .map(|file| file.profile.preamble().start_date_time())
            .min();

        format_coverage(start)
    }

    /// 観測期間の終了日時を返す。
    ///
    /// 最後のプロファイルの観測開始日時とする。
    pub fn time_coverage_end(&self) -> SeriesResult<String> {
        let end = self
            .files
            .iter()
            .map(|file| file.profile.preamble().start_date_time())
            .max();

        format_coverage(end)
    }

    /// 各プロファイルの、アーカイブに書き込む変数と属性を返す。
    pub fn archive_records(&self) -> Vec<ArchiveRecord> {
        self.files
            .iter()
            .map(|file| ArchiveRecord::from_profile(&file.profile))
            .collect()
    }
}

/// 最初のファイルと異なる属性を警告する。
///
/// 属性は時系列で1つしか記録できないため、最初のファイルの値が使われる。
fn warn_changed_attributes(files: &[DecodedFile]) -> Vec<String> {
    let mut changed = Vec::new();
    let Some((first, rest)) = files.split_first() else {
        return changed;
    };
    let expected = ArchiveRecord::from_profile(&first.profile).attributes;
    for file in rest {
        let found = ArchiveRecord::from_profile(&file.profile).attributes;
        for (name, value) in &expected {
            if found.get(name) != Some(value) && !changed.contains(name) {
                warn!(
                    "`{}`: 属性{name}が時系列の途中で変化しています（{value} -> {}）。",
                    file.path.display(),
                    found.get(name).map(String::as_str).unwrap_or("なし"),
                );
                changed.push(name.clone());
            }
        }
    }

    changed
}

fn format_coverage(dt: Option<OffsetDateTime>) -> SeriesResult<String> {
    dt.ok_or(SeriesError::Empty)?
        .format(TIME_COVERAGE_FMT)
        .map_err(|e| SeriesError::Format(format!("{e}")))
}
