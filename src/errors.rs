use crate::revision::FormatRevision;

/// 値が違反した範囲の境界
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// 上限（この値を超えてはならない）
    Max(f64),
    /// 下限（この値を下回ってはならない）
    Min(f64),
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Max(v) => write!(f, "上限{v}"),
            Bound::Min(v) => write!(f, "下限{v}"),
        }
    }
}

/// デコードエラー型
///
/// どのエラーも1ファイルのデコード全体を中断させる。
/// エラーが発生したときに、途中までデコードしたプロファイルは返さない。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// 版番号マーカーが既知の書式改訂のどれにも対応しない
    #[error("サポートしていない書式改訂のマーカーです。`{marker}`")]
    UnknownFormatRevision { marker: u16 },

    /// レコードが途中で途切れている
    ///
    /// `offset`の位置から`needed`バイトを読み込もうとしたが、`available`バイトしか残っていなかった。
    #[error(
        "レコードが途切れています。位置{offset}から{needed}バイト必要ですが、{available}バイトしか残っていません。"
    )]
    TruncatedRecord {
        needed: usize,
        available: usize,
        offset: usize,
    },

    /// 処理パラメーターが許容範囲外
    #[error("`{name}`の値{value}が{bound}を満たしていません。")]
    OutOfRangeField {
        name: &'static str,
        value: f64,
        bound: Bound,
    },
}

/// デコード結果型
pub type DecodeResult<T> = Result<T, DecodeError>;

/// ファイル単位のデコード失敗を、診断に必要な文脈と共に表現する。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReaderError {
    /// ファイル・オープン・エラー
    #[error("ファイル`{path}`を開くときにエラーが発生しました。{message}")]
    Open { path: String, message: String },

    /// ファイル読み込みエラー
    #[error("ファイル`{path}`の読み込みに失敗しました。{message}")]
    Read { path: String, message: String },

    /// デコードエラー
    #[error("ファイル`{path}`（書式改訂{}）のデコードに失敗しました。{source}", revision_label(.revision))]
    Decode {
        path: String,
        revision: Option<FormatRevision>,
        source: DecodeError,
    },
}

impl ReaderError {
    /// エラーの原因となったデコードエラーを返す。
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            ReaderError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn revision_label(revision: &Option<FormatRevision>) -> &'static str {
    revision.map(|r| r.as_str()).unwrap_or("不明")
}

/// ReaderError結果型
pub type ReaderResult<T> = Result<T, ReaderError>;
