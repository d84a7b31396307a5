use time::{Duration, OffsetDateTime};

use crate::cursor::ByteCursor;
use crate::errors::{DecodeError, DecodeResult};

/// プリアンブルのバイト数
pub const PREAMBLE_BYTES: usize = 24;

/// プリアンブルの先頭で読み込んだ値がこの値を超える場合、次の`u16`が見出しのサイズである。
const MAX_INLINE_HEADING_SIZE: u16 = 20;

/// 見出しにパラメーター表が含まれる場合のパラメーター表のサイズ（v2.2a）
const VERSION_2_2A_PARAMETER_TABLE_SIZE: u16 = 704;

/// 書式改訂
///
/// 観測装置のソフトウェア版に対応する。
/// 列挙の順序は版の新旧の順序に一致し、「以上」や「未満」の比較に利用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatRevision {
    V1_2,
    V2_0,
    V2_1,
    V2_2,
    V3_31,
    V5_34,
    V5_36,
    V5_37,
    V5_39,
    V5_43,
    /// 6.45も同じ書式である。
    V5_45,
    V7_47,
    V7_49,
}

impl FormatRevision {
    /// すべての書式改訂（古い順）
    pub const ALL: [FormatRevision; 13] = [
        FormatRevision::V1_2,
        FormatRevision::V2_0,
        FormatRevision::V2_1,
        FormatRevision::V2_2,
        FormatRevision::V3_31,
        FormatRevision::V5_34,
        FormatRevision::V5_36,
        FormatRevision::V5_37,
        FormatRevision::V5_39,
        FormatRevision::V5_43,
        FormatRevision::V5_45,
        FormatRevision::V7_47,
        FormatRevision::V7_49,
    ];

    /// 版番号の文字列を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatRevision::V1_2 => "1.2",
            FormatRevision::V2_0 => "2.0",
            FormatRevision::V2_1 => "2.1",
            FormatRevision::V2_2 => "2.2",
            FormatRevision::V3_31 => "3.31",
            FormatRevision::V5_34 => "5.34",
            FormatRevision::V5_36 => "5.36",
            FormatRevision::V5_37 => "5.37",
            FormatRevision::V5_39 => "5.39",
            FormatRevision::V5_43 => "5.43",
            FormatRevision::V5_45 => "5.45",
            FormatRevision::V7_47 => "7.47",
            FormatRevision::V7_49 => "7.49",
        }
    }

    /// 書式改訂を示すマーカー（符号反転後の値）を返す。
    pub fn marker(&self) -> u16 {
        match self {
            FormatRevision::V1_2 => 5,
            FormatRevision::V2_0 => 6,
            FormatRevision::V2_1 => 7,
            FormatRevision::V2_2 => 8,
            FormatRevision::V3_31 => 10,
            FormatRevision::V5_34 => 11,
            FormatRevision::V5_36 => 13,
            FormatRevision::V5_37 => 14,
            FormatRevision::V5_39 => 16,
            FormatRevision::V5_43 => 19,
            FormatRevision::V5_45 => 21,
            FormatRevision::V7_47 => 22,
            FormatRevision::V7_49 => 24,
        }
    }

    /// ファイルに記録されている版番号から書式改訂を決定する。
    ///
    /// 記録されている値は符号を反転した`u16`であるため、反転してからマーカーとして照合する。
    pub fn from_raw_version(raw_version: u16) -> DecodeResult<Self> {
        Self::try_from(raw_version.wrapping_neg())
    }
}

impl std::fmt::Display for FormatRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// マーカーから書式改訂に変換する。
impl TryFrom<u16> for FormatRevision {
    type Error = DecodeError;

    fn try_from(marker: u16) -> Result<Self, Self::Error> {
        FormatRevision::ALL
            .into_iter()
            .find(|revision| revision.marker() == marker)
            .ok_or(DecodeError::UnknownFormatRevision { marker })
    }
}

/// プリアンブル
///
/// ファイル先頭の24バイトで、書式改訂に関係なく同じ配置である。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    /// 見出しのサイズ
    pub heading_size: u16,

    /// 見出し種別
    ///
    /// 2: パラメーター表を含む、3: ドップラー型ファイル
    pub header_type: u8,

    /// ファイルに記録されている版番号（符号反転前）
    pub raw_version: u16,

    /// 書式改訂
    pub revision: FormatRevision,

    /// 観測開始日時（UNIX時間）
    pub start_time: u32,

    /// 観測終了日時（UNIX時間）
    pub end_time: u32,

    /// 更新間隔
    pub update_rate: u16,

    /// パラメーター表のサイズ
    pub parameter_table_size: u16,
}

impl Preamble {
    /// 書式改訂を示すマーカーを返す。
    pub fn version_marker(&self) -> u16 {
        self.raw_version.wrapping_neg()
    }

    /// パラメーター表の大きさがv2.2aのものかどうかを返す。
    pub fn is_version_2_2a(&self) -> bool {
        self.parameter_table_size == VERSION_2_2A_PARAMETER_TABLE_SIZE
    }

    /// プロファイル情報ブロックの位置を返す。
    ///
    /// パラメーター表と見出しの直後に、2バイトの予備を挟んで配置されている。
    pub fn profile_block_offset(&self) -> usize {
        self.parameter_table_size as usize + self.heading_size as usize + 2
    }

    /// 観測開始日時をUTCで返す。
    pub fn start_date_time(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(i64::from(self.start_time))
    }

    /// 観測終了日時をUTCで返す。
    pub fn end_date_time(&self) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(i64::from(self.end_time))
    }
}

/// プリアンブルを読み込み、書式改訂を決定する。
///
/// # 引数
///
/// * `cursor` - ファイル全体を指すカーソル
///
/// # 戻り値
///
/// `Preamble`。カーソルはプリアンブルの直後を指す。
pub fn read_preamble(cursor: &mut ByteCursor<'_>) -> DecodeResult<Preamble> {
    cursor.seek(0)?;
    cursor.skip(2)?;
    let first = cursor.read_u16()?;
    let second = cursor.read_u16()?;
    let heading_size = if MAX_INLINE_HEADING_SIZE < first {
        second
    } else {
        first
    };
    let header_type = cursor.read_u8()?;
    cursor.skip(1)?;
    let raw_version = cursor.read_u16()?;
    let revision = FormatRevision::from_raw_version(raw_version)?;
    cursor.skip(2)?;
    let start_time = cursor.read_u32()?;
    let end_time = cursor.read_u32()?;
    let update_rate = cursor.read_u16()?;
    let parameter_table_size = cursor.read_u16()?;

    Ok(Preamble {
        heading_size,
        header_type,
        raw_version,
        revision,
        start_time,
        end_time,
        update_rate,
        parameter_table_size,
    })
}
