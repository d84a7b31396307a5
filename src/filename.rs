use std::path::Path;

use time::{Date, Month, PrimitiveDateTime, Time};

/// ファイル名の日時の文字数（`YYMDDHMM`）
const TIMESTAMP_CHARS: usize = 8;

/// FilenameErrorエラー型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    /// ファイル名が短すぎる
    #[error("ファイル名`{0}`から日時を読み取れません。`YYMDDHMM`形式である必要があります。")]
    TooShort(String),

    /// 数字または英字として解釈できない文字
    #[error("ファイル名`{name}`の{position}文字目`{character}`を数値に変換できません。")]
    InvalidCharacter {
        name: String,
        position: usize,
        character: char,
    },

    /// 13以上の月
    #[error("ファイル名`{name}`の月`{month}`が不正です。")]
    InvalidMonth { name: String, month: u8 },

    /// 存在しない日時
    #[error("ファイル名`{name}`から日時を構築できませんでした。{message}")]
    InvalidDateTime { name: String, message: String },
}

/// FilenameError結果型
pub type FilenameResult<T> = Result<T, FilenameError>;

/// 1文字を数値に変換する。
///
/// `0`から`9`はそのまま、`a`から`n`は10から23に変換する。
fn char_value(name: &str, position: usize, character: char) -> FilenameResult<u8> {
    match character {
        '0'..='9' => Ok(character as u8 - b'0'),
        'a'..='n' => Ok(character as u8 - b'a' + 10),
        _ => Err(FilenameError::InvalidCharacter {
            name: name.to_string(),
            position: position + 1,
            character,
        }),
    }
}

fn digits(name: &str, chars: &[char], start: usize) -> FilenameResult<u8> {
    let mut value = 0u8;
    for (i, &c) in chars[start..start + 2].iter().enumerate() {
        if !c.is_ascii_digit() {
            return Err(FilenameError::InvalidCharacter {
                name: name.to_string(),
                position: start + i + 1,
                character: c,
            });
        }
        value = value * 10 + (c as u8 - b'0');
    }

    Ok(value)
}

/// ファイル名に埋め込まれた観測日時（UTC）を読み取る。
///
/// ファイル名は`YYMDDHMM.trw`の形式で、月と時は1文字で表現されている。
/// 10以上の値は`a`（10）から`n`（23）の英字で表現する。
///
/// # 引数
///
/// * `path` - ファイルのパス
///
/// # 戻り値
///
/// ファイル名から読み取った日時
pub fn parse_filename_timestamp<P>(path: P) -> FilenameResult<PrimitiveDateTime>
where
    P: AsRef<Path>,
{
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let chars = name.chars().take(TIMESTAMP_CHARS).collect::<Vec<_>>();
    if chars.len() < TIMESTAMP_CHARS {
        return Err(FilenameError::TooShort(name));
    }

    let year = 2000 + i32::from(digits(&name, &chars, 0)?);
    let month = char_value(&name, 2, chars[2])?;
    if 12 < month {
        return Err(FilenameError::InvalidMonth { name, month });
    }
    let day = digits(&name, &chars, 3)?;
    let hour = char_value(&name, 5, chars[5])?;
    let minute = digits(&name, &chars, 6)?;

    let invalid = |e: &dyn std::fmt::Display| FilenameError::InvalidDateTime {
        name: name.clone(),
        message: format!("{e}"),
    };
    let month = Month::try_from(month).map_err(|e| invalid(&e))?;
    let date = Date::from_calendar_date(year, month, day).map_err(|e| invalid(&e))?;
    let time = Time::from_hms(hour, minute, 0).map_err(|e| invalid(&e))?;

    Ok(PrimitiveDateTime::new(date, time))
}
