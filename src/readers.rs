use std::fs::OpenOptions;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::cursor::ByteCursor;
use crate::decoder::{DecoderOptions, ProfileDecoder, ProfileRecord, Value};
use crate::errors::{ReaderError, ReaderResult};
use crate::revision::read_preamble;

/// `ProfileReader`
///
/// ウィンド・プロファイラーの出力ファイル（`.trw`）を1つ読み込み、デコードした結果を保持する。
#[derive(Debug, Clone)]
pub struct ProfileReader {
    /// パス
    path: PathBuf,
    /// デコードしたプロファイル
    profile: ProfileRecord,
}

impl ProfileReader {
    /// ファイルを開いて、既定の設定でデコードする。
    ///
    /// # 引数
    ///
    /// * `path` - 開くファイルのパス
    ///
    /// # 戻り値
    ///
    /// `ProfileReader`
    pub fn new<P>(path: P) -> ReaderResult<Self>
    where
        P: AsRef<Path>,
    {
        Self::with_options(path, DecoderOptions::default())
    }

    /// ファイルを開いて、指定した設定でデコードする。
    ///
    /// # 引数
    ///
    /// * `path` - 開くファイルのパス
    /// * `options` - デコーダーの設定
    ///
    /// # 戻り値
    ///
    /// `ProfileReader`
    pub fn with_options<P>(path: P, options: DecoderOptions) -> ReaderResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_owned();
        let display = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| ReaderError::Open {
                path: display.clone(),
                message: format!("{e}"),
            })?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| ReaderError::Read {
                path: display.clone(),
                message: format!("{e}"),
            })?;
        log::debug!("`{display}`から{}バイト読み込みました。", buf.len());

        let profile = ProfileDecoder::new(options)
            .decode(&buf)
            .map_err(|source| ReaderError::Decode {
                path: display,
                revision: read_preamble(&mut ByteCursor::new(&buf))
                    .ok()
                    .map(|preamble| preamble.revision),
                source,
            })?;

        Ok(Self { path, profile })
    }

    /// ファイルのパスを返す。
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// デコードしたプロファイルを返す。
    pub fn profile(&self) -> &ProfileRecord {
        &self.profile
    }

    /// デコードしたプロファイルを返して、リーダーを破棄する。
    pub fn into_profile(self) -> ProfileRecord {
        self.profile
    }

    /// 見出しの内容を出力する。
    pub fn pretty_print<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: Write,
    {
        let preamble = self.profile.preamble();
        writeln!(writer, "ファイル: {}", self.path.display())?;
        writeln!(writer, "書式改訂: {}", preamble.revision)?;
        writeln!(writer, "見出しのサイズ: {}", preamble.heading_size)?;
        writeln!(writer, "見出し種別: {}", preamble.header_type)?;
        writeln!(writer, "観測開始日時: {}", preamble.start_date_time())?;
        writeln!(writer, "観測終了日時: {}", preamble.end_date_time())?;
        writeln!(writer, "更新間隔: {}", preamble.update_rate)?;
        writeln!(writer, "パラメーター表のサイズ: {}", preamble.parameter_table_size)?;
        for (name, value) in self.profile.header().iter() {
            writeln!(writer, "{name}: {}", format_value(value))?;
        }
        if let Some(ns) = self.profile.header().pulse_length_ns() {
            writeln!(writer, "pulse_length_ns: {ns}")?;
        }
        writeln!(writer, "レンジゲート数: {}", self.profile.gates().len())?;

        Ok(())
    }
}

fn format_value(value: Value) -> String {
    match value {
        Value::Unsigned(v) => v.to_string(),
        Value::Signed(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Missing => String::new(),
    }
}

fn format_option(value: Option<f32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// レンジゲート毎の高度、風、SN比、品質フラグをCSV形式で出力する。
///
/// 欠測は空欄で出力する。
///
/// # 引数
///
/// * `writer` - 出力先
/// * `profile` - 出力するプロファイル
pub fn output_gates_csv<W>(writer: &mut W, profile: &ProfileRecord) -> std::io::Result<()>
where
    W: Write,
{
    writeln!(
        writer,
        "altitude,u_east,v_north,w_vert,wind_speed,wind_from_direction,snr_min,width_min,qc_flag_beam_1,qc_flag_beam_2,qc_flag_beam_3"
    )?;
    for gate in profile.gates() {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            format_option(gate.altitude),
            format_option(gate.f32("u_east")),
            format_option(gate.f32("v_north")),
            format_option(gate.f32("w_vert")),
            format_option(gate.wind.map(|w| w.speed)),
            format_option(gate.wind.map(|w| w.direction)),
            format_option(gate.snr_min),
            format_option(gate.width_min),
            gate.qc_flag_beam[0].code(),
            gate.qc_flag_beam[1].code(),
            gate.qc_flag_beam[2].code(),
        )?;
    }

    Ok(())
}
