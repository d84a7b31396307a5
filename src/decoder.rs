use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::cursor::ByteCursor;
use crate::derived::{
    beam_quality_flag, delay_altitude_correction, gate_altitude, median_of, min_of,
    normalize_pulse_length_ns, raw_pulse_length_ns, wind_from_components, wind_quality_flag,
    QualityFlag, Wind,
};
use crate::errors::{Bound, DecodeError, DecodeResult};
use crate::layout::{
    gate_layout, header_layout, published_profile_offset, Encoding, FieldDescriptor, FieldGroup,
    Fill, GateLayout, Step, Target,
};
use crate::revision::{read_preamble, FormatRevision, Preamble};

/// 欠測を示すセンチネル値
pub const SENTINEL: i64 = 999_999;

/// コンセンサス時間の上限（分）
const MAX_CONSENSUS_DURATION: f64 = 120.0;

/// 更新間隔の下限と上限（分）
const MIN_UPDATE_RATE: f64 = 0.0;
const MAX_UPDATE_RATE: f64 = 60.0;

/// この書式改訂より古いファイルは、最近のファイルで検証されていない。
const OLDEST_VERIFIED_REVISION: FormatRevision = FormatRevision::V5_36;

/// デコードした値
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// 符号なし整数
    Unsigned(u32),
    /// 符号付き整数
    Signed(i32),
    /// 単精度浮動小数点数
    Float(f32),
    /// 欠測
    Missing,
}

impl Value {
    /// 欠測かどうかを返す。
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// 値を`f32`で返す。欠測の場合は`None`を返す。
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Unsigned(v) => Some(v as f32),
            Value::Signed(v) => Some(v as f32),
            Value::Float(v) => Some(v),
            Value::Missing => None,
        }
    }

    /// 値を`f64`で返す。欠測の場合は`None`を返す。
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Unsigned(v) => Some(f64::from(v)),
            Value::Signed(v) => Some(f64::from(v)),
            Value::Float(v) => Some(f64::from(v)),
            Value::Missing => None,
        }
    }

    /// 整数の値を返す。浮動小数点数または欠測の場合は`None`を返す。
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Unsigned(v) => Some(i64::from(v)),
            Value::Signed(v) => Some(i64::from(v)),
            Value::Float(_) | Value::Missing => None,
        }
    }

    fn is_sentinel(&self) -> bool {
        match *self {
            Value::Unsigned(v) => i64::from(v) == SENTINEL,
            Value::Signed(v) => i64::from(v) == SENTINEL,
            Value::Float(v) => v == SENTINEL as f32,
            Value::Missing => false,
        }
    }

    /// センチネル値を、フィールドの置き換え方に従って置き換える。
    fn fill_sentinel(self, fill: Fill) -> Value {
        if !self.is_sentinel() {
            return self;
        }
        match fill {
            Fill::Missing => Value::Missing,
            Fill::Value(v) => Value::Float(v),
        }
    }
}

/// デコーダーの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// レンジゲート毎の分散・歪度などの統計量を保持するかどうか
    ///
    /// 保持しない場合も、レコードの配置は変わらない。
    pub variance_statistics: bool,

    /// パルス幅から求めた受信遅延の補正値で高度補正値を置き換えるかどうか
    pub delay_correction: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            variance_statistics: true,
            delay_correction: false,
        }
    }
}

/// 見出しとプロファイル情報ブロックの値
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderFields {
    values: BTreeMap<&'static str, Value>,
    pulse_length_ns: Option<i64>,
}

impl HeaderFields {
    /// フィールドの値を返す。書式改訂に存在しないフィールドの場合は`None`を返す。
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied()
    }

    /// フィールドの値を`f32`で返す。
    pub fn f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|v| v.as_f32())
    }

    /// フィールドの整数値を返す。
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.as_i64())
    }

    /// フィールド名と値を名前順に返す。
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.values.iter().map(|(name, value)| (*name, *value))
    }

    /// レンジゲートの数を返す。
    pub fn no_heights(&self) -> usize {
        self.i64("no_heights").unwrap_or(0).max(0) as usize
    }

    /// 最下層のレンジゲートの高度を返す。
    pub fn min_height(&self) -> Option<f32> {
        self.f32("min_height")
    }

    /// レンジゲートの間隔を返す。
    pub fn height_increment(&self) -> Option<f32> {
        self.f32("height_increment")
    }

    /// 観測地点の緯度を返す。
    pub fn latitude(&self) -> Option<f32> {
        self.f32("latitude")
    }

    /// 観測地点の経度を返す。
    pub fn longitude(&self) -> Option<f32> {
        self.f32("longitude")
    }

    /// 観測地点の標高を返す。
    pub fn altitude_site(&self) -> Option<f32> {
        self.f32("altitude_site")
    }

    /// 処理時間（分）を返す。
    pub fn processing_duration(&self) -> Option<f32> {
        self.f32("processing_duration")
    }

    /// 処理間隔（分）を返す。
    pub fn lag_between_processing(&self) -> Option<f32> {
        self.f32("lag_between_processing")
    }

    /// 降雨検知コードを返す。書式改訂5.45より前は記録されていない。
    pub fn rain_detection(&self) -> Option<i64> {
        self.i64("rain_detection")
    }

    /// 境界層高度を返す。
    pub fn boundary_layer_height(&self) -> Option<f32> {
        self.f32("boundary_layer_height")
    }

    /// パルス幅（ns）を返す。
    pub fn pulse_length_ns(&self) -> Option<i64> {
        self.pulse_length_ns
    }
}

/// レンジゲート1つ分のレコード
#[derive(Debug, Clone, PartialEq)]
pub struct GateRecord {
    /// 下から数えたレンジゲートの位置
    pub index: usize,
    /// 高度
    pub altitude: Option<f32>,
    /// 水平風
    pub wind: Option<Wind>,
    /// 3ビームのスペクトル幅の最小値
    pub width_min: Option<f32>,
    /// 3ビームのスペクトル幅の中央値
    pub width_median: Option<f32>,
    /// 3ビームのSN比の最小値
    pub snr_min: Option<f32>,
    /// ビーム毎の品質フラグ
    pub qc_flag_beam: [QualityFlag; 3],
    /// 風の品質フラグ
    pub qc_flag_wind: QualityFlag,
    names: Arc<[&'static str]>,
    values: Vec<Value>,
}

impl GateRecord {
    /// フィールドの値を返す。
    pub fn get(&self, name: &str) -> Option<Value> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// フィールドの値を`f32`で返す。欠測の場合は`None`を返す。
    pub fn f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(|v| v.as_f32())
    }

    /// フィールド名と値を、レコード内の出現順に返す。
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.names.iter().copied().zip(self.values.iter().copied())
    }
}

/// 1ファイル分のプロファイル
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    preamble: Preamble,
    header: HeaderFields,
    gate_fields: Arc<[&'static str]>,
    gates: Vec<GateRecord>,
    gate_offset: usize,
    end_offset: usize,
}

impl ProfileRecord {
    /// プリアンブルを返す。
    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    /// 書式改訂を返す。
    pub fn revision(&self) -> FormatRevision {
        self.preamble.revision
    }

    /// 見出しを返す。
    pub fn header(&self) -> &HeaderFields {
        &self.header
    }

    /// レンジゲートを下から順に返す。
    pub fn gates(&self) -> &[GateRecord] {
        &self.gates
    }

    /// レンジゲートのフィールド名を、レコード内の出現順に返す。
    pub fn gate_fields(&self) -> &[&'static str] {
        &self.gate_fields
    }

    /// 全レンジゲートの、指定したフィールドの値を返す。
    pub fn gate_column(&self, name: &str) -> Option<Vec<Value>> {
        let i = self.gate_fields.iter().position(|n| *n == name)?;

        Some(self.gates.iter().map(|gate| gate.values[i]).collect())
    }

    /// 全レンジゲートの高度を返す。
    pub fn altitudes(&self) -> Vec<Option<f32>> {
        self.gates.iter().map(|gate| gate.altitude).collect()
    }

    /// 最初のレンジゲートの位置を返す。
    pub fn gate_offset(&self) -> usize {
        self.gate_offset
    }

    /// デコードを終えたときの読み込み位置を返す。
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }
}

/// プロファイル・デコーダー
#[derive(Debug, Clone, Default)]
pub struct ProfileDecoder {
    options: DecoderOptions,
}

impl ProfileDecoder {
    /// デコーダーを構築する。
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// 設定を返す。
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// ファイル全体のバイト列から、プロファイルをデコードする。
    ///
    /// # 引数
    ///
    /// * `buf` - ファイル全体のバイト列
    ///
    /// # 戻り値
    ///
    /// `ProfileRecord`。エラーが発生した場合、途中までデコードした結果は返さない。
    pub fn decode(&self, buf: &[u8]) -> DecodeResult<ProfileRecord> {
        let mut cursor = ByteCursor::new(buf);
        let preamble = read_preamble(&mut cursor)?;
        let revision = preamble.revision;
        debug!(
            "書式改訂{revision}、見出し{}バイト、パラメーター表{}バイト",
            preamble.heading_size, preamble.parameter_table_size
        );
        if revision < OLDEST_VERIFIED_REVISION {
            warn!("書式改訂{revision}のファイルは最近検証されていません。");
        }

        let header = self.decode_header(&mut cursor, &preamble)?;
        let no_heights = header.no_heights();

        let mut layout = gate_layout(revision);
        if !self.options.variance_statistics {
            layout = layout.without_group(FieldGroup::Variance);
        }
        let gate_offset = cursor.position();
        let needed = no_heights * layout.record_width();
        if cursor.remaining() < needed {
            return Err(DecodeError::TruncatedRecord {
                needed,
                available: cursor.remaining(),
                offset: gate_offset,
            });
        }

        let names: Arc<[&'static str]> = layout.fields().map(|f| f.name).collect();
        let mut gates = Vec::with_capacity(no_heights);
        for index in 0..no_heights {
            let gate = decode_gate(&mut cursor, &layout, &names, &header, index)?;
            gates.push(gate);
        }
        debug!(
            "{no_heights}個のレンジゲートをデコードしました（位置{gate_offset}〜{}）。",
            cursor.position()
        );

        Ok(ProfileRecord {
            preamble,
            header,
            gate_fields: names,
            gates,
            gate_offset,
            end_offset: cursor.position(),
        })
    }

    fn decode_header(
        &self,
        cursor: &mut ByteCursor<'_>,
        preamble: &Preamble,
    ) -> DecodeResult<HeaderFields> {
        let layout = header_layout(preamble.revision);
        let mut values = BTreeMap::new();
        for step in layout.steps() {
            match step {
                Step::Seek { target, .. } => {
                    let offset = match target {
                        Target::Absolute(offset) => *offset,
                        Target::AfterParameterTable => {
                            let offset = preamble.profile_block_offset();
                            let published = published_profile_offset(preamble.revision);
                            if offset != published {
                                debug!(
                                    "プロファイル情報ブロックの位置{offset}が公開値{published}と異なります。"
                                );
                            }
                            offset
                        }
                    };
                    cursor.seek(offset)?;
                }
                Step::Skip { bytes, .. } => cursor.skip(*bytes)?,
                Step::Field(field) => {
                    let value = read_value(cursor, field.encoding)?.fill_sentinel(field.fill);
                    values.insert(field.name, value);
                }
            }
        }

        let raw_pulse_ns = values
            .get("pulse_length_metres")
            .and_then(|v| v.as_f32())
            .map(raw_pulse_length_ns);
        if self.options.delay_correction {
            if let Some(raw_ns) = raw_pulse_ns {
                let correction = delay_altitude_correction(raw_ns);
                debug!("パルス幅{raw_ns}nsから高度補正値を{correction}に置き換えます。");
                values.insert("altitude_correction", Value::Float(correction));
            }
        }

        Ok(HeaderFields {
            values,
            pulse_length_ns: raw_pulse_ns.map(normalize_pulse_length_ns),
        })
    }
}

/// 既定の設定でプロファイルをデコードする。
pub fn decode_profile(buf: &[u8]) -> DecodeResult<ProfileRecord> {
    ProfileDecoder::default().decode(buf)
}

fn read_value(cursor: &mut ByteCursor<'_>, encoding: Encoding) -> DecodeResult<Value> {
    Ok(match encoding {
        Encoding::U16 => Value::Unsigned(u32::from(cursor.read_u16()?)),
        Encoding::I16 => Value::Signed(i32::from(cursor.read_i16()?)),
        Encoding::U32 => Value::Unsigned(cursor.read_u32()?),
        Encoding::I32 => Value::Signed(cursor.read_i32()?),
        Encoding::F32 => Value::Float(cursor.read_f32()?),
    })
}

/// 処理パラメーターが許容範囲内か確認する。センチネル値を置き換える前の値で判定する。
fn check_range(field: &FieldDescriptor, raw: Value) -> DecodeResult<()> {
    let Some(value) = raw.as_f64() else {
        return Ok(());
    };
    let violated = match field.name {
        "m_duree_traitment" if MAX_CONSENSUS_DURATION < value => {
            Some(Bound::Max(MAX_CONSENSUS_DURATION))
        }
        "m_decalage_traitment" if value < MIN_UPDATE_RATE => Some(Bound::Min(MIN_UPDATE_RATE)),
        "m_decalage_traitment" if MAX_UPDATE_RATE < value => Some(Bound::Max(MAX_UPDATE_RATE)),
        _ => None,
    };
    match violated {
        Some(bound) => Err(DecodeError::OutOfRangeField {
            name: field.name,
            value,
            bound,
        }),
        None => Ok(()),
    }
}

fn decode_gate(
    cursor: &mut ByteCursor<'_>,
    layout: &GateLayout,
    names: &Arc<[&'static str]>,
    header: &HeaderFields,
    index: usize,
) -> DecodeResult<GateRecord> {
    let mut values = Vec::with_capacity(names.len());
    for step in layout.steps() {
        match step {
            Step::Field(field) => {
                let raw = read_value(cursor, field.encoding)?;
                check_range(field, raw)?;
                values.push(raw.fill_sentinel(field.fill));
            }
            Step::Skip { bytes, .. } => cursor.skip(*bytes)?,
            Step::Seek { .. } => {}
        }
    }

    let altitude = match (header.min_height(), header.height_increment()) {
        (Some(min_height), Some(increment)) => Some(gate_altitude(min_height, increment, index)),
        _ => None,
    };
    let mut gate = GateRecord {
        index,
        altitude,
        wind: None,
        width_min: None,
        width_median: None,
        snr_min: None,
        qc_flag_beam: [QualityFlag::NoData; 3],
        qc_flag_wind: wind_quality_flag(),
        names: Arc::clone(names),
        values,
    };
    gate.wind = wind_from_components(gate.f32("u_east"), gate.f32("v_north"));
    let widths = [gate.f32("width_1"), gate.f32("width_2"), gate.f32("width_3")];
    gate.width_min = min_of(&widths);
    gate.width_median = median_of(&widths);
    gate.snr_min = min_of(&[gate.f32("snr_1"), gate.f32("snr_2"), gate.f32("snr_3")]);
    gate.qc_flag_beam = [1, 2, 3].map(|beam| {
        let code = gate
            .get(&format!("validation_{beam}"))
            .and_then(|v| v.as_i64());
        beam_quality_flag(code)
    });
    trace!(
        "レンジゲート{index}: 高度={:?}、風={:?}、SN比最小値={:?}",
        gate.altitude,
        gate.wind,
        gate.snr_min
    );

    Ok(gate)
}
