use std::collections::BTreeMap;

use serde::Serialize;

use crate::decoder::{ProfileRecord, Value};
use crate::derived::rain_detected_flag;

/// アーカイブに書き込む値
///
/// 系列の欠測は`NaN`で表現し、JSONでは`null`として出力する。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArchiveValue {
    /// 整数のスカラー
    Int(i64),
    /// 浮動小数点数のスカラー
    Float(f64),
    /// レンジゲート毎の系列
    Series(Vec<f32>),
}

impl ArchiveValue {
    /// 系列の場合は系列を返す。
    pub fn as_series(&self) -> Option<&[f32]> {
        match self {
            ArchiveValue::Series(values) => Some(values),
            _ => None,
        }
    }
}

/// アーカイブ・ライターに渡す、1ファイル分の変数と属性
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRecord {
    /// 変数名と値
    pub data: BTreeMap<String, ArchiveValue>,
    /// 属性名と値
    pub attributes: BTreeMap<String, String>,
}

fn series<I>(values: I) -> ArchiveValue
where
    I: IntoIterator<Item = Option<f32>>,
{
    ArchiveValue::Series(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
}

fn scalar(value: Option<f32>) -> ArchiveValue {
    ArchiveValue::Float(value.map_or(f64::NAN, f64::from))
}

fn label(value: Option<f32>) -> String {
    value.map_or_else(|| String::from("nan"), |v| v.to_string())
}

impl ArchiveRecord {
    /// プロファイルから、アーカイブに書き込む変数と属性を作成する。
    pub fn from_profile(profile: &ProfileRecord) -> Self {
        let header = profile.header();
        let gates = profile.gates();
        let start = profile.preamble().start_date_time();
        let mut data = BTreeMap::new();
        let mut insert = |name: &str, value: ArchiveValue| {
            data.insert(name.to_string(), value);
        };

        insert("time", ArchiveValue::Int(i64::from(profile.preamble().start_time)));
        insert("altitude", series(profile.altitudes()));
        insert("latitude", scalar(header.latitude()));
        insert("longitude", scalar(header.longitude()));
        insert(
            "time_minutes_since_start_of_day",
            ArchiveValue::Float(
                f64::from(start.hour()) * 60.0
                    + f64::from(start.minute())
                    + f64::from(start.second()) / 60.0,
            ),
        );
        insert("size_of_gate", scalar(header.height_increment()));
        if let Some(code) = header.rain_detection() {
            insert("qc_flag_rain_detected", ArchiveValue::Int(rain_detected_flag(code)));
        }

        insert("wind_speed", series(gates.iter().map(|g| g.wind.map(|w| w.speed))));
        insert(
            "wind_from_direction",
            series(gates.iter().map(|g| g.wind.map(|w| w.direction))),
        );
        for (key, field) in [
            ("eastward_wind", "u_east"),
            ("northward_wind", "v_north"),
            ("upward_air_velocity", "w_vert"),
            ("signal_to_noise_ratio_of_beam_1", "snr_1"),
            ("signal_to_noise_ratio_of_beam_2", "snr_2"),
            ("signal_to_noise_ratio_of_beam_3", "snr_3"),
            ("spectral_width_of_beam_1", "width_1"),
            ("spectral_width_of_beam_2", "width_2"),
            ("spectral_width_of_beam_3", "width_3"),
            ("skew_of_beam_1", "skew_1"),
            ("skew_of_beam_2", "skew_2"),
            ("skew_of_beam_3", "skew_3"),
        ] {
            // 統計量を保持しない設定では歪度がない
            if let Some(column) = profile.gate_column(field) {
                insert(key, series(column.iter().map(Value::as_f32)));
            }
        }
        insert(
            "signal_to_noise_ratio_minimum",
            series(gates.iter().map(|g| g.snr_min)),
        );
        insert(
            "qc_flag_wind",
            series(gates.iter().map(|g| Some(f32::from(g.qc_flag_wind.code())))),
        );
        for beam in 0..3 {
            insert(
                &format!("qc_flag_beam_{}", beam + 1),
                series(
                    gates
                        .iter()
                        .map(|g| Some(f32::from(g.qc_flag_beam[beam].code()))),
                ),
            );
        }

        insert("day_of_year", ArchiveValue::Int(i64::from(start.ordinal())));
        insert("year", ArchiveValue::Int(i64::from(start.year())));
        insert("month", ArchiveValue::Int(i64::from(u8::from(start.month()))));
        insert("day", ArchiveValue::Int(i64::from(start.day())));
        insert("hour", ArchiveValue::Int(i64::from(start.hour())));
        insert("minute", ArchiveValue::Int(i64::from(start.minute())));
        insert("second", ArchiveValue::Float(f64::from(start.second())));

        let mut attributes = BTreeMap::new();
        attributes.insert(
            "platform_altitude".to_string(),
            format!("{} m", label(header.altitude_site())),
        );
        attributes.insert(
            "geospatial_bounds".to_string(),
            format!(
                "{}N, {}E",
                label(header.latitude()),
                label(header.longitude())
            ),
        );
        attributes.insert(
            "instrument_software_version".to_string(),
            profile.revision().to_string(),
        );
        attributes.insert(
            "averaging_interval".to_string(),
            format!("{} minutes", label(header.processing_duration())),
        );
        attributes.insert(
            "sampling_interval".to_string(),
            format!("{} minutes", label(header.lag_between_processing())),
        );

        Self { data, attributes }
    }

    /// 変数の値を返す。
    pub fn get(&self, name: &str) -> Option<&ArchiveValue> {
        self.data.get(name)
    }
}
