/// 光速の半分を、パルス長500nsに対応する距離から求めた値（m/s）
const HALF_LIGHT_SPEED: f64 = 74.9475 / 500e-9;

/// 品質フラグ
///
/// 記録される値は1、2、3のいずれかで、0は使用しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityFlag {
    /// 良好
    Good = 1,
    /// 不良
    Bad = 2,
    /// データなし
    NoData = 3,
}

impl QualityFlag {
    /// フラグの値を返す。
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// ビームの検証コードを品質フラグに変換する。
///
/// 検証コードが1の場合だけ`Good`になり、それ以外（欠測を含む）はすべて`NoData`になる。
/// `Bad`は返さない。
pub fn beam_quality_flag(validation: Option<i64>) -> QualityFlag {
    match validation {
        Some(1) => QualityFlag::Good,
        _ => QualityFlag::NoData,
    }
}

/// 風の品質フラグを返す。
///
/// 判定に使う短期フラグがレコードに記録されないため、常に`NoData`である。
pub fn wind_quality_flag() -> QualityFlag {
    QualityFlag::NoData
}

/// 降雨検知コードを品質フラグに変換する。
///
/// 1が「良好（降雨なし）」を示すように、コードに1を加える。
pub fn rain_detected_flag(rain_detection: i64) -> i64 {
    rain_detection + 1
}

/// 水平風
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    /// 風速（m/s）
    pub speed: f32,
    /// 風向（度、風が吹いてくる方向）
    pub direction: f32,
}

/// 東西成分と南北成分から水平風を求める。
///
/// # 引数
///
/// * `u` - 東向きの成分。欠測の場合は`None`
/// * `v` - 北向きの成分。欠測の場合は`None`
///
/// # 戻り値
///
/// どちらかの成分が欠測の場合は`None`
pub fn wind_from_components(u: Option<f32>, v: Option<f32>) -> Option<Wind> {
    let (u, v) = (f64::from(u?), f64::from(v?));
    let speed = (u * u + v * v).sqrt();

    Some(Wind {
        speed: speed as f32,
        direction: wind_direction(u, v) as f32,
    })
}

fn wind_direction(u: f64, v: f64) -> f64 {
    if v == 0.0 {
        return if 0.0 < u {
            270.0
        } else if u < 0.0 {
            90.0
        } else {
            0.0
        };
    }

    let mut direction = (-u / -v).atan().to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    // 第1象限の補正
    if 0.0 < u && 0.0 < v && direction < 90.0 {
        direction += 180.0;
    }

    direction
}

/// パルス長（m）をパルス幅（ns）に変換する。
///
/// 往復時間として計算し、小数点以下を切り捨てる。
pub fn raw_pulse_length_ns(pulse_length_metres: f32) -> i64 {
    let seconds = f64::from(pulse_length_metres) / (HALF_LIGHT_SPEED * 2.0) * 2.0;

    (seconds * 1e9) as i64
}

/// 丸め誤差で端数になったパルス幅を補正する。
pub fn normalize_pulse_length_ns(raw_ns: i64) -> i64 {
    match raw_ns {
        599 | 2499 => 500,
        other => other,
    }
}

/// パルス長（m）から補正済みのパルス幅（ns）を返す。
pub fn pulse_length_ns(pulse_length_metres: f32) -> i64 {
    normalize_pulse_length_ns(raw_pulse_length_ns(pulse_length_metres))
}

/// 受信遅延を補正する高度補正値を、補正前のパルス幅から求める。
pub fn delay_altitude_correction(raw_ns: i64) -> f32 {
    match raw_ns {
        500 => 102.0,
        599 => 122.1,
        999 | 1000 => 214.5,
        1568 | 1604 | 1700 => 250.0,
        2499 | 2500 => 270.0,
        _ => 250.0,
    }
}

/// 最小値を返す。どれかが欠測の場合は欠測とする。
pub fn min_of(values: &[Option<f32>]) -> Option<f32> {
    let mut result: Option<f32> = None;
    for value in values {
        let value = (*value)?;
        result = Some(result.map_or(value, |r| r.min(value)));
    }

    result
}

/// 中央値を返す。どれかが欠測の場合は欠測とする。
pub fn median_of(values: &[Option<f32>]) -> Option<f32> {
    let mut sorted = values.iter().copied().collect::<Option<Vec<f32>>>()?;
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// レンジゲートの高度を返す。
///
/// 倍精度で計算してから単精度に丸める。
pub fn gate_altitude(min_height: f32, height_increment: f32, index: usize) -> f32 {
    (f64::from(height_increment) * index as f64 + f64::from(min_height)) as f32
}
