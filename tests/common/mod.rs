//! レイアウト表に従って、デコード可能なファイルを合成する。

#![allow(dead_code)]

use std::collections::HashMap;

use wind_profiler::layout::{gate_layout, header_layout, Encoding, Step, Target};
use wind_profiler::revision::PREAMBLE_BYTES;
use wind_profiler::FormatRevision;

/// 見出しのサイズ
pub const HEADING_SIZE: u16 = 20;

/// パラメーター表のサイズ
///
/// プロファイル情報ブロックが、どの書式改訂でもアンテナの幾何より後ろになる大きさにする。
pub const PARAMETER_TABLE_SIZE: u16 = 1000;

/// 2016-07-06 09:30:00 UTC
pub const START_TIME: u32 = 1_467_797_400;

/// プロファイル情報ブロックの位置
pub const PROFILE_BLOCK_OFFSET: usize = PARAMETER_TABLE_SIZE as usize + HEADING_SIZE as usize + 2;

pub struct SyntheticFile {
    revision: FormatRevision,
    no_heights: usize,
    start_time: u32,
    header: HashMap<&'static str, f64>,
    gates: Vec<HashMap<&'static str, f64>>,
}

impl SyntheticFile {
    pub fn new(revision: FormatRevision, no_heights: usize) -> Self {
        let header = HashMap::from([
            ("no_heights", no_heights as f64),
            ("min_height", 100.0),
            ("height_increment", 50.0),
            ("latitude", 52.5),
            ("longitude", -4.0),
            ("altitude_site", 30.0),
            ("processing_duration", 30.0),
            ("lag_between_processing", 15.0),
            ("pulse_length_metres", 149.895),
            ("boundary_layer_height", 1200.0),
            ("rain_detection", 0.0),
        ]);
        let gate = HashMap::from([
            ("u_east", 3.0),
            ("v_north", 4.0),
            ("w_vert", 0.25),
            ("width_1", 0.5),
            ("width_2", 0.75),
            ("width_3", 0.625),
            ("snr_1", 10.0),
            ("snr_2", 12.0),
            ("snr_3", 11.0),
            ("skew_1", 0.125),
            ("skew_2", 0.25),
            ("skew_3", 0.375),
            ("validation_1", 1.0),
            ("validation_2", 1.0),
            ("validation_3", 1.0),
            ("m_duree_traitment", 30.0),
            ("m_decalage_traitment", 15.0),
        ]);

        Self {
            revision,
            no_heights,
            start_time: START_TIME,
            header,
            gates: vec![gate; no_heights],
        }
    }

    pub fn header(mut self, name: &'static str, value: f64) -> Self {
        self.header.insert(name, value);
        self
    }

    pub fn gate(mut self, index: usize, name: &'static str, value: f64) -> Self {
        self.gates[index].insert(name, value);
        self
    }

    pub fn all_gates(mut self, name: &'static str, value: f64) -> Self {
        for gate in &mut self.gates {
            gate.insert(name, value);
        }
        self
    }

    pub fn start_time(mut self, start_time: u32) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; PREAMBLE_BYTES];
        buf[2..4].copy_from_slice(&HEADING_SIZE.to_le_bytes());
        buf[6] = 3;
        buf[8..10].copy_from_slice(&self.revision.marker().wrapping_neg().to_le_bytes());
        buf[12..16].copy_from_slice(&self.start_time.to_le_bytes());
        buf[16..20].copy_from_slice(&(self.start_time + 900).to_le_bytes());
        buf[20..22].copy_from_slice(&15u16.to_le_bytes());
        buf[22..24].copy_from_slice(&PARAMETER_TABLE_SIZE.to_le_bytes());

        let mut pos = PREAMBLE_BYTES;
        for step in header_layout(self.revision).steps() {
            pos = write_step(&mut buf, pos, step, &self.header);
        }
        let layout = gate_layout(self.revision);
        for gate in &self.gates[..self.no_heights] {
            for step in layout.steps() {
                pos = write_step(&mut buf, pos, step, gate);
            }
        }
        assert_eq!(buf.len(), pos);

        buf
    }
}

fn write_step(
    buf: &mut Vec<u8>,
    pos: usize,
    step: &Step,
    values: &HashMap<&'static str, f64>,
) -> usize {
    match step {
        Step::Seek { target, .. } => match target {
            Target::Absolute(offset) => *offset,
            Target::AfterParameterTable => PROFILE_BLOCK_OFFSET,
        },
        Step::Skip { bytes, .. } => {
            reserve(buf, pos + bytes);
            pos + bytes
        }
        Step::Field(field) => {
            let value = values.get(field.name).copied().unwrap_or(0.0);
            let bytes = match field.encoding {
                Encoding::U16 => (value as u16).to_le_bytes().to_vec(),
                Encoding::I16 => (value as i16).to_le_bytes().to_vec(),
                Encoding::U32 => (value as u32).to_le_bytes().to_vec(),
                Encoding::I32 => (value as i32).to_le_bytes().to_vec(),
                Encoding::F32 => (value as f32).to_le_bytes().to_vec(),
            };
            reserve(buf, pos + bytes.len());
            buf[pos..pos + bytes.len()].copy_from_slice(&bytes);
            pos + bytes.len()
        }
    }
}

fn reserve(buf: &mut Vec<u8>, len: usize) {
    if buf.len() < len {
        buf.resize(len, 0);
    }
}
