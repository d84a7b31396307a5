//! ウィンド・プロファイラー（Degreane社製ソフトウェア）の出力ファイル（`.trw`）を読み込む。
//!
//! ファイルの書式は観測装置のソフトウェア版によって異なる。
//! プリアンブルに記録された版番号から書式改訂を決定し、書式改訂毎のレイアウト表に従って
//! 見出しとレンジゲート毎のレコードをデコードする。

pub mod archive;
pub mod batch;
pub mod cursor;
pub mod decoder;
pub mod derived;
pub mod errors;
pub mod filename;
pub mod layout;
pub mod readers;
pub mod revision;

pub use archive::{ArchiveRecord, ArchiveValue};
pub use batch::{decode_files, DecodedFile, FailurePolicy, ProfileSeries, SeriesError};
pub use decoder::{
    decode_profile, DecoderOptions, GateRecord, HeaderFields, ProfileDecoder, ProfileRecord,
    Value,
};
pub use derived::{QualityFlag, Wind};
pub use errors::{Bound, DecodeError, DecodeResult, ReaderError, ReaderResult};
pub use filename::{parse_filename_timestamp, FilenameError};
pub use readers::ProfileReader;
pub use revision::{FormatRevision, Preamble};
