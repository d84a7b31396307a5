use crate::errors::{DecodeError, DecodeResult};

/// メモリ上のバイト列からリトルエンディアンの数値を順に読み込むカーソル
///
/// 読み込み位置は、数値を読み込むたびにその幅だけ進む。
/// 読み込み位置を明示的に移動できるのは`seek`だけである。
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    /// 読み込み対象のバイト列
    buf: &'a [u8],
    /// 現在の読み込み位置
    pos: usize,
}

macro_rules! read_number {
    ($func_name:ident, $type:ty, $bytes:literal) => {
        #[doc = concat!("`", stringify!($type), "`を1つ読み込み、読み込み位置をその幅だけ進める。")]
        pub fn $func_name(&mut self) -> DecodeResult<$type> {
            let bytes = self.take::<$bytes>()?;

            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

impl<'a> ByteCursor<'a> {
    /// バイト列の先頭を指すカーソルを構築する。
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// 現在の読み込み位置を返す。
    pub fn position(&self) -> usize {
        self.pos
    }

    /// バイト列全体の長さを返す。
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// バイト列が空かどうかを返す。
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 読み込み位置以降に残っているバイト数を返す。
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    read_number!(read_u8, u8, 1);
    read_number!(read_u16, u16, 2);
    read_number!(read_i16, i16, 2);
    read_number!(read_u32, u32, 4);
    read_number!(read_i32, i32, 4);

    /// IEEE-754単精度浮動小数点数を1つ読み込む。
    ///
    /// 4バイトをリトルエンディアンの`u32`として読み込み、そのビット列を`f32`として解釈する。
    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        self.read_u32().map(f32::from_bits)
    }

    /// 読み込み位置を進めずに`u16`を読み込む。
    pub fn peek_u16(&self) -> DecodeResult<u16> {
        let mut ahead = self.clone();

        ahead.read_u16()
    }

    /// 読み込み位置を`n`バイト進める。
    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.ensure(n)?;
        self.pos += n;

        Ok(())
    }

    /// 読み込み位置をバイト列の先頭から`target`バイトの位置に移動する。
    ///
    /// 移動先がバイト列の末尾を超える場合は、先頭から`target`バイトを必要とする読み込みとして
    /// `TruncatedRecord`を返す。末尾ちょうどへの移動は許可する。
    pub fn seek(&mut self, target: usize) -> DecodeResult<()> {
        if self.buf.len() < target {
            return Err(DecodeError::TruncatedRecord {
                needed: target,
                available: self.buf.len(),
                offset: 0,
            });
        }
        self.pos = target;

        Ok(())
    }

    fn ensure(&self, needed: usize) -> DecodeResult<()> {
        let available = self.remaining();
        if available < needed {
            return Err(DecodeError::TruncatedRecord {
                needed,
                available,
                offset: self.pos,
            });
        }

        Ok(())
    }

    fn take<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        self.ensure(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let buf = [0x34, 0x12, 0xfe, 0xff, 0x78, 0x56, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff];
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_i32().unwrap(), -1);
        assert_eq!(cursor.position(), buf.len());
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn signed_reads_use_twos_complement() {
        // 符号ビットを立てた値は、絶対値に符号を付けた値ではなく2の補数として読む
        let buf = (-999_999i32).to_le_bytes();
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_i32().unwrap(), -999_999);

        let buf = i16::MIN.to_le_bytes();
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_i16().unwrap(), i16::MIN);
    }

    #[test]
    fn reads_f32_from_bit_pattern() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&999_999f32.to_le_bytes());
        buf.extend_from_slice(&(-12.5f32).to_le_bytes());
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_f32().unwrap(), 999_999.0);
        assert_eq!(cursor.read_f32().unwrap(), -12.5);
    }

    #[test]
    fn truncated_read_reports_offset_and_sizes() {
        let buf = [0u8; 6];
        let mut cursor = ByteCursor::new(&buf);
        cursor.skip(4).unwrap();
        let err = cursor.read_u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedRecord {
                needed: 4,
                available: 2,
                offset: 4
            }
        );
        // 失敗した読み込みは位置を進めない
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn peek_does_not_advance() {
        let buf = [0x01, 0x00, 0x02, 0x00];
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.peek_u16().unwrap(), 1);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u16().unwrap(), 1);
        assert_eq!(cursor.peek_u16().unwrap(), 2);
    }

    #[test]
    fn seek_allows_end_but_not_beyond() {
        let buf = [0u8; 8];
        let mut cursor = ByteCursor::new(&buf);
        cursor.seek(8).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.seek(9),
            Err(DecodeError::TruncatedRecord { needed: 9, available: 8, .. })
        ));
        cursor.seek(2).unwrap();
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn skip_past_end_fails() {
        let buf = [0u8; 3];
        let mut cursor = ByteCursor::new(&buf);
        assert!(cursor.skip(4).is_err());
        assert!(cursor.skip(3).is_ok());
    }
}
