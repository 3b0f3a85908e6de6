//! # タグブロックのエンコード
//!
//! Avro配列と同形式の可変長バイナリ。
//!
//! ```text
//! [count: long] ([name_len: long][name][value_len: long][value])* [0: long]
//! ```
//!
//! `long` はzig-zag変換した値を下位7ビットずつ出力する可変長整数
//! （最後以外のバイトは継続ビット 0x80 を立てる）。
//! 空のタグリストは0バイト（countも終端もなし）になる。

use arbundle_types::Tag;

use crate::BundleError;

/// タグブロックの上限（バイト）
pub const DEFAULT_MAX_TAGS_BYTES: usize = 4096;

fn write_long(buf: &mut Vec<u8>, value: i64) {
    let mut n = ((value << 1) ^ (value >> 63)) as u64;
    while n & !0x7f != 0 {
        buf.push((n as u8 & 0x7f) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_long(buf, bytes.len() as i64);
    buf.extend_from_slice(bytes);
}

/// タグリストをエンコードする。
/// 結果が `max_bytes` を超える場合は `TagsTooLarge` を返す。
pub fn encode_tags(tags: &[Tag], max_bytes: usize) -> Result<Vec<u8>, BundleError> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let mut buf = Vec::new();
    write_long(&mut buf, tags.len() as i64);
    for tag in tags {
        write_bytes(&mut buf, tag.name.as_bytes());
        write_bytes(&mut buf, tag.value.as_bytes());
    }
    write_long(&mut buf, 0);

    if buf.len() > max_bytes {
        return Err(BundleError::TagsTooLarge {
            size: buf.len(),
            max: max_bytes,
        });
    }
    Ok(buf)
}

/// タグブロックの読み取りカーソル
struct TagReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TagReader<'a> {
    fn read_long(&mut self) -> Result<i64, BundleError> {
        let mut n: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = *self.bytes.get(self.pos).ok_or_else(|| {
                BundleError::InvalidTagEncoding("可変長整数の途中で終端に達しました".to_string())
            })?;
            self.pos += 1;
            if shift >= 64 {
                return Err(BundleError::InvalidTagEncoding(
                    "可変長整数が64ビットを超えています".to_string(),
                ));
            }
            n |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
    }

    fn read_string(&mut self) -> Result<String, BundleError> {
        let len = self.read_long()?;
        let len = usize::try_from(len)
            .map_err(|_| BundleError::InvalidTagEncoding(format!("負の文字列長: {len}")))?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                BundleError::InvalidTagEncoding(format!(
                    "文字列長 {len} が残り {} バイトを超えています",
                    self.bytes.len() - self.pos
                ))
            })?;
        let s = std::str::from_utf8(&self.bytes[self.pos..end])
            .map_err(|e| BundleError::InvalidTagEncoding(format!("UTF-8ではありません: {e}")))?
            .to_string();
        self.pos = end;
        Ok(s)
    }
}

/// タグブロックをデコードする。
/// 負のブロック件数（直後にブロックのバイト長が続く形式）も受け付ける。
pub fn decode_tags(bytes: &[u8]) -> Result<Vec<Tag>, BundleError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = TagReader { bytes, pos: 0 };
    let mut tags = Vec::new();
    loop {
        let mut count = reader.read_long()?;
        if count == 0 {
            break;
        }
        if count < 0 {
            count = count.checked_neg().ok_or_else(|| {
                BundleError::InvalidTagEncoding(format!("不正なブロック件数: {count}"))
            })?;
            reader.read_long()?;
        }
        for _ in 0..count {
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            tags.push(Tag { name, value });
        }
    }

    if reader.pos != bytes.len() {
        return Err(BundleError::InvalidTagEncoding(format!(
            "終端の後に {} バイトの余剰があります",
            bytes.len() - reader.pos
        )));
    }
    Ok(tags)
}
