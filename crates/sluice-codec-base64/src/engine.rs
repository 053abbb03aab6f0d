use sluice_core::error::{Result, SluiceError, codes};

/// 标准字母表（RFC 4648 §4）。
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// 折行输出时的单行字符数。
const LINE_LEN: usize = 76;

/// 编码字节序列；`break_lines` 为真时每 76 个输出字符插入一个换行。
///
/// 编码总是成功：三字节一组映射为四个字母表字符，不足三字节的
/// 尾组以 `=` 填充。
pub fn encode(src: &[u8], break_lines: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len().div_ceil(3) * 4 + src.len() / 54 + 1);
    let mut column = 0;
    for chunk in src.chunks(3) {
        let b0 = u32::from(chunk[0]);
        let b1 = u32::from(chunk.get(1).copied().unwrap_or(0));
        let b2 = u32::from(chunk.get(2).copied().unwrap_or(0));
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(ALPHABET[(triple >> 18) as usize & 0x3F]);
        out.push(ALPHABET[(triple >> 12) as usize & 0x3F]);
        out.push(if chunk.len() > 1 {
            ALPHABET[(triple >> 6) as usize & 0x3F]
        } else {
            b'='
        });
        out.push(if chunk.len() > 2 {
            ALPHABET[triple as usize & 0x3F]
        } else {
            b'='
        });

        if break_lines {
            column += 4;
            if column >= LINE_LEN {
                out.push(b'\n');
                column = 0;
            }
        }
    }
    out
}

/// 解码字节序列。空白（空格、制表、回车、换行）被忽略；遇到
/// 填充即视为数据结束。
///
/// 非法字符与截断的四元组以 `codec.decode` 失败。
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() / 4 * 3);
    let mut quad = [0u8; 4];
    let mut have = 0usize;
    let mut padding = 0usize;

    for &byte in src {
        if matches!(byte, b' ' | b'\t' | b'\r' | b'\n') {
            continue;
        }
        let value = if byte == b'=' {
            padding += 1;
            if padding > 2 {
                return Err(SluiceError::new(
                    codes::CODEC_DECODE,
                    "more than two padding characters",
                ));
            }
            0
        } else {
            if padding > 0 {
                return Err(SluiceError::new(
                    codes::CODEC_DECODE,
                    "data after padding character",
                ));
            }
            sextet(byte).ok_or_else(|| {
                SluiceError::new(codes::CODEC_DECODE, format!("invalid base64 byte 0x{byte:02x}"))
            })?
        };
        quad[have] = value;
        have += 1;
        if have == 4 {
            let triple = (u32::from(quad[0]) << 18)
                | (u32::from(quad[1]) << 12)
                | (u32::from(quad[2]) << 6)
                | u32::from(quad[3]);
            out.push((triple >> 16) as u8);
            if padding < 2 {
                out.push((triple >> 8) as u8);
            }
            if padding < 1 {
                out.push(triple as u8);
            }
            have = 0;
            if padding > 0 {
                break;
            }
        }
    }

    if have != 0 {
        return Err(SluiceError::new(
            codes::CODEC_DECODE,
            "truncated base64 quantum",
        ));
    }
    Ok(out)
}

fn sextet(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
