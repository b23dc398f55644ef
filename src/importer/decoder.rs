// ==========================================
// 片材坐标偏差分析系统 - 字节解码器
// ==========================================
// 编码优先级: UTF-16 (BOM 或零字节特征) → UTF-8 (可带 BOM) → EUC-KR(CP949)
// 全部失败: UTF-8 有损解码 (不中断流水线)
// 分隔符: 前 20 行内有制表符 → '\t', 否则有分号 → ';', 否则 ','
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use encoding_rs::{Encoding, EUC_KR, UTF_16BE, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// 区块起始标记
pub const BEGIN_MARKER: &str = ":BEGIN";
/// 区块结束标记
pub const END_MARKER: &str = ":END";

/// 分隔符探测扫描的行数
const DELIMITER_SCAN_LINES: usize = 20;

// ==========================================
// 文本编码 (TextEncoding)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextEncoding {
    Utf16Le,
    Utf16Be,
    Utf8,
    EucKr,
    Utf8Lossy,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf16Le => write!(f, "UTF-16LE"),
            TextEncoding::Utf16Be => write!(f, "UTF-16BE"),
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::EucKr => write!(f, "EUC-KR"),
            TextEncoding::Utf8Lossy => write!(f, "UTF-8(lossy)"),
        }
    }
}

// ==========================================
// 区块模式 (BlockMode)
// ==========================================
// Ignore: 只剔除标记行
// Optional: 两个标记都存在时只取中间行, 颠倒则报错
// Required: 必须存在且顺序正确
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    #[default]
    Ignore,
    Optional,
    Required,
}

/// 解码结果
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    /// 规范化后的非空行 (已剔除标记行与 BOM 残留)
    pub lines: Vec<String>,
    pub encoding: TextEncoding,
    pub delimiter: char,
    /// 是否经过有损解码
    pub lossy: bool,
}

impl DecodedText {
    /// 有损解码时对应的非致命错误
    pub fn degradation(&self) -> Option<ImportError> {
        self.lossy.then_some(ImportError::EncodingExhausted)
    }
}

// ==========================================
// Decoder
// ==========================================
pub struct Decoder {
    block_mode: BlockMode,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(BlockMode::Ignore)
    }
}

impl Decoder {
    pub fn new(block_mode: BlockMode) -> Self {
        Self { block_mode }
    }

    /// 字节 → 规范化行序列
    ///
    /// # 参数
    /// - bytes: 原始文件内容
    ///
    /// # 返回
    /// - Ok(DecodedText)
    /// - Err(ImportError::Structural): 仅在区块模式要求且标记缺失/颠倒时
    pub fn decode(&self, bytes: &[u8]) -> ImportResult<DecodedText> {
        let (text, encoding) = decode_bytes(bytes);
        let lossy = encoding == TextEncoding::Utf8Lossy;
        if lossy {
            warn!(len = bytes.len(), "候选编码全部失败, 使用 UTF-8 有损解码");
        }

        let raw_lines: Vec<&str> = text.lines().collect();
        let block = self.select_block(&raw_lines)?;
        let lines = normalize_lines(block);
        let delimiter = detect_delimiter(&lines);

        debug!(
            encoding = %encoding,
            delimiter = ?delimiter,
            lines = lines.len(),
            "解码完成"
        );

        Ok(DecodedText {
            lines,
            encoding,
            delimiter,
            lossy,
        })
    }

    /// 按区块模式截取行
    fn select_block<'a>(&self, lines: &'a [&'a str]) -> ImportResult<&'a [&'a str]> {
        if self.block_mode == BlockMode::Ignore {
            return Ok(lines);
        }

        let begin = lines
            .iter()
            .position(|l| strip_debris(l) == BEGIN_MARKER);
        let end = lines.iter().position(|l| strip_debris(l) == END_MARKER);

        match (begin, end) {
            (Some(b), Some(e)) if e > b => Ok(&lines[b + 1..e]),
            (Some(_), Some(_)) => Err(ImportError::Structural { begin, end }),
            _ if self.block_mode == BlockMode::Required => {
                Err(ImportError::Structural { begin, end })
            }
            _ => Ok(lines),
        }
    }
}

// ==========================================
// 编码探测
// ==========================================

/// 按优先级解码, 返回 (文本, 实际编码)
pub fn decode_bytes(bytes: &[u8]) -> (String, TextEncoding) {
    // 1. UTF-16: BOM 优先
    if let Some((enc, bom_len)) = Encoding::for_bom(bytes) {
        let body = &bytes[bom_len..];
        if enc == UTF_16LE || enc == UTF_16BE {
            if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(body) {
                let tag = if enc == UTF_16LE {
                    TextEncoding::Utf16Le
                } else {
                    TextEncoding::Utf16Be
                };
                return (text.into_owned(), tag);
            }
        }
    }

    // 1'. UTF-16 无 BOM: 零字节特征
    if let Some(enc) = sniff_utf16(bytes) {
        if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(bytes) {
            let tag = if enc == UTF_16LE {
                TextEncoding::Utf16Le
            } else {
                TextEncoding::Utf16Be
            };
            return (text.into_owned(), tag);
        }
    }

    // 2. UTF-8 (可带 BOM)
    let utf8_body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(utf8_body) {
        return (text.into_owned(), TextEncoding::Utf8);
    }

    // 3. EUC-KR (CP949 超集由 encoding_rs 统一处理)
    if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text.into_owned(), TextEncoding::EucKr);
    }

    // 4. 有损
    let (text, _had_errors) = UTF_8.decode_with_bom_removal(bytes);
    (text.into_owned(), TextEncoding::Utf8Lossy)
}

/// 无 BOM 的 UTF-16 特征: 偶数长度且某一相位的零字节占比超过 1/4
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return None;
    }
    let sample = &bytes[..bytes.len().min(512)];
    let even_zero = sample.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_zero = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    let quarter = sample.len() / 4;

    if odd_zero > quarter && odd_zero > even_zero {
        Some(UTF_16LE)
    } else if even_zero > quarter && even_zero > odd_zero {
        Some(UTF_16BE)
    } else {
        None
    }
}

// ==========================================
// 行规范化
// ==========================================

/// 去除首尾空白与 BOM 残留
fn strip_debris(line: &str) -> &str {
    line.trim().trim_matches('\u{feff}').trim()
}

/// 剔除空行与标记行
fn normalize_lines(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| {
            let s = strip_debris(l);
            if s.is_empty() || s == BEGIN_MARKER || s == END_MARKER {
                None
            } else {
                Some(l.trim_matches(|c: char| c == '\u{feff}' || c == '\r').to_string())
            }
        })
        .collect()
}

/// 分隔符探测
pub fn detect_delimiter<S: AsRef<str>>(lines: &[S]) -> char {
    let head = &lines[..lines.len().min(DELIMITER_SCAN_LINES)];
    if head.iter().any(|l| l.as_ref().contains('\t')) {
        '\t'
    } else if head.iter().any(|l| l.as_ref().contains(';')) {
        ';'
    } else {
        ','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(s: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        for unit in s.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_utf16_bom_decoded() {
        let bytes = utf16le_with_bom("거리 양면상하_좌_1: 거리 Y\t0.05\n");
        let decoded = Decoder::default().decode(&bytes).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf16Le);
        assert_eq!(decoded.delimiter, '\t');
        assert_eq!(decoded.lines, vec!["거리 양면상하_좌_1: 거리 Y\t0.05"]);
    }

    #[test]
    fn test_utf16_without_bom_sniffed() {
        let bytes: Vec<u8> = "a,b\n1,2\n"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let (text, enc) = decode_bytes(&bytes);
        assert_eq!(enc, TextEncoding::Utf16Le);
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[test]
    fn test_utf8_bom_and_plain() {
        let (text, enc) = decode_bytes(b"\xEF\xBB\xBFabc");
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(text, "abc");
        let (_, enc) = decode_bytes("면적".as_bytes());
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn test_euc_kr_fallback() {
        let (bytes, _, _) = EUC_KR.encode("카본");
        let (text, enc) = decode_bytes(&bytes);
        assert_eq!(enc, TextEncoding::EucKr);
        assert_eq!(text, "카본");
    }

    #[test]
    fn test_lossy_never_fails() {
        // 0xFF 0xFF 0x41 : 非 UTF-8, 非 EUC-KR, 奇数长度
        let decoded = Decoder::default().decode(&[0xFF, 0xFF, 0x41]).unwrap();
        assert!(decoded.lossy);
        assert_eq!(decoded.degradation(), Some(ImportError::EncodingExhausted));
    }

    #[test]
    fn test_delimiter_priority() {
        assert_eq!(detect_delimiter(&["a;b", "c\td"]), '\t');
        assert_eq!(detect_delimiter(&["a;b", "c,d"]), ';');
        assert_eq!(detect_delimiter(&["a,b"]), ',');
        let empty: [&str; 0] = [];
        assert_eq!(detect_delimiter(&empty), ',');
    }

    #[test]
    fn test_markers_stripped_in_ignore_mode() {
        let text = "\u{feff}:BEGIN\nA_1:\t1\n\n:END\n";
        let decoded = Decoder::default().decode(text.as_bytes()).unwrap();
        assert_eq!(decoded.lines, vec!["A_1:\t1"]);
    }

    #[test]
    fn test_block_required() {
        let text = "head\n:BEGIN\nA_1:\t1\n:END\ntail\n";
        let decoded = Decoder::new(BlockMode::Required)
            .decode(text.as_bytes())
            .unwrap();
        assert_eq!(decoded.lines, vec!["A_1:\t1"]);

        let missing = Decoder::new(BlockMode::Required).decode(b"A_1:\t1\n");
        assert!(matches!(missing, Err(ImportError::Structural { .. })));

        let inverted = Decoder::new(BlockMode::Required).decode(b":END\nA\n:BEGIN\n");
        assert!(matches!(
            inverted,
            Err(ImportError::Structural {
                begin: Some(2),
                end: Some(0)
            })
        ));
    }

    #[test]
    fn test_block_optional() {
        let decoded = Decoder::new(BlockMode::Optional)
            .decode(b"x\ny\n")
            .unwrap();
        assert_eq!(decoded.lines, vec!["x", "y"]);

        let inverted = Decoder::new(BlockMode::Optional).decode(b":END\nA\n:BEGIN\n");
        assert!(inverted.is_err());
    }
}
