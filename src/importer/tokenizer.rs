// ==========================================
// 片材坐标偏差分析系统 - 行切分与数值解析
// ==========================================
// 单行按分隔符切分 (csv 读取器处理引号), 失败时退回普通 split
// 数值只接受带符号的十进制/指数形式
// ==========================================

use csv::ReaderBuilder;
use regex::Regex;
use std::sync::LazyLock;

/// 严格数值: 整行必须是一个数
static STRICT_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$").expect("invalid float regex")
});

/// 宽松提取: 字符串中的所有数
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("invalid number regex")
});

/// 已切分的一行
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedLine {
    /// 在规范化行序列中的序号 (从 1 开始)
    pub line_no: usize,
    /// 首列 (项目名), 已去引号
    pub label: String,
    /// 其余列
    pub tokens: Vec<String>,
}

impl TokenizedLine {
    /// 从右向左第一个可解析的数
    pub fn rightmost_value(&self) -> Option<f64> {
        self.tokens.iter().rev().find_map(|t| parse_strict_float(t))
    }

    /// 第一列数值 (严格解析)
    pub fn first_value(&self) -> Option<f64> {
        self.tokens.first().and_then(|t| parse_strict_float(t))
    }
}

/// 去除首尾空白与双引号
pub fn clean_token(token: &str) -> &str {
    token.trim().trim_matches('"').trim()
}

/// 严格解析单个 token
pub fn parse_strict_float(token: &str) -> Option<f64> {
    let s = clean_token(token);
    if !STRICT_FLOAT_RE.is_match(s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 提取字符串中的全部数
pub fn extract_numbers(s: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(s)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// 单行切分
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|f| f.trim().to_string()).collect(),
        _ => line
            .split(delimiter)
            .map(|f| f.trim().to_string())
            .collect(),
    }
}

/// 行序列 → TokenizedLine 序列 (项目名为空的行被跳过)
pub fn tokenize(lines: &[String], delimiter: char) -> Vec<TokenizedLine> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let mut parts = split_line(line, delimiter).into_iter();
            let label = clean_token(&parts.next()?).to_string();
            if label.is_empty() {
                return None;
            }
            Some(TokenizedLine {
                line_no: i + 1,
                label,
                tokens: parts.collect(),
            })
        })
        .collect()
}
