// ==========================================
// 片材坐标偏差分析系统 - 文件名规则
// ==========================================
// 规则: 日期_产线_批次_状态_片号_备注(可选).csv
// 时间键只在备注区查找: 6 位 HHMMSS 优先, 其次 4 位 HHMM
// ==========================================

use crate::domain::sheet::{SheetMeta, TimeKey};
use crate::importer::error::{ImportError, ImportResult};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static SIX_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{6}").expect("invalid time regex"));
static FOUR_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("invalid time regex"));

/// 文件名的基本部分 (去目录)
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim()
}

/// 去扩展名后的主干
fn stem(base: &str) -> &str {
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
}

impl SheetMeta {
    /// 解析文件名
    ///
    /// 字段少于 5 个时返回除文件名外全部为空的元数据
    pub fn parse(file_name: &str) -> Self {
        let base = base_name(file_name);
        let parts: Vec<&str> = stem(base).split('_').collect();
        if parts.len() < 5 {
            return Self {
                file_name: base.to_string(),
                ..Default::default()
            };
        }

        let digits: String = parts[4].chars().filter(|c| c.is_ascii_digit()).collect();

        Self {
            file_name: base.to_string(),
            date: Some(parts[0].to_string()),
            line: Some(parts[1].to_string()),
            lot: Some(parts[2].to_string()),
            status: Some(parts[3].to_string()),
            sheet_number: digits.parse().ok(),
            memo: parts[5..].join("_"),
        }
    }

    /// 解析并校验必需字段
    pub fn parse_required(file_name: &str) -> ImportResult<Self> {
        let meta = Self::parse(file_name);
        if meta.is_complete() {
            Ok(meta)
        } else {
            Err(ImportError::FilenameParseFailed(meta.file_name))
        }
    }

    /// 备注区的时间键
    pub fn time_key(&self) -> TimeKey {
        time_key_of_memo(&self.memo)
    }
}

/// 备注 → 时间键
pub fn time_key_of_memo(memo: &str) -> TimeKey {
    if memo.is_empty() {
        return TimeKey::Untimed;
    }
    if let Some(m) = SIX_DIGITS_RE.find(memo) {
        if let Ok(t) = m.as_str().parse::<u32>() {
            if t <= 235_959 {
                return TimeKey::Timed(t);
            }
        }
    }
    if let Some(m) = FOUR_DIGITS_RE.find(memo) {
        if let Ok(t) = m.as_str().parse::<u32>() {
            if t <= 2_359 {
                return TimeKey::Timed(t);
            }
        }
    }
    TimeKey::Untimed
}

/// 同一 sheet_key 的新上传是否取代旧记录
///
/// # 规则
/// - 两者都有时间: 新时间 >= 旧时间
/// - 仅新者有时间: 取代
/// - 其余: 按上传顺序, 后到者取代
pub fn supersedes(
    new_time: TimeKey,
    new_index: usize,
    old_time: TimeKey,
    old_index: usize,
) -> bool {
    match (new_time, old_time) {
        (TimeKey::Timed(n), TimeKey::Timed(o)) => n >= o,
        (TimeKey::Timed(_), TimeKey::Untimed) => true,
        _ => new_index >= old_index,
    }
}
