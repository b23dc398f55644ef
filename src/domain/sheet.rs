// ==========================================
// 片材坐标偏差分析系统 - 片材实体
// ==========================================
// 文件名规则: 日期_产线_批次_状态_片号_备注(可选).csv
// 同一 sheet_key 只保留一份行记录 (后到者覆盖, 不合并)
// ==========================================

use crate::domain::diagnosis::DiagnosisSummary;
use crate::domain::row::SheetRows;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 文件名元数据
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub file_name: String,
    /// 6 位日期原文 (YYMMDD)
    pub date: Option<String>,
    pub line: Option<String>,
    pub lot: Option<String>,
    pub status: Option<String>,
    pub sheet_number: Option<u32>,
    pub memo: String,
}

impl SheetMeta {
    /// 解析后的日期 (YYMMDD)
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%y%m%d").ok())
    }

    /// 必需字段是否齐全 (日期/产线/批次/片号)
    pub fn is_complete(&self) -> bool {
        self.sheet_number.is_some()
            && self.date.as_deref().is_some_and(|s| !s.is_empty())
            && self.line.as_deref().is_some_and(|s| !s.is_empty())
            && self.lot.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// 复合键: 日期|产线|批次|状态|片号
    pub fn sheet_key(&self) -> String {
        [
            self.date.clone().unwrap_or_default(),
            self.line.clone().unwrap_or_default(),
            self.lot.clone().unwrap_or_default(),
            self.status.clone().unwrap_or_default(),
            self.sheet_number.map(|n| n.to_string()).unwrap_or_default(),
        ]
        .join("|")
    }
}

/// 文件名中的时间键 (备注区的 HHMMSS / HHMM)
///
/// 排序: 无时间 < 有时间, 有时间时按数值比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeKey {
    Untimed,
    Timed(u32),
}

/// 解析诊断 (非致命问题的计数与样本)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostics {
    /// 无法识别的项目名总数
    pub unmatched_count: usize,
    /// 无法识别的项目名样本 (上限 50)
    pub unmatched_samples: Vec<String>,
    /// 按面积规则排除的数量
    pub excluded_count: usize,
    /// 是否经过有损解码
    pub lossy_decoded: bool,
}

impl ParseDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unmatched_count == 0 && !self.lossy_decoded
    }
}

/// 片材记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRecord {
    pub sheet_key: String,
    pub meta: SheetMeta,
    pub rows: SheetRows,
    pub diagnosis: DiagnosisSummary,
    pub quality_score: f64,
    #[serde(default)]
    pub parse: ParseDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SheetMeta {
        SheetMeta {
            file_name: "250314_L2_LOT7_A_12.csv".to_string(),
            date: Some("250314".to_string()),
            line: Some("L2".to_string()),
            lot: Some("LOT7".to_string()),
            status: Some("A".to_string()),
            sheet_number: Some(12),
            memo: String::new(),
        }
    }

    #[test]
    fn test_sheet_key() {
        assert_eq!(meta().sheet_key(), "250314|L2|LOT7|A|12");
        assert_eq!(SheetMeta::default().sheet_key(), "||||");
    }

    #[test]
    fn test_parsed_date() {
        assert_eq!(
            meta().parsed_date(),
            Some(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
        );
    }

    #[test]
    fn test_is_complete() {
        assert!(meta().is_complete());
        let mut m = meta();
        m.sheet_number = None;
        assert!(!m.is_complete());
    }

    #[test]
    fn test_parse_diagnostics_clean() {
        assert!(ParseDiagnostics::default().is_clean());
        let lossy = ParseDiagnostics {
            lossy_decoded: true,
            ..Default::default()
        };
        assert!(!lossy.is_clean());
        let json = serde_json::to_value(&lossy).unwrap();
        assert_eq!(json["lossyDecoded"], true);
        assert_eq!(json["unmatchedCount"], 0);
    }

    #[test]
    fn test_time_key_order() {
        assert!(TimeKey::Untimed < TimeKey::Timed(0));
        assert!(TimeKey::Timed(930) < TimeKey::Timed(101500));
    }
}
