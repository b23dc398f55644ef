// ==========================================
// 片材坐标偏差分析系统 - 工序表格行 (印刷/分切导出)
// ==========================================
// 列顺序: 实测, 基准, 公差1, 公差2, 计算值
// 计算值缺失时: 实测 - 基准; 计算器项目只有一个数时取实测
// ==========================================

use crate::domain::labels::CALCULATOR_PREFIX;
use crate::importer::tokenizer::{clean_token, extract_numbers, parse_strict_float};
use serde::{Deserialize, Serialize};

/// 视为零的阈值
const ZERO_EPS: f64 = 1e-12;

/// 工序表格行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub label: String,
    pub actual: Option<f64>,
    pub target: Option<f64>,
    pub tol1: Option<f64>,
    pub tol2: Option<f64>,
    /// 偏差 (设备计算值或推导值)
    pub calc: Option<f64>,
}

impl ProcessRow {
    /// 由项目名与数值列构建
    ///
    /// # 参数
    /// - label: 项目名
    /// - nums: 按列顺序的数值, 缺失为 None
    pub fn from_numbers(label: &str, nums: &[Option<f64>]) -> Self {
        let at = |i: usize| nums.get(i).copied().flatten();
        let actual = at(0);
        let target = at(1);
        let is_calculator = label.starts_with(CALCULATOR_PREFIX);

        let mut calc = if nums.len() > 4 {
            at(4)
        } else if is_calculator && nums.len() == 1 && actual.is_some() {
            actual
        } else {
            match (actual, target) {
                (Some(a), Some(t)) => Some(a - t),
                _ => None,
            }
        };

        // 计算器项目: 计算值为空或为 0 时用实测值
        if is_calculator {
            if let Some(a) = actual {
                if calc.map_or(true, |c| c.abs() < ZERO_EPS) {
                    calc = Some(a);
                }
            }
        }

        Self {
            label: label.to_string(),
            actual,
            target,
            tol1: at(2),
            tol2: at(3),
            calc,
        }
    }
}

/// 单行 → (项目名, 数值列)
///
/// 制表符切分且首列含冒号时按列处理; 否则按第一个冒号切成两段
fn split_tabular(line: &str) -> Option<(String, Vec<String>)> {
    let s = line.trim().trim_matches('\u{feff}').trim_matches('"');
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s
        .split('\t')
        .map(clean_token)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() >= 2 && (parts[0].contains(':') || parts[0].contains('：')) {
        return Some((
            parts[0].to_string(),
            parts[1..].iter().map(|p| p.to_string()).collect(),
        ));
    }

    let (k, v) = s.split_once(':').or_else(|| s.split_once('：'))?;
    Some((k.trim().to_string(), vec![v.trim().to_string()]))
}

/// 行序列 → 工序表格行
pub fn process_rows(lines: &[String]) -> Vec<ProcessRow> {
    lines
        .iter()
        .filter_map(|line| split_tabular(line))
        .map(|(label, cols)| {
            let nums: Vec<Option<f64>> = if cols.len() == 1 {
                extract_numbers(&cols[0]).into_iter().map(Some).collect()
            } else {
                cols.iter().map(|c| parse_strict_float(c)).collect()
            };
            ProcessRow::from_numbers(&label, &nums)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<ProcessRow> {
        let owned: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        process_rows(&owned)
    }

    #[test]
    fn test_fifth_column_is_authoritative() {
        let r = rows(&["거리 타발_좌측_1: 거리 X\t10.05\t10.00\t0.1\t-0.1\t0.07"]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].calc, Some(0.07));
        assert_eq!(r[0].actual, Some(10.05));
    }

    #[test]
    fn test_deviation_derived_from_actual_and_target() {
        let r = rows(&["거리 타발_우측_2: 거리 Y\t5.5\t5.25"]);
        assert_eq!(r[0].calc, Some(0.25));
        assert_eq!(r[0].tol1, None);
    }

    #[test]
    fn test_calculator_single_number_uses_actual() {
        let r = rows(&["계산기 타발기준_카본좌우_1: 숫자\t0.031"]);
        assert_eq!(r[0].calc, Some(0.031));
    }

    #[test]
    fn test_calculator_zero_calc_replaced() {
        let r = rows(&["계산기 타발기준_절연상하_2: 숫자\t-0.04\t0\t0.1\t-0.1\t0"]);
        assert_eq!(r[0].calc, Some(-0.04));
    }

    #[test]
    fn test_colon_split_single_column() {
        let r = rows(&["\u{feff}항목A: 1.5 1.0"]);
        assert_eq!(r[0].label, "항목A");
        assert_eq!(r[0].actual, Some(1.5));
        assert_eq!(r[0].calc, Some(0.5));
    }

    #[test]
    fn test_unparseable_columns_kept_as_missing() {
        let r = rows(&["거리 카본_상측_1: 거리 Y\tN/A\t3.0"]);
        assert_eq!(r[0].actual, None);
        assert_eq!(r[0].target, Some(3.0));
        assert_eq!(r[0].calc, None);
    }

    #[test]
    fn test_line_without_colon_dropped() {
        assert!(rows(&["header\tvalue"]).is_empty());
    }
}
