// ==========================================
// 片材坐标偏差分析系统 - 判定引擎
// ==========================================
// 红线: 判定是"等级制" (OK < CHECK < NG), 评分只做可视化辅助
// 输入: 12 行记录 + ThresholdConfig
// 输出: 行判定 / 片材判定 / 品质分 / 方向
// ==========================================

use crate::config::ThresholdConfig;
use crate::domain::dispensing::PopulationStats;
use crate::domain::row::{RowRecord, SheetRows};
use crate::domain::types::{Axis, Direction, Judgment, SheetStatus};
use serde::{Deserialize, Serialize};

/// CHECK 片材的分数上限 (分数带不跨越等级边界)
pub const CHECK_SCORE_CAP: f64 = 79.9;

/// 风险比上限
const RISK_CAP: f64 = 1.5;

// ==========================================
// 基础函数
// ==========================================

/// 带符号的最坏值: |值| 最大者, 同值取先出现者
pub fn worst_signed<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |best: Option<f64>, v| match best {
            Some(b) if v.abs() <= b.abs() => Some(b),
            _ => Some(v),
        })
}

/// 最坏绝对值
pub fn worst_magnitude<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    worst_signed(values).map(f64::abs)
}

/// 三级判定: |v| >= ng → NG, >= check → CHECK
pub fn judge_value(value: f64, check: f64, ng: f64) -> Judgment {
    let av = value.abs();
    if av >= ng {
        Judgment::Ng
    } else if av >= check {
        Judgment::Check
    } else {
        Judgment::Ok
    }
}

/// 行约束指标: (左右非对称, 斜线代理)
///
/// 任一侧上下偏移缺失时两者皆为 None
pub fn row_constraints(row: &RowRecord) -> (Option<f64>, Option<f64>) {
    match (row.vertical_offset_left, row.vertical_offset_right) {
        (Some(l), Some(r)) => (Some((l - r).abs()), Some((l + r).abs() / 2.0)),
        _ => (None, None),
    }
}

/// 现场方向: 死区以内 (含边界) 为居中
pub fn direction_of(axis: Axis, value: Option<f64>, deadband: f64) -> Direction {
    match value {
        None => Direction::Unknown,
        Some(v) if v.abs() <= deadband => Direction::Centered,
        Some(v) => signed_direction(axis, v),
    }
}

/// 工序裕量用方向: |v| 严格小于阈值才算居中
pub fn tilt_direction(axis: Axis, value: Option<f64>, threshold: f64) -> Direction {
    match value {
        None => Direction::Unknown,
        Some(v) if v.abs() < threshold => Direction::Centered,
        Some(v) => signed_direction(axis, v),
    }
}

fn signed_direction(axis: Axis, v: f64) -> Direction {
    match (axis, v > 0.0) {
        (Axis::X, true) => Direction::Right,
        (Axis::X, false) => Direction::Left,
        (Axis::Y, true) => Direction::Up,
        (Axis::Y, false) => Direction::Down,
    }
}

/// 总体相对判定 (σ 规则)
///
/// z = |v - mean| / std; std 为 0 时恒为 OK
pub fn sigma_judgment(value: f64, stats: &PopulationStats) -> Judgment {
    if stats.std_dev == 0.0 {
        return Judgment::Ok;
    }
    let z = (value - stats.mean).abs() / stats.std_dev;
    if z > 2.0 {
        Judgment::Ng
    } else if z > 1.0 {
        Judgment::Check
    } else {
        Judgment::Ok
    }
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

// ==========================================
// 片材指标 (SheetIndicators)
// ==========================================
/// 片材级判定输入 (均为绝对值)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetIndicators {
    pub worst_x: Option<f64>,
    pub worst_y: Option<f64>,
    pub punch_worst: Option<f64>,
    /// 各行左右非对称最大值
    pub c_asym: Option<f64>,
    /// 各行斜线代理最大值
    pub diag: Option<f64>,
}

impl SheetIndicators {
    pub fn from_rows(rows: &SheetRows) -> Self {
        let (asym, diag): (Vec<_>, Vec<_>) = rows.iter().map(row_constraints).unzip();
        Self {
            worst_x: worst_magnitude(rows.iter().flat_map(|r| r.x_values())),
            worst_y: worst_magnitude(rows.iter().flat_map(|r| r.y_values())),
            punch_worst: worst_magnitude(rows.iter().flat_map(|r| r.punch_values())),
            c_asym: worst_magnitude(asym),
            diag: worst_magnitude(diag),
        }
    }
}

// ==========================================
// JudgmentEngine
// ==========================================
pub struct JudgmentEngine {
    thresholds: ThresholdConfig,
}

impl Default for JudgmentEngine {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}

impl JudgmentEngine {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// 片材判定 (MUST / CHECK / OK)
    ///
    /// - MUST: worstX >= ngX 或 worstY >= ngY
    /// - CHECK: X/Y/非对称/斜线/冲孔 任一达到观察阈值
    pub fn sheet_status(&self, ind: &SheetIndicators) -> SheetStatus {
        let th = &self.thresholds;
        let reaches = |v: Option<f64>, limit: f64| v.is_some_and(|v| v >= limit);

        if reaches(ind.worst_x, th.ng_x) || reaches(ind.worst_y, th.ng_y) {
            return SheetStatus::Must;
        }

        let check = reaches(ind.worst_x, th.tag_x)
            || reaches(ind.worst_y, th.tag_y)
            || reaches(ind.c_asym, th.th_asym)
            || reaches(ind.diag, th.th_diag)
            || reaches(ind.punch_worst, th.tag_punch);

        if check {
            SheetStatus::Check
        } else {
            SheetStatus::Ok
        }
    }

    /// 品质分 (0~100, 越高越安全)
    ///
    /// # 参数
    /// - worst_x, worst_y: 最坏值 (缺失按 0 计)
    /// - status: 片材判定; MUST 固定 0 分, CHECK 上限 79.9
    pub fn quality_score(
        &self,
        worst_x: Option<f64>,
        worst_y: Option<f64>,
        status: SheetStatus,
    ) -> f64 {
        if status == SheetStatus::Must {
            return 0.0;
        }

        let ratio = |v: Option<f64>, ng: f64| {
            if ng > 0.0 {
                (v.unwrap_or(0.0).abs() / ng).min(RISK_CAP)
            } else {
                0.0
            }
        };
        let risk = ratio(worst_x, self.thresholds.ng_x).max(ratio(worst_y, self.thresholds.ng_y));

        let mut score = 100.0 - 60.0 * risk.min(1.0) - 40.0 * (risk - 1.0).max(0.0);
        if status == SheetStatus::Check {
            score = score.min(CHECK_SCORE_CAP);
        }
        score.clamp(0.0, 100.0)
    }

    /// 片材判定 + 品质分
    pub fn evaluate(&self, rows: &SheetRows) -> (SheetIndicators, SheetStatus, f64) {
        let ind = SheetIndicators::from_rows(rows);
        let status = self.sheet_status(&ind);
        let score = self.quality_score(ind.worst_x, ind.worst_y, status);
        (ind, status, score)
    }

    /// 单行判定
    ///
    /// NG: 任一轴达到 ng / CHECK: 任一轴达到观察阈值或冲孔达到 tagPunch
    pub fn row_status(&self, row: &RowRecord) -> Judgment {
        let th = &self.thresholds;
        let sev_x = worst_magnitude(row.x_values());
        let sev_y = worst_magnitude(row.y_values());
        let punch = worst_magnitude(row.punch_values());

        let jx = sev_x.map_or(Judgment::Ok, |v| judge_value(v, th.tag_x, th.ng_x));
        let jy = sev_y.map_or(Judgment::Ok, |v| judge_value(v, th.tag_y, th.ng_y));
        let jp = match punch {
            Some(p) if p >= th.tag_punch => Judgment::Check,
            _ => Judgment::Ok,
        };
        jx.max(jy).max(jp)
    }
}
