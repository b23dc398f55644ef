// ==========================================
// 片材坐标偏差分析系统 - 诊断摘要
// ==========================================
// 派生数据: 行记录或阈值变化时重新计算
// ==========================================

use crate::domain::types::{Axis, Direction, Judgment, Position};
use serde::{Deserialize, Serialize};

/// 最差点 (带方向)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorstPoint {
    /// 带符号值
    pub value: f64,
    pub row: u8,
    pub side: Position,
    pub direction: Direction,
    pub ng: f64,
    pub check: f64,
}

/// 触发的标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: f64,
    pub limit: f64,
}

/// 标题轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeadlineAxis {
    X,
    Y,
    Punch,
    Ok,
}

impl From<Axis> for HeadlineAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => HeadlineAxis::X,
            Axis::Y => HeadlineAxis::Y,
        }
    }
}

/// 诊断标题 (代表性问题)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub axis: HeadlineAxis,
    pub value: Option<f64>,
    pub row: Option<u8>,
    pub side: Option<Position>,
    pub limit: Option<f64>,
}

impl Headline {
    pub fn ok() -> Self {
        Self {
            axis: HeadlineAxis::Ok,
            value: None,
            row: None,
            side: None,
            limit: None,
        }
    }
}

/// 问题行 (Top5 / 冲孔 Top3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRow {
    pub row: u8,
    pub axis: HeadlineAxis,
    pub side: Option<Position>,
    pub value: Option<f64>,
    pub direction: Direction,
    pub row_status: Judgment,
    pub severity: Option<f64>,
}

/// 迷你卡片标记类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    Skew, // X: 左右差
    Tilt, // Y: 倾斜
    Bow,  // Y: 中间鼓/塌
}

/// 迷你卡片标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniFlag {
    pub kind: FlagKind,
    /// 值为正时的含义 (R 面更大 / 右侧更高 / 中间上浮)
    pub positive: bool,
    pub value: f64,
    pub thresh: f64,
}

impl MiniFlag {
    /// 本地化描述
    pub fn label(&self) -> String {
        let key = match (self.kind, self.positive) {
            (FlagKind::Skew, true) => "flag.skew_right",
            (FlagKind::Skew, false) => "flag.skew_left",
            (FlagKind::Tilt, true) => "flag.tilt_right_up",
            (FlagKind::Tilt, false) => "flag.tilt_left_up",
            (FlagKind::Bow, true) => "flag.bow_up",
            (FlagKind::Bow, false) => "flag.bow_down",
        };
        crate::i18n::t(key)
    }
}

/// 迷你卡片测点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniPoint {
    pub pos: Position,
    pub value: f64,
    pub is_worst: bool,
}

/// 单轴迷你诊断卡
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniCard {
    pub axis: Axis,
    pub ng: f64,
    pub deadband: f64,
    pub center_value: Option<f64>,
    pub direction: Direction,
    pub points: Vec<MiniPoint>,
    pub flags: Vec<MiniFlag>,
    pub row: u8,
}

/// 诊断摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisSummary {
    pub sheet_status: Judgment,
    pub headline: Headline,
    pub worst_x: Option<WorstPoint>,
    pub worst_y: Option<WorstPoint>,
    /// 片材级左右非对称 (各行最大)
    pub c_asym: Option<f64>,
    /// 片材级斜线代理值 (各行最大)
    pub diag: Option<f64>,
    pub tags: Vec<Tag>,
    pub problem_rows_top5: Vec<ProblemRow>,
    pub punch_top3: Vec<ProblemRow>,
    pub mini_x: Option<MiniCard>,
    pub mini_y: Option<MiniCard>,
}

impl DiagnosisSummary {
    /// 标签名列表
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}
