// ==========================================
// 片材坐标偏差分析系统 - 工序裕量记录
// ==========================================
// 与片材记录独立, 仅以作业 (job) 为键
// ==========================================

use crate::domain::types::{Axis, Direction, Judgment, MarginStatus, Position, ProcessStage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 四角 → Row1/Row12 拓扑候选 (Topology)
// ==========================================
// 每个候选把两个角点配给 Row1, 另两个配给 Row12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topology {
    A, // 1,3 → Row1 / 2,4 → Row12
    B, // 1,2 → Row1 / 3,4 → Row12
    C, // 1,4 → Row1 / 2,3 → Row12
}

impl Topology {
    /// 候选声明顺序 (同分时先声明者优先)
    pub const CANDIDATES: [Topology; 3] = [Topology::A, Topology::B, Topology::C];

    /// Row1 使用的角点
    pub fn row1_corners(&self) -> [u32; 2] {
        match self {
            Topology::A => [1, 3],
            Topology::B => [1, 2],
            Topology::C => [1, 4],
        }
    }

    /// Row12 使用的角点
    pub fn row12_corners(&self) -> [u32; 2] {
        match self {
            Topology::A => [2, 4],
            Topology::B => [3, 4],
            Topology::C => [2, 3],
        }
    }

    /// 现场显示用名称
    pub fn label(&self) -> &'static str {
        match self {
            Topology::A => "A(1,3→Row1 / 2,4→Row12)",
            Topology::B => "B(1,2→Row1 / 3,4→Row12)",
            Topology::C => "C(1,4→Row1 / 2,3→Row12)",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 印刷层 12 行裕量 (碳层 / 绝缘层 / 层间干涉)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintingMarginRow {
    pub row: u8,
    pub x_direction: Direction,
    pub x_deviation: Option<f64>,
    pub x_movable: Option<f64>,
    pub x_remaining_pct: Option<f64>,
    pub y_direction: Direction,
    pub y_deviation: Option<f64>,
    pub y_movable: Option<f64>,
    pub y_remaining_pct: Option<f64>,
    pub status: MarginStatus,
}

/// 分切冲孔宽度 Y 轴 12 行裕量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlitterMarginRow {
    pub row: u8,
    pub direction: Direction,
    pub y_deviation: Option<f64>,
    pub movable: Option<f64>,
    pub remaining_pct: Option<f64>,
    pub status: MarginStatus,
    /// 最差位置 (L/C/R)
    pub worst_position: Option<Position>,
}

/// 分切全宽均匀性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlitterTotalRow {
    pub row: u8,
    pub left: Option<f64>,
    pub center: Option<f64>,
    pub right: Option<f64>,
    pub range: Option<f64>,
    pub std_dev: Option<f64>,
    pub status: MarginStatus,
}

/// 原单伸缩解释
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrainChange {
    Unchanged,
    Stretched,
    Shrunk,
    Unknown,
}

/// 原单偏差行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricRow {
    pub side: Position,
    pub axis: Option<Axis>,
    pub point: u32,
    pub target: Option<f64>,
    pub actual: Option<f64>,
    pub deviation: Option<f64>,
    pub change: StrainChange,
    pub abs_deviation: Option<f64>,
    pub status: MarginStatus,
}

/// 钢网: 方向别层间差
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StencilDetailRow {
    pub side: Position,
    pub carbon_deviation: Option<f64>,
    pub insulation_deviation: Option<f64>,
    pub layer_difference: Option<f64>,
    pub status: MarginStatus,
}

/// 非对称比较对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsymmetryPair {
    LeftRight,
    TopBottom,
}

/// 钢网: 层内非对称
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StencilSummaryRow {
    pub layer: String,
    pub pair: AsymmetryPair,
    pub value: Option<f64>,
    pub status: MarginStatus,
}

/// 组装单轴裕量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisMargin {
    pub worst: f64,
    pub ng: f64,
    pub margin: f64,
    pub zone: Judgment,
}

/// 工序单轴消耗
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedMargin {
    pub consumed: f64,
    pub budget: f64,
    pub remaining: f64,
    pub zone: Judgment,
}

/// 工序贡献估算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessContribution {
    pub stage: ProcessStage,
    pub x: ConsumedMargin,
    pub y: ConsumedMargin,
}

/// 片材组装裕量估算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyMargin {
    pub x: AxisMargin,
    pub y: AxisMargin,
    pub processes: Vec<ProcessContribution>,
}

/// 工序裕量记录 (按作业保存)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMarginRecord {
    pub carbon: Vec<PrintingMarginRow>,
    pub insulation: Vec<PrintingMarginRow>,
    pub interference: Vec<PrintingMarginRow>,
    pub topology_carbon: Option<Topology>,
    pub topology_insulation: Option<Topology>,
    pub topology_interference: Option<Topology>,
    pub slitter: Vec<SlitterMarginRow>,
    pub slitter_total: Vec<SlitterTotalRow>,
    pub slitter_by_file: BTreeMap<String, Vec<SlitterMarginRow>>,
    pub slitter_total_by_file: BTreeMap<String, Vec<SlitterTotalRow>>,
    pub fabric: Vec<FabricRow>,
    pub stencil_detail: Vec<StencilDetailRow>,
    pub stencil_summary: Vec<StencilSummaryRow>,
    pub printing_files: Vec<String>,
    pub slitter_files: Vec<String>,
}
