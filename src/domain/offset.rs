// ==========================================
// 片材坐标偏差分析系统 - 补偿向量与模拟结果
// ==========================================
// 印刷: 全局一个偏移 / 分切、组装: 每行独立偏移
// ==========================================

use crate::domain::row::{SheetRows, ROW_COUNT};
use crate::domain::types::Judgment;
use serde::{Deserialize, Serialize};

/// 设备补偿向量
///
/// 外部传入时各行向量可短可长，使用前经 [`OffsetVector::normalized`] 补零/截断到 12
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OffsetVector {
    pub printing_x: f64,
    pub printing_y: f64,
    pub slitter_y: Vec<f64>,
    pub assembly_x: Vec<f64>,
    pub assembly_y: Vec<f64>,
}

impl OffsetVector {
    /// 全零向量
    pub fn zero() -> Self {
        Self {
            printing_x: 0.0,
            printing_y: 0.0,
            slitter_y: vec![0.0; ROW_COUNT],
            assembly_x: vec![0.0; ROW_COUNT],
            assembly_y: vec![0.0; ROW_COUNT],
        }
    }

    /// 各行向量补零/截断到 12
    pub fn normalized(&self) -> Self {
        fn fit(v: &[f64]) -> Vec<f64> {
            let mut out: Vec<f64> = v.iter().copied().take(ROW_COUNT).collect();
            out.resize(ROW_COUNT, 0.0);
            out
        }
        Self {
            printing_x: self.printing_x,
            printing_y: self.printing_y,
            slitter_y: fit(&self.slitter_y),
            assembly_x: fit(&self.assembly_x),
            assembly_y: fit(&self.assembly_y),
        }
    }
}

/// 模拟一侧 (前/后) 的片材指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetrics {
    pub worst_x: Option<f64>,
    pub worst_y: Option<f64>,
    pub punch_worst: Option<f64>,
    pub c_asym: f64,
    pub diag: f64,
    pub status: Judgment,
    pub score: f64,
    pub rows: SheetRows,
}

/// 单行前后对比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowComparison {
    pub row: u8,
    pub before_x: Option<f64>,
    pub before_y: Option<f64>,
    pub after_x: Option<f64>,
    pub after_y: Option<f64>,
}

/// 模拟结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub before: SheetMetrics,
    pub after: SheetMetrics,
    pub per_row: Vec<RowComparison>,
}
