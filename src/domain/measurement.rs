// ==========================================
// 片材坐标偏差分析系统 - 测量点
// ==========================================
// 由项目名语法解析产生，只读
// ==========================================

use crate::domain::types::{Axis, Position};
use serde::{Deserialize, Serialize};

/// 单个测量点 (mm)
///
/// - 组装语法: `index` 为行号 (1..12)
/// - 印刷计算器语法: `index` 为角点编号 (1..4)
/// - 距离语法: `index` 为测点编号
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// 检查种类 / 计算器基准 (如 "거리 양면상하", "타발기준")
    pub test_kind: String,
    /// 基准或层 (如 "카본"), 组装语法为空
    pub ref_or_layer: String,
    pub axis: Option<Axis>,
    pub position: Position,
    pub index: u32,
    /// 项目名冒号后的测量项 (如 "거리 Y")
    pub metric: String,
    /// 偏差值
    pub value: Option<f64>,
    /// 实测值 (仅工序表格类导出)
    pub actual: Option<f64>,
    /// 基准值 (仅工序表格类导出)
    pub target: Option<f64>,
}

impl MeasurementPoint {
    /// 组装语法测点
    pub fn assembly(
        test_kind: &str,
        position: Position,
        row: u32,
        metric: &str,
        value: Option<f64>,
    ) -> Self {
        Self {
            test_kind: test_kind.to_string(),
            ref_or_layer: String::new(),
            axis: metric.split_whitespace().last().and_then(Axis::from_token),
            position,
            index: row,
            metric: metric.to_string(),
            value,
            actual: None,
            target: None,
        }
    }

    /// 行号是否在有效范围 1..=12
    pub fn has_valid_row(&self) -> bool {
        (1..=crate::domain::row::ROW_COUNT as u32).contains(&self.index)
    }
}
