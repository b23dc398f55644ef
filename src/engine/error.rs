// ==========================================
// 片材坐标偏差分析系统 - 引擎错误类型
// ==========================================
// InsufficientData: 统计计算无法组成任何完整数据组 (致命)
// MissingAnchor: 插值锚点缺失 (降级为该轴全空)
// ==========================================

use crate::domain::types::Axis;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("数据不足: {0}")]
    InsufficientData(String),

    #[error("插值锚点缺失 (轴 {axis}): Row1={row1:?}, Row12={row12:?}")]
    MissingAnchor {
        axis: Axis,
        row1: Option<f64>,
        row12: Option<f64>,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
