// ==========================================
// 片材坐标偏差分析系统 - 工序裕量限值
// ==========================================
// 印刷/分切 ±0.15mm, 观察 0.12mm
// 原单/钢网/全宽均匀性/点胶 各自独立阈值
// ==========================================

use serde::{Deserialize, Serialize};

/// 工序裕量限值 (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginLimits {
    // ===== 印刷 =====
    pub print_limit: f64,
    pub print_watch: f64,

    // ===== 分切 =====
    pub slit_limit: f64,
    pub slit_watch: f64,

    /// 偏移方向判定阈值
    pub direction_threshold: f64,

    // ===== 原单 =====
    pub fabric_deadband: f64,
    pub fabric_warn: f64,
    pub fabric_danger: f64,

    // ===== 钢网 =====
    pub layer_watch: f64,
    pub layer_stop: f64,
    pub asym_watch: f64,
    pub asym_strong: f64,

    // ===== 分切全宽均匀性 =====
    pub total_warn_range: f64,
    pub total_bad_range: f64,
    pub total_warn_std: f64,
    pub total_bad_std: f64,

    // ===== 点胶 =====
    /// 面积物理有效下限, 低于此值视为异常
    pub dispense_validity_floor: f64,
}

impl Default for MarginLimits {
    fn default() -> Self {
        Self {
            print_limit: 0.15,
            print_watch: 0.12,
            slit_limit: 0.15,
            slit_watch: 0.12,
            direction_threshold: 0.02,
            fabric_deadband: 0.01,
            fabric_warn: 0.05,
            fabric_danger: 0.07,
            layer_watch: 0.12,
            layer_stop: 0.15,
            asym_watch: 0.10,
            asym_strong: 0.12,
            total_warn_range: 0.05,
            total_bad_range: 0.07,
            total_warn_std: 0.02,
            total_bad_std: 0.03,
            dispense_validity_floor: 3.0,
        }
    }
}
