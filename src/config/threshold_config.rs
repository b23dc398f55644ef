// ==========================================
// 片材坐标偏差分析系统 - 判定阈值配置
// ==========================================
// 每次调用传入; 缺省回落到默认值
// 多个别名键映射到同一逻辑阈值, 取第一个非空且可解析的别名
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// 阈值键与别名
// ==========================================
pub mod threshold_keys {
    pub const TAG_X: &[&str] = &["tag_x", "x_tag"];
    pub const TAG_Y: &[&str] = &["tag_y", "y_tag"];
    pub const TAG_PUNCH: &[&str] = &["tag_punch", "punch", "tag_p"];
    pub const TH_ASYM: &[&str] = &["th_asym", "casym", "asym"];
    pub const TH_DIAG: &[&str] = &["th_diag", "diag"];
    pub const NG_X: &[&str] = &["ng_x"];
    pub const NG_Y: &[&str] = &["ng_y"];
    pub const DEADBAND_X: &[&str] = &["deadband_x"];
    pub const DEADBAND_Y: &[&str] = &["deadband_y"];
    pub const TILT_THRESH_Y: &[&str] = &["tilt_thresh_y"];
    pub const BOW_THRESH_Y: &[&str] = &["bow_thresh_y"];
}

/// 判定阈值 (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// X 观察阈值
    pub tag_x: f64,
    /// Y 观察阈值
    pub tag_y: f64,
    /// 冲孔观察阈值
    pub tag_punch: f64,
    /// 左右非对称阈值
    pub th_asym: f64,
    /// 斜线代理阈值
    pub th_diag: f64,
    /// X 不良阈值
    pub ng_x: f64,
    /// Y 不良阈值
    pub ng_y: f64,
    /// 方向判定死区
    pub deadband_x: f64,
    pub deadband_y: f64,
    /// 迷你卡片 tilt/bow 标记阈值
    pub tilt_thresh_y: f64,
    pub bow_thresh_y: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            tag_x: 0.10,
            tag_y: 0.10,
            tag_punch: 0.10,
            th_asym: 0.10,
            th_diag: 0.10,
            ng_x: 0.15,
            ng_y: 0.15,
            deadband_x: 0.02,
            deadband_y: 0.02,
            tilt_thresh_y: 0.03,
            bow_thresh_y: 0.03,
        }
    }
}

impl ThresholdConfig {
    /// 从覆写对象构建 (别名解析)
    ///
    /// # 参数
    /// - overrides: JSON 对象, 值可为数字或数字字符串; null/不可解析视为未设置
    ///
    /// # 示例
    /// ```
    /// use sheet_deviation::config::ThresholdConfig;
    /// let overrides = serde_json::json!({"x_tag": 0.08, "ng_y": null});
    /// let th = ThresholdConfig::from_overrides(overrides.as_object().unwrap());
    /// assert_eq!(th.tag_x, 0.08);
    /// assert_eq!(th.ng_y, 0.15);
    /// ```
    pub fn from_overrides(overrides: &Map<String, Value>) -> Self {
        use threshold_keys::*;

        let d = Self::default();
        Self {
            tag_x: resolve_alias(overrides, TAG_X, d.tag_x),
            tag_y: resolve_alias(overrides, TAG_Y, d.tag_y),
            tag_punch: resolve_alias(overrides, TAG_PUNCH, d.tag_punch),
            th_asym: resolve_alias(overrides, TH_ASYM, d.th_asym),
            th_diag: resolve_alias(overrides, TH_DIAG, d.th_diag),
            ng_x: resolve_alias(overrides, NG_X, d.ng_x),
            ng_y: resolve_alias(overrides, NG_Y, d.ng_y),
            deadband_x: resolve_alias(overrides, DEADBAND_X, d.deadband_x),
            deadband_y: resolve_alias(overrides, DEADBAND_Y, d.deadband_y),
            tilt_thresh_y: resolve_alias(overrides, TILT_THRESH_Y, d.tilt_thresh_y),
            bow_thresh_y: resolve_alias(overrides, BOW_THRESH_Y, d.bow_thresh_y),
        }
    }

    /// 从 JSON 值构建; 非对象时返回默认值
    pub fn from_value(value: &Value) -> Self {
        value
            .as_object()
            .map(Self::from_overrides)
            .unwrap_or_default()
    }
}

/// 按别名顺序取第一个非空且可解析为数字的值
fn resolve_alias(overrides: &Map<String, Value>, keys: &[&str], default: f64) -> f64 {
    keys.iter()
        .filter_map(|k| overrides.get(*k))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        })
        .unwrap_or(default)
}
