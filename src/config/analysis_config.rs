// ==========================================
// 片材坐标偏差分析系统 - 分析配置加载
// ==========================================
// 存储: JSON 文件 (thresholds / margin_limits / max_jobs)
// thresholds 段走别名解析, 其余段走 serde 默认填充
// ==========================================

use crate::config::margin_limits::MarginLimits;
use crate::config::threshold_config::ThresholdConfig;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// 默认保留的作业数
pub const DEFAULT_MAX_JOBS: usize = 5;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("配置文件格式错误: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// 分析配置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub thresholds: ThresholdConfig,
    pub margin_limits: MarginLimits,
    pub max_jobs: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            margin_limits: MarginLimits::default(),
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl AnalysisConfig {
    /// 从 JSON 值构建
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let thresholds = value
            .get("thresholds")
            .map(ThresholdConfig::from_value)
            .unwrap_or_default();

        let margin_limits = match value.get("margin_limits") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
            _ => MarginLimits::default(),
        };

        let max_jobs = value
            .get("max_jobs")
            .and_then(Value::as_u64)
            .map(|n| n.max(1) as usize)
            .unwrap_or(DEFAULT_MAX_JOBS);

        Ok(Self {
            thresholds,
            margin_limits,
            max_jobs,
        })
    }

    /// 从 JSON 文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "读取分析配置");
        let raw = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let config = Self::from_value(&value)?;
        info!(
            ng_x = config.thresholds.ng_x,
            ng_y = config.thresholds.ng_y,
            max_jobs = config.max_jobs,
            "分析配置已加载"
        );
        Ok(config)
    }
}
