// ==========================================
// 片材坐标偏差分析系统 - 配置层
// ==========================================
// 职责: 判定阈值 / 工序裕量限值 / 会话容量
// 存储: JSON 文件或调用方传入的覆写对象
// ==========================================

pub mod analysis_config;
pub mod margin_limits;
pub mod threshold_config;

// 重导出核心配置
pub use analysis_config::{AnalysisConfig, ConfigError, DEFAULT_MAX_JOBS};
pub use margin_limits::MarginLimits;
pub use threshold_config::{threshold_keys, ThresholdConfig};
