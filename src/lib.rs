// ==========================================
// 片材坐标偏差分析系统 - 核心库
// ==========================================
// 输入: 组装检查 / 印刷 / 分切 / 点胶 设备导出文件
// 输出: 行级判定, 片材品质分, 诊断摘要, 工序裕量, 补偿建议
// 系统定位: 决策支持 (补偿值由工程师确认后下发设备)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "ko");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值类型
pub mod domain;

// 配置层 - 阈值与限值
pub mod config;

// 导入层 - 设备导出文件
pub mod importer;

// 引擎层 - 分析计算
pub mod engine;

// 会话存储层 - 上传作业
pub mod repository;

// API 层 - 分析门面
pub mod api;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Axis, Direction, FileFamily, Judgment, MarginStatus, Position, SheetStatus};

// 领域实体
pub use domain::{
    DiagnosisSummary, DispensingReport, MeasurementPoint, OffsetVector, ProcessMarginRecord,
    RowRecord, SheetMeta, SheetRecord, SimulationResult,
};

// 配置
pub use config::{AnalysisConfig, MarginLimits, ThresholdConfig};

// 引擎
pub use engine::{
    DiagnosisBuilder, DispensingAnalyzer, JudgmentEngine, OffsetEngine, ProcessMarginEngine,
    RowPivot,
};

// 导入
pub use importer::MeasurementImporter;

// API
pub use api::{ApiError, MeasurementApi, UploadedFile};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "片材坐标偏差分析系统";
