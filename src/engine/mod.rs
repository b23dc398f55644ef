// ==========================================
// 片材坐标偏差分析系统 - 引擎层
// ==========================================
// 职责: 测点 → 行记录 → 判定 / 诊断 / 补偿 / 工序裕量 / 点胶统计
// 红线: 引擎为纯计算, 不访问会话存储, 不读文件
// ==========================================

pub mod diagnosis;
pub mod dispensing;
pub mod error;
pub mod interpolator;
pub mod judgment;
pub mod margin;
pub mod offset;
pub mod pivot;

// 重导出核心引擎
pub use diagnosis::DiagnosisBuilder;
pub use dispensing::{population_stats, DispensingAnalyzer};
pub use error::{EngineError, EngineResult};
pub use interpolator::{interpolate_row_points, interpolate_sparse, select_topology};
pub use judgment::{JudgmentEngine, SheetIndicators};
pub use margin::{
    assembly_margin, ContributionPolicy, ProcessMarginEngine, RatioContributionPolicy,
};
pub use offset::{recommend_offsets, simulate, OffsetEngine};
pub use pivot::{pivot_to_rows, RowPivot};
