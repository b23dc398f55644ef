// ==========================================
// 片材坐标偏差分析系统 - 领域模型层
// ==========================================
// 职责: 定义测量点、行记录、诊断与裕量等值类型
// 红线: 不含解析逻辑, 不含判定逻辑
// ==========================================

pub mod diagnosis;
pub mod dispensing;
pub mod labels;
pub mod margin;
pub mod measurement;
pub mod offset;
pub mod row;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use diagnosis::{
    DiagnosisSummary, FlagKind, Headline, HeadlineAxis, MiniCard, MiniFlag, MiniPoint, ProblemRow,
    Tag, WorstPoint,
};
pub use dispensing::{DispensingReport, DispensingSet, JudgmentCounts, PopulationStats};
pub use margin::{
    AssemblyMargin, AsymmetryPair, AxisMargin, ConsumedMargin, FabricRow, PrintingMarginRow,
    ProcessContribution, ProcessMarginRecord, SlitterMarginRow, SlitterTotalRow, StencilDetailRow,
    StencilSummaryRow, StrainChange, Topology,
};
pub use measurement::MeasurementPoint;
pub use offset::{OffsetVector, RowComparison, SheetMetrics, SimulationResult};
pub use row::{empty_rows, RowField, RowRecord, SheetRows, ROW_COUNT};
pub use sheet::{ParseDiagnostics, SheetMeta, SheetRecord, TimeKey};
pub use types::{
    Axis, Direction, FileFamily, Judgment, MarginStatus, Position, ProcessStage, SheetStatus,
};
