// ==========================================
// 片材坐标偏差分析系统 - API 层
// ==========================================
// 职责: 提供分析门面, 供传输层 (HTTP / CLI) 调用
// ==========================================

pub mod error;
pub mod measurement_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use measurement_api::{
    DispensingResponse, FailedSample, HealthStatus, MeasurementApi, ParsedCount,
    ProcessDataResponse, SheetDetail, SheetSummary, UploadSummary, UploadedFile,
    FAILED_SAMPLE_CAP,
};
