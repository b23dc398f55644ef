// ==========================================
// 片材坐标偏差分析系统 - 会话存储层
// ==========================================
// 职责: 保存上传作业 (片材记录 + 工序裕量)
// 红线: 存储层不含分析逻辑, 分析引擎不访问存储
// ==========================================

pub mod error;
pub mod job_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use job_repo::{InMemoryJobRepository, Job, JobRepository, StoredSheet};
