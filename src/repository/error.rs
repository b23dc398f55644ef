// ==========================================
// 片材坐标偏差分析系统 - 会话存储错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;
use uuid::Uuid;

/// 会话存储错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("作业不存在: {0}")]
    JobNotFound(Uuid),

    #[error("片材不存在: job={job_id}, sheet_key={sheet_key}")]
    SheetNotFound { job_id: Uuid, sheet_key: String },

    #[error("存储锁获取失败: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockPoisoned(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
