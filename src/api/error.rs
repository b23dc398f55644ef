// ==========================================
// 片材坐标偏差分析系统 - API 层错误类型
// ==========================================
// 职责: 汇总各层错误, 映射为传输层状态码
// 404: 作业/片材不存在; 400: 输入无效; 422: 数据无法分析
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    // ===== 输入错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ===== 领域错误 =====
    #[error("文件导入失败: {0}")]
    ImportFailed(#[from] ImportError),

    #[error("分析失败: {0}")]
    Analysis(#[from] EngineError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 传输层状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::ImportFailed(ImportError::FileRead(_))
            | ApiError::ImportFailed(ImportError::FilenameParseFailed(_)) => 400,
            ApiError::ImportFailed(_) | ApiError::Analysis(_) => 422,
            ApiError::InternalError(_) => 500,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::JobNotFound(id) => {
                ApiError::NotFound(format!("作业 {} 不存在, 请先上传测量文件", id))
            }
            RepositoryError::SheetNotFound { sheet_key, .. } => {
                ApiError::NotFound(format!("片材 {} 不存在", sheet_key))
            }
            RepositoryError::LockPoisoned(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let not_found: ApiError = RepositoryError::JobNotFound(Uuid::nil()).into();
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(ApiError::InvalidInput("no files".into()).status_code(), 400);

        let insufficient: ApiError = EngineError::InsufficientData("0 sets".into()).into();
        assert_eq!(insufficient.status_code(), 422);

        let structural: ApiError = ImportError::Structural {
            begin: None,
            end: None,
        }
        .into();
        assert_eq!(structural.status_code(), 422);
        assert_eq!(
            ApiError::from(ImportError::FileRead("x".into())).status_code(),
            400
        );
        assert_eq!(
            ApiError::from(RepositoryError::LockPoisoned("p".into())).status_code(),
            500
        );
    }
}
