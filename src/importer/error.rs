// ==========================================
// 片材坐标偏差分析系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 致命: Structural / FilenameParseFailed / FileRead
// 非致命: EncodingExhausted / UnmatchedLabel (降级 + 计数)
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    // ===== 结构错误 =====
    #[error("区块标记缺失或颠倒: begin={begin:?}, end={end:?}")]
    Structural {
        begin: Option<usize>,
        end: Option<usize>,
    },

    // ===== 编码错误 (降级为有损解码) =====
    #[error("所有候选编码均解码失败, 已按 UTF-8 有损解码")]
    EncodingExhausted,

    // ===== 项目名错误 (仅诊断) =====
    #[error("项目名无法识别 (行 {line_no}): {label}")]
    UnmatchedLabel { line_no: usize, label: String },

    // ===== 文件名错误 =====
    #[error("文件名解析失败: {0}")]
    FilenameParseFailed(String),

    // ===== 文件错误 =====
    #[error("文件读取失败: {0}")]
    FileRead(String),
}

impl ImportError {
    /// 是否为非致命错误 (仅用于诊断统计)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ImportError::EncodingExhausted | ImportError::UnmatchedLabel { .. }
        )
    }

    /// 失败原因代码 (上传摘要用)
    pub fn reason_code(&self) -> &'static str {
        match self {
            ImportError::Structural { .. } => "structural_error",
            ImportError::EncodingExhausted => "encoding_exhausted",
            ImportError::UnmatchedLabel { .. } => "unmatched_label",
            ImportError::FilenameParseFailed(_) => "filename_parse_failed",
            ImportError::FileRead(_) => "file_read_failed",
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileRead(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split() {
        assert!(ImportError::EncodingExhausted.is_recoverable());
        assert!(ImportError::UnmatchedLabel {
            line_no: 3,
            label: "foo".to_string()
        }
        .is_recoverable());
        assert!(!ImportError::Structural {
            begin: None,
            end: None
        }
        .is_recoverable());
        assert_eq!(
            ImportError::FilenameParseFailed("a.csv".to_string()).reason_code(),
            "filename_parse_failed"
        );
    }
}
