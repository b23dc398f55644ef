// ==========================================
// 片材坐标偏差分析系统 - 测量文件导入器
// ==========================================
// 流程: 字节 → 解码 → 语法解析 → 测点序列
// 点胶文件必须带 :BEGIN/:END 区块, 其余文件只剔除标记行
// ==========================================

use crate::domain::sheet::ParseDiagnostics;
use crate::domain::types::FileFamily;
use crate::importer::decoder::{BlockMode, Decoder, TextEncoding};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::label_parser::{parse_decoded, LabelGrammar, ParseReport};
use std::path::Path;
use tracing::{info, instrument, warn};

/// 单文件导入结果
#[derive(Debug, Clone, PartialEq)]
pub struct FileImport {
    pub family: FileFamily,
    pub encoding: TextEncoding,
    pub lossy: bool,
    pub report: ParseReport,
}

impl FileImport {
    /// 非致命错误列表: 有损解码 + 无法识别的项目名样本
    pub fn warnings(&self) -> Vec<ImportError> {
        let decoded = self.lossy.then_some(ImportError::EncodingExhausted);
        decoded
            .into_iter()
            .chain(self.report.unmatched.iter().map(ImportError::from))
            .collect()
    }

    /// 片材级解析诊断
    pub fn diagnostics(&self) -> ParseDiagnostics {
        ParseDiagnostics {
            unmatched_count: self.report.unmatched_total,
            unmatched_samples: self.report.unmatched_labels(),
            excluded_count: self.report.excluded,
            lossy_decoded: self.lossy,
        }
    }
}

// ==========================================
// MeasurementImporter
// ==========================================
pub struct MeasurementImporter {
    // 无状态
}

impl Default for MeasurementImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementImporter {
    pub fn new() -> Self {
        Self {}
    }

    /// 文件族对应的区块模式
    pub fn block_mode(family: FileFamily) -> BlockMode {
        match family {
            FileFamily::Dispensing => BlockMode::Required,
            _ => BlockMode::Ignore,
        }
    }

    /// 导入内存中的文件内容
    ///
    /// # 参数
    /// - family: 文件族 (决定语法与区块模式)
    /// - bytes: 原始内容
    ///
    /// # 返回
    /// - Ok(FileImport): 无法识别的项目名与有损解码只记入报告
    /// - Err(ImportError::Structural): 点胶文件缺少区块
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn import_bytes(&self, family: FileFamily, bytes: &[u8]) -> ImportResult<FileImport> {
        let decoded = Decoder::new(Self::block_mode(family)).decode(bytes)?;
        let report = parse_decoded(&decoded, LabelGrammar::for_family(family));

        if let Some(err) = decoded.degradation() {
            warn!(family = %family, reason = err.reason_code(), "{}", err);
        }
        if let Some(first) = report.unmatched.first() {
            let err = ImportError::from(first);
            warn!(
                family = %family,
                reason = err.reason_code(),
                unmatched = report.unmatched_total,
                "{}",
                err
            );
        }
        info!(
            family = %family,
            encoding = %decoded.encoding,
            points = report.points.len(),
            "测量文件解析完成"
        );

        Ok(FileImport {
            family,
            encoding: decoded.encoding,
            lossy: decoded.lossy,
            report,
        })
    }

    /// 从磁盘导入
    pub fn import_file<P: AsRef<Path>>(&self, family: FileFamily, path: P) -> ImportResult<FileImport> {
        let bytes = std::fs::read(path.as_ref())?;
        self.import_bytes(family, &bytes)
    }
}
