// ==========================================
// 片材坐标偏差分析系统 - 导入层
// ==========================================
// 职责: 设备导出文件 → 测点序列
// 支持: UTF-16 / UTF-8 / EUC-KR, 制表符/分号/逗号分隔
// ==========================================

// 模块声明
pub mod decoder;
pub mod error;
pub mod filename;
pub mod label_parser;
pub mod measurement_importer;
pub mod tabular;
pub mod tokenizer;

// 重导出核心类型
pub use decoder::{decode_bytes, detect_delimiter, BlockMode, DecodedText, Decoder, TextEncoding};
pub use error::{ImportError, ImportResult};
pub use filename::{supersedes, time_key_of_memo};
pub use label_parser::{
    parse_decoded, LabelGrammar, LabelOutcome, LineValues, ParseReport, UnmatchedLine,
    UNMATCHED_CAP,
};
pub use measurement_importer::{FileImport, MeasurementImporter};
pub use tabular::{process_rows, ProcessRow};
pub use tokenizer::{tokenize, TokenizedLine};
