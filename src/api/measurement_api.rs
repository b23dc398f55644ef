// ==========================================
// 片材坐标偏差分析系统 - 测量分析 API
// ==========================================
// 职责: 供传输层调用的门面
// 1. 测量文件上传 → 片材列表摘要 (新建作业)
// 2. 片材详情 / 组装裕量 / 补偿推荐 / 补偿模拟
// 3. 印刷 / 分切文件 → 工序裕量 (挂在作业上)
// 4. 点胶文件统计 (不依赖作业)
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::AnalysisConfig;
use crate::domain::diagnosis::DiagnosisSummary;
use crate::domain::dispensing::DispensingReport;
use crate::domain::margin::{AssemblyMargin, ProcessMarginRecord};
use crate::domain::measurement::MeasurementPoint;
use crate::domain::offset::{OffsetVector, SimulationResult};
use crate::domain::row::RowRecord;
use crate::domain::sheet::{ParseDiagnostics, SheetMeta, SheetRecord};
use crate::domain::types::{FileFamily, Judgment};
use crate::engine::{
    assembly_margin, ContributionPolicy, DiagnosisBuilder, DispensingAnalyzer, JudgmentEngine,
    OffsetEngine, ProcessMarginEngine, RatioContributionPolicy, RowPivot,
};
use crate::importer::{ImportResult, MeasurementImporter};
use crate::repository::{InMemoryJobRepository, Job, JobRepository};

/// 失败样本上限
pub const FAILED_SAMPLE_CAP: usize = 10;

/// 片号缺失时的排序值
const MISSING_SHEET_NUMBER: u32 = 999_999;

// ==========================================
// 请求 / 响应类型
// ==========================================

/// 上传文件 (文件名 + 原始内容)
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCount {
    pub count: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSample {
    pub filename: String,
    pub reason: String,
}

/// 片材列表项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub sheet_key: String,
    pub meta: SheetMeta,
    pub status: Judgment,
    pub quality_score: f64,
    /// 绝对值
    pub worst_x: Option<f64>,
    pub worst_y: Option<f64>,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub parse: ParseDiagnostics,
}

impl From<&SheetRecord> for SheetSummary {
    fn from(record: &SheetRecord) -> Self {
        let d = &record.diagnosis;
        Self {
            sheet_key: record.sheet_key.clone(),
            meta: record.meta.clone(),
            status: d.sheet_status,
            quality_score: record.quality_score,
            worst_x: d.worst_x.as_ref().map(|w| w.value.abs()),
            worst_y: d.worst_y.as_ref().map(|w| w.value.abs()),
            tags: d.tag_names(),
            parse: record.parse.clone(),
        }
    }
}

/// 上传摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub job_id: Uuid,
    pub parsed: ParsedCount,
    pub failed_samples: Vec<FailedSample>,
    /// 所有保留片材的无法识别项目名合计
    pub unmatched_total: usize,
    /// 有损解码的片材数
    pub lossy_decoded: usize,
    pub sheets: Vec<SheetSummary>,
}

/// 片材详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDetail {
    pub sheet_key: String,
    pub meta: SheetMeta,
    pub rows: Vec<RowRecord>,
    pub detail: DiagnosisSummary,
    pub quality_score: f64,
    pub parse: ParseDiagnostics,
}

/// 工序裕量响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDataResponse {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub record: ProcessMarginRecord,
}

/// 点胶分析响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispensingResponse {
    pub source_file: String,
    #[serde(flatten)]
    pub report: DispensingReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub jobs: usize,
}

// ==========================================
// MeasurementApi
// ==========================================
pub struct MeasurementApi {
    repo: Arc<dyn JobRepository>,
    config: AnalysisConfig,
    importer: MeasurementImporter,
    policy: Arc<dyn ContributionPolicy>,
}

impl MeasurementApi {
    pub fn new(repo: Arc<dyn JobRepository>, config: AnalysisConfig) -> Self {
        Self {
            repo,
            config,
            importer: MeasurementImporter::new(),
            policy: Arc::new(RatioContributionPolicy::default()),
        }
    }

    /// 使用进程内作业存储 (容量取配置 max_jobs)
    pub fn in_memory(config: AnalysisConfig) -> Self {
        let repo = Arc::new(InMemoryJobRepository::new(config.max_jobs));
        Self::new(repo, config)
    }

    /// 替换组装裕量贡献分配策略
    pub fn with_policy(mut self, policy: Arc<dyn ContributionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // ==========================================
    // 片材分析
    // ==========================================

    /// 单个组装检查文件 → 片材记录
    ///
    /// # 参数
    /// - meta: 文件名元数据 (必需字段已校验)
    /// - bytes: 文件内容
    pub fn analyze_sheet(&self, meta: SheetMeta, bytes: &[u8]) -> ImportResult<SheetRecord> {
        let import = self.importer.import_bytes(FileFamily::Assembly, bytes)?;
        for err in import.warnings() {
            warn!(file = %meta.file_name, reason = err.reason_code(), "{}", err);
        }
        let mut record = self.sheet_from_points(meta, &import.report.points);
        record.parse = import.diagnostics();
        Ok(record)
    }

    /// 测点 → 片材记录 (透视 → 诊断 → 品质分)
    pub fn sheet_from_points(&self, meta: SheetMeta, points: &[MeasurementPoint]) -> SheetRecord {
        let th = self.config.thresholds;
        let rows = RowPivot::new().pivot(points);
        let diagnosis = DiagnosisBuilder::new(th).build(&rows);
        let (_, _, score) = JudgmentEngine::new(th).evaluate(&rows);

        SheetRecord {
            sheet_key: meta.sheet_key(),
            meta,
            rows,
            diagnosis,
            quality_score: score,
            parse: ParseDiagnostics::default(),
        }
    }

    /// 测量文件批量上传
    ///
    /// # 参数
    /// - files: 上传文件 (按上传顺序)
    ///
    /// # 返回
    /// - Ok(UploadSummary): 单文件失败只计入 failed / failedSamples
    /// - Err(InvalidInput): 没有文件
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn upload_measurements(&self, files: &[UploadedFile]) -> ApiResult<UploadSummary> {
        if files.is_empty() {
            return Err(ApiError::InvalidInput("没有上传文件".to_string()));
        }

        let mut job = Job::new();
        let mut failed = Vec::new();

        for file in files {
            let analyzed = SheetMeta::parse_required(&file.name)
                .and_then(|meta| self.analyze_sheet(meta, &file.bytes));
            match analyzed {
                Ok(record) => {
                    job.upsert_sheet(record);
                }
                Err(err) => {
                    warn!(file = %file.name, error = %err, "测量文件处理失败");
                    failed.push(FailedSample {
                        filename: file.name.clone(),
                        reason: err.reason_code().to_string(),
                    });
                }
            }
        }

        let mut sheets: Vec<SheetSummary> = job
            .sheets
            .values()
            .map(|s| SheetSummary::from(&s.record))
            .collect();
        sheets.sort_by(|a, b| {
            a.quality_score.total_cmp(&b.quality_score).then_with(|| {
                let sn = |s: &SheetSummary| s.meta.sheet_number.unwrap_or(MISSING_SHEET_NUMBER);
                sn(a).cmp(&sn(b))
            })
        });

        let unmatched_total = sheets.iter().map(|s| s.parse.unmatched_count).sum();
        let lossy_decoded = sheets.iter().filter(|s| s.parse.lossy_decoded).count();

        let job_id = job.id;
        self.repo.insert_job(job)?;

        info!(
            job_id = %job_id,
            sheets = sheets.len(),
            failed = failed.len(),
            unmatched = unmatched_total,
            "测量文件上传完成"
        );
        Ok(UploadSummary {
            job_id,
            parsed: ParsedCount {
                count: sheets.len(),
                failed: failed.len(),
            },
            failed_samples: failed.into_iter().take(FAILED_SAMPLE_CAP).collect(),
            unmatched_total,
            lossy_decoded,
            sheets,
        })
    }

    fn sheet_record(&self, job_id: Uuid, sheet_key: &str) -> ApiResult<SheetRecord> {
        let job = self.repo.get_job(job_id)?;
        Ok(job.sheet(sheet_key)?.clone())
    }

    /// 片材详情 (12 行 + 诊断)
    pub fn get_sheet_detail(&self, job_id: Uuid, sheet_key: &str) -> ApiResult<SheetDetail> {
        let record = self.sheet_record(job_id, sheet_key)?;
        Ok(SheetDetail {
            sheet_key: record.sheet_key,
            meta: record.meta,
            rows: record.rows.to_vec(),
            detail: record.diagnosis,
            quality_score: record.quality_score,
            parse: record.parse,
        })
    }

    /// 片材组装裕量估算
    pub fn get_sheet_margin(&self, job_id: Uuid, sheet_key: &str) -> ApiResult<AssemblyMargin> {
        let record = self.sheet_record(job_id, sheet_key)?;
        let d = &record.diagnosis;
        Ok(assembly_margin(
            d.worst_x.as_ref().map(|w| w.value),
            d.worst_y.as_ref().map(|w| w.value),
            &self.config.thresholds,
            self.policy.as_ref(),
        ))
    }

    /// 推荐补偿
    pub fn recommended_offsets(
        &self,
        job_id: Uuid,
        sheet_key: &str,
        slitter_available: bool,
    ) -> ApiResult<OffsetVector> {
        let record = self.sheet_record(job_id, sheet_key)?;
        Ok(OffsetEngine::new(self.config.thresholds).recommend(&record.rows, slitter_available))
    }

    /// 补偿前后模拟
    pub fn simulate(
        &self,
        job_id: Uuid,
        sheet_key: &str,
        offsets: &OffsetVector,
    ) -> ApiResult<SimulationResult> {
        let record = self.sheet_record(job_id, sheet_key)?;
        Ok(OffsetEngine::new(self.config.thresholds).simulate(&record.rows, offsets))
    }

    // ==========================================
    // 工序裕量
    // ==========================================

    fn import_named(
        &self,
        family: FileFamily,
        files: &[UploadedFile],
        fallback: &str,
    ) -> ApiResult<Vec<(String, Vec<MeasurementPoint>)>> {
        files
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let name = if f.name.trim().is_empty() {
                    format!("{}_{}", fallback, i + 1)
                } else {
                    f.name.clone()
                };
                let import = self.importer.import_bytes(family, &f.bytes)?;
                Ok((name, import.report.points))
            })
            .collect()
    }

    /// 印刷 / 分切文件上传 → 工序裕量
    ///
    /// # 参数
    /// - job_id: 已存在的作业
    /// - printing: 印刷文件 (合并计算)
    /// - slitter: 分切文件 (逐文件计算)
    ///
    /// # 返回
    /// 新的工序裕量 (覆盖作业上的旧记录)
    #[instrument(skip(self, printing, slitter), fields(printing = printing.len(), slitter = slitter.len()))]
    pub fn upload_process_files(
        &self,
        job_id: Uuid,
        printing: &[UploadedFile],
        slitter: &[UploadedFile],
    ) -> ApiResult<ProcessDataResponse> {
        // 先确认作业存在
        self.repo.get_job(job_id)?;

        let printing = self.import_named(FileFamily::Printing, printing, "printing")?;
        let slitter = self.import_named(FileFamily::Slitter, slitter, "slitter")?;
        let record = ProcessMarginEngine::new(self.config.margin_limits)
            .process_record(&printing, &slitter);

        let mut pending = Some(record.clone());
        self.repo.update_job(job_id, &mut |job| {
            if let Some(r) = pending.take() {
                job.process = Some(r);
            }
        })?;

        Ok(ProcessDataResponse { job_id, record })
    }

    /// 查询作业上的工序裕量 (尚未上传时为空记录)
    pub fn get_process_data(&self, job_id: Uuid) -> ApiResult<ProcessDataResponse> {
        let job = self.repo.get_job(job_id)?;
        Ok(ProcessDataResponse {
            job_id,
            record: job.process.unwrap_or_default(),
        })
    }

    // ==========================================
    // 点胶
    // ==========================================

    /// 点胶文件统计
    ///
    /// # 返回
    /// - Err(ImportFailed): 缺少 :BEGIN/:END 区块
    /// - Err(Analysis): 无法组成完整数据组
    pub fn analyze_dispensing(&self, file: &UploadedFile) -> ApiResult<DispensingResponse> {
        let import = self.importer.import_bytes(FileFamily::Dispensing, &file.bytes)?;
        let report = DispensingAnalyzer::new(self.config.margin_limits.dispense_validity_floor)
            .analyze(&import.report.points)?;
        Ok(DispensingResponse {
            source_file: file.name.clone(),
            report,
        })
    }

    pub fn health(&self) -> ApiResult<HealthStatus> {
        Ok(HealthStatus {
            ok: true,
            jobs: self.repo.len()?,
        })
    }
}
