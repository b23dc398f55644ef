// ==========================================
// 片材坐标偏差分析系统 - 作业仓储
// ==========================================
// 作业 = 一次上传会话: 片材记录 (按 sheetKey) + 工序裕量
// 容量有限: 超出时淘汰最早创建的作业
// 写入通过 update_job 在存储锁内执行, 同一作业的写入串行化
// ==========================================

use crate::config::DEFAULT_MAX_JOBS;
use crate::domain::margin::ProcessMarginRecord;
use crate::domain::sheet::{SheetRecord, TimeKey};
use crate::importer::supersedes;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// 作业内保存的片材 (附带替换判定所需的上传信息)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSheet {
    pub record: SheetRecord,
    pub upload_index: usize,
    pub time_key: TimeKey,
}

/// 上传作业
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sheets: BTreeMap<String, StoredSheet>,
    /// 下一个上传序号 (跨多次上传递增)
    pub next_upload_index: usize,
    pub process: Option<ProcessMarginRecord>,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sheets: BTreeMap::new(),
            next_upload_index: 0,
            process: None,
        }
    }

    /// 按替换规则写入片材
    ///
    /// # 返回
    /// true: 新记录被保存 (新增或替换); false: 保留已有记录
    pub fn upsert_sheet(&mut self, record: SheetRecord) -> bool {
        let upload_index = self.next_upload_index;
        self.next_upload_index += 1;
        let time_key = record.meta.time_key();

        if let Some(old) = self.sheets.get(&record.sheet_key) {
            if !supersedes(time_key, upload_index, old.time_key, old.upload_index) {
                debug!(sheet_key = %record.sheet_key, "保留已有片材记录");
                return false;
            }
        }

        self.sheets.insert(
            record.sheet_key.clone(),
            StoredSheet {
                record,
                upload_index,
                time_key,
            },
        );
        true
    }

    pub fn sheet(&self, sheet_key: &str) -> RepositoryResult<&SheetRecord> {
        self.sheets
            .get(sheet_key)
            .map(|s| &s.record)
            .ok_or_else(|| RepositoryError::SheetNotFound {
                job_id: self.id,
                sheet_key: sheet_key.to_string(),
            })
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// JobRepository Trait
// ==========================================
// 实现者: InMemoryJobRepository (进程内)
pub trait JobRepository: Send + Sync {
    /// 保存新作业
    ///
    /// # 返回
    /// 因容量被淘汰的作业 ID
    fn insert_job(&self, job: Job) -> RepositoryResult<Option<Uuid>>;

    /// 查询作业 (返回副本)
    fn get_job(&self, id: Uuid) -> RepositoryResult<Job>;

    /// 在存储锁内修改作业
    fn update_job(&self, id: Uuid, apply: &mut dyn FnMut(&mut Job)) -> RepositoryResult<()>;

    /// 当前作业数
    fn len(&self) -> RepositoryResult<usize>;

    fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
struct JobStore {
    jobs: HashMap<Uuid, Job>,
    /// 创建顺序 (队首最早)
    order: VecDeque<Uuid>,
}

// ==========================================
// InMemoryJobRepository
// ==========================================
#[derive(Debug, Clone)]
pub struct InMemoryJobRepository {
    store: Arc<Mutex<JobStore>>,
    capacity: usize,
}

impl InMemoryJobRepository {
    /// # 参数
    /// - capacity: 最大作业数 (至少 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(JobStore::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, JobStore>> {
        Ok(self.store.lock()?)
    }
}

impl Default for InMemoryJobRepository {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_JOBS)
    }
}

impl JobRepository for InMemoryJobRepository {
    fn insert_job(&self, job: Job) -> RepositoryResult<Option<Uuid>> {
        let mut store = self.lock()?;
        let id = job.id;
        if store.jobs.insert(id, job).is_none() {
            store.order.push_back(id);
        }

        let mut evicted = None;
        while store.order.len() > self.capacity {
            if let Some(oldest) = store.order.pop_front() {
                store.jobs.remove(&oldest);
                info!(job_id = %oldest, "作业数超出容量, 淘汰最早作业");
                evicted = Some(oldest);
            }
        }
        Ok(evicted)
    }

    fn get_job(&self, id: Uuid) -> RepositoryResult<Job> {
        self.lock()?
            .jobs
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::JobNotFound(id))
    }

    fn update_job(&self, id: Uuid, apply: &mut dyn FnMut(&mut Job)) -> RepositoryResult<()> {
        let mut store = self.lock()?;
        let job = store
            .jobs
            .get_mut(&id)
            .ok_or(RepositoryError::JobNotFound(id))?;
        apply(job);
        Ok(())
    }

    fn len(&self) -> RepositoryResult<usize> {
        Ok(self.lock()?.jobs.len())
    }
}
