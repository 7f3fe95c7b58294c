//! 检查点存储
//!
//! 周期索引（`data/<mode>/<key>/index.json`）与手动任务记录
//! （`data/manual/jobs.json`）的唯一持久化入口。
//!
//! 每次保存都是完整快照：先写临时文件再原子改名，任何时刻的读者
//! 看到的要么是上一份、要么是新一份完整状态，绝不会读到写了一半
//! 的文件。损坏或缺失的文件按"不存在"处理，由调用方重建。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::models::{now_stamp, Job, PaperIndex, PaperRecord, PeriodKey};

/// 索引与任务记录存储
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    data_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    // ========== 路径 ==========

    /// 周期根目录 data/<mode>/<key>
    pub fn period_dir(&self, period: &PeriodKey) -> PathBuf {
        self.data_dir.join(period.mode.as_str()).join(&period.key)
    }

    /// 论文工件目录 data/<mode>/<key>/papers
    pub fn papers_dir(&self, period: &PeriodKey) -> PathBuf {
        self.period_dir(period).join("papers")
    }

    pub fn index_path(&self, period: &PeriodKey) -> PathBuf {
        self.period_dir(period).join("index.json")
    }

    pub fn html_path(&self, period: &PeriodKey, arxiv_id: &str) -> PathBuf {
        self.papers_dir(period).join(format!("{arxiv_id}.html"))
    }

    pub fn pdf_path(&self, period: &PeriodKey, arxiv_id: &str) -> PathBuf {
        self.papers_dir(period).join(format!("{arxiv_id}_zh.pdf"))
    }

    fn jobs_path(&self) -> PathBuf {
        self.data_dir.join("manual").join("jobs.json")
    }

    /// 创建周期目录结构，返回论文工件目录
    pub fn ensure_dirs(&self, period: &PeriodKey) -> Result<PathBuf, StoreError> {
        let papers = self.papers_dir(period);
        fs::create_dir_all(&papers).map_err(|source| StoreError::Write {
            path: papers.display().to_string(),
            source,
        })?;
        Ok(papers)
    }

    // ========== 周期索引 ==========

    /// 读取周期索引，缺失或损坏时返回 None
    pub fn load_index(&self, period: &PeriodKey) -> Option<PaperIndex> {
        let path = self.index_path(period);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(idx) => Some(idx),
            Err(e) => {
                warn!("⚠️ 索引文件损坏，忽略 ({}): {}", path.display(), e);
                None
            }
        }
    }

    /// 全量重写周期索引（每个工作单元之后调用一次）
    pub fn save_index(
        &self,
        period: &PeriodKey,
        papers: &[PaperRecord],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.period_dir(period);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        let path = self.index_path(period);
        let index = PaperIndex::new(period, papers.to_vec());
        write_snapshot(&path, &index)?;
        Ok(path)
    }

    /// 按 arxiv_id 插入或替换一条记录。
    /// 已存在则原位替换，否则插到最前（手动提交最新的排最上面）。
    pub fn upsert_paper(
        &self,
        period: &PeriodKey,
        record: PaperRecord,
    ) -> Result<(), StoreError> {
        let mut papers = self
            .load_index(period)
            .map(|idx| idx.papers)
            .unwrap_or_default();
        match papers.iter_mut().find(|p| p.arxiv_id == record.arxiv_id) {
            Some(slot) => *slot = record,
            None => papers.insert(0, record),
        }
        self.save_index(period, &papers)?;
        Ok(())
    }

    // ========== 任务记录 ==========

    /// 读取全部任务记录，缺失或损坏时返回空表
    pub fn load_jobs(&self) -> HashMap<String, Job> {
        let path = self.jobs_path();
        let Ok(raw) = fs::read_to_string(&path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("⚠️ 任务文件损坏，忽略 ({}): {}", path.display(), e);
                HashMap::new()
            }
        }
    }

    /// 全量重写任务记录
    pub fn save_jobs(&self, jobs: &HashMap<String, Job>) -> Result<(), StoreError> {
        let path = self.jobs_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: dir.display().to_string(),
                source,
            })?;
        }
        write_snapshot(&path, jobs)
    }

    /// 更新单个任务：读出全表 → 应用变更 → 刷新 updated_at → 整体重写。
    /// 任务不存在时先创建一条排队记录再应用变更。
    pub fn update_job<F>(&self, arxiv_id: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.load_jobs();
        let job = jobs
            .entry(arxiv_id.to_string())
            .or_insert_with(|| Job::queued(arxiv_id));
        apply(job);
        job.updated_at = now_stamp();
        self.save_jobs(&jobs)
    }
}

/// 完整快照写入：临时文件 + 原子改名
fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| StoreError::Write {
        path: tmp.display().to_string(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Write {
        path: path.display().to_string(),
        source,
    })
}
