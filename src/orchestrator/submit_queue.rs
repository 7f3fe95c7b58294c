//! 手动提交队列 - 编排层
//!
//! 周期调度之外的论文通过这里提交。提交是并发安全的；执行严格
//! 串行——单个后台工作任务一次取一个 id，跑完整的单篇流程，并在
//! 每个阶段边界更新任务状态，外部随时可见实时进度。工作任务自身
//! 永不崩溃：任何阶段抛错都映射成该任务的 error 终态，然后继续
//! 排空队列。
//!
//! 待处理序列、工作忙标志、任务表写入由同一把互斥锁保护；锁只在
//! 读写这些状态的临界区内持有，绝不跨越阻塞的沙箱调用。

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tracing::{error, info};

use crate::error::StoreError;
use crate::models::{Job, JobStatus, PeriodKey};
use crate::store::CheckpointStore;
use crate::workflow::{FullTranslator, PaperFlow};

/// 待处理序列 + 工作忙标志，由单锁保护
#[derive(Default)]
struct QueueState {
    pending: VecDeque<String>,
    running: bool,
}

/// 手动提交队列
pub struct SubmitQueue {
    state: Mutex<QueueState>,
    store: CheckpointStore,
    flow: Arc<PaperFlow>,
    full: Arc<FullTranslator>,
    full_timeout: Duration,
    id_re: Regex,
}

impl SubmitQueue {
    pub fn new(
        store: CheckpointStore,
        flow: Arc<PaperFlow>,
        full: Arc<FullTranslator>,
        full_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            store,
            flow,
            full,
            full_timeout,
            id_re: Regex::new(r"^\d{4}\.\d{4,5}$").expect("硬编码正则必然合法"),
        })
    }

    /// 规范化用户输入的 arxiv id：去空白、去版本号后缀
    pub fn normalize_id(raw: &str) -> String {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        compact.split('v').next().unwrap_or("").to_string()
    }

    /// 提交一个 id。返回 (是否接受, 给提交者的消息)。
    ///
    /// 拒绝条件：格式非法；已有同 id 的未终结任务；已有 done 任务。
    /// 仅 error / done_no_pdf（或不存在）允许重新提交。
    pub fn submit(self: &Arc<Self>, raw: &str) -> (bool, String) {
        let arxiv_id = Self::normalize_id(raw);
        if !self.id_re.is_match(&arxiv_id) {
            return (false, "无效的 arXiv ID，格式示例：2602.12345".to_string());
        }

        {
            let mut state = self.lock_state();
            let mut jobs = self.store.load_jobs();
            if let Some(existing) = jobs.get(&arxiv_id) {
                if !existing.status.is_resubmittable() {
                    return (false, "已存在或正在处理中".to_string());
                }
            }
            jobs.insert(arxiv_id.clone(), Job::queued(&arxiv_id));
            if let Err(e) = self.store.save_jobs(&jobs) {
                return (false, format!("无法保存任务记录: {e}"));
            }
            state.pending.push_back(arxiv_id.clone());
        }

        self.drain();
        (true, "已加入队列".to_string())
    }

    /// 当前全部任务记录的快照（状态接口使用）
    pub fn jobs(&self) -> HashMap<String, Job> {
        let _guard = self.lock_state();
        self.store.load_jobs()
    }

    /// 排空待处理序列：没有工作任务在跑且队列非空时，取队首启动。
    /// 每个任务结束时会再次调用，直到队列排空。
    fn drain(self: &Arc<Self>) {
        let next = {
            let mut state = self.lock_state();
            if state.running {
                return;
            }
            let Some(next) = state.pending.pop_front() else {
                return;
            };
            state.running = true;
            next
        };

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            queue.run_job(next).await;
        });
    }

    /// 后台执行一个任务：抓元数据 → 摘要翻译 → 全文 PDF。
    /// 任何阶段抛错都被捕获并映射为 error 终态，工作循环自身不退出。
    async fn run_job(self: Arc<Self>, arxiv_id: String) {
        info!("📥 手动任务开始: {}", arxiv_id);
        if let Err(e) = self.process_stages(&arxiv_id).await {
            error!("❌ 手动任务失败 {}: {}", arxiv_id, e);
            let _ = self.update_job(&arxiv_id, |j| {
                j.status = JobStatus::Error;
                j.msg = e.to_string();
            });
        }

        {
            let mut state = self.lock_state();
            state.running = false;
        }
        self.drain();
    }

    /// 单个任务的阶段序列，每个阶段边界更新一次状态
    async fn process_stages(&self, arxiv_id: &str) -> Result<()> {
        let period = PeriodKey::manual_today();
        let papers_dir = self.store.ensure_dirs(&period)?;

        self.update_job(arxiv_id, |j| {
            j.status = JobStatus::Fetching;
            j.msg = "正在从 arXiv 获取元数据...".to_string();
        })?;
        let meta = self.flow.fetch_metadata(arxiv_id).await?;

        self.update_job(arxiv_id, |j| {
            j.title = Some(meta.title.clone());
            j.status = JobStatus::Abstract;
            j.msg = "正在翻译摘要...".to_string();
        })?;
        let record = self
            .flow
            .translate_and_render(&meta, 0, &period, &papers_dir)
            .await?;

        // 摘要阶段的结果先落索引，全文失败也不丢
        {
            let _guard = self.lock_state();
            self.store.upsert_paper(&period, record.clone())?;
        }
        self.update_job(arxiv_id, |j| {
            if !record.title_zh.is_empty() {
                j.title_zh = Some(record.title_zh.clone());
            }
            j.status = JobStatus::FullPdf;
            j.msg = "正在翻译全文 PDF（耗时较长）...".to_string();
        })?;

        let r = self
            .full
            .translate_full(arxiv_id, &papers_dir, false, self.full_timeout)
            .await;
        if r.success {
            let rel = format!("papers/{arxiv_id}_zh.pdf");
            let mut with_pdf = record;
            with_pdf.pdf_zh = Some(rel.clone());
            {
                let _guard = self.lock_state();
                self.store.upsert_paper(&period, with_pdf)?;
            }
            self.update_job(arxiv_id, |j| {
                j.status = JobStatus::Done;
                j.msg = "完成".to_string();
                j.pdf_zh = Some(rel.clone());
            })?;
            info!("✅ 手动任务完成: {}", arxiv_id);
        } else {
            let reason = r.error.unwrap_or_default();
            self.update_job(arxiv_id, |j| {
                j.status = JobStatus::DoneNoPdf;
                j.msg = format!("摘要完成，全文PDF失败: {reason}");
            })?;
            info!("⚠️ 手动任务完成（无 PDF）: {}", arxiv_id);
        }
        Ok(())
    }

    /// 任务表写入统一走队列锁，与提交端的去重检查互斥
    fn update_job<F>(&self, arxiv_id: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let _guard = self.lock_state();
        self.store.update_job(arxiv_id, apply)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        // 工作任务从不在持锁状态下 panic，锁不会中毒
        self.state.lock().expect("提交队列锁中毒")
    }
}
