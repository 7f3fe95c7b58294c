//! 周期流水线 - 编排层
//!
//! 驱动一个周期内的全部候选论文走完 元数据 → 摘要翻译 →（可选）
//! 全文编译，严格按榜单顺序串行处理。每完成一个工作单元就整体重写
//! 一次索引（检查点），崩溃最多丢一篇在途论文。单篇失败记录在该
//! 论文的记录上继续往下走；唯一让整次运行失败的情况是一篇候选都
//! 没拿到。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::models::{PaperRecord, PeriodKey};
use crate::services::candidates::CandidateSource;
use crate::store::CheckpointStore;
use crate::utils::logging::append_period_log;
use crate::workflow::{FullTranslator, PaperFlow};

/// 摘要 HTML 工件大于该值才算已完成，可跳过重算
const REUSE_MIN_HTML_BYTES: u64 = 500;
/// 全文 PDF 大于该值才算已完成，可跳过重算
const SKIP_MIN_PDF_BYTES: u64 = 10 * 1024;
/// 相邻两篇论文之间的礼貌性停顿
const PAPER_PAUSE: Duration = Duration::from_secs(2);

/// 周期流水线
pub struct Pipeline {
    candidates: Arc<dyn CandidateSource>,
    flow: Arc<PaperFlow>,
    full: Arc<FullTranslator>,
    store: CheckpointStore,
    logs_dir: PathBuf,
    full_timeout: Duration,
    paper_pause: Duration,
}

impl Pipeline {
    pub fn new(
        candidates: Arc<dyn CandidateSource>,
        flow: Arc<PaperFlow>,
        full: Arc<FullTranslator>,
        store: CheckpointStore,
        config: &Config,
    ) -> Self {
        Self {
            candidates,
            flow,
            full,
            store,
            logs_dir: PathBuf::from(&config.logs_dir),
            full_timeout: Duration::from_secs(config.full_timeout_secs),
            paper_pause: PAPER_PAUSE,
        }
    }

    /// 测试用：取消论文间停顿
    #[cfg(test)]
    pub(crate) fn without_pause(mut self) -> Self {
        self.paper_pause = Duration::ZERO;
        self
    }

    /// 跑完一个周期。返回 true 当且仅当本次运行零失败
    /// （以前运行留下的缓存失败不算本次的账）。
    pub async fn run(&self, period: &PeriodKey, limit: usize, do_full: bool) -> Result<bool> {
        info!("{}", "=".repeat(60));
        info!("📚 Paper Trans — {} {}", period.mode.as_str().to_uppercase(), period.key);
        info!("{}", "=".repeat(60));
        self.log(period, &format!("开始: {period}"));

        let papers_dir = self.store.ensure_dirs(period)?;
        self.log(period, &format!("📁 {}", self.store.period_dir(period).display()));

        // 1. 抓取候选。一篇都没有 → 整次运行失败，不写任何索引
        let candidates = match self.candidates.fetch(period, limit).await {
            Ok(c) => c,
            Err(e) => {
                self.log(period, &format!("❌ 未获取到论文: {e}"));
                return Ok(false);
            }
        };
        if candidates.is_empty() {
            self.log(period, "❌ 未获取到论文");
            return Ok(false);
        }
        self.log(period, &format!("✅ 获取到 {} 篇", candidates.len()));

        // 2. 按榜单顺序逐一处理摘要阶段
        let previous = self.store.load_index(period);
        let total = candidates.len();
        let mut papers_data: Vec<PaperRecord> = Vec::new();
        let mut ok = 0usize;
        let mut fail = 0usize;

        for (i, cand) in candidates.iter().enumerate() {
            let rank = i + 1;
            let arxiv_id = cand.arxiv_id.as_str();
            if arxiv_id.is_empty() {
                continue;
            }

            // 摘要工件已存在且足够大 → 幂等跳过，从旧索引恢复记录
            if file_len(&self.store.html_path(period, arxiv_id)) > REUSE_MIN_HTML_BYTES {
                self.log(period, &format!("  [{rank}/{total}] ⏭️  已存在: {arxiv_id}"));
                let record = previous
                    .as_ref()
                    .and_then(|idx| idx.find(arxiv_id))
                    .cloned()
                    .unwrap_or_else(|| PaperRecord::minimal(arxiv_id, rank));
                papers_data.push(record);
                ok += 1;
                continue;
            }

            self.log(period, &format!("  [{rank}/{total}] 🔄 翻译: {arxiv_id}"));
            match self.flow.process(arxiv_id, rank, period, &papers_dir).await {
                Ok(mut record) => {
                    record.upvotes = cand.upvotes;
                    let label = if record.title_zh.is_empty() {
                        if record.title.is_empty() { record.arxiv_id.clone() } else { record.title.clone() }
                    } else {
                        record.title_zh.clone()
                    };
                    self.log(period, &format!("  ✅ {label}"));
                    papers_data.push(record);
                    ok += 1;
                }
                Err(e) => {
                    // 单篇失败只记在这条记录上，整个周期继续
                    self.log(period, &format!("  ❌ {arxiv_id}: {e}"));
                    papers_data.push(PaperRecord::with_error(arxiv_id, rank, e.to_string()));
                    fail += 1;
                }
            }

            // 检查点：每个工作单元之后整体重写索引
            self.store.save_index(period, &papers_data)?;

            if rank < total && !self.paper_pause.is_zero() {
                tokio::time::sleep(self.paper_pause).await;
            }
        }

        let mut idx_file = self.store.save_index(period, &papers_data)?;

        // 3. 可选的全文翻译阶段
        if do_full {
            self.log(period, "🔬 开始全文翻译...");
            for i in 0..papers_data.len() {
                let arxiv_id = papers_data[i].arxiv_id.clone();
                if arxiv_id.is_empty() {
                    continue;
                }
                if file_len(&self.store.pdf_path(period, &arxiv_id)) > SKIP_MIN_PDF_BYTES {
                    self.log(period, &format!("  ⏭️  全文PDF已存在: {arxiv_id}"));
                    papers_data[i].pdf_zh = Some(format!("papers/{arxiv_id}_zh.pdf"));
                    continue;
                }
                self.log(period, &format!("  🔬 全文翻译: {arxiv_id}"));
                let r = self
                    .full
                    .translate_full(&arxiv_id, &papers_dir, false, self.full_timeout)
                    .await;
                if r.success {
                    papers_data[i].pdf_zh = Some(format!("papers/{arxiv_id}_zh.pdf"));
                    if let Some(pdf) = &r.pdf_path {
                        self.log(period, &format!("  ✅ PDF: {}", pdf.display()));
                    }
                } else {
                    let msg = r.error.unwrap_or_default();
                    papers_data[i].error = Some(msg.clone());
                    self.log(period, &format!("  ❌ {msg}"));
                }
                self.store.save_index(period, &papers_data)?;
            }
            idx_file = self.store.save_index(period, &papers_data)?;
        }

        self.log(
            period,
            &format!("📊 完成: 成功={ok} 失败={fail}  {}", idx_file.display()),
        );
        Ok(fail == 0)
    }

    /// 同时写控制台和周期运行日志
    fn log(&self, period: &PeriodKey, msg: &str) {
        info!("{}", msg);
        append_period_log(&self.logs_dir, period, msg);
    }
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
