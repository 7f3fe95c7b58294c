//! 单篇论文处理流程 - 流程层
//!
//! 定义"一篇论文"的完整摘要阶段：获取元数据 → 翻译 → 渲染 HTML
//! 工件 → 组装索引记录。周期流水线和手动提交队列都走这同一套逻辑，
//! 区别只在调用方式（整段执行 / 分阶段执行以汇报进度）。

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::error::MetadataError;
use crate::models::{PaperRecord, PeriodKey};
use crate::services::metadata::{MetadataSource, PaperMeta};
use crate::services::page_writer::save_paper_page;
use crate::services::translator::TranslationBackend;

/// 单篇论文流程
///
/// - 只依赖能力接口（元数据来源、翻译后端），不持有网络资源
/// - 不出现 Vec、不关心周期内的顺序与统计
pub struct PaperFlow {
    metadata: Arc<dyn MetadataSource>,
    translator: Arc<dyn TranslationBackend>,
}

impl PaperFlow {
    pub fn new(metadata: Arc<dyn MetadataSource>, translator: Arc<dyn TranslationBackend>) -> Self {
        Self { metadata, translator }
    }

    /// 第一阶段：获取元数据
    pub async fn fetch_metadata(&self, arxiv_id: &str) -> Result<PaperMeta, MetadataError> {
        info!("  🔍 获取元数据...");
        let meta = self.metadata.fetch(arxiv_id).await?;
        if !meta.title.is_empty() {
            let preview: String = meta.title.chars().take(60).collect();
            info!("  📌 标题: {}...", preview);
        }
        Ok(meta)
    }

    /// 第二阶段：翻译摘要并渲染 HTML 工件，返回索引记录
    pub async fn translate_and_render(
        &self,
        meta: &PaperMeta,
        rank: usize,
        period: &PeriodKey,
        papers_dir: &Path,
    ) -> Result<PaperRecord> {
        info!("  🌐 翻译中...");
        let translation = self.translator.translate(meta).await?;
        if !translation.title_zh.is_empty() {
            let preview: String = translation.title_zh.chars().take(50).collect();
            info!("  ✅ 译文: {}...", preview);
        }

        let html_path = save_paper_page(papers_dir, meta, &translation, rank, period, None)?;
        info!("  💾 已保存: {}", html_path.display());

        Ok(PaperRecord {
            arxiv_id: meta.arxiv_id.clone(),
            rank,
            title: meta.title.clone(),
            title_zh: translation.title_zh,
            summary_zh: translation.summary_zh,
            keywords_zh: translation.keywords_zh,
            authors: meta.authors.clone(),
            submitted: meta.submitted.clone(),
            url: meta.url.clone(),
            upvotes: 0,
            html_file: format!("papers/{}.html", meta.arxiv_id),
            pdf_zh: None,
            error: None,
        })
    }

    /// 完整摘要阶段：元数据 + 翻译 + 工件，一步到位（周期流水线使用）
    pub async fn process(
        &self,
        arxiv_id: &str,
        rank: usize,
        period: &PeriodKey,
        papers_dir: &Path,
    ) -> Result<PaperRecord> {
        let meta = self.fetch_metadata(arxiv_id).await?;
        self.translate_and_render(&meta, rank, period, papers_dir).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 流程与编排层测试共用的假后端

    use super::*;
    use crate::error::TranslateError;
    use crate::services::translator::Translation;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 可指定失败 id 的假元数据来源
    pub struct FakeMetadata {
        pub fail_ids: HashSet<String>,
        pub calls: AtomicUsize,
    }

    impl FakeMetadata {
        pub fn ok() -> Self {
            Self {
                fail_ids: HashSet::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(ids: &[&str]) -> Self {
            Self {
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        async fn fetch(&self, arxiv_id: &str) -> Result<PaperMeta, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ids.contains(arxiv_id) {
                // 测试里无法凭空构造 reqwest::Error，借正则错误承载失败消息
                return Err(MetadataError::Pattern {
                    source: regex::Error::Syntax(format!("模拟元数据失败: {arxiv_id}")),
                });
            }
            Ok(PaperMeta {
                arxiv_id: arxiv_id.to_string(),
                title: format!("Title of {arxiv_id}"),
                abstract_text: "An abstract.".to_string(),
                authors: "Wei Zhang".to_string(),
                submitted: "19 Feb, 2026".to_string(),
                url: format!("https://arxiv.org/abs/{arxiv_id}"),
                pdf_url: format!("https://arxiv.org/pdf/{arxiv_id}"),
            })
        }
    }

    /// 计数的假翻译后端
    pub struct FakeTranslator {
        pub calls: AtomicUsize,
    }

    impl FakeTranslator {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationBackend for FakeTranslator {
        async fn translate(&self, meta: &PaperMeta) -> Result<Translation, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Translation {
                title_zh: format!("{} 的译文", meta.arxiv_id),
                abstract_zh: "摘要译文。".to_string(),
                keywords_zh: vec!["关键词".to_string()],
                summary_zh: "核心贡献。".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{FakeMetadata, FakeTranslator};
    use super::*;
    use crate::models::Mode;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn process_produces_record_and_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let meta = Arc::new(FakeMetadata::ok());
        let translator = Arc::new(FakeTranslator::new());
        let flow = PaperFlow::new(meta.clone(), translator.clone());
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");

        let record = flow
            .process("2602.10388", 1, &period, dir.path())
            .await
            .unwrap();

        assert_eq!(record.arxiv_id, "2602.10388");
        assert_eq!(record.rank, 1);
        assert_eq!(record.title, "Title of 2602.10388");
        assert_eq!(record.title_zh, "2602.10388 的译文");
        assert_eq!(record.html_file, "papers/2602.10388.html");
        assert!(record.error.is_none());

        let artifact = dir.path().join("2602.10388.html");
        assert!(std::fs::metadata(&artifact).unwrap().len() > 500);
        assert_eq!(meta.calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn metadata_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let flow = PaperFlow::new(
            Arc::new(FakeMetadata::failing(&["2602.00002"])),
            Arc::new(FakeTranslator::new()),
        );
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");

        let err = flow
            .process("2602.00002", 2, &period, dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("模拟元数据失败"));
        // 失败的论文不应留下工件
        assert!(!dir.path().join("2602.00002.html").exists());
    }
}
