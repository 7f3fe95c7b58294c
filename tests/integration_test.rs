//! 实连外部服务的集成测试
//!
//! 默认忽略，需要手动运行：cargo test -- --ignored --nocapture

use std::sync::Arc;

use paper_trans::config::Config;
use paper_trans::models::{Mode, PeriodKey};
use paper_trans::services::candidates::{CandidateSource, HfCandidateSource};
use paper_trans::services::metadata::{ArxivMetadataSource, MetadataSource};
use paper_trans::services::translator::{OpenAiTranslator, TranslationConfig};
use paper_trans::services::TranslationBackend;
use paper_trans::utils::logging;
use paper_trans::workflow::PaperFlow;

#[tokio::test]
#[ignore] // 需要外网（以及可用的代理配置）
async fn test_fetch_candidates() {
    logging::init();
    let config = Config::from_env();

    let source = HfCandidateSource::new(&config);
    let period = PeriodKey::new(Mode::Daily, "2026-02-19");

    let papers = source.fetch(&period, 3).await.expect("抓取候选失败");
    println!("找到 {} 篇", papers.len());
    for p in &papers {
        println!("  [{}] {} ({})", p.arxiv_id, p.title, p.upvotes);
    }
    assert!(papers.len() <= 3);
}

#[tokio::test]
#[ignore] // 需要外网
async fn test_fetch_metadata() {
    logging::init();
    let config = Config::from_env();

    let source = ArxivMetadataSource::new(&config);
    let meta = source.fetch("1706.03762").await.expect("抓取元数据失败");

    println!("标题: {}", meta.title);
    println!("作者: {}", meta.authors);
    assert!(meta.title.to_lowercase().contains("attention"));
    assert!(!meta.abstract_text.is_empty());
}

#[tokio::test]
#[ignore] // 需要外网 + LLM API 凭证
async fn test_single_paper_flow() {
    logging::init();
    let config = Config::from_env();

    let flow = PaperFlow::new(
        Arc::new(ArxivMetadataSource::new(&config)),
        Arc::new(OpenAiTranslator::new(&TranslationConfig::from_config(&config))),
    );

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let period = PeriodKey::new(Mode::Manual, "2026-02-19");

    let record = flow
        .process("1706.03762", 1, &period, dir.path())
        .await
        .expect("处理论文失败");

    println!("标题: {}", record.title);
    println!("译文: {}", record.title_zh);
    assert!(!record.title_zh.is_empty(), "摘要翻译应产出中文标题");
    assert!(dir.path().join("1706.03762.html").exists());
}

#[tokio::test]
#[ignore] // 需要 LLM API 凭证
async fn test_translate_only() {
    logging::init();
    let config = Config::from_env();

    let translator = OpenAiTranslator::new(&TranslationConfig::from_config(&config));
    let meta = paper_trans::services::PaperMeta {
        arxiv_id: "1706.03762".to_string(),
        title: "Attention Is All You Need".to_string(),
        abstract_text: "The dominant sequence transduction models are based on complex \
                        recurrent or convolutional neural networks."
            .to_string(),
        ..Default::default()
    };

    let t = translator.translate(&meta).await.expect("翻译失败");
    println!("标题译文: {}", t.title_zh);
    println!("速读: {}", t.summary_zh);
    assert!(!t.abstract_zh.is_empty());
}
