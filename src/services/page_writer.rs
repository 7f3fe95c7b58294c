//! 论文页面生成 - 业务能力层
//!
//! 把元数据和译文渲染成双语 HTML 工件并落盘。页面自包含（内联样式、
//! 中英摘要切换脚本），不依赖任何静态资源。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::PeriodKey;
use crate::services::metadata::PaperMeta;
use crate::services::translator::Translation;

/// 渲染并保存一篇论文的 HTML 页面，返回落盘路径
pub fn save_paper_page(
    papers_dir: &Path,
    meta: &PaperMeta,
    translation: &Translation,
    rank: usize,
    period: &PeriodKey,
    pdf_zh: Option<&str>,
) -> Result<PathBuf> {
    fs::create_dir_all(papers_dir)
        .with_context(|| format!("无法创建目录: {}", papers_dir.display()))?;
    let html = render_paper_page(meta, translation, rank, period, pdf_zh);
    let path = papers_dir.join(format!("{}.html", meta.arxiv_id));
    fs::write(&path, html).with_context(|| format!("无法写入文件: {}", path.display()))?;
    Ok(path)
}

/// 生成论文的 HTML 页面（纯函数）
pub fn render_paper_page(
    meta: &PaperMeta,
    translation: &Translation,
    rank: usize,
    period: &PeriodKey,
    pdf_zh: Option<&str>,
) -> String {
    let arxiv_id = &meta.arxiv_id;
    let title = if meta.title.is_empty() { arxiv_id.clone() } else { meta.title.clone() };
    let week_str = period.path();

    let title_zh_html = if translation.title_zh.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="title-zh">{}</div>"#, translation.title_zh)
    };

    let mut meta_parts = Vec::new();
    if !meta.authors.is_empty() {
        let mut authors: String = meta.authors.chars().take(120).collect();
        if meta.authors.chars().count() > 120 {
            authors.push_str("...");
        }
        meta_parts.push(format!("<span>👥 {authors}</span>"));
    }
    if !meta.submitted.is_empty() {
        meta_parts.push(format!("<span>📅 {}</span>", meta.submitted));
    }
    meta_parts.push(format!("<span>🆔 {arxiv_id}</span>"));

    let pdf_zh_link = pdf_zh
        .map(|p| format!(r#"<a href="/{week_str}/{p}" class="btn-full">📑 全文中文PDF</a>"#))
        .unwrap_or_default();

    let summary_card = if translation.summary_zh.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="card"><div class="section-title">💡 核心贡献 (AI 速读)</div><div class="summary-box">{}</div></div>"#,
            translation.summary_zh
        )
    };

    let keywords_card = if translation.keywords_zh.is_empty() {
        String::new()
    } else {
        let tags: String = translation
            .keywords_zh
            .iter()
            .map(|k| format!(r#"<span class="keyword">{k}</span>"#))
            .collect();
        format!(
            r#"<div class="card"><div class="section-title">🏷️ 关键词</div><div class="keywords">{tags}</div></div>"#
        )
    };

    let abstract_zh = if translation.abstract_zh.is_empty() {
        "(翻译暂不可用)"
    } else {
        &translation.abstract_zh
    };
    let abstract_en = if meta.abstract_text.is_empty() {
        "(Abstract not available)"
    } else {
        &meta.abstract_text
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>#{rank} {page_title}</title>
  <style>
    * {{ box-sizing: border-box; margin: 0; padding: 0; }}
    body {{ font-family: -apple-system, 'PingFang SC', 'Microsoft YaHei', sans-serif;
           background: #f5f7fa; color: #333; line-height: 1.7; }}
    .container {{ max-width: 900px; margin: 0 auto; padding: 20px; }}
    .breadcrumb {{ font-size: 14px; color: #888; margin-bottom: 20px; }}
    .breadcrumb a {{ color: #4a90e2; text-decoration: none; }}
    .rank-badge {{ display: inline-block; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
                  color: white; font-size: 14px; font-weight: bold; padding: 4px 14px;
                  border-radius: 20px; margin-bottom: 16px; }}
    .card {{ background: white; border-radius: 12px; box-shadow: 0 2px 12px rgba(0,0,0,0.08);
            padding: 32px; margin-bottom: 20px; }}
    .title-en {{ font-size: 22px; font-weight: 700; color: #1a1a2e; margin-bottom: 10px; }}
    .title-zh {{ font-size: 18px; color: #4a90e2; font-weight: 600; margin-bottom: 16px; }}
    .meta {{ font-size: 13px; color: #888; border-top: 1px solid #f0f0f0;
            padding-top: 12px; margin-top: 12px; }}
    .meta span {{ margin-right: 16px; }}
    .links a {{ display: inline-block; padding: 6px 16px; border-radius: 6px;
               text-decoration: none; font-size: 13px; font-weight: 500;
               margin: 6px 10px 0 0; }}
    .btn-arxiv {{ background: #b31b1b; color: white; }}
    .btn-pdf {{ background: #e74c3c; color: white; }}
    .btn-full {{ background: #059669; color: white; }}
    .section-title {{ font-size: 16px; font-weight: 700; color: #555; margin-bottom: 12px;
                     padding-left: 10px; border-left: 4px solid #4a90e2; }}
    .summary-box {{ background: #e8f4fd; border-radius: 8px; padding: 20px; font-size: 15px;
                   color: #2c3e50; border-left: 4px solid #4a90e2; }}
    .keyword {{ display: inline-block; background: #eef2ff; color: #5a67d8; font-size: 12px;
               padding: 4px 12px; border-radius: 20px; margin: 4px 4px 4px 0; }}
    .tab-btn {{ padding: 6px 16px; border: none; border-radius: 6px; cursor: pointer;
               font-size: 13px; margin-right: 8px; background: #f0f0f0; color: #666; }}
    .tab-btn.active {{ background: #4a90e2; color: white; }}
    .tab-content {{ display: none; font-size: 14px; color: #444; line-height: 1.8;
                   margin-top: 12px; }}
    .tab-content.active {{ display: block; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="breadcrumb">
      <a href="/">首页</a> &rsaquo; <a href="/{week_str}">{week_str}</a> &rsaquo; {arxiv_id}
    </div>

    <div class="rank-badge">#{rank} 热门论文</div>

    <div class="card">
      <div class="title-en">{title}</div>
      {title_zh_html}
      <div class="meta">{meta_line}</div>
      <div class="links">
        <a href="{url}" target="_blank" class="btn-arxiv">arXiv 页面</a>
        <a href="{pdf_url}" target="_blank" class="btn-pdf">📄 PDF 原文</a>
        {pdf_zh_link}
      </div>
    </div>

    {summary_card}
    {keywords_card}

    <div class="card">
      <div class="section-title">📝 摘要</div>
      <button class="tab-btn active" onclick="switchTab(event, 'zh')">中文翻译</button>
      <button class="tab-btn" onclick="switchTab(event, 'en')">English Original</button>
      <div id="tab-zh" class="tab-content active">{abstract_zh}</div>
      <div id="tab-en" class="tab-content">{abstract_en}</div>
    </div>
  </div>

  <script>
    function switchTab(ev, lang) {{
      document.querySelectorAll('.tab-content').forEach(t => t.classList.remove('active'));
      document.querySelectorAll('.tab-btn').forEach(b => b.classList.remove('active'));
      document.getElementById('tab-' + lang).classList.add('active');
      ev.target.classList.add('active');
    }}
  </script>
</body>
</html>"#,
        rank = rank,
        page_title = if translation.title_zh.is_empty() { &title } else { &translation.title_zh },
        week_str = week_str,
        arxiv_id = arxiv_id,
        title = title,
        title_zh_html = title_zh_html,
        meta_line = meta_parts.join(""),
        url = meta.url,
        pdf_url = meta.pdf_url,
        pdf_zh_link = pdf_zh_link,
        summary_card = summary_card,
        keywords_card = keywords_card,
        abstract_zh = abstract_zh,
        abstract_en = abstract_en,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    fn sample_meta() -> PaperMeta {
        PaperMeta {
            arxiv_id: "2602.10388".to_string(),
            title: "Scaling Laws for Robots".to_string(),
            abstract_text: "We study scaling.".to_string(),
            authors: "Wei Zhang, Li Na".to_string(),
            submitted: "19 Feb, 2026".to_string(),
            url: "https://arxiv.org/abs/2602.10388".to_string(),
            pdf_url: "https://arxiv.org/pdf/2602.10388".to_string(),
        }
    }

    fn sample_translation() -> Translation {
        Translation {
            title_zh: "机器人缩放定律".to_string(),
            abstract_zh: "我们研究缩放。".to_string(),
            keywords_zh: vec!["机器人".to_string(), "缩放定律".to_string()],
            summary_zh: "提出了机器人学习的缩放定律。".to_string(),
        }
    }

    #[test]
    fn renders_bilingual_page() {
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");
        let html = render_paper_page(&sample_meta(), &sample_translation(), 1, &period, None);

        assert!(html.contains("Scaling Laws for Robots"));
        assert!(html.contains("机器人缩放定律"));
        assert!(html.contains("我们研究缩放。"));
        assert!(html.contains("daily/2026-02-19"));
        assert!(html.contains("#1 热门论文"));
        assert!(!html.contains("全文中文PDF"));
        // 摘要工件复用判定的阈值是 500 字节，正常页面远大于它
        assert!(html.len() > 500);
    }

    #[test]
    fn renders_pdf_link_when_present() {
        let period = PeriodKey::new(Mode::Manual, "2026-02-19");
        let html = render_paper_page(
            &sample_meta(),
            &sample_translation(),
            0,
            &period,
            Some("papers/2602.10388_zh.pdf"),
        );
        assert!(html.contains("/manual/2026-02-19/papers/2602.10388_zh.pdf"));
        assert!(html.contains("全文中文PDF"));
    }

    #[test]
    fn missing_translation_falls_back() {
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");
        let html = render_paper_page(&sample_meta(), &Translation::default(), 2, &period, None);
        assert!(html.contains("(翻译暂不可用)"));
        assert!(!html.contains("核心贡献"));
        assert!(!html.contains("关键词"));
    }

    #[test]
    fn save_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");
        let path = save_paper_page(
            dir.path(),
            &sample_meta(),
            &sample_translation(),
            1,
            &period,
            None,
        )
        .unwrap();
        assert!(path.ends_with("2602.10388.html"));
        assert!(fs::metadata(&path).unwrap().len() > 500);
    }
}
