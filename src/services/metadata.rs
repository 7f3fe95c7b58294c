//! 论文元数据抓取 - 业务能力层
//!
//! 稳定的四字段契约（id / 标题 / 摘要 / 作者，附带提交日期），实现
//! 方式是解析 arXiv 摘要页。上游页面结构脆弱，解析细节全部隔离在
//! 本模块内；网络层按固定顺序尝试传输配置（代理 → 直连），不递归。

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::MetadataError;
use crate::services::candidates::build_transports;

/// 一篇论文的元数据
#[derive(Debug, Clone, Default)]
pub struct PaperMeta {
    pub arxiv_id: String,
    pub title: String,
    pub abstract_text: String,
    pub authors: String,
    pub submitted: String,
    pub url: String,
    pub pdf_url: String,
}

/// 元数据来源接口
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, arxiv_id: &str) -> Result<PaperMeta, MetadataError>;
}

/// arXiv 摘要页抓取实现
pub struct ArxivMetadataSource {
    transports: Vec<Client>,
}

impl ArxivMetadataSource {
    pub fn new(config: &Config) -> Self {
        Self {
            transports: build_transports(&config.proxy_url),
        }
    }
}

#[async_trait]
impl MetadataSource for ArxivMetadataSource {
    async fn fetch(&self, arxiv_id: &str) -> Result<PaperMeta, MetadataError> {
        let url = format!("https://export.arxiv.org/abs/{arxiv_id}");
        let mut last_err = None;
        for client in &self.transports {
            match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
                Ok(resp) => match resp.text().await {
                    Ok(html) => {
                        debug!("元数据页面获取成功: {} ({} 字节)", arxiv_id, html.len());
                        return parse_abs_page(arxiv_id, &html);
                    }
                    Err(e) => last_err = Some(e),
                },
                Err(e) => last_err = Some(e),
            }
        }
        Err(MetadataError::Request {
            url,
            source: last_err.expect("transports 不能为空"),
        })
    }
}

/// 解析 arXiv 摘要页（纯函数，便于测试）
pub(crate) fn parse_abs_page(arxiv_id: &str, html: &str) -> Result<PaperMeta, MetadataError> {
    let tag_re = Regex::new(r"<[^>]+>")?;
    let ws_re = Regex::new(r"\s+")?;
    let strip = |raw: &str| -> String {
        let no_tags = tag_re.replace_all(raw, "");
        ws_re.replace_all(no_tags.trim(), " ").to_string()
    };

    let title_re = Regex::new(
        r#"(?s)<h1 class="title mathjax"[^>]*>(?:<span[^>]*>Title:</span>\s*)?(.*?)</h1>"#,
    )?;
    let title = title_re
        .captures(html)
        .map(|c| strip(&c[1]))
        .unwrap_or_default();

    let abstract_re = Regex::new(
        r#"(?s)<blockquote class="abstract mathjax"[^>]*>(?:<span[^>]*>Abstract:</span>\s*)?(.*?)</blockquote>"#,
    )?;
    let abstract_text = abstract_re
        .captures(html)
        .map(|c| strip(&c[1]))
        .unwrap_or_default();

    let authors_re = Regex::new(r#"(?s)<div class="authors"[^>]*>(.*?)</div>"#)?;
    let authors = authors_re
        .captures(html)
        .map(|c| strip(&c[1]).trim_matches(|ch| ch == ',' || ch == ' ').to_string())
        .unwrap_or_default();

    let submitted_re = Regex::new(r"Submitted on ([\w\s,]+?)(?:\s*\(|\s*\[)")?;
    let submitted = submitted_re
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    Ok(PaperMeta {
        arxiv_id: arxiv_id.to_string(),
        title,
        abstract_text,
        authors,
        submitted,
        url: format!("https://arxiv.org/abs/{arxiv_id}"),
        pdf_url: format!("https://arxiv.org/pdf/{arxiv_id}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABS_PAGE: &str = r##"
      <h1 class="title mathjax"><span class="descriptor">Title:</span>
        Attention Is <em>Not</em> All You Need
      </h1>
      <div class="authors"><a href="#">Wei Zhang</a>, <a href="#">Li Na</a>, </div>
      <blockquote class="abstract mathjax">
        <span class="descriptor">Abstract:</span>
        We revisit the   transformer
        architecture and find surprising results.
      </blockquote>
      <div class="dateline">[Submitted on 19 Feb, 2026 (v1)]</div>
    "##;

    #[test]
    fn parses_all_fields() {
        let meta = parse_abs_page("2602.10388", ABS_PAGE).unwrap();
        assert_eq!(meta.arxiv_id, "2602.10388");
        assert_eq!(meta.title, "Attention Is Not All You Need");
        assert_eq!(
            meta.abstract_text,
            "We revisit the transformer architecture and find surprising results."
        );
        assert_eq!(meta.authors, "Wei Zhang, Li Na");
        assert_eq!(meta.submitted, "19 Feb, 2026");
        assert_eq!(meta.url, "https://arxiv.org/abs/2602.10388");
        assert_eq!(meta.pdf_url, "https://arxiv.org/pdf/2602.10388");
    }

    #[test]
    fn missing_sections_yield_empty_fields() {
        let meta = parse_abs_page("2602.10388", "<html><body>nothing here</body></html>").unwrap();
        assert!(meta.title.is_empty());
        assert!(meta.abstract_text.is_empty());
        assert!(meta.authors.is_empty());
        assert!(meta.submitted.is_empty());
        // id 派生字段始终存在
        assert_eq!(meta.url, "https://arxiv.org/abs/2602.10388");
    }
}
