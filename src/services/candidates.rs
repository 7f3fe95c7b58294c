//! 候选论文抓取 - 业务能力层
//!
//! 从 Hugging Face Papers 的 daily / weekly / monthly 榜单页面解析
//! 候选 arxiv id（按榜单顺序去重）、标题和热度。页面结构属于第三方，
//! 解析逻辑全部收在本模块，上游变更只影响这里。

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{Mode, PeriodKey};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 榜单上的一条候选论文
#[derive(Debug, Clone)]
pub struct Candidate {
    pub arxiv_id: String,
    pub title: String,
    pub upvotes: u32,
    pub url: String,
}

impl Candidate {
    fn bare(arxiv_id: &str) -> Self {
        Self {
            arxiv_id: arxiv_id.to_string(),
            title: String::new(),
            upvotes: 0,
            url: format!("https://arxiv.org/abs/{arxiv_id}"),
        }
    }
}

/// 候选来源接口：给定周期返回按榜单排序的候选列表
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch(&self, period: &PeriodKey, limit: usize) -> Result<Vec<Candidate>, FetchError>;
}

/// Hugging Face Papers 榜单抓取
pub struct HfCandidateSource {
    /// 按顺序尝试的传输配置（代理优先，失败后直连），不做递归重试
    transports: Vec<Client>,
}

impl HfCandidateSource {
    pub fn new(config: &Config) -> Self {
        Self {
            transports: build_transports(&config.proxy_url),
        }
    }

    fn listing_url(period: &PeriodKey) -> String {
        let segment = match period.mode {
            Mode::Daily | Mode::Manual => "date",
            Mode::Weekly => "week",
            Mode::Monthly => "month",
        };
        format!("https://huggingface.co/papers/{segment}/{}", period.key)
    }
}

#[async_trait]
impl CandidateSource for HfCandidateSource {
    async fn fetch(&self, period: &PeriodKey, limit: usize) -> Result<Vec<Candidate>, FetchError> {
        let url = Self::listing_url(period);
        info!("[fetch] {} {} -> {}", period.mode.as_str().to_uppercase(), period.key, url);

        let mut last_err = None;
        for (i, client) in self.transports.iter().enumerate() {
            match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
                Ok(resp) => match resp.text().await {
                    Ok(html) => {
                        let papers = parse_listing(&html, limit);
                        info!("[fetch] 找到 {} 篇", papers.len());
                        return Ok(papers);
                    }
                    Err(e) => last_err = Some(e),
                },
                Err(e) => {
                    if i + 1 < self.transports.len() {
                        warn!("[fetch] 代理失败，尝试直连...");
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(FetchError::Request {
            url,
            // transports 至少含直连一项，走到这里必然有错误
            source: last_err.expect("transports 不能为空"),
        })
    }
}

/// 构建传输配置列表：配了代理则 [代理, 直连]，否则只有直连
pub(crate) fn build_transports(proxy_url: &str) -> Vec<Client> {
    let mut transports = Vec::new();
    if !proxy_url.is_empty() {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => match client_builder().proxy(proxy).build() {
                Ok(c) => transports.push(c),
                Err(e) => warn!("⚠️ 代理客户端构建失败，跳过: {}", e),
            },
            Err(e) => warn!("⚠️ 代理地址无效 ({}): {}", proxy_url, e),
        }
    }
    match client_builder().build() {
        Ok(c) => transports.push(c),
        Err(e) => warn!("⚠️ 直连客户端构建失败: {}", e),
    }
    transports
}

fn client_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
}

/// 从榜单 HTML 中解析论文列表（纯函数，便于测试）
pub(crate) fn parse_listing(html: &str, limit: usize) -> Vec<Candidate> {
    // 所有 arxiv id，保序去重
    let id_re = Regex::new(r#"href="/papers/(\d{4}\.\d{4,})""#).expect("正则字面量");
    let mut seen = HashSet::new();
    let mut papers: Vec<Candidate> = Vec::new();
    for cap in id_re.captures_iter(html) {
        let aid = &cap[1];
        if seen.insert(aid.to_string()) {
            papers.push(Candidate::bare(aid));
        }
    }

    // 标题：论文链接后紧跟的 <h3>
    let block_re =
        Regex::new(r#"(?s)href="/papers/(\d{4}\.\d{4,})"[^>]*>.*?<h3[^>]*>(.*?)</h3>"#)
            .expect("正则字面量");
    let tag_re = Regex::new(r"<[^>]+>").expect("正则字面量");
    for cap in block_re.captures_iter(html) {
        let aid = &cap[1];
        let clean = tag_re.replace_all(&cap[2], "").trim().to_string();
        if !clean.is_empty() {
            if let Some(p) = papers.iter_mut().find(|p| p.arxiv_id == aid) {
                p.title = clean;
            }
        }
    }

    // 热度：同一区块附近的纯数字 <div>
    let upvote_re =
        Regex::new(r#"(?s)href="/papers/(\d{4}\.\d{4,})".*?<div[^>]*>\s*(\d+)\s*</div>"#)
            .expect("正则字面量");
    for cap in upvote_re.captures_iter(html) {
        if let Ok(votes) = cap[2].parse() {
            if let Some(p) = papers.iter_mut().find(|p| p.arxiv_id == &cap[1]) {
                p.upvotes = votes;
            }
        }
    }

    papers.truncate(limit);

    // 备用：主解析一无所获时，直接找裸 arxiv id
    if papers.is_empty() {
        let bare_re = Regex::new(r"\b(\d{4}\.\d{4,5})\b").expect("正则字面量");
        let mut seen = HashSet::new();
        for cap in bare_re.captures_iter(html) {
            let aid = &cap[1];
            if seen.insert(aid.to_string()) {
                papers.push(Candidate::bare(aid));
                if papers.len() >= limit {
                    break;
                }
            }
        }
    }

    papers
}
