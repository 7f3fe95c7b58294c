//! 论文记录与周期索引
//!
//! 一个周期对应一个 `index.json`，每处理完一篇论文就整体重写一次，
//! 使磁盘上的索引始终是最近一次完整一致的状态。

use serde::{Deserialize, Serialize};

use crate::models::period::{now_stamp, Mode, PeriodKey};

/// 单篇论文在索引中的记录，以 arxiv_id 为唯一键
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperRecord {
    pub arxiv_id: String,
    #[serde(default)]
    pub rank: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_zh: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary_zh: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords_zh: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authors: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub submitted: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PaperRecord {
    /// 最小记录：摘要工件已存在但旧索引中找不到对应条目时使用
    pub fn minimal(arxiv_id: &str, rank: usize) -> Self {
        Self {
            arxiv_id: arxiv_id.to_string(),
            rank,
            html_file: format!("papers/{arxiv_id}.html"),
            ..Default::default()
        }
    }

    /// 失败记录：单篇论文处理抛错时写入，不中断整个周期
    pub fn with_error(arxiv_id: &str, rank: usize, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::minimal(arxiv_id, rank)
        }
    }
}

/// 周期索引：`{mode, key, generated_at, total, papers}`
///
/// 不变式：`total == papers.len()`，由 [`PaperIndex::new`] 保证。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperIndex {
    pub mode: Mode,
    pub key: String,
    pub generated_at: String,
    pub total: usize,
    pub papers: Vec<PaperRecord>,
}

impl PaperIndex {
    pub fn new(period: &PeriodKey, papers: Vec<PaperRecord>) -> Self {
        Self {
            mode: period.mode,
            key: period.key.clone(),
            generated_at: now_stamp(),
            total: papers.len(),
            papers,
        }
    }

    pub fn find(&self, arxiv_id: &str) -> Option<&PaperRecord> {
        self.papers.iter().find(|p| p.arxiv_id == arxiv_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::period::Mode;

    #[test]
    fn index_total_matches_len() {
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");
        let idx = PaperIndex::new(
            &period,
            vec![
                PaperRecord::minimal("2602.00001", 1),
                PaperRecord::with_error("2602.00002", 2, "boom"),
            ],
        );
        assert_eq!(idx.total, 2);
        assert_eq!(idx.total, idx.papers.len());
        assert_eq!(idx.find("2602.00002").unwrap().error.as_deref(), Some("boom"));
        assert!(idx.find("2602.99999").is_none());
    }

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_string(&PaperRecord::minimal("2602.00001", 3)).unwrap();
        assert!(json.contains("\"arxiv_id\":\"2602.00001\""));
        assert!(json.contains("\"rank\":3"));
        assert!(!json.contains("title"));
        assert!(!json.contains("error"));
    }
}
