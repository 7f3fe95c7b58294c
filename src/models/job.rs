//! 手动提交任务记录
//!
//! 状态机：`queued → fetching → abstract → full_pdf → {done | done_no_pdf | error}`。
//! 同一 arxiv_id 同时最多存在一个未终结的任务。

use serde::{Deserialize, Serialize};

use crate::models::period::now_stamp;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Fetching,
    Abstract,
    FullPdf,
    Done,
    DoneNoPdf,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::DoneNoPdf | JobStatus::Error)
    }

    /// 是否允许对同一 arxiv_id 重新提交。
    /// 规则：仅 error（彻底失败）与 done_no_pdf（全文 PDF 缺失）可重新提交，
    /// done 及所有未终结状态拒绝。
    pub fn is_resubmittable(self) -> bool {
        matches!(self, JobStatus::Error | JobStatus::DoneNoPdf)
    }
}

/// 一次手动提交的持久化记录，以 arxiv_id 为键
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub arxiv_id: String,
    pub status: JobStatus,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_zh: Option<String>,
    pub submitted_at: String,
    pub updated_at: String,
}

impl Job {
    /// 新建排队中的任务
    pub fn queued(arxiv_id: &str) -> Self {
        let now = now_stamp();
        Self {
            arxiv_id: arxiv_id.to_string(),
            status: JobStatus::Queued,
            msg: "排队等待中".to_string(),
            title: None,
            title_zh: None,
            pdf_zh: None,
            submitted_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_names() {
        assert_eq!(serde_json::to_string(&JobStatus::FullPdf).unwrap(), "\"full_pdf\"");
        assert_eq!(serde_json::to_string(&JobStatus::DoneNoPdf).unwrap(), "\"done_no_pdf\"");
        let s: JobStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(s, JobStatus::Queued);
    }

    #[test]
    fn terminal_and_resubmittable() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::FullPdf.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::DoneNoPdf.is_terminal());
        assert!(JobStatus::Error.is_terminal());

        assert!(JobStatus::Error.is_resubmittable());
        assert!(JobStatus::DoneNoPdf.is_resubmittable());
        assert!(!JobStatus::Done.is_resubmittable());
        assert!(!JobStatus::Abstract.is_resubmittable());
    }

    #[test]
    fn new_job_is_queued() {
        let job = Job::queued("2602.12345");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.msg, "排队等待中");
        assert_eq!(job.submitted_at, job.updated_at);
    }
}
