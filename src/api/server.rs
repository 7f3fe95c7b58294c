//! 提交 API - 对外接口
//!
//! 只有两个 JSON 端点：提交一个 arxiv id、查询全部任务状态。
//! 页面渲染和静态文件不在这里，由外部前端自行消费这两个端点。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::Job;
use crate::orchestrator::SubmitQueue;

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    arxiv_id: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    ok: bool,
    msg: String,
    arxiv_id: String,
}

pub fn router(queue: Arc<SubmitQueue>) -> Router {
    Router::new()
        .route("/api/submit", post(submit))
        .route("/api/submit/status", get(status))
        .with_state(queue)
}

/// POST /api/submit  {"arxiv_id": "2602.12345"}
async fn submit(
    State(queue): State<Arc<SubmitQueue>>,
    Json(req): Json<SubmitRequest>,
) -> (StatusCode, Json<SubmitResponse>) {
    let arxiv_id = SubmitQueue::normalize_id(&req.arxiv_id);
    let (ok, msg) = queue.submit(&req.arxiv_id);
    let code = if ok { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (code, Json(SubmitResponse { ok, msg, arxiv_id }))
}

/// GET /api/submit/status  → 任务记录全表
async fn status(State(queue): State<Arc<SubmitQueue>>) -> Json<HashMap<String, Job>> {
    Json(queue.jobs())
}

/// 启动提交 API 服务
pub async fn serve(addr: &str, queue: Arc<SubmitQueue>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))?;
    info!("🌐 提交 API 已启动: http://{addr}");
    axum::serve(listener, router(queue))
        .await
        .context("提交 API 异常退出")
}
