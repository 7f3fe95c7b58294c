//! 应用程序错误类型
//!
//! 按故障域分组：候选列表抓取、元数据、翻译、沙箱、存储。
//! 编排层统一用 `anyhow::Result` 组合，单篇论文粒度以下的错误
//! 永远不会越过它所属的工作单元向上冒泡。

use thiserror::Error;

/// 候选论文列表抓取错误。
/// 整个周期唯一的致命错误来源：一篇论文都没拿到时整次运行失败。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("请求失败 ({url}): {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// 元数据抓取错误（单篇论文粒度）
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("请求失败 ({url}): {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("正则解析失败: {source}")]
    Pattern {
        #[from]
        source: regex::Error,
    },
}

/// LLM 翻译错误（单篇论文粒度）
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCall { model: String, message: String },
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 编译沙箱错误
#[derive(Debug, Error)]
pub enum SandboxError {
    /// 基础设施前置条件不满足，不重试
    #[error("容器 {container} 未运行")]
    Unavailable { container: String },
    #[error("无法复制驱动脚本到容器: {detail}")]
    InjectFailed { detail: String },
    /// 外层超时：无论沙箱内部状态如何，整体判定失败
    #[error("超时 ({secs}s)")]
    Timeout { secs: u64 },
    #[error("沙箱调用失败: {detail}")]
    ExecFailed { detail: String },
    /// 驱动汇报的失败（已含内部重试）
    #[error("{message}")]
    Driver { message: String },
    /// 驱动输出中没有任何结果哨兵行
    #[error("翻译失败（驱动所有重试均未生成 PDF）")]
    Unknown,
    #[error("无法从容器复制 PDF: {path}")]
    CopyFailed { path: String },
    #[error("PDF 复制成功但文件过小或为空")]
    ArtifactTooSmall,
}

/// 检查点存储错误。
/// 读取侧没有错误类型：缺失或损坏的文件按"不存在"处理，由调用方重建。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("写入文件失败 ({path}): {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON序列化失败 ({path}): {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
