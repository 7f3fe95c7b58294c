//! 全文翻译外层边界 - 流程层
//!
//! 把"翻译全文并重新编译 PDF"这个最容易出问题的操作包在沙箱调用
//! 里：检查容器 → 注入驱动 → 带超时执行 → 解析结果哨兵 → 取回 PDF
//! 并校验大小。重试都发生在沙箱内的驱动里，这一层只认最终结果。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::SandboxError;
use crate::infrastructure::CompilationSandbox;

/// 取回的 PDF 小于该值视为损坏或未完成渲染，即使哨兵报告成功也判失败
const MIN_PDF_BYTES: u64 = 4096;

/// 驱动结果哨兵行的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
    /// `RESULT:SUCCESS:<路径>`
    Pdf(String),
    /// `RESULT:ERROR:<消息>`
    Error(String),
    /// 输出中没有任何哨兵行
    Unknown,
}

/// 从驱动输出中提取结果（只认 SUCCESS 和 ERROR，大小写敏感前缀匹配）
pub fn parse_driver_output(stdout: &str) -> DriverOutcome {
    for line in stdout.lines() {
        if let Some(path) = line.strip_prefix("RESULT:SUCCESS:") {
            return DriverOutcome::Pdf(path.to_string());
        }
        if let Some(msg) = line.strip_prefix("RESULT:ERROR:") {
            return DriverOutcome::Error(msg.to_string());
        }
    }
    DriverOutcome::Unknown
}

/// 一次全文翻译的结果
#[derive(Debug, Clone)]
pub struct FullTranslateResult {
    pub success: bool,
    pub pdf_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl FullTranslateResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            pdf_path: None,
            error: Some(error.into()),
        }
    }
}

/// 全文翻译执行器
pub struct FullTranslator {
    sandbox: Arc<dyn CompilationSandbox>,
}

impl FullTranslator {
    pub fn new(sandbox: Arc<dyn CompilationSandbox>) -> Self {
        Self { sandbox }
    }

    /// 全文翻译主流程：仅以取回的 PDF 为成功标准。
    /// 失败不向上抛错，调用方把 `error` 记到论文或任务上继续处理。
    pub async fn translate_full(
        &self,
        arxiv_id: &str,
        output_dir: &Path,
        no_cache: bool,
        timeout: Duration,
    ) -> FullTranslateResult {
        // 1. 基础设施前置条件：容器必须在运行，不满足则不重试
        if !self.sandbox.is_available().await {
            let e = SandboxError::Unavailable {
                container: self.sandbox.name().to_string(),
            };
            error!("❌ {}", e);
            return FullTranslateResult::failed(e.to_string());
        }

        // 2. 注入驱动
        info!("📦 复制驱动脚本到容器...");
        if let Err(e) = self.sandbox.inject_driver().await {
            error!("❌ {}", e);
            return FullTranslateResult::failed(e.to_string());
        }

        // 3. 带超时执行（驱动内部有自己的尝试级超时，这里是外层兜底）
        info!("🚀 启动容器内翻译 (timeout={}s)...", timeout.as_secs());
        let t0 = Instant::now();
        let output = match self.sandbox.invoke(arxiv_id, no_cache, timeout).await {
            Ok(out) => out,
            Err(e) => {
                error!("❌ {}", e);
                return FullTranslateResult::failed(e.to_string());
            }
        };
        info!("⏱️  耗时: {}s", t0.elapsed().as_secs());

        // 容器内日志只保留驱动自己的行，其余是工具链噪声
        for line in output.stdout.lines() {
            if line.contains("[driver]") || line.contains("RESULT:") {
                debug!("   {}", line);
            }
        }

        // 4. 解析结果哨兵
        let outcome = parse_driver_output(&output.stdout);
        let container_path = match outcome {
            DriverOutcome::Pdf(path) => {
                // 驱动返回相对路径时，相对沙箱工作根目录解析
                if path.starts_with('/') {
                    path
                } else {
                    format!("{}/{}", self.sandbox.root(), path)
                }
            }
            DriverOutcome::Error(msg) => {
                let e = SandboxError::Driver { message: msg };
                error!("❌ {}", e);
                return FullTranslateResult::failed(e.to_string());
            }
            DriverOutcome::Unknown => {
                let e = SandboxError::Unknown;
                error!("❌ {}", e);
                return FullTranslateResult::failed(e.to_string());
            }
        };
        info!("   输出路径: {}", container_path);

        // 5. 取回 PDF 并校验大小
        let local_pdf = output_dir.join(format!("{arxiv_id}_zh.pdf"));
        if let Err(e) = self.sandbox.copy_out(&container_path, &local_pdf).await {
            error!("❌ {}", e);
            return FullTranslateResult::failed(e.to_string());
        }
        let size = std::fs::metadata(&local_pdf).map(|m| m.len()).unwrap_or(0);
        if size <= MIN_PDF_BYTES {
            let e = SandboxError::ArtifactTooSmall;
            error!("❌ {}", e);
            return FullTranslateResult::failed(e.to_string());
        }

        info!(
            "✅ PDF 翻译成功: {} ({:.2} MB)",
            local_pdf.display(),
            size as f64 / 1024.0 / 1024.0
        );
        FullTranslateResult {
            success: true,
            pdf_path: Some(local_pdf),
            error: None,
        }
    }
}
