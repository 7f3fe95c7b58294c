//! 编译沙箱 - 基础设施层
//!
//! 全文翻译的重型工具链运行在一个隔离的执行边界（长驻 Docker 容器）
//! 内，本模块只暴露一条窄通道：检查可达、注入驱动、带超时调用、
//! 取回产物。隔离机制（容器 / 子进程 / 远程 worker）对上层不可见。

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::SandboxError;

/// 容器内驱动程序的固定落点
const DRIVER_DEST: &str = "/tmp/full-translate-driver";

/// 一次沙箱调用的原始输出
#[derive(Debug, Clone)]
pub struct SandboxOutput {
    pub stdout: String,
    pub stderr: String,
}

/// 编译沙箱接口
///
/// 系统全局同一时刻最多一次调用在途（由上层的串行调度保证），
/// 实现无须自带并发控制。
#[async_trait]
pub trait CompilationSandbox: Send + Sync {
    /// 沙箱运行时是否可达。不可达是基础设施前置条件失败，调用方
    /// 直接判定失败，不重试。
    async fn is_available(&self) -> bool;

    /// 把驱动程序注入沙箱边界内
    async fn inject_driver(&self) -> Result<(), SandboxError>;

    /// 调用驱动，整体受 `timeout` 约束；超时返回 [`SandboxError::Timeout`]，
    /// 此时沙箱内部状态不可信（内层驱动有自己的子超时，这里是双保险）。
    async fn invoke(
        &self,
        arxiv_id: &str,
        no_cache: bool,
        timeout: Duration,
    ) -> Result<SandboxOutput, SandboxError>;

    /// 把沙箱内的文件复制到本地
    async fn copy_out(&self, remote_path: &str, local_path: &Path) -> Result<(), SandboxError>;

    /// 沙箱内的工作根目录，用于解析驱动输出的相对路径
    fn root(&self) -> &str;

    /// 沙箱的标识（容器名），用于日志与错误消息
    fn name(&self) -> &str;
}

/// Docker 容器沙箱
pub struct DockerSandbox {
    container: String,
    driver_bin: String,
    root: String,
}

impl DockerSandbox {
    pub fn new(config: &Config) -> Self {
        Self {
            container: config.sandbox_container.clone(),
            driver_bin: config.driver_bin.clone(),
            root: "/gpt".to_string(),
        }
    }
}

#[async_trait]
impl CompilationSandbox for DockerSandbox {
    async fn is_available(&self) -> bool {
        let output = Command::new("docker")
            .args(["ps", "-q", "-f"])
            .arg(format!("name={}", self.container))
            .output()
            .await;
        match output {
            Ok(out) => !String::from_utf8_lossy(&out.stdout).trim().is_empty(),
            Err(_) => false,
        }
    }

    async fn inject_driver(&self) -> Result<(), SandboxError> {
        let output = Command::new("docker")
            .arg("cp")
            .arg(&self.driver_bin)
            .arg(format!("{}:{}", self.container, DRIVER_DEST))
            .output()
            .await
            .map_err(|e| SandboxError::InjectFailed { detail: e.to_string() })?;
        if !output.status.success() {
            return Err(SandboxError::InjectFailed {
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn invoke(
        &self,
        arxiv_id: &str,
        no_cache: bool,
        timeout: Duration,
    ) -> Result<SandboxOutput, SandboxError> {
        let mut cmd = Command::new("docker");
        cmd.arg("exec").arg(&self.container).arg(DRIVER_DEST).arg(arxiv_id);
        if no_cache {
            cmd.arg("--no-cache");
        }
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 超时放弃等待时连带杀掉 docker exec 客户端进程
            .kill_on_drop(true);

        debug!("沙箱调用: docker exec {} {} {}", self.container, DRIVER_DEST, arxiv_id);

        let child = cmd
            .spawn()
            .map_err(|e| SandboxError::ExecFailed { detail: e.to_string() })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(out)) => Ok(SandboxOutput {
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(SandboxError::ExecFailed { detail: e.to_string() }),
            Err(_) => Err(SandboxError::Timeout {
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn copy_out(&self, remote_path: &str, local_path: &Path) -> Result<(), SandboxError> {
        let output = Command::new("docker")
            .arg("cp")
            .arg(format!("{}:{}", self.container, remote_path))
            .arg(local_path)
            .output()
            .await
            .map_err(|_| SandboxError::CopyFailed {
                path: remote_path.to_string(),
            })?;
        if !output.status.success() {
            return Err(SandboxError::CopyFailed {
                path: remote_path.to_string(),
            });
        }
        Ok(())
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn name(&self) -> &str {
        &self.container
    }
}
