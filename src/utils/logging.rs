//! 日志工具模块
//!
//! tracing 负责控制台输出；每个周期另有一份纯文本运行日志
//! （logs/<mode>-<key>.log），追加写入，便于事后排查单个周期。

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::models::{now_stamp, PeriodKey};

/// 初始化 tracing 日志，默认级别 info，可用 RUST_LOG 覆盖。
/// 重复调用是无害的空操作（测试里每个用例都会调一次）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 向周期运行日志追加一行 `[时间戳] 消息`。
/// 日志写失败只警告，绝不影响主流程。
pub fn append_period_log(logs_dir: &Path, period: &PeriodKey, msg: &str) {
    if let Err(e) = try_append(logs_dir, period, msg) {
        warn!("⚠️ 周期日志写入失败: {}", e);
    }
}

fn try_append(logs_dir: &Path, period: &PeriodKey, msg: &str) -> std::io::Result<()> {
    fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(format!("{}-{}.log", period.mode.as_str(), period.key));
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "[{}] {}", now_stamp(), msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let period = PeriodKey::new(Mode::Daily, "2026-02-19");

        append_period_log(dir.path(), &period, "开始: daily/2026-02-19");
        append_period_log(dir.path(), &period, "✅ 获取到 3 篇");

        let content = fs::read_to_string(dir.path().join("daily-2026-02-19.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("开始: daily/2026-02-19"));
        assert!(lines[1].contains("获取到 3 篇"));
        assert!(lines[0].starts_with('['));
    }
}
