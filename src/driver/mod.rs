//! 容器内全文翻译驱动 - 尝试循环 / 缓存清理 / 产物定位
//!
//! 编译成独立二进制 `full-translate-driver`，由外层 `docker cp` 进
//! 容器后 `docker exec` 执行。它的 stdout 就是协议通道：结尾输出
//! 唯一一行结果哨兵（`RESULT:SUCCESS:<路径>` 或 `RESULT:ERROR:<消息>`），
//! 其余所有行都是 `[driver]` 前缀的日志噪声，外层一概忽略。
//!
//! 工具链（LaTeX 全文翻译与重编译）慢、偶尔挂死、还会派生出
//! pdflatex 等子孙进程。每次尝试都把工具链放进新的进程组并施加
//! 尝试级硬超时，超时就对整个进程组 SIGKILL——只杀直接子进程
//! 不够，残留的孤儿进程会一直占着超时窗口。

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

/// 首次尝试之外的重试预算
pub const MAX_RETRIES: usize = 2;
/// 小于该大小的 PDF 视为无效产物
const MIN_OUTPUT_BYTES: u64 = 50 * 1024;

/// 驱动配置，全部来自容器内环境变量
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub arxiv_id: String,
    pub no_cache: bool,
    /// 工具链缓存根目录（ARXIV_CACHE_DIR）
    pub cache_root: PathBuf,
    /// 工具链命令模板（TOOLCHAIN_CMD），`{url}` / `{id}` 为占位符，
    /// 需要强制重新翻译时追加 ` --no-cache`
    pub toolchain_cmd: String,
    /// 尝试级硬超时（ATTEMPT_TIMEOUT_SECS），独立于外层超时
    pub attempt_timeout: Duration,
    /// 两次尝试之间的等待
    pub retry_pause: Duration,
    /// 注入给工具链子进程的出口代理（HOST_PROXY），空串表示直连
    pub proxy: String,
}

impl DriverConfig {
    pub fn from_env(arxiv_id: &str, no_cache: bool) -> Self {
        Self {
            arxiv_id: arxiv_id.to_string(),
            no_cache,
            cache_root: std::env::var("ARXIV_CACHE_DIR")
                .unwrap_or_else(|_| "/gpt/gpt_log/arxiv_cache".to_string())
                .into(),
            toolchain_cmd: std::env::var("TOOLCHAIN_CMD")
                .unwrap_or_else(|_| "python3 /gpt/latex_translate.py {url}".to_string()),
            attempt_timeout: Duration::from_secs(
                std::env::var("ATTEMPT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1800),
            ),
            retry_pause: Duration::from_secs(5),
            proxy: std::env::var("HOST_PROXY")
                .unwrap_or_else(|_| "http://127.0.0.1:7890".to_string()),
        }
    }
}

/// 主循环：首次 + 最多 [`MAX_RETRIES`] 次重试，成功返回产物路径。
///
/// 首次尝试遵循调用方的 no_cache 参数；重试一律先清编译缓存再强制
/// 重新翻译。缓存清理只动 workfolder / translation，保留 e-print
/// （原始下载源），避免重复下载。
pub async fn run(cfg: &DriverConfig) -> Option<PathBuf> {
    println!(
        "[driver] 开始处理: {}  no_cache={}  max_retries={}",
        cfg.arxiv_id, cfg.no_cache, MAX_RETRIES
    );
    if !cfg.proxy.is_empty() {
        println!("[driver] 代理: {}", cfg.proxy);
    }

    // 调用方要求无缓存时，先清编译缓存（保留 e-print）
    if cfg.no_cache {
        clear_compile_cache(&cfg.cache_root, &cfg.arxiv_id, false);
    }

    for attempt in 1..=MAX_RETRIES + 1 {
        let result = if attempt == 1 {
            run_attempt(cfg, cfg.no_cache, attempt).await
        } else {
            println!("\n[driver] ══ 第 {attempt} 次重试（清除缓存后重新翻译）══");
            clear_compile_cache(&cfg.cache_root, &cfg.arxiv_id, false);
            run_attempt(cfg, true, attempt).await
        };

        if result.is_some() {
            return result;
        }
        if attempt <= MAX_RETRIES {
            println!("[driver] 等待 {}s 后重试...", cfg.retry_pause.as_secs());
            tokio::time::sleep(cfg.retry_pause).await;
        }
    }
    None
}

/// 执行一次翻译 + 编译尝试，成功返回 PDF 路径
async fn run_attempt(cfg: &DriverConfig, no_cache: bool, attempt_idx: usize) -> Option<PathBuf> {
    println!("[driver] 第 {attempt_idx} 次尝试  no_cache={no_cache}");
    run_toolchain(cfg, no_cache).await;
    let found = locate_output(&cfg.cache_root, &cfg.arxiv_id);
    match &found {
        Some(p) => {
            let kb = file_size(p) / 1024;
            println!("[driver] ✅ 找到产物: {} ({kb}KB)", p.display());
        }
        None => println!("[driver] ❌ 本次未生成有效翻译 PDF（>{}KB）", MIN_OUTPUT_BYTES / 1024),
    }
    found
}

/// 在新进程组里跑一遍工具链，施加尝试级硬超时。
/// 超时对整个进程组 SIGKILL，保证 pdflatex 等子孙进程不会变成孤儿。
async fn run_toolchain(cfg: &DriverConfig, no_cache: bool) {
    let url = format!("https://arxiv.org/abs/{}", cfg.arxiv_id);
    let mut shell_cmd = cfg
        .toolchain_cmd
        .replace("{url}", &url)
        .replace("{id}", &cfg.arxiv_id);
    if no_cache {
        shell_cmd.push_str(" --no-cache");
    }
    println!("[driver] 调用工具链: {shell_cmd}");

    let mut command = Command::new("sh");
    command.arg("-c").arg(&shell_cmd).process_group(0);
    if !cfg.proxy.is_empty() {
        for key in ["HTTP_PROXY", "HTTPS_PROXY", "http_proxy", "https_proxy"] {
            command.env(key, &cfg.proxy);
        }
        command.env("NO_PROXY", "localhost,127.0.0.1");
    }

    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            println!("[driver] 工具链启动失败: {e}");
            return;
        }
    };
    let pid = child.id();

    match tokio::time::timeout(cfg.attempt_timeout, child.wait()).await {
        Ok(Ok(status)) => {
            println!("[driver] 工具链退出: {status}");
        }
        Ok(Err(e)) => {
            println!("[driver] 等待工具链失败: {e}");
        }
        Err(_) => {
            if let Some(pid) = pid {
                kill_process_group(pid).await;
            } else {
                let _ = child.start_kill();
            }
            // 组内进程已被 SIGKILL，这里只是回收直接子进程
            let _ = child.wait().await;
            println!(
                "[driver] ⚠️  工具链超时（{}s），已强制终止进程组",
                cfg.attempt_timeout.as_secs()
            );
        }
    }
}

/// SIGKILL 整个进程组。`process_group(0)` 使组 id 等于子进程 pid。
async fn kill_process_group(pid: u32) {
    let _ = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -9 -- -{pid}"))
        .status()
        .await;
}

/// 在固定位置按优先级查找产物 PDF（绝不搜索 Figures 等子目录）：
/// 1. translation/translate_zh.pdf（工具链最终输出）
/// 2. workfolder 根目录下名字含 translate_zh 的合并产物
/// 3. workfolder 根目录内最大的 PDF（排除翻译前的 merge.pdf）
pub(crate) fn locate_output(cache_root: &Path, arxiv_id: &str) -> Option<PathBuf> {
    let base = cache_root.join(arxiv_id);
    let translation_dir = base.join("translation");
    let workfolder = base.join("workfolder");

    let candidate = translation_dir.join("translate_zh.pdf");
    if file_size(&candidate) > MIN_OUTPUT_BYTES {
        return Some(candidate);
    }

    for fname in ["merge_translate_zh.pdf", "translate_zh.pdf"] {
        let fp = workfolder.join(fname);
        if file_size(&fp) > MIN_OUTPUT_BYTES {
            return Some(fp);
        }
    }

    let entries = std::fs::read_dir(&workfolder).ok()?;
    let best = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension().is_some_and(|ext| ext == "pdf")
                && p.file_name().is_some_and(|n| n != "merge.pdf")
        })
        .max_by_key(|p| file_size(p))?;
    (file_size(&best) > MIN_OUTPUT_BYTES).then_some(best)
}

/// 清除编译缓存。full=true 时连解包目录一起清；任何情况下都保留
/// e-print（原始下载源），避免重试时重复下载。
pub(crate) fn clear_compile_cache(cache_root: &Path, arxiv_id: &str, full: bool) {
    let base = cache_root.join(arxiv_id);
    let mut targets = vec!["workfolder", "translation"];
    if full {
        targets.push("extract");
    }
    for subdir in targets {
        let dir = base.join(subdir);
        if dir.exists() && std::fs::remove_dir_all(&dir).is_ok() {
            println!("[driver] 已清除缓存: {}", dir.display());
        }
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// 写一个指定大小的占位 PDF
    fn put_pdf(path: &Path, bytes: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; bytes]).unwrap();
    }

    fn test_cfg(cache_root: &Path, toolchain_cmd: &str, timeout: Duration) -> DriverConfig {
        DriverConfig {
            arxiv_id: "2602.10388".to_string(),
            no_cache: false,
            cache_root: cache_root.to_path_buf(),
            toolchain_cmd: toolchain_cmd.to_string(),
            attempt_timeout: timeout,
            retry_pause: Duration::from_millis(10),
            proxy: String::new(),
        }
    }

    #[test]
    fn locate_prefers_translation_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("2602.10388");
        put_pdf(&base.join("translation/translate_zh.pdf"), 60_000);
        put_pdf(&base.join("workfolder/merge_translate_zh.pdf"), 90_000);

        let found = locate_output(tmp.path(), "2602.10388").unwrap();
        assert!(found.ends_with("translation/translate_zh.pdf"));
    }

    #[test]
    fn locate_falls_back_to_workfolder_names() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("2602.10388");
        // translation 里的太小，不算
        put_pdf(&base.join("translation/translate_zh.pdf"), 1_000);
        put_pdf(&base.join("workfolder/translate_zh.pdf"), 60_000);

        let found = locate_output(tmp.path(), "2602.10388").unwrap();
        assert!(found.ends_with("workfolder/translate_zh.pdf"));
    }

    #[test]
    fn locate_picks_largest_root_pdf_excluding_merge() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("2602.10388");
        put_pdf(&base.join("workfolder/merge.pdf"), 900_000); // 翻译前产物，排除
        put_pdf(&base.join("workfolder/chapter1.pdf"), 80_000);
        put_pdf(&base.join("workfolder/main_zh.pdf"), 120_000);
        put_pdf(&base.join("workfolder/Figures/fig.pdf"), 500_000); // 子目录，不搜

        let found = locate_output(tmp.path(), "2602.10388").unwrap();
        assert!(found.ends_with("workfolder/main_zh.pdf"));
    }

    #[test]
    fn locate_rejects_small_files() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("2602.10388");
        put_pdf(&base.join("workfolder/tiny.pdf"), 2_000);
        assert!(locate_output(tmp.path(), "2602.10388").is_none());
    }

    #[test]
    fn cache_clear_preserves_eprint() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("2602.10388");
        for d in ["workfolder", "translation", "extract", "e-print"] {
            fs::create_dir_all(base.join(d)).unwrap();
        }

        clear_compile_cache(tmp.path(), "2602.10388", false);
        assert!(!base.join("workfolder").exists());
        assert!(!base.join("translation").exists());
        assert!(base.join("extract").exists());
        assert!(base.join("e-print").exists());

        clear_compile_cache(tmp.path(), "2602.10388", true);
        assert!(!base.join("extract").exists());
        assert!(base.join("e-print").exists());
    }

    #[tokio::test]
    async fn failing_toolchain_stops_after_retry_budget() {
        let tmp = tempfile::tempdir().unwrap();
        let counter = tmp.path().join("attempts.log");
        let cmd = format!("echo run >> {}", counter.display());
        let cfg = test_cfg(tmp.path(), &cmd, Duration::from_secs(5));

        let result = run(&cfg).await;
        assert!(result.is_none());

        // 首次 + 2 次重试，之后绝不再试
        let attempts = fs::read_to_string(&counter).unwrap().lines().count();
        assert_eq!(attempts, MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_cache_clears() {
        let tmp = tempfile::tempdir().unwrap();
        let counter = tmp.path().join("attempts.log");
        let target = tmp.path().join("2602.10388/translation/translate_zh.pdf");
        // 前两次尝试失败，第三次（缓存已被清过两轮）才产出足够大的 PDF
        let cmd = format!(
            "echo run >> {c}; n=$(wc -l < {c}); if [ \"$n\" -ge 3 ]; then mkdir -p {d} && head -c 60000 /dev/zero > {t}; fi",
            c = counter.display(),
            d = target.parent().unwrap().display(),
            t = target.display(),
        );
        let cfg = test_cfg(tmp.path(), &cmd, Duration::from_secs(5));

        let result = run(&cfg).await.expect("第三次尝试应成功");
        assert!(result.ends_with("translation/translate_zh.pdf"));
        assert_eq!(fs::read_to_string(&counter).unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn hung_toolchain_leaves_no_orphan_descendants() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("orphan-was-alive.txt");
        // 工具链挂死，并派生了一个 2s 后会写标记文件的孙进程。
        // 组级 SIGKILL 必须把它一并带走，否则标记文件会出现。
        let cmd = format!(
            "(sleep 2 && touch {m}) & sleep 30",
            m = marker.display()
        );
        let mut cfg = test_cfg(tmp.path(), &cmd, Duration::from_millis(300));
        cfg.retry_pause = Duration::from_millis(1);

        run_toolchain(&cfg, false).await;

        // 给足孙进程本来会醒来的时间
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(
            !marker.exists(),
            "孙进程在组级超时后仍然存活并写下了标记文件"
        );
    }
}
