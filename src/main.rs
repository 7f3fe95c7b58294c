use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use paper_trans::config::Config;
use paper_trans::infrastructure::DockerSandbox;
use paper_trans::models::{JobStatus, Mode, PeriodKey};
use paper_trans::orchestrator::{Pipeline, SubmitQueue};
use paper_trans::services::{
    ArxivMetadataSource, HfCandidateSource, OpenAiTranslator, TranslationConfig,
};
use paper_trans::store::CheckpointStore;
use paper_trans::utils::logging;
use paper_trans::workflow::{FullTranslator, PaperFlow};

#[derive(Parser)]
#[command(name = "paper-trans", version, about = "arXiv 热门论文抓取与翻译")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 跑一个抓取周期（定时任务入口）
    Run {
        /// 周期模式
        #[arg(value_enum)]
        mode: RunMode,
        /// 周期 key（如 2026-02-19 / 2026-W08 / 2026-02），缺省取当前周期
        key: Option<String>,
        /// 论文数上限，缺省按模式（daily 3，weekly/monthly 10）
        #[arg(long)]
        limit: Option<usize>,
        /// 仅摘要翻译，跳过全文 PDF
        #[arg(long)]
        no_full: bool,
    },
    /// 手动提交一篇论文并等待处理完成
    Submit {
        /// arXiv ID，如 2602.12345
        arxiv_id: String,
    },
    /// 启动手动提交 API 服务
    Serve {
        /// 监听地址，缺省读 SERVE_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RunMode {
    Daily,
    Weekly,
    Monthly,
}

impl From<RunMode> for Mode {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Daily => Mode::Daily,
            RunMode::Weekly => Mode::Weekly,
            RunMode::Monthly => Mode::Monthly,
        }
    }
}

/// 按配置装配整套组件
fn build(config: &Config) -> (Pipeline, Arc<SubmitQueue>) {
    let store = CheckpointStore::new(&config.data_dir);
    let flow = Arc::new(PaperFlow::new(
        Arc::new(ArxivMetadataSource::new(config)),
        Arc::new(OpenAiTranslator::new(&TranslationConfig::from_config(config))),
    ));
    let full = Arc::new(FullTranslator::new(Arc::new(DockerSandbox::new(config))));

    let pipeline = Pipeline::new(
        Arc::new(HfCandidateSource::new(config)),
        flow.clone(),
        full.clone(),
        store.clone(),
        config,
    );
    let queue = SubmitQueue::new(
        store,
        flow,
        full,
        Duration::from_secs(config.full_timeout_secs),
    );
    (pipeline, queue)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置（进程启动时读一次环境变量）
    let config = Config::from_env();
    info!("📡 模型: {}", config.llm_model_name);

    let cli = Cli::parse();
    let (pipeline, queue) = build(&config);

    match cli.command {
        Commands::Run {
            mode,
            key,
            limit,
            no_full,
        } => {
            let mode: Mode = mode.into();
            let period = PeriodKey::new(mode, key.unwrap_or_else(|| mode.default_key()));
            let limit = limit.unwrap_or_else(|| mode.default_limit());
            let ok = pipeline.run(&period, limit, !no_full).await?;
            // 退出码 0 当且仅当本次运行零失败
            std::process::exit(if ok { 0 } else { 1 });
        }
        Commands::Submit { arxiv_id } => {
            let (accepted, msg) = queue.submit(&arxiv_id);
            println!("{msg}");
            if !accepted {
                std::process::exit(1);
            }
            let id = SubmitQueue::normalize_id(&arxiv_id);
            let status = wait_for_terminal(&queue, &id).await;
            std::process::exit(match status {
                JobStatus::Done | JobStatus::DoneNoPdf => 0,
                _ => 1,
            });
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.serve_addr.clone());
            paper_trans::api::serve(&addr, queue).await?;
        }
    }
    Ok(())
}

/// 轮询任务状态直到终态，期间把状态变化打给用户
async fn wait_for_terminal(queue: &Arc<SubmitQueue>, arxiv_id: &str) -> JobStatus {
    let mut last_msg = String::new();
    loop {
        if let Some(job) = queue.jobs().get(arxiv_id) {
            if job.msg != last_msg {
                info!("[{}] {}", arxiv_id, job.msg);
                last_msg = job.msg.clone();
            }
            if job.status.is_terminal() {
                return job.status;
            }
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
