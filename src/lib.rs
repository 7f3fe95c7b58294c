//! # Paper Trans
//!
//! 定时 + 手动抓取 arXiv 热门论文，翻译元数据与（可选）全文，
//! 结果写入可断点续跑的周期索引。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有隔离边界，只暴露能力
//! - `CompilationSandbox` - 编译沙箱的窄接口（检查 / 注入 / 调用 / 取回）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇论文
//! - `CandidateSource` - 候选榜单抓取能力
//! - `MetadataSource` - 元数据抓取能力
//! - `TranslationBackend` - 摘要翻译能力
//! - `page_writer` - 双语 HTML 工件渲染能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"的完整处理流程
//! - `PaperFlow` - 摘要阶段编排（元数据 → 翻译 → 工件 → 记录）
//! - `FullTranslator` - 全文翻译外层边界（沙箱调用 + 结果哨兵协议）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 周期流水线，串行 + 逐单元检查点
//! - `orchestrator/submit_queue` - 手动提交队列，单工作任务排空
//!
//! 另有贯穿各层的 `store/`（检查点存储）、`models/`（数据模型）与
//! 容器内运行的 `driver/`（全文翻译驱动，编译为独立二进制）。

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use infrastructure::{CompilationSandbox, DockerSandbox};
pub use models::{Job, JobStatus, Mode, PaperIndex, PaperRecord, PeriodKey};
pub use orchestrator::{Pipeline, SubmitQueue};
pub use store::CheckpointStore;
pub use workflow::{FullTranslator, PaperFlow};
