//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责周期调度和手动提交的执行，是整个系统的"指挥中心"。
//!
//! ### `pipeline` - 周期流水线
//! - 抓取一个周期的候选论文，按榜单顺序串行处理
//! - 每个工作单元之后写检查点（整体重写索引）
//! - 单篇失败隔离在该论文的记录上，不中断周期
//!
//! ### `submit_queue` - 手动提交队列
//! - 并发安全的提交入口（格式校验 + 去重）
//! - 单个后台工作任务串行排空队列
//! - 每个阶段边界更新任务状态，供外部查询实时进度
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (pipeline / submit_queue)
//!     ↓
//! workflow (PaperFlow / FullTranslator)
//!     ↓
//! services (candidates / metadata / translator / page_writer)
//!     ↓
//! infrastructure (CompilationSandbox)
//! ```
//!
//! 两条入口最终都汇入同一套单篇流程与同一个检查点存储。

pub mod pipeline;
pub mod submit_queue;

pub use pipeline::Pipeline;
pub use submit_queue::SubmitQueue;
