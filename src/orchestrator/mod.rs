//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一轮更新的整体调度，是整个系统的"指挥中心"。
//!
//! ### `app` - 应用主结构
//! - 管理应用生命周期（初始化、运行）
//! - 持有抓取流程和文章加工流程
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理所有查询词和新文章)
//!     ↓
//! workflow::FetchPipeline / workflow::ArticleFlow
//!     ↓
//! services (能力层：search / detail / ledger / summarize / narration / news)
//!     ↓
//! clients (E-utilities HTTP 客户端)
//! ```
//!
//! 本层只做调度和统计，不做具体业务判断。

pub mod app;

pub use app::App;
