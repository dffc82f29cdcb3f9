//! # PubMed News
//!
//! 定期从 PubMed 抓取新发表的文章，翻译成中文摘要并生成语音新闻
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - E-utilities HTTP 客户端（ESearch / EFetch）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只负责一种能力
//! - `SearchService` / `DetailService` - 搜索 PMID、批量取详情
//! - `DedupLedger` - 已处理 PMID 账本
//! - `SummarizeService` / `NarrationService` / `NewsWriter` - 翻译、语音、写日志
//!
//! ### ③ 流程层（Workflow）
//! - `FetchPipeline` - 搜索 → 去重 → 取详情 → 校验 → 更新账本
//! - `ArticleFlow` - 单篇文章：翻译 → 语音 → 追加 news.jsonl
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 初始化依赖，跑完一轮所有查询词并汇总统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod parsers;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, PipelineSettings};
pub use error::{AppError, AppResult};
pub use models::{ArticleDetail, ArticleRecord, NewsEntry, QueryTerm, RecordId};
pub use orchestrator::App;
pub use services::{DedupLedger, DetailSource, SearchSource, SeenIds};
pub use workflow::{ArticleFlow, FetchPipeline};
