//! 应用主流程 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 E-utilities 客户端、各项服务、抓取流程和文章加工流程
//! 2. **抓取新文章**：对所有查询词运行一轮 `FetchPipeline::run_cycle`
//! 3. **逐篇加工**：翻译、生成语音、追加 news.jsonl
//! 4. **全局统计**：汇总成功和失败数量
//!
//! 文章严格按顺序处理，上游限流由抓取流程内部的节流间隔负责。

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use crate::clients::EutilsClient;
use crate::config::Config;
use crate::services::{
    DedupLedger, DetailService, NarrationService, NewsWriter, SearchService, SummarizeService,
};
use crate::utils::logging::{log_article_start, log_startup, print_final_stats};
use crate::workflow::{ArticleFlow, FetchPipeline};

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: FetchPipeline<SearchService, DetailService>,
    flow: ArticleFlow<SummarizeService, NarrationService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let settings = config
            .pipeline_settings()
            .context("抓取参数校验失败")?;

        let client = Arc::new(EutilsClient::new(&config).context("创建 E-utilities 客户端失败")?);
        let pipeline = FetchPipeline::new(
            SearchService::new(client.clone()),
            DetailService::new(client, config.max_detail_batch),
            DedupLedger::new(&config.ledger_path),
            settings,
        );

        tokio::fs::create_dir_all(&config.audio_dir)
            .await
            .with_context(|| format!("无法创建语音目录: {}", config.audio_dir))?;

        let flow = ArticleFlow::new(
            SummarizeService::new(&config),
            NarrationService::new(&config).context("创建语音合成服务失败")?,
            NewsWriter::with_path(&config.news_path),
            &config.audio_dir,
        );

        Ok(Self {
            config,
            pipeline,
            flow,
        })
    }

    /// 运行一轮完整更新
    pub async fn run(&self) -> Result<()> {
        let queries = self.config.query_terms();
        log_startup(&self.config, queries.len());

        let records = self.pipeline.run_cycle(&queries).await;

        if records.is_empty() {
            info!("ℹ️ 本轮没有找到新的文章，程序结束");
            return Ok(());
        }

        let mut stats = ProcessingStats {
            total: records.len(),
            ..Default::default()
        };

        for (idx, record) in records.iter().enumerate() {
            log_article_start(idx + 1, stats.total, &record.title);

            match self.flow.run(record).await {
                Ok(entry) => {
                    info!("✓ PMID {} 已写入 news.jsonl (语音: {})", record.id, entry.audio);
                    stats.success += 1;
                }
                Err(e) => {
                    error!("❌ PMID {} 处理失败: {}", record.id, e);
                    stats.failed += 1;
                }
            }
        }

        print_final_stats(stats.success, stats.failed, stats.total, &self.config.news_path);

        Ok(())
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}
