//! 文章抓取流程 - 流程层
//!
//! 核心职责：决定哪些上游记录是"新的"，并保证每个 PMID 最多被接受一次
//!
//! 单个查询词的流程顺序：
//! 1. 读取账本
//! 2. 搜索（多取 `overfetch_margin` 个候选）
//! 3. 按顺序过滤掉已处理的 ID，取前 N 个
//! 4. 批量取详情
//! 5. 校验摘要，通过的生成 `ArticleRecord`；无论是否通过都记入账本
//! 6. 整体重写账本

use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::PipelineSettings;
use crate::error::AppResult;
use crate::models::{ArticleRecord, QueryTerm, RecordId};
use crate::services::ledger::SeenIds;
use crate::services::{DedupLedger, DetailSource, SearchSource};
use crate::utils::logging::{log_query_start, truncate_text};

/// 抓取流程
///
/// - 不持有任何全局状态，所有依赖通过构造函数传入
/// - 严格顺序执行，一个查询词处理完才开始下一个
pub struct FetchPipeline<S, D> {
    search: S,
    detail: D,
    ledger: DedupLedger,
    settings: PipelineSettings,
}

impl<S: SearchSource, D: DetailSource> FetchPipeline<S, D> {
    /// 创建新的抓取流程
    pub fn new(search: S, detail: D, ledger: DedupLedger, settings: PipelineSettings) -> Self {
        Self {
            search,
            detail,
            ledger,
            settings,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 依次处理所有查询词，汇总新文章
    ///
    /// 某个查询词失败只记录日志，不影响其他查询词
    pub async fn run_cycle(&self, queries: &[QueryTerm]) -> Vec<ArticleRecord> {
        let mut collected = Vec::new();

        for (idx, query) in queries.iter().enumerate() {
            log_query_start(idx + 1, queries.len(), query);

            if idx > 0 {
                pace(self.settings.query_delay).await;
            }

            match self.fetch_new(query, self.settings.articles_per_query).await {
                Ok(records) => {
                    for record in &records {
                        info!(
                            "✓ 已抓取 '{}' (来源: {})",
                            truncate_text(&record.title, 80),
                            query
                        );
                    }
                    collected.extend(records);
                }
                Err(e) => {
                    error!("❌ 查询 {} 处理失败: {}", query, e);
                }
            }
        }

        collected
    }

    /// 为单个查询词抓取最多 `target_count` 篇新文章
    pub async fn fetch_new(
        &self,
        query: &QueryTerm,
        target_count: usize,
    ) -> AppResult<Vec<ArticleRecord>> {
        if target_count == 0 {
            return Ok(Vec::new());
        }

        let mut seen = self.ledger.load().await?;

        let candidates = self
            .search
            .search(query, target_count + self.settings.overfetch_margin)
            .await;

        let batch = select_unseen(&candidates, &seen, target_count);
        if batch.is_empty() {
            info!("没有为查询 {} 找到新的、未处理的 PMID", query);
            return Ok(Vec::new());
        }

        pace(self.settings.detail_delay).await;

        let details = self.detail.fetch_details(&batch).await;
        let requested: HashSet<&RecordId> = batch.iter().collect();

        let mut records = Vec::new();
        for detail in details {
            if !requested.contains(&detail.id) {
                warn!("⚠️ EFetch 返回了未请求的 PMID {}，忽略", detail.id);
                continue;
            }
            if seen.contains(&detail.id) {
                continue;
            }

            if !detail.has_usable_abstract(self.settings.min_abstract_chars) {
                warn!(
                    "⚠️ PMID {} ('{}') 的摘要过短或不存在，跳过",
                    detail.id,
                    truncate_text(&detail.title, 80)
                );
                seen.insert(detail.id);
                continue;
            }

            seen.insert(detail.id.clone());
            records.push(ArticleRecord::from_detail(query, detail));
        }

        self.ledger.save(&seen).await?;

        Ok(records)
    }
}

/// 按搜索结果顺序取前 `limit` 个未处理的 ID，同一响应中的重复 ID 只算一次
pub fn select_unseen(candidates: &[RecordId], seen: &SeenIds, limit: usize) -> Vec<RecordId> {
    let mut picked: Vec<RecordId> = Vec::new();
    for id in candidates {
        if picked.len() >= limit {
            break;
        }
        if seen.contains(id) || picked.contains(id) {
            continue;
        }
        picked.push(id.clone());
    }
    picked
}

/// 固定间隔，遵守上游速率限制
async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
