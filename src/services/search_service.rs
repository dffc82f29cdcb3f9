/// 文献搜索服务
///
/// 负责把查询词翻译成上游检索式并调用 ESearch，失败时记录日志并返回空列表
use crate::clients::EutilsClient;
use crate::models::{QueryTerm, RecordId};
use crate::services::source::SearchSource;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// 不带关键词时使用的检索式，匹配 PubMed 收录的全部文章
pub const LATEST_SEARCH_EXPRESSION: &str = "pubmed[sb]";

/// 查询词对应的上游检索式
pub fn search_expression(query: &QueryTerm) -> &str {
    match query {
        QueryTerm::Keyword(text) => text,
        QueryTerm::Latest => LATEST_SEARCH_EXPRESSION,
    }
}

/// 搜索服务
pub struct SearchService {
    client: Arc<EutilsClient>,
}

impl SearchService {
    /// 创建新的搜索服务
    pub fn new(client: Arc<EutilsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchSource for SearchService {
    async fn search(&self, query: &QueryTerm, max_results: usize) -> Vec<RecordId> {
        let term = search_expression(query);
        info!("🔍 ESearch 搜索 {}，最多 {} 条", query, max_results);

        match self.client.esearch(term, max_results).await {
            Ok(ids) => {
                if ids.is_empty() {
                    info!("ESearch 未找到任何 PMID (检索式: '{}')", term);
                } else {
                    info!("ESearch 找到 {} 个 PMID", ids.len());
                }
                ids
            }
            Err(e) => {
                warn!("⚠️ ESearch 请求失败 (检索式: '{}'): {}", term, e);
                Vec::new()
            }
        }
    }
}
