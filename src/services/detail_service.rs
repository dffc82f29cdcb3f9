/// 文章详情服务
///
/// 一次 EFetch 请求取回整批文章并解析；请求或解析失败时整批丢弃
use crate::clients::EutilsClient;
use crate::error::ApiError;
use crate::models::{ArticleDetail, RecordId};
use crate::parsers::parse_article_set;
use crate::services::source::DetailSource;
use crate::utils::logging::truncate_text;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// 详情服务
pub struct DetailService {
    client: Arc<EutilsClient>,
    max_batch: usize,
}

impl DetailService {
    /// 创建新的详情服务
    ///
    /// `max_batch` 为单次请求允许的最大 ID 数
    pub fn new(client: Arc<EutilsClient>, max_batch: usize) -> Self {
        Self { client, max_batch }
    }
}

#[async_trait]
impl DetailSource for DetailService {
    async fn fetch_details(&self, ids: &[RecordId]) -> Vec<ArticleDetail> {
        if ids.is_empty() {
            return Vec::new();
        }
        if ids.len() > self.max_batch {
            let err = ApiError::BatchTooLarge {
                endpoint: "efetch.fcgi".to_string(),
                requested: ids.len(),
                limit: self.max_batch,
            };
            warn!("⚠️ 拒绝发送 EFetch 请求: {}", err);
            return Vec::new();
        }

        info!("📥 EFetch 取得 {} 篇文章的详细信息...", ids.len());

        let xml = match self.client.efetch(ids).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("⚠️ EFetch 请求失败: {}", e);
                return Vec::new();
            }
        };

        parse_batch(&xml)
    }
}

/// 解析一次 EFetch 响应；文档不合法或被截断时整批丢弃
pub fn parse_batch(xml: &str) -> Vec<ArticleDetail> {
    match parse_article_set(xml) {
        Ok(articles) => {
            info!("✓ EFetch 成功解析 {} 篇文章", articles.len());
            articles
        }
        Err(e) => {
            warn!(
                "⚠️ EFetch XML 解析失败: {}\n响应内容: {}",
                e,
                truncate_text(xml, 500)
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn service(base_url: &str, max_batch: usize) -> DetailService {
        let config = Config {
            eutils_base_url: base_url.to_string(),
            ..Config::default()
        };
        DetailService::new(Arc::new(EutilsClient::new(&config).unwrap()), max_batch)
    }

    fn ids(raw: &[&str]) -> Vec<RecordId> {
        raw.iter().map(|id| RecordId::from(*id)).collect()
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_without_request() {
        // 不可路由的地址：如果真的发出请求，测试会等到超时
        let service = service("http://192.0.2.1/eutils/", 2);
        let details = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            service.fetch_details(&ids(&["1", "2", "3"])),
        )
        .await
        .unwrap();
        assert!(details.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_returns_nothing() {
        let service = service("http://192.0.2.1/eutils/", 2);
        assert!(service.fetch_details(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_upstream_yields_empty_batch() {
        // 端口 9 (discard) 在本机通常没有监听，连接会被立即拒绝
        let service = service("http://127.0.0.1:9/eutils/", 200);
        assert!(service.fetch_details(&ids(&["111"])).await.is_empty());
    }

    #[test]
    fn truncated_response_is_dropped_as_a_whole() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>42</PMID>\
                   <Article><Abstract><AbstractText>Short start";
        assert!(parse_batch(xml).is_empty());

        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>42</PMID>\
                   </MedlineCitation></PubmedArticle></PubmedArticleSet>";
        assert_eq!(parse_batch(xml).len(), 1);
    }
}
