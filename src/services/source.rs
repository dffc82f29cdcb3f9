//! 上游文献库的能力接口
//!
//! 两个接口都不返回错误：实现方自行记录失败并返回空列表，
//! 抓取流程把"上游失败"和"没有结果"视为同一种情况。

use async_trait::async_trait;

use crate::models::{ArticleDetail, QueryTerm, RecordId};

/// 搜索能力：查询词 → 按时间倒序的候选 ID
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search(&self, query: &QueryTerm, max_results: usize) -> Vec<RecordId>;
}

/// 详情能力：一批 ID → 解析后的文章详情
///
/// 整批一起成功或一起失败；返回的文章数可能少于请求的 ID 数。
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_details(&self, ids: &[RecordId]) -> Vec<ArticleDetail>;
}
