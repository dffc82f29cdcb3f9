//! 文章数据模型
//!
//! 上游解析出的原始记录（`ArticleDetail`）与校验后交给下游的记录（`ArticleRecord`）

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::published_date::PartialDate;

/// 缺失标题时的占位
pub const UNTITLED: &str = "Untitled";
/// 缺失摘要时的占位
pub const NO_ABSTRACT: &str = "No abstract available";
/// 无法解析任何作者或日期时的占位
pub const UNKNOWN: &str = "Unknown";
/// 记录来源标签
pub const SOURCE_TAG: &str = "PubMed";
/// "最新文章"查询在记录中显示的来源
pub const LATEST_LABEL: &str = "Latest Articles";

/// 上游记录 ID（PubMed 的 PMID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// 查询词
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    /// 按关键词或短语搜索
    Keyword(String),
    /// 不加关键词，取全库最新文章
    Latest,
}

impl QueryTerm {
    /// 写入记录的来源标签
    pub fn source_label(&self) -> &str {
        match self {
            QueryTerm::Keyword(text) => text,
            QueryTerm::Latest => LATEST_LABEL,
        }
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTerm::Keyword(text) => write!(f, "'{}'", text),
            QueryTerm::Latest => f.write_str("最新文章 (无特定关键词)"),
        }
    }
}

/// 从 EFetch 文档解析出的单篇文章
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDetail {
    pub id: RecordId,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub published_date: Option<PartialDate>,
    pub journal: Option<String>,
    pub doi: Option<String>,
}

impl ArticleDetail {
    /// 摘要是否可用于后续翻译
    ///
    /// 占位摘要或去除首尾空白后不足 `min_chars` 个字符的摘要都不可用
    pub fn has_usable_abstract(&self, min_chars: usize) -> bool {
        self.abstract_text != NO_ABSTRACT && self.abstract_text.trim().chars().count() >= min_chars
    }
}

/// 交给下游处理的文章记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub query: String,
    pub id: RecordId,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published_date: String,
    pub journal: Option<String>,
    pub doi: Option<String>,
    pub source: String,
}

impl ArticleRecord {
    /// 由查询词和已通过校验的详情构建记录
    pub fn from_detail(query: &QueryTerm, detail: ArticleDetail) -> Self {
        Self {
            query: query.source_label().to_string(),
            url: canonical_url(&detail.id),
            published_date: detail
                .published_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            id: detail.id,
            title: detail.title,
            summary: detail.abstract_text,
            authors: detail.authors,
            journal: detail.journal,
            doi: detail.doi,
            source: SOURCE_TAG.to_string(),
        }
    }
}

/// 文章在 PubMed 网站上的地址
pub fn canonical_url(id: &RecordId) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id)
}
