/// NCBI E-utilities 客户端
///
/// 封装 ESearch / EFetch 两个接口的 HTTP 调用，不做任何容错：
/// 网络错误、非 2xx 状态码和格式错误都以 `AppError` 返回，由上层决定如何处理。
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::RecordId;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const ESEARCH: &str = "esearch.fcgi";
const EFETCH: &str = "efetch.fcgi";
const DATABASE: &str = "pubmed";

/// ESearch JSON 响应中我们关心的部分
#[derive(Debug, Default, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// E-utilities 客户端
pub struct EutilsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EutilsClient {
    /// 创建新的 E-utilities 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("pubmed_news/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::api_request_failed("http-client", e))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.eutils_base_url),
            api_key: config.ncbi_api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// 按发表时间倒序搜索，返回 PMID 列表
    ///
    /// # 参数
    /// - `term`: 发给上游的检索式
    /// - `retmax`: 最多返回的 ID 数
    pub async fn esearch(&self, term: &str, retmax: usize) -> AppResult<Vec<RecordId>> {
        let params = self.search_params(term, retmax);
        let body = self.get_text(ESEARCH, &params).await?;
        let ids = parse_search_response(&body)?;
        debug!("ESearch 返回 {} 个 PMID (检索式: '{}')", ids.len(), term);
        Ok(ids)
    }

    /// 一次请求取回多篇文章的 XML 文档
    pub async fn efetch(&self, ids: &[RecordId]) -> AppResult<String> {
        let params = self.fetch_params(ids);
        self.get_text(EFETCH, &params).await
    }

    fn search_params(&self, term: &str, retmax: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", DATABASE.to_string()),
            ("term", term.to_string()),
            ("retmode", "json".to_string()),
            ("retmax", retmax.to_string()),
            ("sort", "date".to_string()),
        ];
        self.push_api_key(&mut params);
        params
    }

    fn fetch_params(&self, ids: &[RecordId]) -> Vec<(&'static str, String)> {
        let joined = ids
            .iter()
            .map(RecordId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut params = vec![
            ("db", DATABASE.to_string()),
            ("id", joined),
            ("retmode", "xml".to_string()),
            ("rettype", "abstract".to_string()),
        ];
        self.push_api_key(&mut params);
        params
    }

    fn push_api_key(&self, params: &mut Vec<(&'static str, String)>) {
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
    }

    async fn get_text(&self, endpoint: &str, params: &[(&'static str, String)]) -> AppResult<String> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api_bad_status(endpoint, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))
    }
}

/// 解析 ESearch 的 JSON 响应，缺失字段视为空列表
fn parse_search_response(body: &str) -> AppResult<Vec<RecordId>> {
    let response: ESearchResponse = serde_json::from_str(body)?;
    Ok(response
        .esearchresult
        .idlist
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(RecordId::new)
        .collect())
}

fn normalize_base_url(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> EutilsClient {
        let config = Config {
            eutils_base_url: "https://example.org/eutils".to_string(),
            ncbi_api_key: api_key.map(str::to_string),
            ..Config::default()
        };
        EutilsClient::new(&config).unwrap()
    }

    #[test]
    fn search_params_sort_by_date_and_carry_api_key() {
        let params = client(Some("secret")).search_params("machine learning", 16);
        assert!(params.contains(&("term", "machine learning".to_string())));
        assert!(params.contains(&("retmax", "16".to_string())));
        assert!(params.contains(&("sort", "date".to_string())));
        assert!(params.contains(&("retmode", "json".to_string())));
        assert!(params.contains(&("api_key", "secret".to_string())));

        let params = client(Some("")).search_params("x", 1);
        assert!(params.iter().all(|(k, _)| *k != "api_key"));
    }

    #[test]
    fn fetch_params_join_ids() {
        let ids = vec![RecordId::from("111"), RecordId::from("222")];
        let params = client(None).fetch_params(&ids);
        assert!(params.contains(&("id", "111,222".to_string())));
        assert!(params.contains(&("rettype", "abstract".to_string())));
        assert!(params.contains(&("retmode", "xml".to_string())));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(client(None).base_url, "https://example.org/eutils/");
    }

    #[test]
    fn search_response_parsing() {
        let body = r#"{"header":{"type":"esearch"},"esearchresult":{"count":"2","idlist":["111","222"]}}"#;
        let ids = parse_search_response(body).unwrap();
        assert_eq!(ids, vec![RecordId::from("111"), RecordId::from("222")]);

        assert!(parse_search_response(r#"{"esearchresult":{}}"#).unwrap().is_empty());
        assert!(parse_search_response("<html>busy</html>").is_err());
    }
}
