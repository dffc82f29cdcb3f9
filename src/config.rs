use crate::error::{AppError, AppResult, FileError};
use crate::models::QueryTerm;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 指定 TOML 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PUBMED_NEWS_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- E-utilities 配置 ---
    pub eutils_base_url: String,
    pub ncbi_api_key: Option<String>,
    /// 关键词查询列表
    pub queries: Vec<String>,
    /// 是否追加一次"最新文章"（不带关键词）查询
    pub include_latest: bool,
    /// 每个查询抓取的新文章数
    pub articles_per_query: usize,
    /// 搜索时额外多取的候选 ID 数
    pub overfetch_margin: usize,
    /// 摘要最少字符数（去除首尾空白后）
    pub min_abstract_chars: usize,
    /// 单次 EFetch 请求允许的最大 ID 数
    pub max_detail_batch: usize,
    /// 搜索与详情请求之间的间隔（毫秒）
    pub detail_delay_ms: u64,
    /// 两个查询之间的间隔（毫秒）
    pub query_delay_ms: u64,
    // --- 持久化路径 ---
    pub ledger_path: String,
    pub news_path: String,
    pub audio_dir: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub target_language: String,
    // --- 语音合成配置 ---
    pub tts_api_base_url: String,
    pub tts_api_key: String,
    pub tts_model: String,
    pub tts_voice: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            eutils_base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/".to_string(),
            ncbi_api_key: None,
            queries: vec![
                "artificial intelligence".to_string(),
                "machine learning".to_string(),
                "deep learning".to_string(),
                "cancer treatment".to_string(),
                "diabetes management".to_string(),
            ],
            include_latest: true,
            articles_per_query: 1,
            overfetch_margin: 15,
            min_abstract_chars: 50,
            max_detail_batch: 200,
            detail_delay_ms: 400,
            query_delay_ms: 1000,
            ledger_path: "processed_ids.txt".to_string(),
            news_path: "news.jsonl".to_string(),
            audio_dir: "audios".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash-001".to_string(),
            target_language: "繁體中文".to_string(),
            tts_api_base_url: "https://api.openai.com/v1".to_string(),
            tts_api_key: String::new(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            verbose_logging: false,
        }
    }
}

/// 抓取流程参数（已校验）
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub articles_per_query: usize,
    pub overfetch_margin: usize,
    pub min_abstract_chars: usize,
    pub detail_delay: Duration,
    pub query_delay: Duration,
}

impl PipelineSettings {
    /// 校验参数并构建
    ///
    /// `articles_per_query` 必须至少为 1，且不能超过单次详情请求的上限
    pub fn new(
        articles_per_query: usize,
        overfetch_margin: usize,
        min_abstract_chars: usize,
        max_detail_batch: usize,
    ) -> AppResult<Self> {
        if articles_per_query == 0 {
            return Err(AppError::invalid_config(
                "articles_per_query",
                articles_per_query,
                "必须大于 0",
            ));
        }
        if articles_per_query > max_detail_batch {
            return Err(AppError::invalid_config(
                "articles_per_query",
                articles_per_query,
                "不能超过 max_detail_batch",
            ));
        }
        Ok(Self {
            articles_per_query,
            overfetch_margin,
            min_abstract_chars,
            detail_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
        })
    }

    /// 设置请求节流间隔
    pub fn with_delays(mut self, detail_delay: Duration, query_delay: Duration) -> Self {
        self.detail_delay = detail_delay;
        self.query_delay = query_delay;
        self
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（如设置了 `PUBMED_NEWS_CONFIG`）→ 环境变量
    pub fn load() -> AppResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Ok(Self::from_toml_file(Path::new(&path))?.with_env_overrides()),
            Err(_) => Ok(Self::from_env()),
        }
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            eutils_base_url: std::env::var("EUTILS_BASE_URL").unwrap_or(base.eutils_base_url),
            ncbi_api_key: std::env::var("NCBI_API_KEY").ok().or(base.ncbi_api_key),
            queries: std::env::var("PUBMED_QUERIES")
                .ok()
                .map(|v| split_queries(&v))
                .unwrap_or(base.queries),
            include_latest: std::env::var("INCLUDE_LATEST").ok().and_then(|v| v.parse().ok()).unwrap_or(base.include_latest),
            articles_per_query: std::env::var("ARTICLES_PER_QUERY").ok().and_then(|v| v.parse().ok()).unwrap_or(base.articles_per_query),
            overfetch_margin: std::env::var("OVERFETCH_MARGIN").ok().and_then(|v| v.parse().ok()).unwrap_or(base.overfetch_margin),
            min_abstract_chars: std::env::var("MIN_ABSTRACT_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.min_abstract_chars),
            max_detail_batch: std::env::var("MAX_DETAIL_BATCH").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_detail_batch),
            detail_delay_ms: std::env::var("DETAIL_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.detail_delay_ms),
            query_delay_ms: std::env::var("QUERY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.query_delay_ms),
            ledger_path: std::env::var("LEDGER_PATH").unwrap_or(base.ledger_path),
            news_path: std::env::var("NEWS_PATH").unwrap_or(base.news_path),
            audio_dir: std::env::var("AUDIO_DIR").unwrap_or(base.audio_dir),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            target_language: std::env::var("TARGET_LANGUAGE").unwrap_or(base.target_language),
            tts_api_base_url: std::env::var("TTS_API_BASE_URL").unwrap_or(base.tts_api_base_url),
            tts_api_key: std::env::var("TTS_API_KEY").unwrap_or(base.tts_api_key),
            tts_model: std::env::var("TTS_MODEL").unwrap_or(base.tts_model),
            tts_voice: std::env::var("TTS_VOICE").unwrap_or(base.tts_voice),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }

    /// 按配置顺序构建查询列表，"最新文章"查询排在最后
    pub fn query_terms(&self) -> Vec<QueryTerm> {
        let mut terms: Vec<QueryTerm> = self
            .queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(|q| QueryTerm::Keyword(q.to_string()))
            .collect();
        if self.include_latest {
            terms.push(QueryTerm::Latest);
        }
        terms
    }

    /// 由配置派生抓取流程参数
    pub fn pipeline_settings(&self) -> AppResult<PipelineSettings> {
        Ok(PipelineSettings::new(
            self.articles_per_query,
            self.overfetch_margin,
            self.min_abstract_chars,
            self.max_detail_batch,
        )?
        .with_delays(
            Duration::from_millis(self.detail_delay_ms),
            Duration::from_millis(self.query_delay_ms),
        ))
    }
}

/// `PUBMED_QUERIES` 以分号分隔
fn split_queries(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}
