//! 语音合成服务 - 业务能力层
//!
//! 把语音稿交给 OpenAI 兼容的 `/audio/speech` 接口，结果写成 mp3 文件。
//! 合成失败只记录日志，不影响账本和其他文章。

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 语音合成能力（尽力而为）
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn synthesize(&self, text: &str, output_path: &Path);
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// 语音合成服务
pub struct NarrationService {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
}

impl NarrationService {
    /// 创建新的语音合成服务
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AppError::api_request_failed("http-client", e))?;

        Ok(Self {
            http,
            endpoint: format!("{}/audio/speech", config.tts_api_base_url.trim_end_matches('/')),
            api_key: config.tts_api_key.clone(),
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
        })
    }

    /// 合成语音并写入文件
    pub async fn try_synthesize(&self, text: &str, output_path: &Path) -> AppResult<()> {
        debug!("语音合成: {} 字符 → {}", text.chars().count(), output_path.display());

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api_bad_status(&self.endpoint, status.as_u16()));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(&self.endpoint, e))?;

        let write_failed = |e| AppError::file_write_failed(output_path.display().to_string(), e);
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }
        fs::write(output_path, &audio).await.map_err(write_failed)?;

        Ok(())
    }
}

#[async_trait]
impl Narrator for NarrationService {
    async fn synthesize(&self, text: &str, output_path: &Path) {
        match self.try_synthesize(text, output_path).await {
            Ok(()) => info!("🔊 语音文件已生成: {}", output_path.display()),
            Err(e) => warn!("⚠️ 语音生成失败 ({}): {}", output_path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_built_from_base_url() {
        let config = Config {
            tts_api_base_url: "https://tts.example.org/v1/".to_string(),
            ..Config::default()
        };
        let service = NarrationService::new(&config).unwrap();
        assert_eq!(service.endpoint, "https://tts.example.org/v1/audio/speech");
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(SpeechRequest {
            model: "tts-1",
            input: "你好",
            voice: "alloy",
            response_format: "mp3",
        })
        .unwrap();
        assert_eq!(body["input"], "你好");
        assert_eq!(body["response_format"], "mp3");
    }
}
