//! 翻译摘要服务 - 业务能力层
//!
//! 只负责"把一篇英文文章变成中文语音稿素材"，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::Translation;

/// 翻译与摘要能力
///
/// 永远返回一个可用的结果：调用失败时返回占位翻译，不向上传播错误
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn translate_and_summarize(&self, title: &str, abstract_text: &str) -> Translation;
}

/// 基于 LLM 的翻译摘要服务
pub struct SummarizeService {
    client: Client<OpenAIConfig>,
    model_name: String,
    target_language: String,
}

impl SummarizeService {
    /// 创建新的翻译摘要服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            target_language: config.target_language.clone(),
        }
    }

    /// 调用 LLM 并解析结构化结果
    pub async fn try_translate(&self, title: &str, abstract_text: &str) -> AppResult<Translation> {
        let (user_message, system_message) = self.build_messages(title, abstract_text);
        let response = self.send_to_llm(&user_message, &system_message).await?;
        parse_translation(&response)
    }

    /// 通用的 LLM 调用
    async fn send_to_llm(&self, user_message: &str, system_message: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let llm_failed = |e| AppError::llm_api_failed(&self.model_name, e);

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_message)
                    .build()
                    .map_err(llm_failed)?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()
                    .map_err(llm_failed)?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(2000u32)
            .build()
            .map_err(llm_failed)?;

        let response = self.client.chat().create(request).await.map_err(llm_failed)?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    /// 返回 (user_message, system_message)
    fn build_messages(&self, title: &str, abstract_text: &str) -> (String, String) {
        let system_message = format!(
            "你是一位生醫新聞編輯，負責把英文研究摘要改寫成{}的廣播稿素材。\
             只輸出 JSON 物件，不要輸出其他文字。",
            self.target_language
        );

        let user_message = format!(
            "請將以下生醫研究文章標題與摘要翻譯成{lang}，並完成以下任務：\n\
             1. 將摘要濃縮成適合收聽且簡明扼要的{lang}摘要（約100-150字）。\n\
             2. 設想3個應用場景，用簡單易懂的口語描述，讓一般人能理解這項研究的價值。\n\
             請以 JSON 回覆，格式為 {{\"title_zh\": \"...\", \"summary_zh\": \"...\", \"applications\": [\"...\", \"...\", \"...\"]}}\n\
             英文標題：{title}\n\
             英文摘要：{abstract_text}\n",
            lang = self.target_language,
            title = title,
            abstract_text = abstract_text,
        );

        (user_message, system_message)
    }
}

#[async_trait]
impl Summarizer for SummarizeService {
    async fn translate_and_summarize(&self, title: &str, abstract_text: &str) -> Translation {
        match self.try_translate(title, abstract_text).await {
            Ok(translation) => translation,
            Err(e) => {
                warn!("⚠️ 翻译过程中发生错误: {}", e);
                Translation::placeholder(title, &e.to_string())
            }
        }
    }
}

/// 解析 LLM 返回的 JSON，容忍外层的 Markdown 代码块
fn parse_translation(response: &str) -> AppResult<Translation> {
    let json = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response,
    };
    let translation: Translation = serde_json::from_str(json)
        .map_err(|source| AppError::Llm(LlmError::MalformedOutput { source }))?;
    Ok(translation.normalized())
}
