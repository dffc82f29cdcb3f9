//! 单篇文章加工流程 - 流程层
//!
//! 流程顺序：翻译摘要 → 生成语音稿 → 语音合成 → 追加 news.jsonl
//!
//! 翻译和语音失败都已在各自服务内降级处理，这里只有写日志文件失败会返回错误。

use std::path::PathBuf;
use tracing::info;

use crate::error::AppResult;
use crate::models::{ArticleRecord, NewsEntry};
use crate::services::{Narrator, NewsWriter, Summarizer};

/// 单篇文章加工流程
pub struct ArticleFlow<T, N> {
    summarizer: T,
    narrator: N,
    writer: NewsWriter,
    audio_dir: PathBuf,
}

impl<T: Summarizer, N: Narrator> ArticleFlow<T, N> {
    pub fn new(summarizer: T, narrator: N, writer: NewsWriter, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            summarizer,
            narrator,
            writer,
            audio_dir: audio_dir.into(),
        }
    }

    pub async fn run(&self, record: &ArticleRecord) -> AppResult<NewsEntry> {
        let translation = self
            .summarizer
            .translate_and_summarize(&record.title, &record.summary)
            .await;
        info!("✓ 翻译完成: {}", translation.title_zh);

        let audio_path = self.audio_dir.join(format!("{}.mp3", record.id));
        self.narrator
            .synthesize(&translation.narration_text(), &audio_path)
            .await;

        let entry = NewsEntry {
            record: record.clone(),
            translation,
            audio: audio_path.display().to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
        };

        self.writer.append(&entry).await?;

        Ok(entry)
    }
}
