//! 新闻日志写入服务 - 业务能力层
//!
//! 只负责"往 news.jsonl 追加一行"能力，不关心流程

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::NewsEntry;

/// 新闻日志写入服务
///
/// 职责：
/// - 每篇文章写一行完整的 JSON
/// - 只追加，不修改已有内容
pub struct NewsWriter {
    news_path: PathBuf,
}

impl NewsWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            news_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.news_path
    }

    /// 追加一条记录
    pub async fn append(&self, entry: &NewsEntry) -> AppResult<()> {
        debug!("写入 news.jsonl: PMID {}", entry.record.id);

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let write_failed = |e| AppError::file_write_failed(self.news_path.display().to_string(), e);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.news_path)
            .await
            .map_err(write_failed)?;

        file.write_all(line.as_bytes()).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleRecord, RecordId, Translation};

    fn entry(id: &str) -> NewsEntry {
        NewsEntry {
            record: ArticleRecord {
                query: "cancer treatment".to_string(),
                id: RecordId::from(id),
                url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
                title: "Title".to_string(),
                summary: "Summary".to_string(),
                authors: vec!["Lee J".to_string()],
                published_date: "2023-05-14".to_string(),
                journal: None,
                doi: Some("10.1/x".to_string()),
                source: "PubMed".to_string(),
            },
            translation: Translation {
                title_zh: "標題".to_string(),
                summary_zh: "摘要".to_string(),
                applications: vec!["一".into(), "二".into(), "三".into()],
            },
            audio: format!("audios/{}.mp3", id),
            timestamp: "2024-01-01T08:00:00+08:00".to_string(),
        }
    }

    #[tokio::test]
    async fn appends_one_flat_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let writer = NewsWriter::with_path(dir.path().join("news.jsonl"));

        writer.append(&entry("1")).await.unwrap();
        writer.append(&entry("2")).await.unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "1");
        assert_eq!(first["title_zh"], "標題");
        assert_eq!(first["audio"], "audios/1.mp3");
        assert!(first["journal"].is_null());
        assert_eq!(first["applications"].as_array().unwrap().len(), 3);
        // 非 ASCII 字符原样写入
        assert!(lines[0].contains("標題"));
    }
}
