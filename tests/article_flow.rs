use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use pubmed_news::models::Translation;
use pubmed_news::services::{Narrator, NewsWriter, Summarizer};
use pubmed_news::{ArticleFlow, ArticleRecord, RecordId};

struct FixedSummarizer;

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn translate_and_summarize(&self, _title: &str, _abstract_text: &str) -> Translation {
        Translation {
            title_zh: "連續血糖監測的效果".to_string(),
            summary_zh: "研究顯示連續血糖監測可改善血糖控制。".to_string(),
            applications: vec!["門診".to_string(), "居家照護".to_string(), "遠距醫療".to_string()],
        }
    }
}

#[derive(Clone, Default)]
struct RecordingNarrator {
    calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

#[async_trait]
impl Narrator for RecordingNarrator {
    async fn synthesize(&self, text: &str, output_path: &Path) {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), output_path.to_path_buf()));
    }
}

fn record() -> ArticleRecord {
    ArticleRecord {
        query: "diabetes management".to_string(),
        id: RecordId::from("111"),
        url: "https://pubmed.ncbi.nlm.nih.gov/111/".to_string(),
        title: "Continuous glucose monitoring".to_string(),
        summary: "A long enough abstract about glucose monitoring in adults.".to_string(),
        authors: vec!["Smith Anna".to_string()],
        published_date: "2023-05-14".to_string(),
        journal: None,
        doi: None,
        source: "PubMed".to_string(),
    }
}

#[tokio::test]
async fn flow_narrates_and_appends_one_json_line() {
    let dir = TempDir::new().unwrap();
    let news_path = dir.path().join("news.jsonl");
    let audio_dir = dir.path().join("audio");
    let narrator = RecordingNarrator::default();
    let flow = ArticleFlow::new(
        FixedSummarizer,
        narrator.clone(),
        NewsWriter::with_path(&news_path),
        &audio_dir,
    );

    let entry = flow.run(&record()).await.unwrap();
    flow.run(&record()).await.unwrap();

    let calls = narrator.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, audio_dir.join("111.mp3"));
    assert!(calls[0].0.starts_with("連續血糖監測的效果\n\n"));
    assert!(calls[0].0.contains("第三，遠距醫療"));

    let content = std::fs::read_to_string(&news_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["id"], "111");
    assert_eq!(value["query"], "diabetes management");
    assert_eq!(value["title_zh"], "連續血糖監測的效果");
    assert_eq!(value["applications"][1], "居家照護");
    assert_eq!(value["audio"], entry.audio);
    assert!(value["journal"].is_null());
}
