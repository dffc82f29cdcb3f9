use serde::{Deserialize, Serialize};

use crate::models::ArticleRecord;

/// 每篇文章固定生成的应用场景数量
pub const APPLICATION_COUNT: usize = 3;

/// 翻译与摘要结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// 翻译后的标题
    pub title_zh: String,
    /// 适合收听的精简摘要
    pub summary_zh: String,
    /// 三个应用场景
    pub applications: Vec<String>,
}

impl Translation {
    /// 翻译失败时的占位结果
    pub fn placeholder(title: &str, reason: &str) -> Self {
        Self {
            title_zh: format!("[翻譯失敗] {}", title),
            summary_zh: format!("摘要翻譯失敗：{}", reason),
            applications: (1..=APPLICATION_COUNT)
                .map(|i| format!("應用場景{}：翻譯失敗", i))
                .collect(),
        }
    }

    /// 保证恰好有三个应用场景
    pub fn normalized(mut self) -> Self {
        self.applications.retain(|a| !a.trim().is_empty());
        self.applications.truncate(APPLICATION_COUNT);
        while self.applications.len() < APPLICATION_COUNT {
            self.applications.push("（無）".to_string());
        }
        self
    }

    /// 语音稿：标题、摘要和三个应用场景
    pub fn narration_text(&self) -> String {
        let ordinals = ["第一", "第二", "第三"];
        let mut text = format!(
            "{}\n\n{}\n\n這項研究的應用場景：\n",
            self.title_zh, self.summary_zh
        );
        for (ordinal, application) in ordinals.iter().zip(&self.applications) {
            text.push_str(&format!("{}，{}\n", ordinal, application));
        }
        text.push('\n');
        text
    }
}

/// `news.jsonl` 中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEntry {
    #[serde(flatten)]
    pub record: ArticleRecord,
    #[serde(flatten)]
    pub translation: Translation,
    /// 语音文件路径
    pub audio: String,
    /// 处理时间
    pub timestamp: String,
}
