//! 已处理 ID 账本
//!
//! 账本文件每行一个 PMID。每次保存都整体重写文件，所以保存前内存中的集合必须
//! 已经包含所有历史 ID。账本只增不减，也不做并发写保护：同一时间只允许一个进程运行。

use crate::error::{AppError, AppResult};
use crate::models::RecordId;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 内存中的已处理 ID 集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenIds(BTreeSet<RecordId>);

impl SeenIds {
    pub fn contains(&self, id: &RecordId) -> bool {
        self.0.contains(id)
    }

    /// 返回该 ID 此前是否不存在
    pub fn insert(&mut self, id: RecordId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.0.iter()
    }
}

impl FromIterator<RecordId> for SeenIds {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 账本文件
#[derive(Debug, Clone)]
pub struct DedupLedger {
    path: PathBuf,
}

impl DedupLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取账本；文件不存在时视为没有历史记录
    pub async fn load(&self) -> AppResult<SeenIds> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let ids = parse_ledger(&content);
                debug!("账本 {} 中有 {} 个已处理 ID", self.path.display(), ids.len());
                Ok(ids)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("账本 {} 不存在，从空集合开始", self.path.display());
                Ok(SeenIds::default())
            }
            Err(e) => Err(AppError::file_read_failed(self.path.display().to_string(), e)),
        }
    }

    /// 用完整集合覆盖账本
    ///
    /// 先写临时文件再改名，写入中途崩溃时旧账本保持完整
    pub async fn save(&self, ids: &SeenIds) -> AppResult<()> {
        let write_failed = |e| AppError::file_write_failed(self.path.display().to_string(), e);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let mut content = ids
            .iter()
            .map(RecordId::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let tmp_path = self.temp_path();
        fs::write(&tmp_path, content).await.map_err(write_failed)?;
        fs::rename(&tmp_path, &self.path).await.map_err(write_failed)?;

        debug!("账本已保存: {} 个 ID", ids.len());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn parse_ledger(content: &str) -> SeenIds {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RecordId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DedupLedger::new(dir.path().join("processed_ids.txt"));
        assert!(ledger.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_rewrites_whole_set() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DedupLedger::new(dir.path().join("state").join("processed_ids.txt"));

        let mut ids: SeenIds = ["222", "111"].into_iter().map(RecordId::from).collect();
        ledger.save(&ids).await.unwrap();

        ids.insert(RecordId::from("333"));
        ledger.save(&ids).await.unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "111\n222\n333\n");
        assert_eq!(ledger.load().await.unwrap(), ids);
        assert!(!ledger.temp_path().exists());
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let ids = parse_ledger("111\r\n\n  222 \n");
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&RecordId::from("222")));
    }
}
