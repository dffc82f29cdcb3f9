/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::QueryTerm;

/// 初始化 tracing 输出
///
/// 默认级别为 info，可以用 `RUST_LOG` 覆盖；`verbose` 为 true 时本 crate 输出 debug 日志
pub fn init(verbose: bool) {
    let default_directive = if verbose { "pubmed_news=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, query_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PubMed 语音新闻更新");
    info!("📋 查询数: {}，每个查询抓取 {} 篇", query_count, config.articles_per_query);
    info!("📒 账本文件: {}", config.ledger_path);
    info!("{}", "=".repeat(60));
}

/// 记录查询开始信息
///
/// # 参数
/// - `index`: 查询编号（从 1 开始）
/// - `total`: 查询总数
/// - `query`: 查询词
pub fn log_query_start(index: usize, total: usize, query: &QueryTerm) {
    info!("\n{}", "=".repeat(60));
    info!("📦 正在处理查询 {}/{}: {}", index, total, query);
    info!("{}", "=".repeat(60));
}

/// 记录文章加工开始信息
pub fn log_article_start(index: usize, total: usize, title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📰 正在处理第 {}/{} 篇文章: {}", index, total, truncate_text(title, 80));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `news_path`: news.jsonl 路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, news_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n记录已追加至: {}", news_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
