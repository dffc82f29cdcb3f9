pub mod detail_service;
pub mod ledger;
pub mod narration_service;
pub mod news_writer;
pub mod search_service;
pub mod source;
pub mod summarize_service;

pub use detail_service::DetailService;
pub use ledger::{DedupLedger, SeenIds};
pub use narration_service::{NarrationService, Narrator};
pub use news_writer::NewsWriter;
pub use search_service::SearchService;
pub use source::{DetailSource, SearchSource};
pub use summarize_service::{SummarizeService, Summarizer};
