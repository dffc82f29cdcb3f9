pub mod article_flow;
pub mod fetch_pipeline;

pub use article_flow::ArticleFlow;
pub use fetch_pipeline::{select_unseen, FetchPipeline};
