pub mod article;
pub mod news;
pub mod published_date;

pub use article::{ArticleDetail, ArticleRecord, QueryTerm, RecordId};
pub use news::{NewsEntry, Translation};
pub use published_date::{DatePrecision, DateResolverChain, DateSources, PartialDate};
