pub mod efetch_xml;

pub use efetch_xml::parse_article_set;
