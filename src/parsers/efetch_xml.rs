//! EFetch (`rettype=abstract`, `retmode=xml`) 文档解析
//!
//! 基于 quick-xml 的流式解析。每个 `PubmedArticle` 生成一条 `ArticleDetail`，
//! 缺失的子字段用占位值补齐；文档本身不合法时整批失败。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::article::{NO_ABSTRACT, UNKNOWN, UNTITLED};
use crate::models::published_date::{DateSources, HistoryDate, RawDate};
use crate::models::{ArticleDetail, DateResolverChain, RecordId};

type XmlReader<'a> = Reader<&'a [u8]>;
type ParseResult<T> = Result<T, ParseError>;

/// 解析过程中的中间结果
#[derive(Debug, Default)]
struct RawArticle {
    pmid: Option<String>,
    title: Option<String>,
    abstract_parts: Vec<String>,
    authors: Vec<String>,
    journal: Option<String>,
    doi: Option<String>,
    dates: DateSources,
}

impl RawArticle {
    fn into_detail(self, dates: &DateResolverChain) -> Option<ArticleDetail> {
        let pmid = self.pmid.filter(|p| !p.is_empty())?;

        let abstract_text = if self.abstract_parts.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            self.abstract_parts.join("\n")
        };

        let authors = if self.authors.is_empty() {
            vec![UNKNOWN.to_string()]
        } else {
            self.authors
        };

        Some(ArticleDetail {
            id: RecordId::new(pmid),
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            abstract_text,
            authors,
            published_date: dates.resolve(&self.dates),
            journal: self.journal.filter(|j| !j.is_empty()),
            doi: self.doi.filter(|d| !d.is_empty()),
        })
    }
}

/// 解析整份 `PubmedArticleSet` 文档
pub fn parse_article_set(xml: &str) -> ParseResult<Vec<ArticleDetail>> {
    let dates = DateResolverChain::standard();
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubmedArticle" => {
                let raw = parse_pubmed_article(&mut reader)?;
                match raw.into_detail(&dates) {
                    Some(detail) => {
                        debug!("解析文章 PMID {}", detail.id);
                        articles.push(detail);
                    }
                    None => warn!("EFetch 文档中有文章缺少 PMID，已跳过"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}

fn parse_pubmed_article(reader: &mut XmlReader) -> ParseResult<RawArticle> {
    let mut article = RawArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut article)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut article)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "PubmedArticle" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}

fn parse_medline_citation(reader: &mut XmlReader, article: &mut RawArticle) -> ParseResult<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                // 评论/勘误列表中也有 PMID，只取第一个
                b"PMID" if article.pmid.is_none() => {
                    article.pmid = Some(read_text(reader)?.trim().to_string());
                }
                b"Article" => parse_article_element(reader, article)?,
                b"CommentsCorrectionsList" => skip_element(reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "MedlineCitation" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut XmlReader, article: &mut RawArticle) -> ParseResult<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ArticleTitle" => article.title = Some(read_text(reader)?.trim().to_string()),
                b"Abstract" => article.abstract_parts = parse_abstract(reader)?,
                b"AuthorList" => article.authors = parse_author_list(reader)?,
                b"Journal" => parse_journal(reader, article)?,
                b"ELocationID" => {
                    let is_doi = attr_value(&e, b"EIdType").as_deref() == Some("doi");
                    let value = read_text(reader)?.trim().to_string();
                    if is_doi && article.doi.is_none() {
                        article.doi = Some(value);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "Article" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// 摘要可能分为多个带标签的段落，例如 `BACKGROUND: ...`
fn parse_abstract(reader: &mut XmlReader) -> ParseResult<Vec<String>> {
    let mut parts = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"AbstractText" => {
                let label = attr_value(&e, b"Label").filter(|l| !l.trim().is_empty());
                if let Some(text) = non_empty(read_text(reader)?) {
                    parts.push(match label {
                        Some(label) => format!("{}: {}", label.trim(), text),
                        None => text,
                    });
                }
            }
            Event::End(e) if e.name().as_ref() == b"Abstract" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "Abstract" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(parts)
}

fn parse_author_list(reader: &mut XmlReader) -> ParseResult<Vec<String>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                if let Some(name) = parse_author(reader)? {
                    authors.push(name);
                }
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "AuthorList" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut XmlReader) -> ParseResult<Option<String>> {
    let mut last_name = None;
    let mut fore_name = None;
    let mut initials = None;
    let mut collective_name = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => last_name = non_empty(read_text(reader)?),
                b"ForeName" => fore_name = non_empty(read_text(reader)?),
                b"Initials" => initials = non_empty(read_text(reader)?),
                b"CollectiveName" => collective_name = non_empty(read_text(reader)?),
                b"AffiliationInfo" | b"Identifier" => skip_element(reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "Author" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(display_name(last_name, fore_name.or(initials), collective_name))
}

/// 姓在前、名（或缩写）在后；没有个人姓名时使用团体作者名
fn display_name(
    last_name: Option<String>,
    given: Option<String>,
    collective_name: Option<String>,
) -> Option<String> {
    let parts: Vec<String> = [last_name, given].into_iter().flatten().collect();
    if parts.is_empty() {
        collective_name
    } else {
        Some(parts.join(" "))
    }
}

fn parse_journal(reader: &mut XmlReader, article: &mut RawArticle) -> ParseResult<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Title" => article.journal = non_empty(read_text(reader)?),
                b"PubDate" => article.dates.pub_date = read_date(reader, b"PubDate")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "Journal" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pubmed_data(reader: &mut XmlReader, article: &mut RawArticle) -> ParseResult<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"History" => article.dates.history = parse_history(reader)?,
                b"ArticleIdList" => {
                    let doi = parse_article_ids(reader)?;
                    if article.doi.is_none() {
                        article.doi = doi;
                    }
                }
                // 参考文献里的 ArticleIdList 属于被引文章
                b"ReferenceList" => skip_element(reader)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "PubmedData" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_history(reader: &mut XmlReader) -> ParseResult<Vec<HistoryDate>> {
    let mut history = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PubMedPubDate" => {
                let status = attr_value(&e, b"PubStatus").unwrap_or_default();
                let date = read_date(reader, b"PubMedPubDate")?;
                history.push(HistoryDate { status, date });
            }
            Event::End(e) if e.name().as_ref() == b"History" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "History" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(history)
}

fn parse_article_ids(reader: &mut XmlReader) -> ParseResult<Option<String>> {
    let mut doi = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let is_doi = attr_value(&e, b"IdType").as_deref() == Some("doi");
                let value = non_empty(read_text(reader)?);
                if is_doi && doi.is_none() {
                    doi = value;
                }
            }
            Event::End(e) if e.name().as_ref() == b"ArticleIdList" => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "ArticleIdList" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(doi)
}

/// 读取 Year / Month / Day / MedlineDate 子节点
fn read_date(reader: &mut XmlReader, end_tag: &[u8]) -> ParseResult<RawDate> {
    let mut date = RawDate::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = non_empty(read_text(reader)?),
                b"Month" => date.month = non_empty(read_text(reader)?),
                b"Day" => date.day = non_empty(read_text(reader)?),
                b"MedlineDate" => date.medline_date = non_empty(read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == end_tag => break,
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "date" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(date)
}

/// 读取当前元素的全部文本，包括嵌套的行内标签（如 `<i>`、`<sup>`）
fn read_text(reader: &mut XmlReader) -> ParseResult<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "text" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// 跳过当前元素的整个子树
fn skip_element(reader: &mut XmlReader) -> ParseResult<()> {
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(ParseError::UnexpectedEof { element: "element" }),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn attr_value(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="PubMed-not-MEDLINE" Owner="NLM">
      <PMID Version="1">38000001</PMID>
      <Article PubModel="Print-Electronic">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <Volume>12</Volume>
            <PubDate>
              <Year>2023</Year>
            </PubDate>
          </JournalIssue>
          <Title>Journal of Clinical Informatics</Title>
        </Journal>
        <ArticleTitle>Effects of <i>KRAS</i> inhibition &amp; glucose control.</ArticleTitle>
        <ELocationID EIdType="doi" ValidYN="Y">10.1000/jci.2023.001</ELocationID>
        <Abstract>
          <AbstractText Label="BACKGROUND" NlmCategory="BACKGROUND">Diabetes is common.</AbstractText>
          <AbstractText Label="METHODS">We studied <sup>2</sup> cohorts.</AbstractText>
          <AbstractText Label="EMPTY"></AbstractText>
          <CopyrightInformation>Copyright 2023.</CopyrightInformation>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y">
            <LastName>Smith</LastName>
            <ForeName>Anna</ForeName>
            <Initials>A</Initials>
            <AffiliationInfo><Affiliation>Somewhere University.</Affiliation></AffiliationInfo>
          </Author>
          <Author ValidYN="Y">
            <LastName>Lee</LastName>
            <Initials>J</Initials>
          </Author>
          <Author ValidYN="Y">
            <AffiliationInfo><Affiliation>Nameless Institute.</Affiliation></AffiliationInfo>
          </Author>
          <Author ValidYN="Y">
            <CollectiveName>Diabetes Study Group</CollectiveName>
          </Author>
        </AuthorList>
      </Article>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="CommentIn">
          <RefSource>Other J. 2023.</RefSource>
          <PMID Version="1">37999999</PMID>
        </CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
    <PubmedData>
      <History>
        <PubMedPubDate PubStatus="received"><Year>2023</Year><Month>1</Month><Day>3</Day></PubMedPubDate>
        <PubMedPubDate PubStatus="pubmed"><Year>2023</Year><Month>5</Month><Day>14</Day></PubMedPubDate>
        <PubMedPubDate PubStatus="medline"><Year>2023</Year><Month>5</Month><Day>15</Day></PubMedPubDate>
      </History>
      <ArticleIdList>
        <ArticleId IdType="pubmed">38000001</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">38000002</PMID>
      <Article>
        <Journal>
          <JournalIssue>
            <PubDate><Year>2024</Year><Month>Feb</Month><Day>07</Day></PubDate>
          </JournalIssue>
        </Journal>
        <AuthorList>
          <Author><ForeName>Ghost</ForeName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="doi">10.1000/own.doi</ArticleId>
      </ArticleIdList>
      <ReferenceList>
        <Reference>
          <Citation>Someone else.</Citation>
          <ArticleIdList><ArticleId IdType="doi">10.1000/cited.doi</ArticleId></ArticleIdList>
        </Reference>
      </ReferenceList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parse_full_article() {
        let articles = parse_article_set(SAMPLE_XML).unwrap();
        assert_eq!(articles.len(), 2);

        let article = &articles[0];
        assert_eq!(article.id.as_str(), "38000001");
        assert_eq!(article.title, "Effects of KRAS inhibition & glucose control.");
        assert_eq!(
            article.abstract_text,
            "BACKGROUND: Diabetes is common.\nMETHODS: We studied 2 cohorts."
        );
        assert_eq!(article.journal.as_deref(), Some("Journal of Clinical Informatics"));
        assert_eq!(article.doi.as_deref(), Some("10.1000/jci.2023.001"));
    }

    #[test]
    fn authors_fall_back_to_initials_and_skip_nameless_entries() {
        let articles = parse_article_set(SAMPLE_XML).unwrap();
        assert_eq!(
            articles[0].authors,
            vec!["Smith Anna", "Lee J", "Diabetes Study Group"]
        );
        assert_eq!(articles[1].authors, vec!["Ghost"]);
    }

    #[test]
    fn year_only_pub_date_is_upgraded_from_history() {
        let articles = parse_article_set(SAMPLE_XML).unwrap();
        let date = articles[0].published_date.unwrap();
        assert_eq!(date.to_string(), "2023-05-14");

        let date = articles[1].published_date.unwrap();
        assert_eq!(date.to_string(), "2024-02-07");
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let articles = parse_article_set(SAMPLE_XML).unwrap();
        let article = &articles[1];
        assert_eq!(article.title, UNTITLED);
        assert_eq!(article.abstract_text, NO_ABSTRACT);
        assert!(article.journal.is_none());
        // 不取参考文献的 DOI
        assert_eq!(article.doi.as_deref(), Some("10.1000/own.doi"));
    }

    #[test]
    fn article_without_authors_or_pmid() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation><Article><ArticleTitle>No id</ArticleTitle></Article></MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation><PMID>42</PMID><Article><ArticleTitle>  </ArticleTitle>
      <Abstract><AbstractText>Plain abstract.</AbstractText></Abstract></Article></MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;
        let articles = parse_article_set(xml).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id.as_str(), "42");
        assert_eq!(articles[0].title, UNTITLED);
        assert_eq!(articles[0].abstract_text, "Plain abstract.");
        assert_eq!(articles[0].authors, vec![UNKNOWN]);
        assert!(articles[0].published_date.is_none());
    }

    #[test]
    fn malformed_document_fails_whole_batch() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</PMID></Article></PubmedArticle>";
        assert!(parse_article_set(xml).is_err());
    }

    #[test]
    fn truncated_document_fails_whole_batch() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>42</PMID>\
                   <Article><Abstract><AbstractText>Short start";
        assert!(parse_article_set(xml).is_err());

        // 完整的文章之后被截断，同样整批失败
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</PMID>\
                   </MedlineCitation></PubmedArticle><PubmedArticle><MedlineCitation>";
        assert!(parse_article_set(xml).is_err());
    }

    #[test]
    fn empty_document_yields_no_articles() {
        assert!(parse_article_set("").unwrap().is_empty());
        assert!(parse_article_set("<PubmedArticleSet></PubmedArticleSet>")
            .unwrap()
            .is_empty());
    }
}
