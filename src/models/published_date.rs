//! 发表日期解析
//!
//! PubMed 记录的日期散落在多个位置，精度也不一致。这里把每个位置包装成一个
//! 独立的解析策略（`DateResolver`），再由 `DateResolverChain` 按优先级组合：
//!
//! 1. 取第一个策略的结果；
//! 2. 结果未精确到日时，继续询问后续策略；
//! 3. 后续结果只有在精度严格更高时才会替换当前结果。

use chrono::NaiveDate;
use phf::phf_map;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `MedlineDate` 中的四位年份
static LEADING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("年份正则无效"));

/// 月份缩写 → 数字
static MONTHS: phf::Map<&'static str, u8> = phf_map! {
    "jan" => 1,
    "feb" => 2,
    "mar" => 3,
    "apr" => 4,
    "may" => 5,
    "jun" => 6,
    "jul" => 7,
    "aug" => 8,
    "sep" => 9,
    "oct" => 10,
    "nov" => 11,
    "dec" => 12,
};

/// 日期精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// 可能只精确到年或月的日期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialDate {
    year: u16,
    month: Option<u8>,
    day: Option<u8>,
}

impl PartialDate {
    pub fn year(year: u16) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn year_month(year: u16, month: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    pub fn ymd(year: u16, month: u8, day: u8) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
        }
    }

    /// 由 XML 中的年/月/日文本构建
    ///
    /// 年份必须是四位数字，否则返回 `None`；月份无法识别时只保留年份，
    /// 没有有效月份时忽略日。日在该月不存在时（如 2 月 31 日）只保留年月。
    pub fn from_parts(year: &str, month: Option<&str>, day: Option<&str>) -> Option<Self> {
        let year = parse_year(year)?;
        let Some(month) = month.and_then(parse_month) else {
            return Some(Self::year(year));
        };
        let day = day
            .and_then(parse_day)
            .filter(|&d| NaiveDate::from_ymd_opt(year.into(), month.into(), d.into()).is_some());
        match day {
            Some(day) => Some(Self::ymd(year, month, day)),
            None => Some(Self::year_month(year, month)),
        }
    }

    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

fn parse_year(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

/// 月份既可能是数字，也可能是英文缩写或全称
fn parse_month(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u8>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let key: String = raw.chars().take(3).collect::<String>().to_lowercase();
    MONTHS.get(key.as_str()).copied()
}

fn parse_day(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|d| (1..=31).contains(d))
}

/// XML 中某个日期节点的原始文本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    /// 期刊只给出自由格式日期时使用，例如 `2023 Jan-Feb`
    pub medline_date: Option<String>,
}

impl RawDate {
    pub fn resolve(&self) -> Option<PartialDate> {
        match &self.year {
            Some(year) => PartialDate::from_parts(year, self.month.as_deref(), self.day.as_deref()),
            None => self.medline_date.as_deref().and_then(leading_year),
        }
    }
}

fn leading_year(medline_date: &str) -> Option<PartialDate> {
    let year = LEADING_YEAR.captures(medline_date)?.get(1)?.as_str();
    parse_year(year).map(PartialDate::year)
}

/// `History` 下的一条 `PubMedPubDate`
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDate {
    pub status: String,
    pub date: RawDate,
}

/// 一篇文章中所有可用于推断发表日期的节点
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateSources {
    pub pub_date: RawDate,
    pub history: Vec<HistoryDate>,
}

/// 单个日期解析策略
pub trait DateResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, sources: &DateSources) -> Option<PartialDate>;
}

/// 期刊期号上的 `PubDate`
pub struct PubDateResolver;

impl DateResolver for PubDateResolver {
    fn name(&self) -> &'static str {
        "pub_date"
    }

    fn resolve(&self, sources: &DateSources) -> Option<PartialDate> {
        sources.pub_date.resolve()
    }
}

/// 历史事件日期列表
///
/// 依次查找 `preferred_statuses` 中的状态，日期无法解析时继续找下一个状态，
/// 都没有时取第一条。
pub struct HistoryResolver {
    preferred_statuses: Vec<&'static str>,
}

impl HistoryResolver {
    pub fn new(preferred_statuses: Vec<&'static str>) -> Self {
        Self { preferred_statuses }
    }

    /// 依优先级取第一条能解析出日期的记录
    fn pick(&self, history: &[HistoryDate]) -> Option<PartialDate> {
        self.preferred_statuses
            .iter()
            .find_map(|status| {
                history
                    .iter()
                    .filter(|entry| entry.status.eq_ignore_ascii_case(status))
                    .find_map(|entry| entry.date.resolve())
            })
            .or_else(|| history.first().and_then(|entry| entry.date.resolve()))
    }
}

impl Default for HistoryResolver {
    fn default() -> Self {
        Self::new(vec!["pubmed", "medline"])
    }
}

impl DateResolver for HistoryResolver {
    fn name(&self) -> &'static str {
        "history"
    }

    fn resolve(&self, sources: &DateSources) -> Option<PartialDate> {
        self.pick(&sources.history)
    }
}

/// 按优先级排列的日期解析策略
pub struct DateResolverChain {
    resolvers: Vec<Box<dyn DateResolver>>,
}

impl DateResolverChain {
    pub fn new(resolvers: Vec<Box<dyn DateResolver>>) -> Self {
        Self { resolvers }
    }

    /// 标准顺序：先期刊 `PubDate`，再历史事件日期
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(PubDateResolver),
            Box::new(HistoryResolver::default()),
        ])
    }

    pub fn resolve(&self, sources: &DateSources) -> Option<PartialDate> {
        let mut best: Option<PartialDate> = None;
        for resolver in &self.resolvers {
            if best.is_some_and(|d| d.precision() == DatePrecision::Day) {
                break;
            }
            let Some(candidate) = resolver.resolve(sources) else {
                continue;
            };
            let replace = match best {
                None => true,
                Some(current) => candidate.precision() > current.precision(),
            };
            if replace {
                tracing::trace!(resolver = resolver.name(), date = %candidate, "采用日期");
                best = Some(candidate);
            }
        }
        best
    }
}

impl Default for DateResolverChain {
    fn default() -> Self {
        Self::standard()
    }
}
