//! Google News RSS client
//!
//! Broad web headlines beyond Yahoo's company feed. The RSS payload is
//! small and flat, so items are extracted with regexes rather than a
//! full XML parser.

use crate::error::{DataError, Result};
use crate::types::NewsItem;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use tracing::debug;

const RSS_URL: &str = "https://news.google.com/rss/search";
const REQUEST_TIMEOUT_SECS: u64 = 10;

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<item>(.*?)</item>").expect("static regex")
});
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>").expect("static regex")
});
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<link>(.*?)</link>").expect("static regex")
});
static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<source[^>]*>(.*?)</source>"#).expect("static regex")
});
static PUBDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<pubDate>(.*?)</pubDate>").expect("static regex")
});

pub struct GoogleNewsClient {
    http: Client,
    max_results: usize,
}

impl GoogleNewsClient {
    pub fn new(max_results: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, max_results })
    }

    /// Search headlines for a query like `"Apple Inc stock"`.
    pub async fn search(&self, query: &str) -> Result<Vec<NewsItem>> {
        let url = format!(
            "{RSS_URL}?q={}&hl=en-US&gl=US&ceid=US:en",
            urlencode(query)
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Fetch(format!(
                "google news HTTP {} for '{query}'",
                response.status()
            )));
        }

        let body = response.text().await?;
        let items = parse_rss_items(&body, self.max_results);
        debug!(query, count = items.len(), "fetched google news headlines");
        Ok(items)
    }
}

fn parse_rss_items(body: &str, max_results: usize) -> Vec<NewsItem> {
    ITEM_RE
        .captures_iter(body)
        .take(max_results)
        .filter_map(|item| {
            let block = item.get(1)?.as_str();
            let title = first_group(&TITLE_RE, block)?;
            Some(NewsItem {
                title: unescape(&title),
                publisher: first_group(&SOURCE_RE, block).map(|s| unescape(&s)),
                summary: None,
                url: first_group(&LINK_RE, block),
                published_at: first_group(&PUBDATE_RE, block)
                    .and_then(|d| DateTime::parse_from_rfc2822(&d).ok())
                    .map(|d| d.with_timezone(&Utc)),
            })
        })
        .collect()
}

fn first_group(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn urlencode(query: &str) -> String {
    query
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c.to_string(),
            ' ' => "+".to_string(),
            other => format!("%{:02X}", other as u32),
        })
        .collect()
}
