//! Daily readings scraped from the USCCB website.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::{Client, StatusCode};

use massreadings_core::cache::{FetchError, ReadingFetcher};
use massreadings_core::mass::{parse_reading_text, MassDate, MassReading};

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("script regex is valid")
});

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|tr|section)\s*>")
        .expect("line break regex is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex is valid")
});

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("title regex is valid")
});

/// Fetches `{base_url}/bible/readings/{MMDDYY}.cfm` and structures the page.
pub struct UsccbFetcher {
    client: Client,
    base_url: String,
}

impl UsccbFetcher {
    /// Create a fetcher against `base_url` (e.g. "https://bible.usccb.org").
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("massreadings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, date: MassDate) -> String {
        format!("{}/bible/readings/{}.cfm", self.base_url, date.usccb_slug())
    }
}

#[async_trait]
impl ReadingFetcher<MassReading> for UsccbFetcher {
    async fn fetch_reading(&self, date: MassDate) -> Result<MassReading, FetchError> {
        let url = self.page_url(date);
        tracing::debug!(%date, %url, "Fetching readings from USCCB");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Unavailable(format!(
                "USCCB returned {status} for {url}"
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Unavailable(format!("Failed to read {url}: {e}")))?;

        readings_from_page(date, &url, &html)
    }
}

/// Structures a readings page. A page without any reading section is treated
/// as "no readings published".
fn readings_from_page(date: MassDate, url: &str, html: &str) -> Result<MassReading, FetchError> {
    let mut text = String::new();
    if let Some(title) = page_title(html) {
        text.push_str(&title);
        text.push('\n');
    }
    text.push_str(&html_to_text(lectionary_block(html)));

    let mut parsed = parse_reading_text(&text);
    if parsed.sections.is_empty() {
        return Err(FetchError::NotFound);
    }
    parsed.url = Some(url.to_string());

    Ok(MassReading::from_parsed(date, parsed))
}

/// The `<title>` of the page without the site suffix.
fn page_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = decode_entities(&TAG.replace_all(raw, ""));
    let title = title.split(" | ").next().unwrap_or_default().trim();

    (!title.is_empty()).then(|| title.to_string())
}

/// The part of the page holding the readings, up to the footer.
fn lectionary_block(html: &str) -> &str {
    let start = html
        .find("b-lectionary")
        .map(|i| html[..i].rfind('<').unwrap_or(i))
        .unwrap_or(0);
    let block = &html[start..];

    match block.find("<footer") {
        Some(end) => &block[..end],
        None => block,
    }
}

/// Reduces markup to trimmed, non-empty text lines.
fn html_to_text(html: &str) -> String {
    let html = SCRIPT_OR_STYLE.replace_all(html, "");
    let html = LINE_BREAK.replace_all(&html, "\n");
    let text = TAG.replace_all(&html, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };

            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "copy" => '\u{00A9}',
        _ => return None,
    };
    Some(c)
}
