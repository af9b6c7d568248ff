//! Pure functions for structuring the plain text of a day's readings.

use std::sync::LazyLock;

use regex::Regex;

use super::ReadingSection;

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<kind>Reading (?:1|2|I|II)|First Reading|Second Reading|Responsorial Psalm|Alleluia|Verse Before the Gospel|Sequence|Gospel)(?:\s*:\s*(?P<rest>.*))?$",
    )
    .expect("section header regex is valid")
});

static VERSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+:\d+(?:-\d+)?").expect("verse regex is valid"));

static CITATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[1-3]\s?)?[A-Z][A-Za-z.]*(?:\s[A-Za-z.]+)*\s\d+:\d+")
        .expect("citation regex is valid")
});

static FEAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Optional Memorial|Memorial|Solemnity|Feast) of (?P<name>.+)")
        .expect("feast regex is valid")
});

/// Title, source URL and reading sections extracted from readings text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReadings {
    pub title: Option<String>,
    pub url: Option<String>,
    pub sections: Vec<ReadingSection>,
}

/// Extracts the feast name from a mass title.
///
/// # Examples
///
/// ```
/// use massreadings_core::mass::feast_day;
///
/// assert_eq!(
///     feast_day("Memorial of Saint Scholastica, Virgin").as_deref(),
///     Some("Saint Scholastica, Virgin")
/// );
/// assert_eq!(feast_day("Tuesday of the Third Week of Lent"), None);
/// ```
pub fn feast_day(title: &str) -> Option<String> {
    FEAST
        .captures(title)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str().trim().to_string())
}

/// Splits the plain text of a day's readings into title, URL and sections.
///
/// The first `https://` line is the URL. The first other line that is not a
/// section header or a response (`R.`) is the title. Every header opens a new
/// section; its citation comes from the header itself, from a citation line
/// right after it, or from a verse reference in the next two lines. Remaining
/// lines are content of the current section; lines before the first header
/// are dropped.
pub fn parse_reading_text(text: &str) -> ParsedReadings {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut parsed = ParsedReadings::default();
    let mut current: Option<ReadingSection> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if line.starts_with("https://") {
            if parsed.url.is_none() {
                parsed.url = Some(line.to_string());
            }
            continue;
        }

        if let Some(caps) = SECTION_HEADER.captures(line) {
            if let Some(section) = current.take() {
                parsed.sections.push(section);
            }

            let kind = caps["kind"].to_string();
            let rest = caps.name("rest").map_or("", |m| m.as_str().trim());

            let source = if rest.is_empty() {
                match lines.get(i) {
                    Some(next) if CITATION_LINE.is_match(next) => {
                        i += 1;
                        next.to_string()
                    }
                    _ => lookahead_verse(&lines[i..]).unwrap_or_default(),
                }
            } else if VERSE.is_match(rest) {
                rest.to_string()
            } else {
                match lookahead_verse(&lines[i..]) {
                    Some(verse) => format!("{rest} {verse}"),
                    None => rest.to_string(),
                }
            };

            current = Some(ReadingSection {
                kind,
                source,
                content: Vec::new(),
            });
            continue;
        }

        if parsed.title.is_none()
            && current.is_none()
            && !line.starts_with("R.")
            && !line.starts_with("The word")
            && !line.starts_with("The Gospel")
        {
            parsed.title = Some(line.to_string());
            continue;
        }

        if let Some(section) = current.as_mut() {
            section.content.push(line.to_string());
        }
    }

    if let Some(section) = current {
        parsed.sections.push(section);
    }

    parsed
}

fn lookahead_verse(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .take(2)
        .find_map(|line| VERSE.find(line))
        .map(|m| m.as_str().to_string())
}
