use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::parse::{feast_day, ParsedReadings};
use super::season::liturgical_season;
use super::MassDate;

/// Which mass of the day a reading set belongs to.
///
/// Only the default mass is served, so this always serializes as `"DEFAULT"`
/// and is not part of the cache key. Days with several masses (Christmas,
/// Easter Vigil) resolve to the one USCCB lists first. The enum keeps the
/// `mass_type` field of the response stable if other masses become
/// selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MassType {
    #[default]
    Default,
}

/// One reading of the mass (first reading, psalm, gospel, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSection {
    #[serde(rename = "type")]
    pub kind: String,
    /// Scripture citation, e.g. `Acts 2:14, 22-33`.
    pub source: String,
    pub content: Vec<String>,
}

/// Season, vestment color and feast of a liturgical day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiturgicalInfo {
    pub season: String,
    pub color: String,
    pub feast_day: Option<String>,
}

impl LiturgicalInfo {
    /// Derives the liturgical info for a date and its mass title.
    pub fn for_day(date: NaiveDate, title: Option<&str>) -> Self {
        let season = liturgical_season(date);
        Self {
            season: season.name().to_string(),
            color: season.color().to_string(),
            feast_day: title.and_then(feast_day),
        }
    }
}

/// The readings of one day, as returned by `GET /mass/{date}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassReading {
    pub date: MassDate,
    pub title: Option<String>,
    pub url: Option<String>,
    pub mass_type: MassType,
    pub liturgical_info: LiturgicalInfo,
    pub readings: Vec<ReadingSection>,
}

impl MassReading {
    /// Assembles a reading from parsed page text.
    pub fn from_parsed(date: MassDate, parsed: ParsedReadings) -> Self {
        let liturgical_info = LiturgicalInfo::for_day(date.date(), parsed.title.as_deref());
        Self {
            date,
            title: parsed.title,
            url: parsed.url,
            mass_type: MassType::Default,
            liturgical_info,
            readings: parsed.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parsed_fills_liturgical_info() {
        let date = MassDate::parse("2025-03-19").unwrap();
        let parsed = ParsedReadings {
            title: Some("Solemnity of Saint Joseph, Spouse of the Blessed Virgin Mary".to_string()),
            url: Some("https://bible.usccb.org/bible/readings/031925.cfm".to_string()),
            sections: vec![],
        };

        let reading = MassReading::from_parsed(date, parsed);

        assert_eq!(reading.liturgical_info.season, "Lent");
        assert_eq!(reading.liturgical_info.color, "#7030A0");
        assert_eq!(
            reading.liturgical_info.feast_day.as_deref(),
            Some("Saint Joseph, Spouse of the Blessed Virgin Mary")
        );
    }

    #[test]
    fn test_json_shape() {
        let date = MassDate::parse("2025-07-14").unwrap();
        let reading = MassReading {
            date,
            title: Some("Monday of the Fifteenth Week in Ordinary Time".to_string()),
            url: None,
            mass_type: MassType::Default,
            liturgical_info: LiturgicalInfo::for_day(date.date(), None),
            readings: vec![ReadingSection {
                kind: "Gospel".to_string(),
                source: "Matthew 10:34-11:1".to_string(),
                content: vec!["Jesus said to his Apostles:".to_string()],
            }],
        };

        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["date"], "2025-07-14");
        assert_eq!(json["mass_type"], "DEFAULT");
        assert_eq!(json["liturgical_info"]["season"], "Ordinary Time");
        assert_eq!(json["liturgical_info"]["feast_day"], serde_json::Value::Null);
        assert_eq!(json["readings"][0]["type"], "Gospel");
        assert_eq!(json["readings"][0]["source"], "Matthew 10:34-11:1");
    }
}
