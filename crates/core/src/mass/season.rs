//! Simplified liturgical calendar.
//!
//! Seasons are derived from the date of Easter and a handful of fixed feasts.
//! Feasts that move the boundaries (e.g. the Baptism of the Lord) are not
//! modelled.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A season of the liturgical year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiturgicalSeason {
    Advent,
    Christmas,
    Lent,
    Easter,
    #[serde(rename = "Ordinary Time")]
    OrdinaryTime,
}

impl LiturgicalSeason {
    pub fn name(&self) -> &'static str {
        match self {
            LiturgicalSeason::Advent => "Advent",
            LiturgicalSeason::Christmas => "Christmas",
            LiturgicalSeason::Lent => "Lent",
            LiturgicalSeason::Easter => "Easter",
            LiturgicalSeason::OrdinaryTime => "Ordinary Time",
        }
    }

    /// Vestment color as a CSS hex value.
    pub fn color(&self) -> &'static str {
        match self {
            LiturgicalSeason::Advent | LiturgicalSeason::Lent => "#7030A0",
            LiturgicalSeason::Christmas | LiturgicalSeason::Easter => "#FFFFFF",
            LiturgicalSeason::OrdinaryTime => "#008000",
        }
    }
}

/// Returns Easter Sunday for the given Gregorian year (anonymous computus).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use massreadings_core::mass::easter_sunday;
///
/// assert_eq!(easter_sunday(2025), NaiveDate::from_ymd_opt(2025, 4, 20));
/// ```
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// First Sunday of Advent: the Sunday on or after November 27.
fn advent_start(year: i32) -> Option<NaiveDate> {
    let nov_27 = NaiveDate::from_ymd_opt(year, 11, 27)?;
    let offset = 6 - nov_27.weekday().num_days_from_monday();
    Some(nov_27 + Duration::days(offset as i64))
}

/// Returns the liturgical season containing `date`.
pub fn liturgical_season(date: NaiveDate) -> LiturgicalSeason {
    let year = date.year();
    let (Some(easter), Some(advent), Some(christmas), Some(epiphany)) = (
        easter_sunday(year),
        advent_start(year),
        NaiveDate::from_ymd_opt(year, 12, 25),
        NaiveDate::from_ymd_opt(year, 1, 6),
    ) else {
        return LiturgicalSeason::OrdinaryTime;
    };

    let ash_wednesday = easter - Duration::days(46);
    let pentecost = easter + Duration::days(49);

    if date >= ash_wednesday && date < easter {
        LiturgicalSeason::Lent
    } else if date >= easter && date <= pentecost {
        LiturgicalSeason::Easter
    } else if date >= advent && date < christmas {
        LiturgicalSeason::Advent
    } else if date >= christmas || date <= epiphany {
        LiturgicalSeason::Christmas
    } else {
        LiturgicalSeason::OrdinaryTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_easter_known_years() {
        assert_eq!(easter_sunday(2024), Some(ymd(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(ymd(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(ymd(2026, 4, 5)));
        assert_eq!(easter_sunday(2000), Some(ymd(2000, 4, 23)));
        assert_eq!(easter_sunday(2038), Some(ymd(2038, 4, 25)));
    }

    #[test]
    fn test_advent_start() {
        // Nov 27 2024 was a Wednesday
        assert_eq!(advent_start(2024), Some(ymd(2024, 12, 1)));
        // Nov 27 2022 was a Sunday
        assert_eq!(advent_start(2022), Some(ymd(2022, 11, 27)));
    }

    #[test]
    fn test_lent_boundaries() {
        // Ash Wednesday 2025 is March 5
        assert_eq!(
            liturgical_season(ymd(2025, 3, 4)),
            LiturgicalSeason::OrdinaryTime
        );
        assert_eq!(liturgical_season(ymd(2025, 3, 5)), LiturgicalSeason::Lent);
        assert_eq!(liturgical_season(ymd(2025, 4, 19)), LiturgicalSeason::Lent);
    }

    #[test]
    fn test_easter_season_runs_through_pentecost() {
        assert_eq!(
            liturgical_season(ymd(2025, 4, 20)),
            LiturgicalSeason::Easter
        );
        assert_eq!(liturgical_season(ymd(2025, 6, 8)), LiturgicalSeason::Easter);
        assert_eq!(
            liturgical_season(ymd(2025, 6, 9)),
            LiturgicalSeason::OrdinaryTime
        );
    }

    #[test]
    fn test_advent_and_christmas() {
        assert_eq!(
            liturgical_season(ymd(2024, 11, 30)),
            LiturgicalSeason::OrdinaryTime
        );
        assert_eq!(
            liturgical_season(ymd(2024, 12, 1)),
            LiturgicalSeason::Advent
        );
        assert_eq!(
            liturgical_season(ymd(2024, 12, 24)),
            LiturgicalSeason::Advent
        );
        assert_eq!(
            liturgical_season(ymd(2024, 12, 25)),
            LiturgicalSeason::Christmas
        );
        assert_eq!(
            liturgical_season(ymd(2025, 1, 6)),
            LiturgicalSeason::Christmas
        );
        assert_eq!(
            liturgical_season(ymd(2025, 1, 7)),
            LiturgicalSeason::OrdinaryTime
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(LiturgicalSeason::Lent.color(), "#7030A0");
        assert_eq!(LiturgicalSeason::Easter.color(), "#FFFFFF");
        assert_eq!(LiturgicalSeason::OrdinaryTime.color(), "#008000");
    }

    #[test]
    fn test_season_serializes_with_display_name() {
        let json = serde_json::to_string(&LiturgicalSeason::OrdinaryTime).unwrap();
        assert_eq!(json, "\"Ordinary Time\"");
    }
}
