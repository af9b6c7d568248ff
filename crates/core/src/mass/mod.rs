mod date;
mod error;
mod parse;
mod season;
mod types;

pub use date::{MassDate, EARLIEST_SUPPORTED_YEAR, LATEST_SUPPORTED_YEAR};
pub use error::DateError;
pub use parse::{feast_day, parse_reading_text, ParsedReadings};
pub use season::{easter_sunday, liturgical_season, LiturgicalSeason};
pub use types::{LiturgicalInfo, MassReading, MassType, ReadingSection};
