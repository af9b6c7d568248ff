//! Offline fetcher producing fixed readings, for local development.

use std::time::Duration;

use async_trait::async_trait;

use massreadings_core::cache::{FetchError, ReadingFetcher};
use massreadings_core::mass::{parse_reading_text, MassDate, MassReading};

const LECTIONARY: [&str; 3] = [
    "First Reading: Sirach 5:1-8
Rely not on your wealth;
say not: \"I have the power.\"
The word of the Lord.
Responsorial Psalm: Psalms 1:1-2, 3, 4 and 6
R. Blessed are they who hope in the Lord.
Gospel: Mark 9:41-50
Jesus said to his disciples:
\"Anyone who gives you a cup of water to drink
because you belong to Christ will surely not lose his reward.\"
The Gospel of the Lord.",
    "Reading I: Genesis 1:1-19
In the beginning, when God created the heavens and the earth,
the earth was a formless wasteland.
Responsorial Psalm: Psalms 104:1-2a, 5-6, 10 and 12, 24 and 35c
R. May the Lord be glad in his works.
Alleluia: Matthew 4:23
Jesus preached the Gospel of the Kingdom.
Gospel: Mark 6:53-56
After making the crossing to the other side of the sea,
Jesus and his disciples came to land at Gennesaret.",
    "Reading 1: Isaiah 55:10-11
Thus says the LORD:
Just as from the heavens the rain and snow come down.
Responsorial Psalm: Psalms 34:4-5, 6-7, 16-17, 18-19
R. From all their distress God rescues the just.
Verse Before the Gospel: Matthew 4:4b
One does not live on bread alone.
Gospel: Matthew 6:7-15
Jesus said to his disciples:
\"This is how you are to pray.\"",
];

/// Serves one of a few canned lectionaries, picked by date, after an
/// optional simulated latency. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    latency: Duration,
}

impl MockFetcher {
    /// Delay every fetch by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    fn page_text(date: MassDate) -> String {
        let title = date.date().format("%A, %B %-d, %Y");
        let lectionary = LECTIONARY[date.ordinal().rem_euclid(LECTIONARY.len() as i32) as usize];

        format!(
            "Readings for {title}\nhttps://bible.usccb.org/bible/readings/{}.cfm\n{lectionary}",
            date.usccb_slug()
        )
    }
}

#[async_trait]
impl ReadingFetcher<MassReading> for MockFetcher {
    async fn fetch_reading(&self, date: MassDate) -> Result<MassReading, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        tracing::debug!(%date, "Serving mock readings");
        Ok(MassReading::from_parsed(
            date,
            parse_reading_text(&Self::page_text(date)),
        ))
    }
}
