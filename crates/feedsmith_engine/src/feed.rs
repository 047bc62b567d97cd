use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use rss::{Channel, ChannelBuilder, Item, ItemBuilder};
use thiserror::Error;
use url::Url;

use crate::types::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("bad timestamp {value:?}: {message}")]
    BadTimestamp { value: String, message: String },
}

/// Publication-level settings shared by every synthesized feed.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Boilerplate channel description.
    pub description: String,
    /// RSS `language` code of the publication.
    pub language: String,
    /// Home zone: pubDates render with this zone's UTC offset.
    pub timezone: Tz,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            description: "Latest items scraped from the source page".to_string(),
            language: "pl".to_string(),
            timezone: chrono_tz::Europe::Warsaw,
        }
    }
}

/// Build one RSS 2.0 channel for a source's records, in record order.
///
/// Output bytes are deterministic for identical input (no generator tag,
/// no synthesis-time clock reads).
pub fn synthesize(
    records: &[Record],
    source_url: &str,
    settings: &FeedSettings,
) -> Result<Channel, FeedError> {
    let title = Url::parse(source_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| source_url.to_string());

    let items = records
        .iter()
        .map(|record| {
            let published = localize(&record.timestamp, settings.timezone)?;
            Ok(ItemBuilder::default()
                .title(Some(record.text.clone()))
                .link(Some(record.url.clone()))
                .description(Some(record.text.clone()))
                .pub_date(Some(published.to_rfc2822()))
                .build())
        })
        .collect::<Result<Vec<Item>, FeedError>>()?;

    Ok(ChannelBuilder::default()
        .title(title)
        .link(source_url.to_string())
        .description(settings.description.clone())
        .language(Some(settings.language.clone()))
        .items(items)
        .build())
}

/// Interpret a record timestamp in the publication's home zone.
///
/// Zoned values are converted; zone-less values are taken to already be
/// local time in `tz` (localize, not convert).
fn localize(timestamp: &str, tz: Tz) -> Result<DateTime<Tz>, FeedError> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(zoned.with_timezone(&tz));
    }

    let naive = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S"))
        .map_err(|err| FeedError::BadTimestamp {
            value: timestamp.to_string(),
            message: err.to_string(),
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local),
        // DST fold: pick the earlier reading.
        LocalResult::Ambiguous(earlier, _) => Ok(earlier),
        LocalResult::None => Err(FeedError::BadTimestamp {
            value: timestamp.to_string(),
            message: format!("time does not exist in zone {tz}"),
        }),
    }
}
