use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{ExtractedItem, Record};

/// Turn extracted items into records stamped with the fetch instant.
///
/// All records from one source-run share the instant the page was fetched,
/// so re-synthesizing the same run yields identical bytes.
pub fn build_records(items: Vec<ExtractedItem>, fetched_at: DateTime<Utc>) -> Vec<Record> {
    let timestamp = fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    items
        .into_iter()
        .map(|item| Record {
            text: item.text,
            url: item.url,
            timestamp: timestamp.clone(),
        })
        .collect()
}
