use feedsmith_engine::{synthesize, FeedError, FeedSettings, Record};
use pretty_assertions::assert_eq;

const SOURCE_URL: &str = "https://example.org/news";

fn record(text: &str, timestamp: &str) -> Record {
    Record {
        text: text.to_string(),
        url: format!("{SOURCE_URL}/item"),
        timestamp: timestamp.to_string(),
    }
}

#[test]
fn channel_fields_come_from_the_source_and_settings() {
    let records = vec![record("Headline", "2024-03-01T10:00:00")];
    let settings = FeedSettings::default();

    let channel = synthesize(&records, SOURCE_URL, &settings).unwrap();
    assert_eq!(channel.title(), "example.org");
    assert_eq!(channel.link(), SOURCE_URL);
    assert_eq!(channel.description(), settings.description);
    assert_eq!(channel.language(), Some("pl"));

    let item = &channel.items()[0];
    assert_eq!(item.title(), Some("Headline"));
    assert_eq!(item.description(), Some("Headline"));
    assert_eq!(item.link(), Some("https://example.org/news/item"));
}

#[test]
fn naive_timestamp_is_localized_into_the_home_zone() {
    // Winter date: Warsaw is CET, +01:00. Localize, do not assume UTC.
    let records = vec![record("Headline", "2024-03-01T10:00:00")];
    let channel = synthesize(&records, SOURCE_URL, &FeedSettings::default()).unwrap();

    let pub_date = channel.items()[0].pub_date().unwrap();
    assert_eq!(pub_date, "Fri, 1 Mar 2024 10:00:00 +0100");
}

#[test]
fn summer_dates_get_the_dst_offset() {
    let records = vec![record("Headline", "2024-07-01T12:00:00")];
    let channel = synthesize(&records, SOURCE_URL, &FeedSettings::default()).unwrap();

    let pub_date = channel.items()[0].pub_date().unwrap();
    assert!(pub_date.ends_with("+0200"), "got {pub_date}");
}

#[test]
fn zoned_timestamps_are_converted_not_reinterpreted() {
    let records = vec![record("Headline", "2024-03-01T09:00:00Z")];
    let channel = synthesize(&records, SOURCE_URL, &FeedSettings::default()).unwrap();

    let pub_date = channel.items()[0].pub_date().unwrap();
    assert_eq!(pub_date, "Fri, 1 Mar 2024 10:00:00 +0100");
}

#[test]
fn malformed_timestamp_fails_synthesis() {
    let records = vec![record("Headline", "yesterday-ish")];
    let err = synthesize(&records, SOURCE_URL, &FeedSettings::default()).unwrap_err();
    assert!(matches!(err, FeedError::BadTimestamp { .. }));
}

#[test]
fn identical_records_produce_identical_bytes() {
    let records = vec![
        record("One", "2024-03-01T10:00:00"),
        record("Two", "2024-03-01T10:00:00"),
    ];
    let settings = FeedSettings::default();

    let first = synthesize(&records, SOURCE_URL, &settings).unwrap().to_string();
    let second = synthesize(&records, SOURCE_URL, &settings).unwrap().to_string();
    assert_eq!(first, second);
}

#[test]
fn unparsable_source_url_falls_back_to_the_raw_string() {
    let records = vec![record("Headline", "2024-03-01T10:00:00")];
    let channel = synthesize(&records, "not a url", &FeedSettings::default()).unwrap();
    assert_eq!(channel.title(), "not a url");
}
