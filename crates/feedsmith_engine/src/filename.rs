use url::Url;

const MAX_SAFE_NAME_CHARS: usize = 200;

/// Deterministic artifact name for a source URL: `feed_{host}_{path}.xml`
/// with every path separator and dot replaced by an underscore.
///
/// Pure function of the URL, so republishing the same source always lands on
/// the same object name and stays idempotent at the storage layer.
pub fn feed_filename(url: &str) -> String {
    let (host, path) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or_default().to_string(),
            parsed.path().trim_matches('/').to_string(),
        ),
        // Unparsable input still gets a stable, sanitized name.
        Err(_) => (url.to_string(), String::new()),
    };

    let combined = if path.is_empty() {
        host
    } else {
        format!("{host}_{path}")
    };

    let safe: String = combined
        .chars()
        .map(|c| if c == '/' || c == '.' { '_' } else { c })
        .take(MAX_SAFE_NAME_CHARS)
        .collect();

    format!("feed_{safe}.xml")
}
