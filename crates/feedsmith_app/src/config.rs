//! Run configuration loaded from a JSON file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;

use feedsmith_engine::{FeedSettings, FetchSettings, RunSettings, SourceConfig};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub sources: Vec<SourceConfig>,
    /// Local directory for feed artifacts; omit to publish remote-only.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// Object-storage destination; omit to publish locally only.
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_language")]
    pub language: String,
    /// IANA zone name for feed pubDates, e.g. "Europe/Warsaw".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Accept misconfigured site certificates. Off unless asked for.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub public_base: String,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./published_feeds.json")
}

fn default_concurrency() -> usize {
    4
}

fn default_language() -> String {
    "pl".to_string()
}

fn default_timezone() -> String {
    "Europe/Warsaw".to_string()
}

impl AppConfig {
    /// Read and parse the config file. Any failure here aborts the run;
    /// there is nothing sensible to do without a source list.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("malformed config file {}", path.display()))?;
        if config.output_dir.is_none() && config.storage.is_none() {
            anyhow::bail!("config needs an output_dir, a storage section, or both");
        }
        Ok(config)
    }

    pub fn run_settings(&self) -> anyhow::Result<RunSettings> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|err| anyhow::anyhow!("unknown timezone {:?}: {err}", self.timezone))?;
        Ok(RunSettings {
            fetch: FetchSettings {
                accept_invalid_certs: self.accept_invalid_certs,
                ..FetchSettings::default()
            },
            feed: FeedSettings {
                language: self.language.clone(),
                timezone,
                ..FeedSettings::default()
            },
            concurrency: self.concurrency,
        })
    }

    /// Drop malformed source descriptors (empty url or no rules) with an
    /// error log; a bad source never aborts the others.
    pub fn valid_sources(&self) -> Vec<SourceConfig> {
        self.sources
            .iter()
            .filter(|source| {
                let ok = !source.url.trim().is_empty() && source.rules().next().is_some();
                if !ok {
                    pipeline_logging::pipeline_error!(
                        "skipping malformed source descriptor (url {:?})",
                        source.url
                    );
                }
                ok
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_selector_and_selector_list() {
        let json = r#"{
            "sources": [
                { "url": "https://www.pap.pl/kraj?page=0", "selector": ".title" },
                { "url": "https://example.org/news", "selectors": [".title", ".lead"] }
            ],
            "output_dir": "./feeds"
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let rules: Vec<&str> = config.sources[0].rules().collect();
        assert_eq!(rules, vec![".title"]);
        let rules: Vec<&str> = config.sources[1].rules().collect();
        assert_eq!(rules, vec![".title", ".lead"]);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timezone, "Europe/Warsaw");
    }

    #[test]
    fn load_reads_a_config_file_and_builds_run_settings() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("feedsmith.json");
        std::fs::write(
            &path,
            r#"{
                "sources": [{ "url": "https://www.pap.pl/kraj?page=0", "selector": ".title" }],
                "output_dir": "./feeds",
                "timezone": "Europe/Warsaw",
                "language": "pl"
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
        let settings = config.run_settings().unwrap();
        assert_eq!(settings.feed.timezone, chrono_tz::Europe::Warsaw);
        assert_eq!(settings.feed.language, "pl");
    }

    #[test]
    fn load_rejects_a_config_without_any_destination() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("feedsmith.json");
        std::fs::write(
            &path,
            r#"{ "sources": [{ "url": "https://example.org", "selector": ".title" }] }"#,
        )
        .unwrap();

        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn malformed_sources_are_dropped() {
        let json = r#"{
            "sources": [
                { "url": "", "selector": ".title" },
                { "url": "https://example.org/news" },
                { "url": "https://example.org/ok", "selector": ".title" }
            ],
            "output_dir": "./feeds"
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let valid = config.valid_sources();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].url, "https://example.org/ok");
    }
}
