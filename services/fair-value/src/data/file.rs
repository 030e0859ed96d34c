//! Snapshot provider backed by JSON files on disk.
//!
//! Each ticker lives in `<dir>/<TICKER>.json` holding one serialized
//! [`MarketSnapshot`].

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{normalize_ticker, FactsProvider, ProviderError};
use super::snapshot::{FactDefaults, MarketSnapshot};

pub struct FileSnapshotProvider {
    dir: PathBuf,
    defaults: FactDefaults,
}

impl FileSnapshotProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            defaults: FactDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: FactDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a ticker's snapshot file.
    pub fn snapshot_path(&self, ticker: &str) -> Result<PathBuf, ProviderError> {
        let ticker =
            normalize_ticker(ticker).ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;
        Ok(self.dir.join(format!("{}.json", ticker)))
    }
}

#[async_trait]
impl FactsProvider for FileSnapshotProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ProviderError> {
        let path = self.snapshot_path(ticker)?;
        debug!(path = %path.display(), "Reading snapshot");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(ticker.trim().to_ascii_uppercase()));
            }
            Err(e) => return Err(ProviderError::Io(format!("{}: {}", path.display(), e))),
        };

        let mut snapshot: MarketSnapshot = serde_json::from_str(&content)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", path.display(), e)))?;

        if snapshot.ticker.is_empty() {
            snapshot.ticker = ticker.trim().to_ascii_uppercase();
        }
        Ok(snapshot)
    }

    fn fact_defaults(&self) -> FactDefaults {
        self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_snapshot(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_reads_snapshot_case_insensitively() {
        let dir = TempDir::new().unwrap();
        write_snapshot(
            dir.path(),
            "ACME.json",
            r#"{ "ticker": "ACME", "quote": { "currentPrice": 12.5 } }"#,
        );

        let provider = FileSnapshotProvider::new(dir.path());
        let snapshot = provider.fetch_snapshot("acme").await.unwrap();
        assert_eq!(snapshot.ticker, "ACME");
        assert_eq!(snapshot.quote.current_price, Some(12.5));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = FileSnapshotProvider::new(dir.path());

        let err = provider.fetch_snapshot("NOPE").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(t) if t == "NOPE"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "BAD.json", "{ not json");

        let provider = FileSnapshotProvider::new(dir.path());
        let err = provider.fetch_snapshot("BAD").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn test_rejects_path_like_tickers() {
        let provider = FileSnapshotProvider::new("/tmp");
        assert!(provider.snapshot_path("../secrets").is_err());
    }

    #[tokio::test]
    async fn test_defaults_flow_into_facts() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "ACME.json", r#"{ "ticker": "ACME" }"#);

        let provider = FileSnapshotProvider::new(dir.path()).with_defaults(FactDefaults {
            sector_pe: 21.0,
            ..FactDefaults::default()
        });
        let facts = provider.fetch_facts("ACME").await.unwrap();
        assert!((facts.sector_pe_default - 21.0).abs() < 1e-12);
    }
}
