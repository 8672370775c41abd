//! Run configuration: storage target, fetch settings, optional ticker list.
//!
//! Loaded from TOML. Every section is optional; an empty file (or no file at
//! all) yields the built-in defaults: the 20-entry macro registry written to
//! `s3://chian-macro-data/macroresult.csv`.

use macrosnap_core::quotes::yahoo::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use macrosnap_core::quotes::{FetchMode, QuoteError, YahooProvider};
use macrosnap_core::registry::{Registry, RegistryEntry, RegistryError};
use macrosnap_core::store::s3::DEFAULT_REGION;
use macrosnap_core::store::{
    Credentials, LocalStore, ObjectStore, S3Location, S3Store, StoreError, TableStore,
};
use macrosnap_core::table::TableFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BUCKET: &str = "chian-macro-data";
pub const DEFAULT_KEY: &str = "macroresult.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid ticker list: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("storage setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("quote provider setup failed: {0}")]
    Provider(#[from] QuoteError),
}

/// Where the table artifact is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    S3,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: Backend,
    pub bucket: String,
    pub key: String,
    /// Falls back to `AWS_REGION`, then `AWS_DEFAULT_REGION`, then us-east-1.
    pub region: Option<String>,
    /// S3-compatible endpoint; switches to path-style addressing.
    pub endpoint: Option<String>,
    /// File path for the local backend.
    pub path: Option<PathBuf>,
    /// Artifact encoding; inferred from the key/path extension when unset.
    pub format: Option<TableFormat>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::S3,
            bucket: DEFAULT_BUCKET.to_string(),
            key: DEFAULT_KEY.to_string(),
            region: None,
            endpoint: None,
            path: None,
            format: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub parallel: bool,
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            parallel: false,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    /// Switches to the local backend at this path.
    pub local_path: Option<PathBuf>,
    pub parallel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    /// Replaces the built-in registry when non-empty.
    pub tickers: Vec<RegistryEntry>,
}

impl SnapshotConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// `<config dir>/macrosnap/config.toml`, e.g. `~/.config/macrosnap/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("macrosnap").join("config.toml"))
    }

    /// Explicit path if given, else the default path if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::info!("using config {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(bucket) = &overrides.bucket {
            self.storage.bucket = bucket.clone();
        }
        if let Some(key) = &overrides.key {
            self.storage.key = key.clone();
        }
        if let Some(region) = &overrides.region {
            self.storage.region = Some(region.clone());
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.storage.endpoint = Some(endpoint.clone());
        }
        if let Some(path) = &overrides.local_path {
            self.storage.backend = Backend::Local;
            self.storage.path = Some(path.clone());
        }
        if overrides.parallel {
            self.fetch.parallel = true;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage.backend {
            Backend::S3 => {
                if self.storage.bucket.trim().is_empty() {
                    return Err(ConfigError::Invalid("storage.bucket is empty".into()));
                }
                if self.storage.key.trim().is_empty() {
                    return Err(ConfigError::Invalid("storage.key is empty".into()));
                }
            }
            Backend::Local => {
                if self.storage.path.is_none() {
                    return Err(ConfigError::Invalid(
                        "storage.path is required for the local backend".into(),
                    ));
                }
            }
        }
        if self.fetch.timeout_secs == 0 || self.storage.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Configured tickers, or the built-in macro registry.
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        if self.tickers.is_empty() {
            Ok(Registry::default_macro())
        } else {
            Ok(Registry::from_entries(self.tickers.clone())?)
        }
    }

    pub fn fetch_mode(&self) -> FetchMode {
        if self.fetch.parallel {
            FetchMode::Parallel
        } else {
            FetchMode::Sequential
        }
    }

    pub fn table_format(&self) -> TableFormat {
        if let Some(format) = self.storage.format {
            return format;
        }
        match self.storage.backend {
            Backend::S3 => TableFormat::from_path(&self.storage.key),
            Backend::Local => self
                .storage
                .path
                .as_deref()
                .map(|p| TableFormat::from_path(&p.to_string_lossy()))
                .unwrap_or_default(),
        }
    }

    /// Region from config, else the given environment lookup, else us-east-1.
    /// A blank value at any step counts as unset.
    pub fn resolve_region(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let non_blank = |r: Option<String>| r.filter(|r| !r.trim().is_empty());
        non_blank(self.storage.region.clone())
            .or_else(|| non_blank(lookup("AWS_REGION")))
            .or_else(|| non_blank(lookup("AWS_DEFAULT_REGION")))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn build_provider(&self) -> Result<YahooProvider, ConfigError> {
        Ok(YahooProvider::with_options(
            &self.fetch.base_url,
            Duration::from_secs(self.fetch.timeout_secs),
        )?)
    }

    /// Object store for the configured backend. S3 credentials are taken as given
    /// so the caller decides where they come from.
    pub fn build_backend(
        &self,
        credentials: Option<Credentials>,
    ) -> Result<Box<dyn ObjectStore>, ConfigError> {
        match self.storage.backend {
            Backend::S3 => {
                let location = S3Location {
                    bucket: self.storage.bucket.clone(),
                    key: self.storage.key.clone(),
                    region: self.resolve_region(|k| std::env::var(k).ok()),
                    endpoint: self.storage.endpoint.clone(),
                };
                let store = S3Store::new(
                    location,
                    credentials,
                    Duration::from_secs(self.storage.timeout_secs),
                )?;
                Ok(Box::new(store))
            }
            Backend::Local => {
                let path = self.storage.path.clone().ok_or_else(|| {
                    ConfigError::Invalid("storage.path is required for the local backend".into())
                })?;
                Ok(Box::new(LocalStore::new(path)))
            }
        }
    }

    pub fn build_store(&self, credentials: Option<Credentials>) -> Result<TableStore, ConfigError> {
        Ok(TableStore::new(
            self.build_backend(credentials)?,
            self.table_format(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrosnap_core::registry::AssetGroup;

    #[test]
    fn empty_config_is_defaults() {
        let config = SnapshotConfig::from_toml("").unwrap();
        assert_eq!(config, SnapshotConfig::default());
        assert_eq!(config.storage.bucket, "chian-macro-data");
        assert_eq!(config.storage.key, "macroresult.csv");
        assert_eq!(config.registry().unwrap().len(), 20);
        assert_eq!(config.fetch_mode(), FetchMode::Sequential);
        assert_eq!(config.table_format(), TableFormat::Csv);
    }

    #[test]
    fn parses_full_config() {
        let toml = r#"
[storage]
backend = "s3"
bucket = "macro-archive"
key = "daily/macro.json"
region = "eu-central-1"
endpoint = "http://localhost:9000"

[fetch]
timeout_secs = 10
parallel = true

[[tickers]]
name = "Gold"
symbol = "GC=F"
group = "commodities"

[[tickers]]
name = "Bitcoin"
symbol = "BTC-USD"
"#;
        let config = SnapshotConfig::from_toml(toml).unwrap();
        assert_eq!(config.storage.bucket, "macro-archive");
        assert_eq!(config.table_format(), TableFormat::Json);
        assert_eq!(config.fetch_mode(), FetchMode::Parallel);
        assert_eq!(config.resolve_region(|_| None), "eu-central-1");

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Gold").unwrap().group, AssetGroup::Commodities);
        assert_eq!(registry.get("Bitcoin").unwrap().group, AssetGroup::Other);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SnapshotConfig::from_toml("[storage]\nbukket = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_tickers_are_rejected() {
        let toml = r#"
[[tickers]]
name = "Gold"
symbol = "GC=F"

[[tickers]]
name = "Gold"
symbol = "MGC=F"
"#;
        let config = SnapshotConfig::from_toml(toml).unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::Registry(RegistryError::DuplicateName(_)))
        ));
    }

    #[test]
    fn local_backend_requires_path() {
        let err = SnapshotConfig::from_toml("[storage]\nbackend = \"local\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = SnapshotConfig::default();
        config
            .apply_overrides(&Overrides {
                bucket: Some("other-bucket".into()),
                local_path: Some(PathBuf::from("out/history.json")),
                parallel: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.storage.bucket, "other-bucket");
        assert_eq!(config.storage.backend, Backend::Local);
        assert_eq!(config.table_format(), TableFormat::Json);
        assert!(config.fetch.parallel);
    }

    #[test]
    fn blank_bucket_override_is_rejected() {
        let mut config = SnapshotConfig::default();
        let result = config.apply_overrides(&Overrides {
            bucket: Some("  ".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn region_falls_back_through_environment() {
        let config = SnapshotConfig::default();
        assert_eq!(config.resolve_region(|_| None), "us-east-1");
        assert_eq!(
            config.resolve_region(|k| (k == "AWS_DEFAULT_REGION").then(|| "ap-east-1".into())),
            "ap-east-1"
        );
        assert_eq!(
            config.resolve_region(|k| Some(format!("{k}-region"))),
            "AWS_REGION-region"
        );
    }

    #[test]
    fn blank_region_values_are_skipped() {
        let env = |k: &str| match k {
            "AWS_REGION" => Some(String::new()),
            "AWS_DEFAULT_REGION" => Some("eu-west-2".to_string()),
            _ => None,
        };
        assert_eq!(SnapshotConfig::default().resolve_region(env), "eu-west-2");

        let config = SnapshotConfig::from_toml("[storage]\nregion = \" \"\n").unwrap();
        assert_eq!(config.resolve_region(env), "eu-west-2");
        assert_eq!(config.resolve_region(|_| None), "us-east-1");
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let config = SnapshotConfig::from_toml("[storage]\nkey = \"table.dat\"\nformat = \"json\"\n")
            .unwrap();
        assert_eq!(config.table_format(), TableFormat::Json);
    }

    #[test]
    fn local_store_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut config = SnapshotConfig::default();
        config
            .apply_overrides(&Overrides {
                local_path: Some(path.clone()),
                ..Default::default()
            })
            .unwrap();
        let store = config.build_store(None).unwrap();
        assert_eq!(store.location(), format!("file://{}", path.display()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SnapshotConfig::from_file(Path::new("/nonexistent/macrosnap.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
