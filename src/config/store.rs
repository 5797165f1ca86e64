// src/config/store.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_STORE_CONFIG_PATH: &str = "config/store.json";

pub const ENV_STORE_CONFIG: &str = "GUIDE_STORE_CONFIG";
pub const ENV_STORE_URL: &str = "GUIDE_STORE_URL";
pub const ENV_STORE_KEY: &str = "GUIDE_STORE_KEY";
pub const ENV_STORE_TIMEOUT_MS: &str = "GUIDE_STORE_TIMEOUT_MS";

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 60_000;

fn default_timeout_ms() -> u64 {
    10_000
}

/// Table names as deployed in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub retailers: String,
    pub lodgings: String,
    pub articles: String,
    pub subscribers: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            retailers: "dispensaries".into(),
            lodgings: "hotels".into(),
            articles: "blog_posts".into(),
            subscribers: "newsletter_subscribers".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Empty means "no remote store": an in-memory store is used instead.
    #[serde(default)]
    pub base_url: String,
    /// "ENV" means: read from GUIDE_STORE_KEY
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout, clamped to 1s..=60s.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub tables: TableNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
            tables: TableNames::default(),
        }
    }
}

impl StoreConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading store config from {}", path.display()))?;
        let cfg: StoreConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing store config {}", path.display()))?;
        cfg.finish()
    }

    /// Resolution order:
    /// 1) $GUIDE_STORE_CONFIG (must exist)
    /// 2) config/store.json
    /// 3) built-in defaults
    ///
    /// Env overrides (GUIDE_STORE_URL, GUIDE_STORE_TIMEOUT_MS) apply on top.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_STORE_CONFIG) {
            let pb = PathBuf::from(p);
            anyhow::ensure!(pb.exists(), "{ENV_STORE_CONFIG} points to non-existent path");
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_STORE_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Self::default().finish()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn finish(mut self) -> Result<Self> {
        if let Ok(url) = env::var(ENV_STORE_URL) {
            self.base_url = url;
        }
        if let Some(ms) = env::var(ENV_STORE_TIMEOUT_MS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.timeout_ms = ms;
        }
        self.base_url = self.base_url.trim().to_string();

        // Resolve api key if "ENV"
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_STORE_KEY)
                .map_err(|_| anyhow::anyhow!("Missing {ENV_STORE_KEY} env var"))?;
        }

        self.timeout_ms = self.timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        Ok(self)
    }
}
