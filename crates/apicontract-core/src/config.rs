//! Harness configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public deployment of the API under test.
pub const DEFAULT_BASE_URL: &str = "https://api-desafio-qa.onrender.com";

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the server under test
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of scenarios in flight
    pub concurrency: usize,

    /// HTTP headers sent with every request (auth, api keys)
    pub headers: HashMap<String, String>,

    /// Seed for generated fixture data; random when unset
    pub seed: Option<u64>,

    /// Directory for report files (default: `~/.apicontract/reports/...`)
    pub report_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            concurrency: 4,
            headers: HashMap::new(),
            seed: None,
            report_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the first default location that exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but is invalid
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Like [`Config::load_default`], looking in `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but is invalid
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [".apicontract.toml", ".apicontract.json", "apicontract.toml"];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }

    /// Reject values the runner cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        for (name, value) in &self.headers {
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return Err(ConfigError::Invalid(format!(
                    "header name {name:?} is not a valid token"
                )));
            }
            if value.bytes().any(|b| (b < b' ' && b != b'\t') || b == 0x7f) {
                return Err(ConfigError::Invalid(format!(
                    "header {name} contains a control character"
                )));
            }
        }
        Ok(())
    }

    /// Copy with sensitive header values replaced, for snapshots written next to reports.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        crate::report::mask_headers(&mut masked.headers);
        masked
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Example config file written by `apicontract init`
    #[must_use]
    pub const fn example() -> &'static str {
        r#"# apicontract configuration

# Server under test
base_url = "https://api-desafio-qa.onrender.com"

# Per-request timeout in seconds
timeout_secs = 30

# Scenarios in flight at once (1 = sequential)
concurrency = 4

# Fixed seed for generated fixture data (random when unset)
# seed = 42

# Where reports are written (default: ~/.apicontract/reports/<host>_<timestamp>)
# report_dir = ".apicontract/reports"

# HTTP headers sent with every request
[headers]
# Authorization = "Bearer your-token-here"
"#
    }
}

/// RFC 9110 `tchar`
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
