//! Persistent report storage - `~/.apicontract/reports/`
//!
//! Every `apicontract run` is saved unless `--no-report` is given.
//! Directory layout: `{base}/{host_port}_{timestamp}/`

use std::path::{Path, PathBuf};

use apicontract_core::Config;

/// Pick the directory for this run's report.
///
/// `report_dir` from config (or `--report-dir`) wins over `~/.apicontract/reports`.
pub fn report_dir(config: &Config) -> Result<PathBuf, std::io::Error> {
    let base = match config.report_dir.as_deref() {
        Some(dir) => dir.to_path_buf(),
        None => report_base_dir()?,
    };
    Ok(base.join(build_dir_name(&config.base_url)))
}

/// Write `config.toml`, a snapshot of the effective config with credentials masked, into `dir`.
pub fn save_config(config: &Config, dir: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let config_toml = toml::to_string_pretty(&config.masked())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(dir.join("config.toml"), config_toml)
}

fn report_base_dir() -> Result<PathBuf, std::io::Error> {
    let home = std::env::var("HOME")
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(".apicontract").join("reports"))
}

/// `{host_port}_{timestamp}` e.g. `localhost_8080_20260205T193000`
fn build_dir_name(base_url: &str) -> String {
    let host_port = extract_host_port(base_url);
    let ts = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    format!("{host_port}_{ts}")
}

/// `"http://localhost:8080/path"` → `"localhost_8080"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .replace(':', "_")
}
