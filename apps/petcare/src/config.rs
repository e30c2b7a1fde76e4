use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "petcare.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Delay every mock fetch waits before answering.
    pub fetch_delay_ms: u64,
    pub log_filter: String,
    /// Number of initial fetches that fail, per query key (`home/main`).
    pub fail_first: BTreeMap<String, u32>,
    /// Serve the home screen as a signed-out visitor.
    pub guest: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_delay_ms: 1000,
            log_filter: "info".into(),
            fail_first: BTreeMap::new(),
            guest: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    fetch_delay_ms: Option<u64>,
    log_filter: Option<String>,
    #[serde(default)]
    fail_first: BTreeMap<String, u32>,
    guest: Option<bool>,
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
///
/// A missing default file is fine; a missing file passed explicitly is not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.fetch_delay_ms {
        settings.fetch_delay_ms = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.guest {
        settings.guest = v;
    }
    settings.fail_first.extend(file_cfg.fail_first);
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("APP__FETCH_DELAY_MS") {
        settings.fetch_delay_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__FETCH_DELAY_MS must be a number of milliseconds, got '{v}'"))?;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("APP__GUEST") {
        settings.guest = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = lookup("APP__FAIL_FIRST") {
        settings.fail_first.extend(parse_fail_first(&v)?);
    }
    Ok(())
}

/// Parses `key=count` pairs separated by commas, e.g. `notifications=1,home/main=2`.
fn parse_fail_first(raw: &str) -> anyhow::Result<BTreeMap<String, u32>> {
    let mut out = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let Some((key, count)) = pair.split_once('=') else {
            bail!("expected key=count in APP__FAIL_FIRST, got '{pair}'");
        };
        let count = count
            .trim()
            .parse()
            .with_context(|| format!("invalid failure count for '{}'", key.trim()))?;
        out.insert(key.trim().to_string(), count);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
