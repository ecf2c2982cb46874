use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    errors::Result,
    utils::{
        app_data_dir, config_file_in, documents_dir_in,
        persistence::{read_json, write_json_atomic},
    },
};

/// Developer-only operations (resetting onboarding, forcing the tour or the
/// budget nudge). Off unless enabled explicitly at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevHooks {
    #[serde(default)]
    pub enabled: bool,
}

impl DevHooks {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// BCP 47 tag; its language picks the money separators.
    pub locale: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub dev_hooks: DevHooks,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-AU".into(),
            currency: "AUD".into(),
            data_dir: None,
            log_filter: None,
            dev_hooks: DevHooks::default(),
        }
    }
}

impl Config {
    /// Root of the JSON document store. An explicit `data_dir` wins over
    /// `base`.
    pub fn documents_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => documents_dir_in(base),
        }
    }

    /// Grouping and decimal separators for `locale`.
    fn separators(&self) -> (char, char) {
        let language = self
            .locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "de" | "es" | "it" | "pt" | "nl" | "da" | "id" | "tr" => ('.', ','),
            "fr" | "sv" | "nb" | "fi" | "pl" | "ru" | "cs" => (' ', ','),
            _ => (',', '.'),
        }
    }

    /// `AUD 1,234.50` in English locales, `EUR 1.234,50` in German.
    pub fn format_money(&self, amount: f64) -> String {
        let (group, decimal) = self.separators();
        let fixed = format!("{:.2}", amount.abs());
        let Some((whole, cents)) = fixed.split_once('.') else {
            return format!("{} {amount}", self.currency);
        };
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (index, digit) in whole.chars().enumerate() {
            if index > 0 && (whole.len() - index) % 3 == 0 {
                grouped.push(group);
            }
            grouped.push(digit);
        }
        let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
        format!("{} {sign}{grouped}{decimal}{cents}", self.currency)
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at the application data directory.
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            path: config_file_in(&base),
            base,
        }
    }

    /// Loads the stored configuration, or defaults when none was saved.
    pub fn load(&self) -> Result<Config> {
        match read_json(&self.path)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Config::default()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        write_json_atomic(&self.path, &serde_json::to_value(config)?)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path());
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.dev_hooks.enabled);
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path());
        let config = Config {
            dev_hooks: DevHooks::enabled(),
            log_filter: Some("xfinance_core=debug".into()),
            ..Config::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert_eq!(
            config.documents_dir(manager.base()),
            dir.path().join("documents")
        );
    }

    #[test]
    fn money_follows_the_locale() {
        let config = Config::default();
        assert_eq!(config.format_money(40.0), "AUD 40.00");
        assert_eq!(config.format_money(1234567.5), "AUD 1,234,567.50");
        assert_eq!(config.format_money(-0.004), "AUD 0.00");
        assert_eq!(config.format_money(-950.0), "AUD -950.00");

        let german = Config {
            locale: "de-DE".into(),
            currency: "EUR".into(),
            ..Config::default()
        };
        assert_eq!(german.format_money(1234.5), "EUR 1.234,50");

        let french = Config {
            locale: "fr_FR".into(),
            ..german
        };
        assert_eq!(french.format_money(1234.5), "EUR 1 234,50");
    }
}
