use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

pub const URL_ENV: &str = "OPENPROJECT_URL";
pub const API_KEY_ENV: &str = "OPENPROJECT_API_KEY";

const PLACEHOLDER_URLS: &[&str] = &[
    "https://your-openproject.example.com",
    "https://sd.lyckabc.xyz",
];
const PLACEHOLDER_API_KEY: &str = "your-api-key-here";

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub openproject: Option<OpenProjectSection>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OpenProjectSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Resolved connection settings, built once in `main` and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub api_key: String,
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".opbulk")
        .join("config.toml")
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Merge file settings with environment overrides and reject anything unset
/// or still at its placeholder value.
pub fn resolve(
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, SyncError> {
    let section = file.openproject.unwrap_or_default();

    let base_url = env(URL_ENV)
        .or(section.url)
        .map(|u| u.trim().to_string())
        .unwrap_or_default();
    let api_key = env(API_KEY_ENV)
        .or(section.api_key)
        .map(|k| k.trim().to_string())
        .unwrap_or_default();

    if base_url.is_empty() || PLACEHOLDER_URLS.contains(&base_url.as_str()) {
        return Err(SyncError::Configuration(format!(
            "set {URL_ENV} or [openproject].url to your OpenProject address"
        )));
    }
    if api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
        return Err(SyncError::Configuration(format!(
            "set {API_KEY_ENV} or [openproject].api_key to a real API key"
        )));
    }

    Ok(AppConfig { base_url, api_key })
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let file = load_file_config(&path)?;
    let config = resolve(file, |key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn file_with(url: &str, key: &str) -> FileConfig {
        FileConfig {
            openproject: Some(OpenProjectSection {
                url: Some(url.into()),
                api_key: Some(key.into()),
            }),
        }
    }

    #[test]
    fn file_values_are_used() {
        let cfg = resolve(file_with("https://op.local", "abc"), env_of(&[])).unwrap();
        assert_eq!(cfg.base_url, "https://op.local");
        assert_eq!(cfg.api_key, "abc");
    }

    #[test]
    fn env_overrides_file() {
        let env = env_of(&[(URL_ENV, "https://other"), (API_KEY_ENV, "xyz")]);
        let cfg = resolve(file_with("https://op.local", "abc"), env).unwrap();
        assert_eq!(cfg.base_url, "https://other");
        assert_eq!(cfg.api_key, "xyz");
    }

    #[test]
    fn missing_values_are_configuration_errors() {
        let err = resolve(FileConfig::default(), env_of(&[])).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn placeholders_count_as_unset() {
        for url in PLACEHOLDER_URLS {
            let err = resolve(file_with(url, "abc"), env_of(&[])).unwrap_err();
            assert!(err.to_string().contains(URL_ENV));
        }
        let env = env_of(&[(URL_ENV, "https://sd.lyckabc.xyz")]);
        let err = resolve(file_with("https://op.local", "abc"), env).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));

        let err = resolve(file_with("https://op.local", PLACEHOLDER_API_KEY), env_of(&[]))
            .unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[openproject]\nurl = \"https://op.local\"\napi_key = \"k\"\n",
        )
        .unwrap();
        let file = load_file_config(&path).unwrap();
        let section = file.openproject.unwrap();
        assert_eq!(section.url.as_deref(), Some("https://op.local"));
        assert_eq!(section.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn absent_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = load_file_config(&dir.path().join("nope.toml")).unwrap();
        assert!(file.openproject.is_none());
    }
}
