//! Application settings storage
//!
//! Stores the API base URL and bearer token in a JSON file in the config
//! directory. Environment variables override stored values, so CI and
//! one-off runs never need to touch the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Path to config file (set during init)
static CONFIG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Default platform API base (the local dev backend)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
        }
    }
}

impl Settings {
    /// Load settings from disk or create default
    fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    fn save(&self, path: &PathBuf) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

/// Initialize settings with the config directory
pub fn init(config_dir: PathBuf) {
    let config_path = config_dir.join("settings.json");
    let settings = Settings::load(&config_path);

    *CONFIG_PATH.write().unwrap() = Some(config_path);
    *SETTINGS.write().unwrap() = Some(settings);
}

// ==================== API Base URL ====================

/// Get the API base URL (checks env var first, then stored setting)
pub fn get_api_base_url() -> String {
    // Environment variable takes precedence
    if let Ok(url) = std::env::var("COHORTREE_API_URL") {
        if !url.is_empty() {
            return url;
        }
    }

    let guard = SETTINGS.read().ok();
    guard
        .as_ref()
        .and_then(|g| g.as_ref())
        .map(|s| s.api_base_url.clone())
        .unwrap_or_else(default_api_base_url)
}

/// Set and save the API base URL
pub fn set_api_base_url(url: String) -> Result<(), String> {
    if url.is_empty() {
        return Err("API base URL cannot be empty".to_string());
    }

    let mut settings_guard = SETTINGS
        .write()
        .map_err(|_| "Failed to acquire settings lock")?;

    let settings = settings_guard.get_or_insert_with(Settings::default);
    settings.api_base_url = url.trim_end_matches('/').to_string();

    // Save to disk
    let config_path = CONFIG_PATH
        .read()
        .map_err(|_| "Failed to acquire config path lock")?
        .clone()
        .ok_or("Settings not initialized")?;

    settings.save(&config_path)?;

    println!("API base URL saved to settings");
    Ok(())
}

// ==================== Auth Token ====================

/// Get the bearer token (checks env var first, then stored setting)
pub fn get_auth_token() -> Option<String> {
    // Environment variable takes precedence
    if let Ok(token) = std::env::var("COHORTREE_TOKEN") {
        if !token.is_empty() {
            return Some(token);
        }
    }

    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.auth_token.clone()
}

/// Check if a token is available
pub fn has_auth_token() -> bool {
    get_auth_token().map(|t| !t.is_empty()).unwrap_or(false)
}

/// Set and save the bearer token (empty clears it)
pub fn set_auth_token(token: String) -> Result<(), String> {
    let cleared = token.is_empty();

    let mut settings_guard = SETTINGS
        .write()
        .map_err(|_| "Failed to acquire settings lock")?;

    let settings = settings_guard.get_or_insert_with(Settings::default);
    settings.auth_token = if cleared { None } else { Some(token) };

    // Save to disk
    let config_path = CONFIG_PATH
        .read()
        .map_err(|_| "Failed to acquire config path lock")?
        .clone()
        .ok_or("Settings not initialized")?;

    settings.save(&config_path)?;

    if cleared {
        println!("Auth token cleared");
    } else {
        println!("Auth token saved to settings");
    }
    Ok(())
}

/// Get masked token for display (shows first 8/last 4 chars)
pub fn get_masked_auth_token() -> Option<String> {
    get_auth_token().map(|token| mask_token(&token))
}

fn mask_token(token: &str) -> String {
    if token.len() > 12 {
        format!("{}...{}", &token[..8], &token[token.len() - 4..])
    } else {
        "*".repeat(token.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = Settings {
            api_base_url: "https://practice.example.edu/api".to_string(),
            auth_token: Some("secret-token-1234".to_string()),
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_base_url, "https://practice.example.edu/api");
        assert_eq!(loaded.auth_token.as_deref(), Some("secret-token-1234"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(loaded.auth_token, None);
    }

    #[test]
    fn test_load_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"auth_token": "abc"}"#).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(loaded.auth_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefgh12345678"), "abcdefgh...5678");
        assert_eq!(mask_token("short"), "*****");
    }
}
