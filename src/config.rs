use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ShopError};

const DEFAULT_RETURN_URL: &str = "http://localhost:3000/checkout/return";
const DEFAULT_CANCEL_URL: &str = "http://localhost:3000/checkout/cancel";
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_PAGE_SIZE: u32 = 12;

#[derive(Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ShopError::ConfigRead {
                path: config_path.clone(),
                source: e,
            })?;

        Self::parse(&contents).map_err(|e| ShopError::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn config_dir() -> Result<PathBuf> {
        ProjectDirs::from("", "", "shop")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ShopError::NoConfigDir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the backend base URL with env var taking precedence over config file
    pub fn api_url(&self) -> Result<Url> {
        let raw = match std::env::var("SHOP_API_URL") {
            Ok(url) => url,
            Err(_) => self.api_url.clone().ok_or(ShopError::MissingApiUrl)?,
        };

        Url::parse(&raw).map_err(|_| ShopError::InvalidUrl(raw))
    }

    /// Token override for scripted use; otherwise the logged-in session is used
    pub fn token_override() -> Option<String> {
        std::env::var("SHOP_TOKEN").ok().filter(|t| !t.is_empty())
    }

    pub fn return_url(&self) -> &str {
        self.return_url.as_deref().unwrap_or(DEFAULT_RETURN_URL)
    }

    pub fn cancel_url(&self) -> &str {
        self.cancel_url.as_deref().unwrap_or(DEFAULT_CANCEL_URL)
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = Config::parse("api_url = \"https://shop.example.com\"").unwrap();
        assert_eq!(config.return_url(), DEFAULT_RETURN_URL);
        assert_eq!(config.cancel_url(), DEFAULT_CANCEL_URL);
        assert_eq!(config.currency(), "USD");
        assert_eq!(config.page_size(), 12);
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
api_url = "https://shop.example.com"
return_url = "https://shop.example.com/return"
cancel_url = "https://shop.example.com/cancel"
currency = "EUR"
page_size = 30
"#,
        )
        .unwrap();
        assert_eq!(config.return_url(), "https://shop.example.com/return");
        assert_eq!(config.currency(), "EUR");
        assert_eq!(config.page_size(), 30);
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(Config::parse("page_size = \"many\"").is_err());
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let config = Config {
            api_url: Some("https://shop.example.com".to_string()),
            ..Default::default()
        };
        let written = toml::to_string(&config).unwrap();
        assert_eq!(written.trim(), "api_url = \"https://shop.example.com\"");
    }
}
