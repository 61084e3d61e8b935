//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub deals_api_url: String,
    pub storefront_api_url: String,
    /// Country code for regional prices (`cc`).
    pub storefront_country: String,
    /// Language for descriptions (`l`).
    pub storefront_language: String,
    pub deals_page_size: u32,
    pub search_limit: u32,
    pub feed_max_listings: usize,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Upstream API Settings ---
        let deals_api_url = std::env::var("DEALS_API_URL")
            .unwrap_or_else(|_| "https://www.cheapshark.com/api/1.0".to_string());
        let storefront_api_url = std::env::var("STOREFRONT_API_URL")
            .unwrap_or_else(|_| "https://store.steampowered.com/api".to_string());
        let storefront_country =
            std::env::var("STOREFRONT_COUNTRY").unwrap_or_else(|_| "br".to_string());
        let storefront_language =
            std::env::var("STOREFRONT_LANGUAGE").unwrap_or_else(|_| "brazilian".to_string());

        // --- Load Listing Settings ---
        let deals_page_size = parse_var("DEALS_PAGE_SIZE", "12")?;
        let search_limit = parse_var("SEARCH_LIMIT", "25")?;
        let feed_max_listings = parse_var::<NonZeroUsize>("FEED_MAX_LISTINGS", "500")?.get();

        let cors_origin = std::env::var("CORS_ORIGIN").ok().filter(|o| o != "*");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            deals_api_url: trim_base(deals_api_url),
            storefront_api_url: trim_base(storefront_api_url),
            storefront_country,
            storefront_language,
            deals_page_size,
            search_limit,
            feed_max_listings,
            cors_origin,
        })
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_value(name, &raw)
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
