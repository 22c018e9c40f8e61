//! Configuration management for the sporlapi client.
//!
//! Values come from environment variables, optionally seeded from a `.env` file in
//! the platform local data directory. Unlike plain `env::var` lookups scattered
//! through the code, everything the pipeline needs is gathered once into
//! [`Settings`], so a missing value is reported up front instead of panicking in the
//! middle of a request.

use std::{env, path::PathBuf, time::Duration};

use crate::pipeline::CredentialSource;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_API_URL: &str = "SPOTIFY_API_URL";
const ENV_TOKEN_URL: &str = "SPOTIFY_API_TOKEN_URL";
const ENV_CLIENT_ID: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";
const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
const ENV_TIMEOUT: &str = "SPOTIFY_HTTP_TIMEOUT_SECS";
const ENV_MARKET: &str = "SPOTIFY_MARKET";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("cannot prepare config directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read .env file: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// Loads environment variables from `<data_local_dir>/sporlapi/.env`.
///
/// The directory is created when missing. A missing `.env` file is not an error;
/// values may come from the process environment alone. Variables already present in
/// the environment win over the file.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/sporlapi/.env`
/// - macOS: `~/Library/Application Support/sporlapi/.env`
/// - Windows: `%LOCALAPPDATA%/sporlapi/.env`
pub async fn load_env() -> Result<(), ConfigError> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)?;
    }
    Ok(())
}

/// Path of the `.env` file read by [`load_env`].
pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlapi/.env");
    path
}

/// Everything needed to construct a [`crate::spotify::SpotifyClient`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub credential_source: CredentialSource,
    pub timeout: Duration,
    pub market: Option<String>,
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// `SPOTIFY_ACCESS_TOKEN` selects a static token; otherwise the client id and
    /// secret are required for the client-credentials exchange.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Settings::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let credential_source = match get(ENV_ACCESS_TOKEN) {
            Some(token) => CredentialSource::StaticToken(token),
            None => CredentialSource::ProviderBacked {
                client_id: get(ENV_CLIENT_ID).ok_or(ConfigError::Missing(ENV_CLIENT_ID))?,
                client_secret: get(ENV_CLIENT_SECRET)
                    .ok_or(ConfigError::Missing(ENV_CLIENT_SECRET))?,
                token_endpoint: get(ENV_TOKEN_URL)
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            },
        };

        let timeout = match get(ENV_TIMEOUT) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: ENV_TIMEOUT,
                        value: raw,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            credential_source,
            timeout,
            market: get(ENV_MARKET),
        })
    }
}
