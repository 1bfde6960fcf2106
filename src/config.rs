use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Index page cache lifetime when `INDEX_CACHE_SECONDS` is unset.
pub const CACHING_TIME: u64 = 20;

/// Runtime settings read from the environment once at start-up.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub media_root: PathBuf,
    /// Raw session key material. None means a key is generated per process.
    pub secret_key: Option<Vec<u8>>,
    pub index_cache_ttl: Duration,
    pub secure_cookies: bool,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_owned());

        let media_root = PathBuf::from(lookup("MEDIA_ROOT").unwrap_or_else(|| "media".to_owned()));

        let secret_key = match lookup("SECRET_KEY") {
            Some(key) if key.len() < 64 => bail!("SECRET_KEY must be at least 64 bytes long"),
            Some(key) => Some(key.into_bytes()),
            None => None,
        };

        let index_cache_ttl = match lookup("INDEX_CACHE_SECONDS") {
            Some(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .context("INDEX_CACHE_SECONDS cannot be parsed as an unsigned integer")?,
            ),
            None => Duration::from_secs(CACHING_TIME),
        };

        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(flag) => flag
                .parse::<bool>()
                .context("SECURE_COOKIES must be `true` or `false`")?,
            None => false,
        };

        Ok(Self {
            database_url,
            bind_address,
            media_root,
            secret_key,
            index_cache_ttl,
            secure_cookies,
        })
    }
}
