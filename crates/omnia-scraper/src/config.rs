// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run configuration and its resolution from flags, files and environment.
//!
//! ## Credentials
//!
//! The password is resolved in this order:
//! 1. `--password` flag
//! 2. `OMNIA_PASSWORD_FILE` env → reads the password from the file path
//! 3. `OMNIA_PASSWORD` env → uses the value directly (visible in `ps`)
//!
//! `OMNIA_PASSWORD_FILE` is preferred because file paths are not visible in
//! the process list, unlike environment variable values.

use crate::error::{ScrapeError, ScrapeResult};
use crate::pacing::PacingPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Vendor origin every endpoint path is joined to.
pub const DEFAULT_BASE_URL: &str = "https://b2b.omniacomponents.com/";

/// Desktop Firefox string the vendor site accepts.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:76.0) Gecko/20100101 Firefox/76.0";

pub const DEFAULT_CATEGORY_ID: u64 = 1327;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub const ENV_USERNAME: &str = "OMNIA_USERNAME";
pub const ENV_PASSWORD: &str = "OMNIA_PASSWORD";
pub const ENV_PASSWORD_FILE: &str = "OMNIA_PASSWORD_FILE";
pub const ENV_CATEGORY_ID: &str = "OMNIA_CATEGORY_ID";
pub const ENV_BASE_URL: &str = "OMNIA_BASE_URL";

/// Login credentials. The password never appears in `Debug` output or
/// serialized configs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What to do when a product has no usable tech sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTechsheetPolicy {
    /// Abort the whole run.
    #[default]
    Fail,
    /// Log, record the product id, and continue with the next product.
    Skip,
}

/// Everything a scrape run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub category_id: u64,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub pacing: PacingPolicy,
    pub on_missing_techsheet: MissingTechsheetPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::default(),
            category_id: DEFAULT_CATEGORY_ID,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            pacing: PacingPolicy::default(),
            on_missing_techsheet: MissingTechsheetPolicy::Fail,
        }
    }
}

impl ScraperConfig {
    /// Load a JSON config file. Absent keys take their defaults.
    pub fn from_json_file(path: &Path) -> ScrapeResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ScrapeError::Config(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// The base origin as a URL, always ending in `/` so relative endpoint
    /// paths join beneath it instead of replacing its last segment.
    pub fn base_url(&self) -> ScrapeResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::Config(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    /// Reject configs that cannot possibly produce a successful run.
    pub fn validate(&self) -> ScrapeResult<()> {
        self.base_url()?;
        if self.credentials.username.trim().is_empty() {
            return Err(ScrapeError::Config(format!(
                "username is required (--username or {ENV_USERNAME})"
            )));
        }
        if self.credentials.password.is_empty() {
            return Err(ScrapeError::Config(format!(
                "password is required (--password, {ENV_PASSWORD_FILE} or {ENV_PASSWORD})"
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ScrapeError::Config("timeout must be non-zero".to_string()));
        }
        self.pacing.validate()
    }
}

/// Resolve the password from an explicit value, a password file named by
/// `OMNIA_PASSWORD_FILE`, or `OMNIA_PASSWORD`, in that order.
///
/// `env` is the variable lookup, `std::env::var(..).ok()` in the binary.
pub fn resolve_password<F>(explicit: Option<&str>, env: F) -> ScrapeResult<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(password) = explicit {
        return Ok(Some(password.to_string()));
    }

    if let Some(path) = env(ENV_PASSWORD_FILE) {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ScrapeError::Config(format!(
                "cannot read password file at '{path}': {e}. \
                 Check that the file exists and is readable."
            ))
        })?;
        let password = raw.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            return Err(ScrapeError::Config(format!(
                "password file at '{path}' is empty"
            )));
        }
        return Ok(Some(password));
    }

    Ok(env(ENV_PASSWORD))
}

/// Resolve a plain string setting from an explicit value or an env var.
pub fn resolve_string<F>(explicit: Option<&str>, var: &str, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit.map(str::to_string).or_else(|| env(var))
}

/// Resolve the category id from an explicit value or `OMNIA_CATEGORY_ID`.
pub fn resolve_category_id<F>(explicit: Option<u64>, env: F) -> ScrapeResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    if explicit.is_some() {
        return Ok(explicit);
    }
    match env(ENV_CATEGORY_ID) {
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            ScrapeError::Config(format!("{ENV_CATEGORY_ID} is not a category id: '{raw}'"))
        }),
        None => Ok(None),
    }
}
