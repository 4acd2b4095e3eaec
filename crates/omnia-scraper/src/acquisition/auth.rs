//! Login handshake that establishes the session cookie.

use crate::acquisition::http_client::{decode, HttpClient};
use crate::config::Credentials;
use crate::error::{ScrapeError, ScrapeResult};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const LOGIN_ENDPOINT: &str = "login";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Only the presence of `user` matters; its contents are never read.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    user: Option<serde_json::Value>,
}

impl LoginResponse {
    fn is_authenticated(&self) -> bool {
        matches!(self.user, Some(ref u) if !u.is_null())
    }
}

/// Log in once. On success the session cookie sits in `client`'s cookie
/// store and rides along on every later request.
///
/// A null or absent `user`, or a 401/403 answer, is [`ScrapeError::Auth`].
pub async fn login(client: &HttpClient, credentials: &Credentials) -> ScrapeResult<()> {
    let request = LoginRequest {
        username: &credentials.username,
        password: &credentials.password,
    };

    let resp = client
        .send_raw(Method::POST, LOGIN_ENDPOINT, &request)
        .await?;

    if matches!(resp.status, 401 | 403) {
        return Err(ScrapeError::Auth);
    }
    if !resp.is_success() {
        return Err(ScrapeError::HttpStatus {
            status: resp.status,
            url: resp.url,
        });
    }

    let parsed: LoginResponse = decode(LOGIN_ENDPOINT, &resp.body)?;
    if !parsed.is_authenticated() {
        return Err(ScrapeError::Auth);
    }

    tracing::info!("logged in as '{}'", credentials.username);
    Ok(())
}
