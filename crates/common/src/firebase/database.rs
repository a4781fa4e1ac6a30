use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;

use super::auth::TokenProvider;
use super::credentials::ServiceAccount;
use crate::error::{BusError, Result};

/// Authenticated handle to one Realtime Database instance.
///
/// Constructed once at startup and shared by every [`DatabaseReference`]
/// derived from it.
pub struct FirebaseDatabase {
    http: reqwest::Client,
    base_url: Url,
    auth: TokenProvider,
}

/// Checks that `path` names a node: slash-separated, non-empty keys without
/// the characters Firebase forbids in keys (`. $ # [ ]` and control characters).
pub fn validate_path(path: &str) -> Result<()> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(BusError::Config("reference path is empty".to_string()));
    }
    for key in trimmed.split('/') {
        if key.is_empty() {
            return Err(BusError::Config(format!(
                "reference path {path:?} contains an empty key"
            )));
        }
        if let Some(c) = key
            .chars()
            .find(|&c| matches!(c, '.' | '$' | '#' | '[' | ']') || c.is_control())
        {
            return Err(BusError::Config(format!(
                "reference path {path:?} contains forbidden character {c:?}"
            )));
        }
    }
    Ok(())
}

impl FirebaseDatabase {
    /// Creates a client for `database_url` using the given service account.
    ///
    /// No network traffic happens here; call [`authenticate`](Self::authenticate)
    /// to verify the credentials up front.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `database_url` is not an absolute http(s) URL
    /// - The service account key cannot be used for signing
    /// - The HTTP client cannot be built
    pub fn new(database_url: &str, account: ServiceAccount) -> Result<Self> {
        let mut base_url = Url::parse(database_url)
            .map_err(|e| BusError::Config(format!("invalid database URL {database_url:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(BusError::Config(format!(
                "database URL must be http(s), got {database_url:?}"
            )));
        }

        // No request timeout: a stalled write blocks the loop until the
        // connection gives up on its own.
        let http = reqwest::Client::builder().build()?;
        let auth = TokenProvider::new(account, http.clone())?;
        base_url.set_fragment(None);

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Obtains (and caches) an access token, surfacing credential problems early.
    pub async fn authenticate(&self) -> Result<()> {
        self.auth.access_token().await.map(|_| ())
    }

    /// Returns a handle to the node at `path`, e.g. `buses/bus1`.
    pub fn reference(self: &Arc<Self>, path: &str) -> DatabaseReference {
        DatabaseReference {
            db: Arc::clone(self),
            path: path.trim_matches('/').to_string(),
        }
    }
}

/// A location in the database that can be overwritten with a JSON value.
#[derive(Clone)]
pub struct DatabaseReference {
    db: Arc<FirebaseDatabase>,
    path: String,
}

impl DatabaseReference {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// REST endpoint of this node. Any query on the database URL (such as the
    /// emulator's `?ns=`) is preserved.
    pub fn url(&self) -> Result<Url> {
        validate_path(&self.path)?;

        let mut keys: Vec<&str> = self.path.split('/').collect();
        let last = format!("{}.json", keys.pop().unwrap_or_default());

        let mut url = self.db.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BusError::Config(format!("database URL {} cannot hold a path", self.db.base_url)))?
            .pop_if_empty()
            .extend(keys)
            .push(&last);
        Ok(url)
    }

    /// Replaces whatever is stored at this location with `value`.
    pub async fn set<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let mut url = self.url()?;
        url.query_pairs_mut().append_pair("print", "silent");
        let token = self.db.auth.access_token().await?;

        let response = self
            .db
            .http
            .put(url)
            .bearer_auth(token)
            .json(value)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BusError::Database {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(path = %self.path, "Reference updated");
        Ok(())
    }
}
