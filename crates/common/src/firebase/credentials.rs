use std::fmt;
use std::path::Path;

use jsonwebtoken::EncodingKey;
use serde::Deserialize;

use crate::error::{BusError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service-account key file as downloaded from the Firebase console.
///
/// Only the fields needed for the JWT bearer flow are kept; the rest of the
/// file is ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    /// Reads and validates a service-account key file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The content is not a service-account JSON document
    /// - The private key is not a PEM encoded RSA key
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        tracing::debug!("Read credentials from {}", path.display());
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let account: ServiceAccount = serde_json::from_str(raw)
            .map_err(|e| BusError::Credentials(format!("malformed key file: {e}")))?;

        if account.account_type != "service_account" {
            return Err(BusError::Credentials(format!(
                "expected type \"service_account\", got \"{}\"",
                account.account_type
            )));
        }
        if account.client_email.is_empty() {
            return Err(BusError::Credentials("client_email is empty".to_string()));
        }
        // Fail at load time rather than on the first token request
        account.signing_key()?;

        Ok(account)
    }

    pub(crate) fn signing_key(&self) -> Result<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| BusError::Credentials(format!("invalid private key: {e}")))
    }
}

// Keeps the private key out of logs
impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
