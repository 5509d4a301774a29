use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::PuchError;

/// Tokens shorter than this are never accepted by the lenient fallback.
pub const MIN_FALLBACK_TOKEN_LEN: usize = 3;

/// Resolves Puch tokens to phone numbers and gates HTTP requests on a bearer token.
#[derive(Clone, Debug)]
pub struct TokenRegistry {
    auth_token: Option<SecretString>,
    mappings: HashMap<String, String>,
    owner_phone: String,
}

impl TokenRegistry {
    pub fn new(
        auth_token: Option<SecretString>,
        mappings: HashMap<String, String>,
        owner_phone: impl Into<String>,
    ) -> Self {
        Self {
            auth_token,
            mappings,
            owner_phone: owner_phone.into(),
        }
    }

    pub fn owner_phone(&self) -> &str {
        &self.owner_phone
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Resolve a token to the phone number of the user it belongs to.
    ///
    /// `None` means the caller already passed the HTTP bearer gate and gets
    /// the owner's number.
    pub fn resolve(&self, token: Option<&str>) -> Result<String, PuchError> {
        let Some(token) = token else {
            return Ok(self.owner_phone.clone());
        };
        if let Some(phone) = self.mappings.get(token) {
            debug!(token = %redact(token), "token matched mapping");
            return Ok(phone.clone());
        }
        if self.matches_auth_token(token) {
            return Ok(self.owner_phone.clone());
        }
        if token.chars().count() >= MIN_FALLBACK_TOKEN_LEN {
            info!(token = %redact(token), "unknown token, using owner phone fallback");
            return Ok(self.owner_phone.clone());
        }
        Err(PuchError::InvalidToken)
    }

    /// Check an `Authorization` header value. Always true when no auth token is configured.
    pub fn authorize_header(&self, header: Option<&str>) -> bool {
        if self.auth_token.is_none() {
            return true;
        }
        header
            .and_then(bearer_token)
            .is_some_and(|t| self.matches_auth_token(t))
    }

    fn matches_auth_token(&self, token: &str) -> bool {
        self.auth_token
            .as_ref()
            .is_some_and(|s| s.expose_secret() == token)
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Tokens shorter than this are logged as `***` with nothing revealed.
const REDACT_MIN_LEN: usize = 6;

/// Keep at most the first two characters of a token for log output.
pub fn redact(token: &str) -> String {
    if token.chars().count() < REDACT_MIN_LEN {
        return "***".to_string();
    }
    let head: String = token.chars().take(2).collect();
    format!("{head}***")
}
