use crate::{DEFAULT_OWNER_PHONE, PuchError, TokenRegistry};
use secrecy::SecretString;
use std::collections::HashMap;

pub const DEFAULT_SERVER_NAME: &str = "Puch MCP";
pub const DEFAULT_TOKEN_MAP: &str = "123123:919876543210,test:919876543210,dipesh:919876543210";

#[derive(Clone, Debug)]
pub struct Config {
    pub auth_token: Option<SecretString>,
    pub owner_phone: String,
    pub token_map: HashMap<String, String>,
    pub server_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, PuchError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, PuchError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let auth_token = get("PUCH_AUTH_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::new(t.into()));
        let owner_phone =
            get("PUCH_OWNER_PHONE").unwrap_or_else(|| DEFAULT_OWNER_PHONE.to_string());
        let owner_phone = crate::phone::normalize_phone(&owner_phone).ok_or_else(|| {
            PuchError::Config(format!("PUCH_OWNER_PHONE is not a phone number: {owner_phone:?}"))
        })?;
        let token_map = parse_token_map(
            &get("PUCH_TOKEN_MAP").unwrap_or_else(|| DEFAULT_TOKEN_MAP.to_string()),
        )?;
        let server_name = get("PUCH_SERVER_NAME")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());
        Ok(Self {
            auth_token,
            owner_phone,
            token_map,
            server_name,
        })
    }

    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(
            self.auth_token.clone(),
            self.token_map.clone(),
            self.owner_phone.clone(),
        )
    }
}

/// Parse `token:phone` pairs separated by commas. Blank entries are skipped.
pub fn parse_token_map(raw: &str) -> Result<HashMap<String, String>, PuchError> {
    let mut map = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (token, phone) = entry
            .split_once(':')
            .map(|(t, p)| (t.trim(), p.trim()))
            .filter(|(t, _)| !t.is_empty())
            .ok_or_else(|| PuchError::Config(format!("bad PUCH_TOKEN_MAP entry: {entry:?}")))?;
        let phone = crate::phone::normalize_phone(phone).ok_or_else(|| {
            PuchError::Config(format!("bad phone in PUCH_TOKEN_MAP entry: {entry:?}"))
        })?;
        map.insert(token.to_string(), phone);
    }
    Ok(map)
}
