//! Domain types and the `MessagingBackend` seam behind the Puch MCP server.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod memory;
pub mod observability;
pub mod phone;

pub use auth::TokenRegistry;
pub use config::Config;
pub use memory::InMemoryBackend;

/// Phone number returned for the owner of this server when nothing else is configured.
pub const DEFAULT_OWNER_PHONE: &str = "919876543210";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PuchError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("invalid phone number: {0:?}")]
    InvalidPhone(String),
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ContactList {
    pub contacts: Vec<Contact>,
    pub total: usize,
}

impl From<Vec<Contact>> for ContactList {
    fn from(contacts: Vec<Contact>) -> Self {
        let total = contacts.len();
        Self { contacts, total }
    }
}

/// Receipt for an accepted outbound message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct SentMessage {
    pub success: bool,
    pub phone: String,
    pub message: String,
    pub status: String,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_messages: u64,
    pub active_chats: u64,
    pub response_rate: String,
    pub top_contact: String,
}

#[async_trait]
pub trait MessagingBackend: Send + Sync + 'static {
    async fn send_message(&self, phone: &str, message: &str) -> Result<SentMessage, PuchError>;

    /// List contacts, optionally filtered by a case-insensitive name substring.
    async fn get_contacts(&self, search: Option<&str>) -> Result<ContactList, PuchError>;

    async fn get_analytics(&self) -> Result<Analytics, PuchError>;
}
