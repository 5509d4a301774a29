//! In-process `MessagingBackend` with a seeded contact book and analytics baseline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::info;

use crate::phone::{message_id, normalize_phone};
use crate::{Analytics, Contact, ContactList, MessagingBackend, PuchError, SentMessage};

/// Counters the analytics report starts from before any message is sent.
#[derive(Clone, Debug)]
pub struct AnalyticsBaseline {
    pub total_messages: u64,
    pub active_chats: u64,
    pub response_rate: String,
    pub top_contact: String,
    pub top_contact_messages: u64,
}

impl Default for AnalyticsBaseline {
    fn default() -> Self {
        Self {
            total_messages: 156,
            active_chats: 23,
            response_rate: "94%".to_string(),
            top_contact: "John Doe".to_string(),
            top_contact_messages: 45,
        }
    }
}

pub fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::new("John Doe", "919876543210"),
        Contact::new("Jane Smith", "918765432109"),
        Contact::new("Bob Johnson", "917654321098"),
    ]
}

/// Number of sent messages kept for [`InMemoryBackend::recent_messages`].
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Clone, Debug)]
pub struct MessageRecord {
    pub receipt: SentMessage,
    pub sent_at: DateTime<Utc>,
}

/// Analytics only need the counters; `recent` is capped and drops the oldest record.
#[derive(Default)]
struct Outbox {
    total_sent: u64,
    per_phone: HashMap<String, u64>,
    recent: VecDeque<MessageRecord>,
}

pub struct InMemoryBackend {
    contacts: Vec<Contact>,
    baseline: AnalyticsBaseline,
    history_limit: usize,
    outbox: RwLock<Outbox>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(default_contacts(), AnalyticsBaseline::default())
    }
}

impl InMemoryBackend {
    pub fn new(contacts: Vec<Contact>, baseline: AnalyticsBaseline) -> Self {
        Self {
            contacts,
            baseline,
            history_limit: DEFAULT_HISTORY_LIMIT,
            outbox: RwLock::new(Outbox::default()),
        }
    }

    /// Keep at most `limit` messages for [`Self::recent_messages`].
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Most recent messages first.
    pub async fn recent_messages(&self, limit: usize) -> Vec<MessageRecord> {
        let outbox = self.outbox.read().await;
        outbox.recent.iter().rev().take(limit).cloned().collect()
    }

    fn top_contact(&self, per_phone: &HashMap<String, u64>) -> String {
        let mut best_name = self.baseline.top_contact.as_str();
        let mut best = self.baseline.top_contact_messages
            + self
                .contacts
                .iter()
                .find(|c| c.name == self.baseline.top_contact)
                .and_then(|c| per_phone.get(&c.phone))
                .copied()
                .unwrap_or(0);
        for c in &self.contacts {
            if c.name == self.baseline.top_contact {
                continue;
            }
            let count = per_phone.get(&c.phone).copied().unwrap_or(0);
            if count > best {
                best = count;
                best_name = &c.name;
            }
        }
        format!("{best_name} ({best} messages)")
    }
}

#[async_trait]
impl MessagingBackend for InMemoryBackend {
    async fn send_message(&self, phone: &str, message: &str) -> Result<SentMessage, PuchError> {
        let phone = normalize_phone(phone).ok_or_else(|| PuchError::InvalidPhone(phone.into()))?;
        if message.trim().is_empty() {
            return Err(PuchError::EmptyMessage);
        }
        let receipt = SentMessage {
            success: true,
            id: message_id(&phone, message),
            phone: phone.clone(),
            message: message.to_string(),
            status: "sent".to_string(),
        };

        let mut outbox = self.outbox.write().await;
        outbox.total_sent += 1;
        *outbox.per_phone.entry(phone).or_insert(0) += 1;
        if self.history_limit > 0 {
            while outbox.recent.len() >= self.history_limit {
                outbox.recent.pop_front();
            }
            outbox.recent.push_back(MessageRecord {
                receipt: receipt.clone(),
                sent_at: Utc::now(),
            });
        }
        metrics::counter!("puch_messages_sent_total").increment(1);
        info!(id = %receipt.id, "message accepted");
        Ok(receipt)
    }

    async fn get_contacts(&self, search: Option<&str>) -> Result<ContactList, PuchError> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let contacts = match needle {
            Some(n) => self
                .contacts
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&n))
                .cloned()
                .collect(),
            None => self.contacts.clone(),
        };
        Ok(ContactList::from(contacts))
    }

    async fn get_analytics(&self) -> Result<Analytics, PuchError> {
        let outbox = self.outbox.read().await;
        Ok(Analytics {
            total_messages: self.baseline.total_messages + outbox.total_sent,
            active_chats: self.baseline.active_chats + outbox.per_phone.len() as u64,
            response_rate: self.baseline.response_rate.clone(),
            top_contact: self.top_contact(&outbox.per_phone),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contacts_unfiltered_keep_seed_order() {
        let b = InMemoryBackend::default();
        let list = b.get_contacts(None).await.unwrap();
        assert_eq!(list.total, 3);
        assert_eq!(list.contacts[0].name, "John Doe");
        assert_eq!(list.contacts[2].name, "Bob Johnson");
        assert_eq!(b.get_contacts(Some("   ")).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn contacts_search_is_case_insensitive() {
        let b = InMemoryBackend::default();
        let list = b.get_contacts(Some("jOhN")).await.unwrap();
        let names: Vec<_> = list.contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Bob Johnson"]);
        assert_eq!(list.total, 2);
        assert_eq!(b.get_contacts(Some("zzz")).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn send_message_returns_receipt() {
        let b = InMemoryBackend::default();
        let r = b
            .send_message("+91 98765 43210", "Hello from test!")
            .await
            .unwrap();
        assert!(r.success);
        assert_eq!(r.status, "sent");
        assert_eq!(r.phone, "919876543210");
        assert_eq!(r.id, message_id("919876543210", "Hello from test!"));
        assert_eq!(b.recent_messages(10).await.len(), 1);
    }

    #[tokio::test]
    async fn send_message_validates_input() {
        let b = InMemoryBackend::default();
        assert_eq!(
            b.send_message("abc", "hi").await,
            Err(PuchError::InvalidPhone("abc".into()))
        );
        assert_eq!(
            b.send_message("919876543210", "  \n").await,
            Err(PuchError::EmptyMessage)
        );
        assert!(b.recent_messages(10).await.is_empty());
    }

    #[tokio::test]
    async fn analytics_start_from_baseline() {
        let b = InMemoryBackend::default();
        let a = b.get_analytics().await.unwrap();
        assert_eq!(a.total_messages, 156);
        assert_eq!(a.active_chats, 23);
        assert_eq!(a.response_rate, "94%");
        assert_eq!(a.top_contact, "John Doe (45 messages)");
    }

    #[tokio::test]
    async fn analytics_track_sent_messages() {
        let b = InMemoryBackend::default();
        b.send_message("919876543210", "one").await.unwrap();
        b.send_message("919876543210", "two").await.unwrap();
        b.send_message("911234567890", "three").await.unwrap();
        let a = b.get_analytics().await.unwrap();
        assert_eq!(a.total_messages, 159);
        assert_eq!(a.active_chats, 25);
        assert_eq!(a.top_contact, "John Doe (47 messages)");
    }

    #[tokio::test]
    async fn top_contact_can_change_hands() {
        let baseline = AnalyticsBaseline {
            top_contact_messages: 1,
            ..AnalyticsBaseline::default()
        };
        let b = InMemoryBackend::new(default_contacts(), baseline);
        b.send_message("918765432109", "a").await.unwrap();
        assert_eq!(
            b.get_analytics().await.unwrap().top_contact,
            "John Doe (1 messages)"
        );
        b.send_message("918765432109", "b").await.unwrap();
        assert_eq!(
            b.get_analytics().await.unwrap().top_contact,
            "Jane Smith (2 messages)"
        );
    }

    #[tokio::test]
    async fn recent_messages_newest_first() {
        let b = InMemoryBackend::default();
        b.send_message("919876543210", "first").await.unwrap();
        b.send_message("919876543210", "second").await.unwrap();
        let recent = b.recent_messages(1).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].receipt.message, "second");
    }

    #[tokio::test]
    async fn history_is_capped_but_counts_are_not() {
        let b = InMemoryBackend::default().with_history_limit(3);
        for i in 0..10 {
            b.send_message("919876543210", &format!("msg {i}"))
                .await
                .unwrap();
        }
        let recent = b.recent_messages(usize::MAX).await;
        let texts: Vec<_> = recent.iter().map(|r| r.receipt.message.as_str()).collect();
        assert_eq!(texts, vec!["msg 9", "msg 8", "msg 7"]);

        let a = b.get_analytics().await.unwrap();
        assert_eq!(a.total_messages, 166);
        assert_eq!(a.top_contact, "John Doe (55 messages)");
    }

    #[tokio::test]
    async fn zero_history_keeps_nothing() {
        let b = InMemoryBackend::default().with_history_limit(0);
        b.send_message("919876543210", "hi").await.unwrap();
        assert!(b.recent_messages(10).await.is_empty());
        assert_eq!(b.get_analytics().await.unwrap().total_messages, 157);
    }

    #[tokio::test]
    async fn default_history_limit_applies() {
        let b = InMemoryBackend::default();
        for i in 0..DEFAULT_HISTORY_LIMIT + 5 {
            b.send_message("918765432109", &format!("m{i}")).await.unwrap();
        }
        assert_eq!(
            b.recent_messages(usize::MAX).await.len(),
            DEFAULT_HISTORY_LIMIT
        );
    }
}
