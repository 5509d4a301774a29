use std::sync::Arc;

use puch_core::{Config, InMemoryBackend, MessagingBackend, PuchError};

#[tokio::test]
async fn shared_backend_counts_concurrent_sends() {
    let backend = Arc::new(InMemoryBackend::default());
    let mut handles = Vec::new();
    for i in 0..20 {
        let b = backend.clone();
        handles.push(tokio::spawn(async move {
            b.send_message("917654321098", &format!("ping {i}")).await
        }));
    }
    for h in handles {
        h.await.expect("join").expect("send");
    }
    let a = backend.get_analytics().await.unwrap();
    assert_eq!(a.total_messages, 176);
    assert_eq!(a.active_chats, 24);
    assert_eq!(a.top_contact, "John Doe (45 messages)");
}

#[tokio::test]
async fn backend_is_usable_as_trait_object() {
    let backend: Arc<dyn MessagingBackend> = Arc::new(InMemoryBackend::default());
    let jane = backend.get_contacts(Some("smith")).await.unwrap();
    assert_eq!(jane.total, 1);
    let receipt = backend
        .send_message(&jane.contacts[0].phone, "hi Jane")
        .await
        .unwrap();
    assert_eq!(receipt.phone, "918765432109");
}

#[test]
fn config_defaults_drive_token_resolution() {
    let cfg = Config::from_env_with(|_| None).unwrap();
    let registry = cfg.token_registry();
    assert!(!registry.auth_enabled());
    assert_eq!(registry.resolve(Some("123123")).unwrap(), "919876543210");
    assert_eq!(registry.resolve(Some("x")), Err(PuchError::InvalidToken));
}
