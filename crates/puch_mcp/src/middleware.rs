//! Logging and latency metrics around a `MessagingBackend`.

use std::sync::Arc;
use std::time::Instant;

use puch_core::{Analytics, ContactList, MessagingBackend, PuchError, SentMessage};
use tracing::debug;

/// Decorator that times every backend call and logs its outcome.
#[derive(Clone)]
pub struct LoggingBackend<B: MessagingBackend> {
    inner: Arc<B>,
}

impl<B: MessagingBackend> LoggingBackend<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn with_logging<F, Fut, T>(&self, operation: F, name: &'static str) -> Result<T, PuchError>
    where
        F: FnOnce(Arc<B>) -> Fut,
        Fut: std::future::Future<Output = Result<T, PuchError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        metrics::histogram!("puch_backend_latency_seconds", "op" => name)
            .record(duration.as_secs_f64());
        match &result {
            Ok(_) => debug!("Operation completed successfully: {} in {:?}", name, duration),
            Err(e) => debug!("Operation failed: {} in {:?} - error: {}", name, duration, e),
        }

        result
    }
}

#[async_trait::async_trait]
impl<B: MessagingBackend> MessagingBackend for LoggingBackend<B> {
    async fn send_message(&self, phone: &str, message: &str) -> Result<SentMessage, PuchError> {
        self.with_logging(
            |backend| async move { backend.send_message(phone, message).await },
            "send_message",
        )
        .await
    }

    async fn get_contacts(&self, search: Option<&str>) -> Result<ContactList, PuchError> {
        self.with_logging(
            |backend| async move { backend.get_contacts(search).await },
            "get_contacts",
        )
        .await
    }

    async fn get_analytics(&self) -> Result<Analytics, PuchError> {
        self.with_logging(
            |backend| async move { backend.get_analytics().await },
            "get_analytics",
        )
        .await
    }
}
