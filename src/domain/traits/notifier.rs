use async_trait::async_trait;

/// Error surfacing - fire-and-forget, never fails the caller
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn report(&self, error: &(dyn std::error::Error + Send + Sync), channel: Option<&str>);
}
