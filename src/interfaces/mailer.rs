use async_trait::async_trait;

use crate::error::Result;

/// Outbound mail seam. The recipient is fixed by deployment configuration,
/// so senders only take subject and body.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}
