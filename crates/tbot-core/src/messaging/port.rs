use async_trait::async_trait;

use crate::{messaging::types::OutgoingMessage, Result};

/// Outbound half of the transport/session layer.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, msg: OutgoingMessage) -> Result<()>;
}

/// Identity-key management exposed by the transport.
#[async_trait]
pub trait IdentityKeys: Send + Sync {
    async fn accept_identity_key(&self, addr: &str) -> Result<()>;
}
