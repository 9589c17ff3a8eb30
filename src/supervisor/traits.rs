//! Collaborator interfaces consumed by the supervisor
//!
//! The supervisor never talks to the messaging transport, the notification
//! backend, or the persistence layer directly. Everything goes through these
//! traits so instances can be constructed with injected collaborators.

use crate::error::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// The long-lived, device-paired messaging connection being watched.
///
/// Implemented by the embedding application over its actual transport.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchedConnection: Send + Sync {
    /// Point-in-time liveness read: does the connection report itself ready?
    async fn is_ready(&self) -> bool;

    /// Tear the connection down.
    async fn disconnect(&self) -> Result<()>;

    /// Bring the connection back up.
    async fn connect(&self) -> Result<()>;

    /// Request a fresh pairing credential for the given identity.
    async fn request_pairing_code(&self, identity: &str) -> Result<String>;
}

/// Channel used to reach the human operator.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Open (or reuse) a direct conversation with the target, returning a
    /// handle that `post_message` accepts.
    async fn open_conversation(&self, target: &str) -> Result<String>;

    /// Post a text message into the conversation.
    async fn post_message(&self, handle: &str, text: &str) -> Result<()>;
}

/// Durable string-keyed store backing supervisor state across restarts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
