use thiserror::Error;

use super::validation::ValidationError;
use crate::platform::PlatformError;
use crate::store::StoreError;

/// Outcome of a failed lifecycle operation. Every variant aborts the
/// operation before the state document is written.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Malformed course, semester or open status.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Actor is neither owner nor moderator. Never reported to the user.
    #[error("action not permitted")]
    Unauthorized,
    /// Cooldown active; the group channel has already been told.
    #[error("rename cooldown active for another {remaining} seconds")]
    RateLimited { remaining: i64 },
    #[error("no such {0}")]
    NotFound(&'static str),
    /// Bulk initialization met a channel whose name cannot be parsed.
    #[error("channel name has wrong format: {0}")]
    ConfigIntegrity(String),
    #[error("groups are already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
