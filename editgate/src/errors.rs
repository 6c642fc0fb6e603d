use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

/// Internal error vocabulary for the authentication core.
///
/// None of these are fatal to the hosting page: every public operation on the
/// session manager resolves to a well-defined state instead of propagating
/// one of these. They exist so that diagnostics and event reasons name what
/// actually went wrong.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Manifest retrieval failed (transport error, non-success status, or an
    /// unparseable document). Always recovered locally via the fallback
    /// manifest, never surfaced as a hard error.
    #[error("failed to retrieve credential manifest: {reason}")]
    Retrieval { reason: String },

    /// The submitted password matched no stored fingerprint. Surfaced to the
    /// user as a rejected login; session state is left untouched.
    #[error("password matched no stored fingerprint")]
    Verification,

    /// A persisted session was found past its expiry. Surfaced as an
    /// informational notice and treated as unauthenticated.
    #[error("persisted session expired at {expires_at}")]
    ExpiredSession { expires_at: DateTime<Utc> },

    /// The persisted session record could not be parsed. Treated identically
    /// to "no record"; logged as a diagnostic only.
    #[error("persisted session record is unreadable: {reason}")]
    CorruptState { reason: String },

    /// The session store could not complete a read/write/clear. The store
    /// degrades to "absent record" semantics rather than failing the caller.
    #[error("session store failed to {operation}: {reason}")]
    Storage { operation: String, reason: String },

    /// The supplied configuration is unusable. Raised at load time, before
    /// any session operation runs.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

/// Type alias for fallible internal operations
pub type Result<T> = std::result::Result<T, Error>;
