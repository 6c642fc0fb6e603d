//! Collaborator-facing lifecycle notifications.
//!
//! The authentication core never touches presentation. It emits these events
//! over a broadcast channel and lets external observers (the edit-mode/DOM
//! layer) render them however they choose: toast, panel, or modal. Lagging
//! or absent receivers never block or fail the core.

/// Buffered events per receiver before older ones are dropped.
pub(crate) const EVENT_BUFFER: usize = 16;

/// State transitions the presentation layer may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session became live, either from a fresh login or from a valid
    /// persisted session adopted on startup. Edit affordances may be shown.
    Authenticated {
        role: String,
        display_name: String,
        capabilities: Vec<String>,
    },
    /// A persisted session was found past its expiry and discarded.
    SessionExpired,
    /// A submitted password matched no stored fingerprint.
    LoginFailed,
    /// The session was destroyed; edit affordances must be torn down.
    LoggedOut,
}
