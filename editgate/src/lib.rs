//! # editgate: Edit-Mode Authentication for Static Pages
//!
//! `editgate` grants a visiting client elevated, in-place editing privileges
//! over a static content page after presenting a password, without any
//! server-side authority. It is the authentication and session-lifecycle core
//! behind an "edit mode": credential retrieval with fallback, password
//! verification via a deterministic digest, role-to-capability mapping,
//! session token issuance, persisted-session validation with expiry, and the
//! state transitions that gate the privileged mode.
//!
//! ## Overview
//!
//! Static content hosting has no application server to ask "may this visitor
//! edit?". This crate answers that question entirely on the client: a
//! credential manifest (role → password fingerprint, role → capability tags)
//! is fetched from a well-known remote location on every login attempt, with
//! a built-in fallback manifest so the page stays operable offline. A
//! successful login mints an expiring [`Session`] with a snapshot of the
//! role's capabilities and persists it to a single local key-value slot; the
//! next page load restores and validates it. The surrounding presentation
//! layer (edit buttons, floating panels, toasts, the login dialog) is an
//! external collaborator that consumes the session's state through the
//! [`EditGate`] facade and its event stream, and is deliberately absent from
//! this crate.
//!
//! ## Security model
//!
//! There is none, and that is explicit: the digest is obfuscation rather than
//! cryptography, the fallback credentials ship with the page, and a client
//! can always inspect or forge its own persisted session. The component gates
//! UI affordances for cooperating visitors; it does not protect data from
//! hostile ones. See [`auth::digest`] for the compatibility constraints on
//! the fingerprint function.
//!
//! ## Core components
//!
//! The **retrieval layer** ([`source`]) fetches the manifest document with a
//! cache-defeating query parameter and resolves every failure (transport
//! error, non-success status, unparseable body) to the configured fallback
//! manifest, logging a diagnostic instead of surfacing an error.
//!
//! The **authentication layer** ([`auth`]) fingerprints the submitted
//! password, scans the manifest in document order for the first match, and
//! runs the session state machine: `Unauthenticated → Authenticated →
//! Unauthenticated`, with every failure collapsing back to the start state.
//!
//! The **storage layer** ([`store`]) holds the one persisted session record
//! behind a trait so hosts can bridge to whatever origin-scoped store they
//! have; file-backed and in-memory implementations ship in the crate.
//!
//! Lifecycle transitions are broadcast as [`AuthEvent`]s ([`events`]) for the
//! presentation layer to render however it chooses.
//!
//! ## Quick start
//!
//! ```no_run
//! use editgate::{Config, EditGate};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     editgate::telemetry::init_telemetry()?;
//!
//!     let config = Config::load("editgate.yaml")?;
//!     let gate = EditGate::new(config);
//!
//!     // Adopt a previously persisted session, if one is still valid.
//!     gate.restore_session();
//!
//!     let outcome = gate.login("a password").await;
//!     if outcome.is_success() && gate.has_capability("announcements") {
//!         // reveal the announcement edit affordances
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod auth;
pub mod config;
pub mod errors;
pub mod events;
pub mod manifest;
pub mod source;
pub mod store;
pub mod telemetry;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::auth::manager::SessionManager;
use crate::source::{HttpManifestSource, StaticManifestSource};
use crate::store::FileSessionStore;

pub use crate::auth::manager::{AuthState, LoginOutcome};
pub use crate::auth::session::Session;
pub use crate::config::Config;
pub use crate::events::AuthEvent;
pub use crate::manifest::Manifest;
pub use crate::source::CredentialSource;
pub use crate::store::SessionStore;

/// The outward-facing contract of the component: the single entry point the
/// editing UI calls.
///
/// Construct one per page load and share it by reference with any
/// collaborator that needs read access. Everything else in the crate is
/// plumbing behind this surface.
pub struct EditGate {
    manager: SessionManager,
}

impl EditGate {
    /// Build the facade from configuration: remote manifest source when a URL
    /// is configured (fallback otherwise), file-backed session record.
    pub fn new(config: Config) -> Self {
        let source: Arc<dyn CredentialSource> = match &config.manifest.url {
            Some(url) => Arc::new(HttpManifestSource::new(
                url.clone(),
                config.manifest.request_timeout,
                config.manifest.fallback.clone(),
            )),
            None => Arc::new(StaticManifestSource::new(config.manifest.fallback.clone())),
        };
        let store = Arc::new(FileSessionStore::new(config.storage.record_path.clone()));
        Self {
            manager: SessionManager::new(source, store, config.session),
        }
    }

    /// Build the facade from explicit parts, for hosts that bring their own
    /// manifest source or session store.
    pub fn with_parts(
        source: Arc<dyn CredentialSource>,
        store: Arc<dyn SessionStore>,
        session: config::SessionConfig,
    ) -> Self {
        Self {
            manager: SessionManager::new(source, store, session),
        }
    }

    /// Attempt a login with the submitted password.
    pub async fn login(&self, password: &str) -> LoginOutcome {
        self.manager.login(password).await
    }

    /// Validate and adopt a previously persisted session.
    pub fn restore_session(&self) -> AuthState {
        self.manager.restore_session()
    }

    /// Destroy the live session and its persisted record.
    pub fn logout(&self) {
        self.manager.logout()
    }

    /// Whether the live session grants a capability tag.
    pub fn has_capability(&self, tag: &str) -> bool {
        self.manager.has_capability(tag)
    }

    /// Read-only snapshot of the live session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.manager.current_session()
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        self.manager.state()
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.manager.subscribe()
    }
}
