//! Session lifecycle state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::auth::digest::digest;
use crate::auth::permissions;
use crate::auth::session::Session;
use crate::config::SessionConfig;
use crate::errors::Error;
use crate::events::{AuthEvent, EVENT_BUFFER};
use crate::source::CredentialSource;
use crate::store::SessionStore;

/// Authentication state visible to collaborators.
///
/// There is no separate locked or error state: every failure collapses back
/// to `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// The password matched; the session is live and persisted.
    Success { role: String },
    /// No stored fingerprint matched the submitted password.
    Rejected,
    /// Another login attempt was already in flight; this one was not started.
    Busy,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success { .. })
    }
}

/// Owns the one live session and every transition into and out of it.
///
/// Constructed once per page load and passed by reference to collaborators
/// needing read access; session state is never reached through ambient
/// global lookup. Only this type writes to the session store, and always as a
/// whole record.
///
/// All operations are total for expected inputs: no method throws for a
/// missing record, a corrupt record, a failed retrieval, or a wrong password.
pub struct SessionManager {
    source: Arc<dyn CredentialSource>,
    store: Arc<dyn SessionStore>,
    policy: SessionConfig,
    session: Mutex<Option<Session>>,
    login_busy: AtomicBool,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionManager {
    pub fn new(source: Arc<dyn CredentialSource>, store: Arc<dyn SessionStore>, policy: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            source,
            store,
            policy,
            session: Mutex::new(None),
            login_busy: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to lifecycle notifications. Subscribers that lag or drop
    /// their receiver never affect the core.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Current state derived from the live session.
    pub fn state(&self) -> AuthState {
        if self.session.lock().unwrap().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Snapshot of the live session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    /// Validate and adopt a previously persisted session.
    ///
    /// No record, an unparseable record, and an expired record all resolve to
    /// `Unauthenticated`; the latter two also remove the record. Expiry is
    /// the only one of these surfaced to collaborators.
    pub fn restore_session(&self) -> AuthState {
        let Some(raw) = self.store.load() else {
            return AuthState::Unauthenticated;
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                let e = Error::CorruptState { reason: e.to_string() };
                debug!("Discarding persisted session: {e}");
                self.store.clear();
                return AuthState::Unauthenticated;
            }
        };

        if session.is_expired() {
            let e = Error::ExpiredSession {
                expires_at: session.expires_at,
            };
            debug!("Discarding persisted session: {e}");
            self.store.clear();
            let _ = self.events.send(AuthEvent::SessionExpired);
            return AuthState::Unauthenticated;
        }

        let _ = self.events.send(AuthEvent::Authenticated {
            role: session.role.clone(),
            display_name: session.display_name.clone(),
            capabilities: session.capabilities.clone(),
        });
        *self.session.lock().unwrap() = Some(session);
        AuthState::Authenticated
    }

    /// Attempt a login with the submitted password.
    ///
    /// Loads a fresh manifest, fingerprints the password, and takes the first
    /// matching role in manifest order. A second call arriving while one is
    /// suspended on retrieval is rejected outright rather than interleaved,
    /// so the persisted record is only ever written by one attempt at a time.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, password: &str) -> LoginOutcome {
        if self.login_busy.swap(true, Ordering::SeqCst) {
            debug!("Rejecting login attempt while another is in flight");
            return LoginOutcome::Busy;
        }
        let _reset = scopeguard::guard((), |_| self.login_busy.store(false, Ordering::SeqCst));

        let manifest = self.source.load_manifest().await;
        let fingerprint = digest(password);

        // First fingerprint match in document order wins; a duplicated
        // fingerprint resolves to the earliest role.
        let matched = manifest
            .passwords
            .iter()
            .find(|(_, stored)| **stored == fingerprint)
            .map(|(role, _)| role.clone());

        let Some(role) = matched else {
            debug!("Login failed: {}", Error::Verification);
            let _ = self.events.send(AuthEvent::LoginFailed);
            return LoginOutcome::Rejected;
        };

        let capabilities = permissions::capabilities_for(&role, &manifest);
        let session = Session::mint(
            role.clone(),
            self.policy.display_name_for(&role),
            capabilities,
            self.policy.duration,
        );

        self.persist(&session);
        let _ = self.events.send(AuthEvent::Authenticated {
            role: session.role.clone(),
            display_name: session.display_name.clone(),
            capabilities: session.capabilities.clone(),
        });
        *self.session.lock().unwrap() = Some(session);

        LoginOutcome::Success { role }
    }

    /// Destroy the live session and its persisted record unconditionally.
    pub fn logout(&self) {
        self.store.clear();
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::LoggedOut);
    }

    /// Whether the live session grants a capability tag.
    ///
    /// Always false when unauthenticated. Authenticated sessions grant a tag
    /// on exact membership or through the sentinel capability.
    pub fn has_capability(&self, tag: &str) -> bool {
        match self.session.lock().unwrap().as_ref() {
            Some(session) => permissions::grants(&session.capabilities, &self.policy.sentinel, tag),
            None => false,
        }
    }

    fn persist(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(record) => self.store.save(&record),
            Err(e) => warn!("Failed to serialize session record: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Notify;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::auth::session::generate_token;
    use crate::manifest::Manifest;
    use crate::source::{HttpManifestSource, StaticManifestSource};
    use crate::store::MemorySessionStore;

    fn test_manifest() -> Manifest {
        let mut manifest = Manifest {
            passwords: Default::default(),
            permissions: Default::default(),
        };
        manifest.passwords.insert("creator".to_string(), digest("secret"));
        manifest.passwords.insert("manager".to_string(), digest("backstage"));
        manifest
            .permissions
            .insert("creator".to_string(), vec!["all".to_string()]);
        manifest
            .permissions
            .insert("manager".to_string(), vec!["students".to_string(), "staff".to_string()]);
        manifest
    }

    fn manager_with(manifest: Manifest, store: Arc<MemorySessionStore>) -> SessionManager {
        SessionManager::new(
            Arc::new(StaticManifestSource::new(manifest)),
            store,
            SessionConfig::default(),
        )
    }

    fn manager() -> SessionManager {
        manager_with(test_manifest(), Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_login_success_mints_and_persists() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(test_manifest(), store.clone());
        let mut events = manager.subscribe();

        let outcome = manager.login("secret").await;
        assert_eq!(
            outcome,
            LoginOutcome::Success {
                role: "creator".to_string()
            }
        );
        assert_eq!(manager.state(), AuthState::Authenticated);

        let session = manager.current_session().unwrap();
        assert_eq!(session.role, "creator");
        assert_eq!(
            session.capabilities,
            permissions::capabilities_for("creator", &test_manifest())
        );
        assert!(session.expires_at > session.issued_at);

        // Persisted immediately, as a whole record.
        let record: Session = serde_json::from_str(&store.load().unwrap()).unwrap();
        assert_eq!(record.token, session.token);

        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::Authenticated {
                role: "creator".to_string(),
                display_name: "Creator".to_string(),
                capabilities: vec!["all".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_rejected() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(test_manifest(), store.clone());
        let mut events = manager.subscribe();

        assert_eq!(manager.login("wrong").await, LoginOutcome::Rejected);
        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert_eq!(store.load(), None);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoginFailed);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_existing_session_untouched() {
        let manager = manager();
        manager.login("secret").await;
        let before = manager.current_session().unwrap();

        assert_eq!(manager.login("wrong").await, LoginOutcome::Rejected);
        assert_eq!(manager.state(), AuthState::Authenticated);
        assert_eq!(manager.current_session().unwrap().token, before.token);
    }

    #[tokio::test]
    async fn test_sentinel_grants_everything() {
        let manager = manager();
        manager.login("secret").await;

        assert!(manager.has_capability("students"));
        assert!(manager.has_capability("never-listed-anywhere"));
    }

    #[tokio::test]
    async fn test_exact_capability_checks_without_sentinel() {
        let manager = manager();
        manager.login("backstage").await;

        assert!(manager.has_capability("students"));
        assert!(manager.has_capability("staff"));
        assert!(!manager.has_capability("grades"));
    }

    #[test]
    fn test_has_capability_false_when_unauthenticated() {
        let manager = manager();
        assert!(!manager.has_capability("students"));
        assert!(!manager.has_capability("all"));
    }

    #[tokio::test]
    async fn test_role_without_permissions_entry_has_no_capabilities() {
        let mut manifest = test_manifest();
        manifest.passwords.insert("ghost".to_string(), digest("phantom"));

        let manager = manager_with(manifest, Arc::new(MemorySessionStore::new()));
        let outcome = manager.login("phantom").await;

        assert!(outcome.is_success());
        assert!(manager.current_session().unwrap().capabilities.is_empty());
        assert!(!manager.has_capability("students"));
    }

    #[tokio::test]
    async fn test_duplicate_fingerprint_resolves_to_earliest_role() {
        let mut manifest = test_manifest();
        // Same fingerprint under a later role id: the earlier entry wins.
        manifest.passwords.insert("impostor".to_string(), digest("secret"));

        let manager = manager_with(manifest, Arc::new(MemorySessionStore::new()));
        assert_eq!(
            manager.login("secret").await,
            LoginOutcome::Success {
                role: "creator".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_restore_round_trip_preserves_session() {
        let store = Arc::new(MemorySessionStore::new());
        let first = manager_with(test_manifest(), store.clone());
        first.login("backstage").await;
        let minted = first.current_session().unwrap();

        // A fresh instance over the same store, as on the next page load.
        let second = manager_with(test_manifest(), store);
        let mut events = second.subscribe();

        assert_eq!(second.restore_session(), AuthState::Authenticated);
        let restored = second.current_session().unwrap();
        assert_eq!(restored.role, minted.role);
        assert_eq!(restored.capabilities, minted.capabilities);
        assert_eq!(restored.token, minted.token);

        assert!(matches!(events.try_recv().unwrap(), AuthEvent::Authenticated { .. }));
    }

    #[test]
    fn test_restore_without_record() {
        let manager = manager();
        let mut events = manager.subscribe();

        assert_eq!(manager.restore_session(), AuthState::Unauthenticated);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_restore_expired_record_removes_it_and_notifies() {
        let store = Arc::new(MemorySessionStore::new());
        let expired = Session {
            role: "creator".to_string(),
            display_name: "Creator".to_string(),
            capabilities: vec!["all".to_string()],
            issued_at: Utc::now() - Duration::from_secs(2 * 60 * 60),
            token: generate_token(),
            expires_at: Utc::now() - Duration::from_secs(1),
        };
        store.save(&serde_json::to_string(&expired).unwrap());

        let manager = manager_with(test_manifest(), store.clone());
        let mut events = manager.subscribe();

        assert_eq!(manager.restore_session(), AuthState::Unauthenticated);
        assert_eq!(store.load(), None);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SessionExpired);
    }

    #[test]
    fn test_restore_corrupt_record_behaves_as_absent() {
        let store = Arc::new(MemorySessionStore::new());
        store.save("{definitely not a session record");

        let manager = manager_with(test_manifest(), store.clone());
        let mut events = manager.subscribe();

        assert_eq!(manager.restore_session(), AuthState::Unauthenticated);
        // Cleared silently: a corrupt record is a diagnostic, not a notice.
        assert_eq!(store.load(), None);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_logout_destroys_session_and_record() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(test_manifest(), store.clone());
        manager.login("secret").await;
        let mut events = manager.subscribe();

        manager.logout();

        assert_eq!(manager.state(), AuthState::Unauthenticated);
        assert_eq!(manager.current_session(), None);
        assert_eq!(store.load(), None);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoggedOut);
        assert!(!manager.has_capability("students"));
    }

    struct BlockingSource {
        started: Arc<Notify>,
        release: Arc<Notify>,
        manifest: Manifest,
    }

    #[async_trait]
    impl CredentialSource for BlockingSource {
        async fn load_manifest(&self) -> Manifest {
            self.started.notify_one();
            self.release.notified().await;
            self.manifest.clone()
        }
    }

    #[tokio::test]
    async fn test_overlapping_login_is_rejected_not_interleaved() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let manager = Arc::new(SessionManager::new(
            Arc::new(BlockingSource {
                started: started.clone(),
                release: release.clone(),
                manifest: test_manifest(),
            }),
            Arc::new(MemorySessionStore::new()),
            SessionConfig::default(),
        ));

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.login("secret").await }
        });
        // Wait until the first attempt is suspended on retrieval.
        started.notified().await;

        assert_eq!(manager.login("secret").await, LoginOutcome::Busy);

        release.notify_one();
        assert!(first.await.unwrap().is_success());

        // The guard is released once the first attempt completes.
        release.notify_one();
        assert!(manager.login("secret").await.is_success());
    }

    #[tokio::test]
    async fn test_login_succeeds_against_fallback_when_unreachable() {
        let mut fallback = Manifest {
            passwords: Default::default(),
            permissions: Default::default(),
        };
        fallback.passwords.insert("editor".to_string(), digest("offline"));
        fallback
            .permissions
            .insert("editor".to_string(), vec!["articles".to_string()]);

        // Nothing listens on port 1, so every fetch falls back.
        let source = HttpManifestSource::new(
            url::Url::parse("http://127.0.0.1:1/auth.json").unwrap(),
            Duration::from_secs(1),
            fallback,
        );
        let manager = SessionManager::new(
            Arc::new(source),
            Arc::new(MemorySessionStore::new()),
            SessionConfig::default(),
        );

        assert_eq!(
            manager.login("offline").await,
            LoginOutcome::Success {
                role: "editor".to_string()
            }
        );
        assert!(manager.has_capability("articles"));
    }
}
