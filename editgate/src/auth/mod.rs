//! Authentication and session lifecycle.
//!
//! This module carries the actual logic of the component: password
//! verification against manifest fingerprints, capability resolution, session
//! minting, and the state machine that gates edit mode.
//!
//! # Authentication flow
//!
//! A login attempt fetches a fresh credential manifest (remote authority with
//! built-in fallback), fingerprints the submitted password with the legacy
//! [`digest`] transform, and scans the manifest's password entries in
//! document order for the first fingerprint match. A match resolves the
//! role's capability tags, mints an expiring [`session::Session`] with a
//! random opaque token, and persists it to the single session slot. On the
//! next startup the persisted record is adopted if still valid, or discarded
//! with a notification if expired.
//!
//! There is deliberately no server-side authority anywhere in this flow: the
//! session is client-held proof only, and a client can always inspect or
//! forge its own persisted state. The component gates UI affordances, not
//! data.
//!
//! # Modules
//!
//! - [`digest`]: legacy password fingerprinting (obfuscation only)
//! - [`manager`]: the session lifecycle state machine
//! - [`permissions`]: capability resolution and sentinel-aware checks
//! - [`session`]: the session record and token minting

pub mod digest;
pub mod manager;
pub mod permissions;
pub mod session;
