//! Capability resolution and checks.
//!
//! Capabilities are flat string tags snapshotted into the session at login
//! time; there is no hierarchy or inheritance between roles. A configurable
//! sentinel tag (default `"all"`) grants unrestricted access and must be
//! consulted explicitly wherever capability checks are enforced.

use crate::manifest::Manifest;

/// Look up the ordered capability set for a role.
///
/// Returns an empty set when the role has no `permissions` entry: a role
/// that can log in but do nothing is a valid manifest state, not an error.
pub fn capabilities_for(role: &str, manifest: &Manifest) -> Vec<String> {
    manifest.permissions.get(role).cloned().unwrap_or_default()
}

/// Whether a capability set grants `tag`.
///
/// True on an exact tag match or when the set contains the sentinel; absence
/// of the sentinel means checks are exact-match against the listed tags.
pub fn grants(capabilities: &[String], sentinel: &str, tag: &str) -> bool {
    capabilities.iter().any(|c| c == sentinel || c == tag)
}
