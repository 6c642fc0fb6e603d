//! Credential manifest data model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The authoritative credential document: which passwords exist and what each
/// one is allowed to do.
///
/// A manifest is fetched fresh on every login attempt, lives only for the
/// duration of that one verification, and is never persisted or cached across
/// attempts.
///
/// Both maps preserve document order. Order matters for `passwords`: the
/// match scan during login takes the first role whose stored fingerprint
/// equals the submitted password's fingerprint, so if two roles ever share a
/// fingerprint the earliest entry wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Role id → password fingerprint (lowercase hex, see [`crate::auth::digest`]).
    pub passwords: IndexMap<String, String>,
    /// Role id → ordered capability tags. A role present in `passwords` but
    /// absent here simply has no capabilities; that is not an error.
    pub permissions: IndexMap<String, Vec<String>>,
}

impl Manifest {
    /// The built-in manifest used when no remote authority is reachable (or
    /// none is configured), so the component stays operable with no network
    /// access. Deployments can override it wholesale through configuration.
    pub fn builtin() -> Self {
        Self {
            passwords: IndexMap::from([
                ("creator".to_string(), "a1b2c3d4e5f67890".to_string()),
                ("manager".to_string(), "f6e5d4c3b2a10987".to_string()),
            ]),
            permissions: IndexMap::from([
                ("creator".to_string(), vec!["all".to_string()]),
                (
                    "manager".to_string(),
                    vec![
                        "students".to_string(),
                        "staff".to_string(),
                        "announcements".to_string(),
                        "grades".to_string(),
                        "attendance".to_string(),
                    ],
                ),
            ]),
        }
    }
}
