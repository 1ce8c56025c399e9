//! Session documents.
//!
//! A saved session is a JSON array of `{ "tree", "x", "y" }` records, in
//! workspace order. Node identities and parent links are never written; they
//! are reassigned and rebuilt on load.
//!
//! The same records may also be wrapped in a [`SessionDocument`] that carries
//! a format version and a creation timestamp. [`parse_session`] accepts both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::session::Placed;

/// Current session format version
pub const FORMAT_VERSION: &str = "1.0.0";

/// Conventional file extension for session files.
pub const FILE_EXTENSION: &str = "ndp";

/// Versioned wrapper for a saved session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Format version (semver)
    pub version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    pub items: Vec<Placed>,
}

impl SessionDocument {
    pub fn new(items: Vec<Placed>) -> Self {
        SessionDocument {
            version: FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            items,
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check if version is compatible with current version
    pub fn is_compatible(&self) -> bool {
        major(&self.version).is_some() && major(&self.version) == major(FORMAT_VERSION)
    }
}

fn major(version: &str) -> Option<u32> {
    version.split('.').next().and_then(|s| s.parse::<u32>().ok())
}

/// Serialize workspace items as a bare JSON array.
pub fn session_to_json(items: &[Placed]) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Parse a bare array or a versioned document.
pub fn parse_session(text: &str) -> CoreResult<Vec<Placed>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        let items: Vec<Placed> = serde_json::from_value(value)?;
        debug!(items = items.len(), "parsed bare session array");
        return Ok(items);
    }

    let document: SessionDocument = serde_json::from_value(value)?;
    if !document.is_compatible() {
        return Err(CoreError::IncompatibleVersion {
            found: document.version,
            expected: FORMAT_VERSION.to_string(),
        });
    }
    debug!(
        items = document.items.len(),
        version = %document.version,
        "parsed session document"
    );
    Ok(document.items)
}
