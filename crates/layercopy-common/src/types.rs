//! Domain primitive types used across the layercopy workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SENTINEL_ID;
use crate::error::{LayercopyError, Result};

/// Rejects identifiers that would not map to exactly one directory
/// directly below their storage subtree.
fn validate_component(kind: &'static str, id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id == "." || id == ".." {
        "must not be a relative path component"
    } else if id.contains('/') {
        "must not contain '/'"
    } else if id.contains('\0') {
        "must not contain NUL"
    } else {
        return Ok(());
    };
    Err(LayercopyError::InvalidIdentifier {
        kind,
        id: id.to_string(),
        reason,
    })
}

/// Opaque identifier naming a content layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerId(String);

impl LayerId {
    /// Parses a layer identifier.
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::InvalidIdentifier` if the value is empty, is
    /// `.` or `..`, or contains `/` or NUL.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_component("layer id", &id)?;
        Ok(Self(id))
    }

    /// Parses a parent identifier where the empty string means "no parent".
    ///
    /// # Errors
    ///
    /// Returns an error if a non-empty value is not a valid layer identifier.
    pub fn parse_parent(id: &str) -> Result<Option<Self>> {
        if id.is_empty() {
            return Ok(None);
        }
        Self::parse(id).map(Some)
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LayerId {
    type Error = LayercopyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<LayerId> for String {
    fn from(id: LayerId) -> Self {
        id.0
    }
}

/// Container handle keying a bundle directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Parses a container handle.
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::InvalidIdentifier` under the same rules as
    /// [`LayerId::parse`].
    pub fn parse(handle: impl Into<String>) -> Result<Self> {
        let handle = handle.into();
        validate_component("handle", &handle)?;
        Ok(Self(handle))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Handle {
    type Error = LayercopyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// A uid/gid pair applied to filesystem entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
}

impl Ownership {
    /// Creates an ownership pair.
    #[must_use]
    pub const fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// The placeholder identity meaning "no real owner".
    #[must_use]
    pub const fn sentinel() -> Self {
        Self::new(SENTINEL_ID, SENTINEL_ID)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}
