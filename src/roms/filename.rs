//! ROM filename validation.
//!
//! # Rules (applied in order, first failure wins)
//! 1. Non-empty string of at most 255 characters (`invalid_length`)
//! 2. No `..`, `/` or `\` anywhere (`path_traversal`)
//! 3. Safe characters followed by a `.gba` extension (`invalid_characters`)
//! 4. Base-name normalization must be a no-op (`invalid_name`)
//!
//! # Design Decisions
//! - Total over `serde_json::Value`: non-string input rejects, never panics
//! - No regex; a single pass over the characters
//! - Accepted names are wrapped in [`RomName`] so only validated names reach the store

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

/// Maximum accepted name length, in characters.
pub const MAX_ROM_NAME_LEN: usize = 255;

/// Required extension, compared case-insensitively.
const ROM_EXTENSION: &str = ".gba";

/// Why a ROM name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    InvalidLength,
    PathTraversal,
    InvalidCharacters,
    InvalidName,
}

impl RejectReason {
    /// Stable reason code, also used as the security event tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidLength => "invalid_length",
            Self::PathTraversal => "path_traversal",
            Self::InvalidCharacters => "invalid_characters",
            Self::InvalidName => "invalid_name",
        }
    }

    /// Message returned to the client.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidLength => "ROM name length is invalid.",
            Self::PathTraversal => "Invalid ROM name format.",
            Self::InvalidCharacters => "ROM name contains invalid characters.",
            Self::InvalidName => "Invalid ROM name.",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ROM filename that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RomName(String);

impl RomName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for RomName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate an arbitrary JSON value as a ROM name.
pub fn validate_rom_name(value: &Value) -> Result<RomName, RejectReason> {
    match value {
        Value::String(s) => validate_rom_name_str(s),
        _ => Err(RejectReason::InvalidLength),
    }
}

/// Validate a string as a ROM name.
pub fn validate_rom_name_str(name: &str) -> Result<RomName, RejectReason> {
    let len = name.chars().count();
    if len == 0 || len > MAX_ROM_NAME_LEN {
        return Err(RejectReason::InvalidLength);
    }

    check_structure(name)?;

    // Second line of defense in case something slipped past the traversal check.
    match Path::new(name).file_name().and_then(OsStr::to_str) {
        Some(base) if base == name => Ok(RomName(name.to_string())),
        _ => Err(RejectReason::InvalidName),
    }
}

/// Rules 2 and 3 only. Used to filter directory listings.
pub fn is_structurally_valid(name: &str) -> bool {
    check_structure(name).is_ok()
}

fn check_structure(name: &str) -> Result<(), RejectReason> {
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(RejectReason::PathTraversal);
    }

    let split = name.len().checked_sub(ROM_EXTENSION.len());
    let (stem, ext) = match split.and_then(|at| Some((name.get(..at)?, name.get(at..)?))) {
        Some(parts) => parts,
        None => return Err(RejectReason::InvalidCharacters),
    };

    if stem.is_empty() || !ext.eq_ignore_ascii_case(ROM_EXTENSION) {
        return Err(RejectReason::InvalidCharacters);
    }

    if !stem.chars().all(is_allowed_char) {
        return Err(RejectReason::InvalidCharacters);
    }

    Ok(())
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '.' | '_' | '-')
}
