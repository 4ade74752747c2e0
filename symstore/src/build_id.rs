//! Build identifiers for symbol files.
//!
//! A build id is an opaque fingerprint derived from a module's contents. It is
//! used to confirm that a located symbol file belongs to the exact module
//! version being debugged. The empty build id means "unknown": lookups accept
//! the first file with a matching name.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing a build id from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildIdParseError {
    /// The string contains a character that is not a hex digit.
    #[error("invalid hex digit '{0}' in build id")]
    InvalidDigit(char),

    /// The string has an odd number of hex digits.
    #[error("build id has an odd number of hex digits ({0})")]
    OddLength(usize),
}

/// Content-derived module identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BuildId {
    bytes: Vec<u8>,
}

impl BuildId {
    /// The unknown build id.
    pub const fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create a build id from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parse a build id from hex text.
    ///
    /// Digits may be upper or lower case. Dashes are ignored so that
    /// GUID-style identifiers can be passed unchanged.
    pub fn parse(text: &str) -> Result<Self, BuildIdParseError> {
        let digits: Vec<char> = text.chars().filter(|c| *c != '-').collect();
        if digits.len() % 2 != 0 {
            return Err(BuildIdParseError::OddLength(digits.len()));
        }

        let mut bytes = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks(2) {
            let high = hex_value(pair[0])?;
            let low = hex_value(pair[1])?;
            bytes.push((high << 4) | low);
        }

        Ok(Self { bytes })
    }

    /// Returns true for the unknown build id.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw identity bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex, the form expected by cloud lookup services.
    pub fn to_hex_string(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Directory name used for this build id inside structured stores and
    /// HTTP symbol servers.
    pub fn to_path_name(&self) -> String {
        self.to_string()
    }
}

fn hex_value(c: char) -> Result<u8, BuildIdParseError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(BuildIdParseError::InvalidDigit(c))
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for BuildId {
    type Err = BuildIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BuildId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
