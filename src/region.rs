// src/region.rs
//! Supported feed regions and their display names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-letter region codes a user can pick for their feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    In,
    Us,
    Gb,
    Ca,
    Au,
}

impl Region {
    /// Region assigned to new users.
    pub const DEFAULT: Region = Region::In;

    pub const ALL: [Region; 5] = [Region::In, Region::Us, Region::Gb, Region::Ca, Region::Au];

    pub fn code(self) -> &'static str {
        match self {
            Region::In => "in",
            Region::Us => "us",
            Region::Gb => "gb",
            Region::Ca => "ca",
            Region::Au => "au",
        }
    }

    /// Name used in search queries (`... AND India`).
    pub fn display_name(self) -> &'static str {
        match self {
            Region::In => "India",
            Region::Us => "USA",
            Region::Gb => "UK",
            Region::Ca => "Canada",
            Region::Au => "Australia",
        }
    }

    /// Parse a stored code, falling back to [`Region::DEFAULT`] with a warning.
    ///
    /// Only used for rows written before codes were validated; the API layer
    /// rejects unknown codes instead.
    pub fn from_stored(code: &str) -> Region {
        code.parse().unwrap_or_else(|e: UnknownRegion| {
            tracing::warn!(
                code = %e.0,
                fallback = Region::DEFAULT.code(),
                "unknown stored region code"
            );
            Region::DEFAULT
        })
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::DEFAULT
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported country code: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == code)
            .ok_or_else(|| UnknownRegion(s.trim().to_string()))
    }
}
