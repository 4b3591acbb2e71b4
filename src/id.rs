//! Opaque identifiers
//!
//! Actors and communities are identified by snowflake-style integers handed
//! to us by the chat transport. They carry no meaning inside the core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a compact identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed identifier {input:?}: {reason}")]
pub struct ParseIdError {
    /// Offending input
    pub input: String,
    /// What was wrong with it
    pub reason: &'static str,
}

impl ParseIdError {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Identity submitting input commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

/// Audience grouping that can host at most one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u64(s).map(ActorId)
    }
}

impl FromStr for CommunityId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u64(s).map(CommunityId)
    }
}

pub(crate) fn parse_u64(s: &str) -> Result<u64, ParseIdError> {
    s.parse::<u64>()
        .map_err(|_| ParseIdError::new(s, "expected an unsigned integer"))
}
