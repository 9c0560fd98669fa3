//! Target hardware capability model.
//!
//! A capability identifies a hardware generation's supported instruction set
//! as an ordered (major, minor, revision) triple. It is both a field of every
//! compilation job and the universe over which "capability of the bound
//! device" and "highest supported capability" are resolved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A hardware generation, ordered by the natural ordering of the triple.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Capability {
    pub major: u32,
    pub minor: u32,
    /// Architecture revision; almost always zero, but part of the ordering.
    pub revision: u32,
}

/// Every capability this build knows how to target, in ascending order.
pub const SUPPORTED_CAPABILITIES: &[Capability] = &[
    Capability::of(5, 2),
    Capability::of(6, 0),
    Capability::of(6, 1),
    Capability::of(7, 0),
    Capability::of(7, 5),
    Capability::of(8, 0),
    Capability::of(8, 6),
    Capability::of(8, 9),
    Capability::of(9, 0),
];

impl Capability {
    /// Construct a capability with a zero revision.
    pub const fn of(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            revision: 0,
        }
    }

    /// Construct a capability with an explicit architecture revision.
    pub const fn with_revision(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// The highest capability this build supports targeting.
    ///
    /// Used as the optimistic fallback when no device is bound, so offline
    /// reflection favors newer, more concise instruction selection.
    pub fn max_supported() -> Self {
        SUPPORTED_CAPABILITIES
            .iter()
            .copied()
            .max()
            .unwrap_or_default()
    }

    /// Whether this build can target the capability.
    pub fn is_supported(&self) -> bool {
        SUPPORTED_CAPABILITIES.contains(self)
    }

    /// Target name used in generated assembly (e.g. "sm_86").
    pub fn target_name(&self) -> String {
        format!("sm_{}{}", self.major, self.minor)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
        }
    }
}

impl FromStr for Capability {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidCapability { input: s.into() };
        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| invalid())?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| invalid())?;
        let revision = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self {
            major,
            minor,
            revision,
        })
    }
}
