//! Daemon version gate.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// Oldest daemon version this client talks to (inclusive).
pub const VERSION_MINIMUM: &str = "0.4.21";
/// First daemon version this client no longer supports (exclusive).
pub const VERSION_MAXIMUM: &str = "0.6.0";
/// Versions inside the range that are known to be broken.
pub const VERSION_BLACKLIST: &[&str] = &[];

/// Numeric prefix of a daemon version string.
///
/// `"0.5.1-rc1"` parses to `[0, 5, 1]`; the suffix after the first `-` is
/// dropped. Ordering is element-wise, a shorter prefix sorting first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(Vec<u64>);

impl Version {
    /// The numeric components.
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for Version {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let prefix = s.split_once('-').map_or(s, |(prefix, _)| prefix);
        prefix
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
            .map_err(|_| DecodeError::InvalidVersion(s.to_owned()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for n in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{n}")?;
            first = false;
        }
        Ok(())
    }
}

/// The daemon version is not supported by this client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("unsupported daemon version {current} (supported: {minimum} <= version < {maximum})")]
#[diagnostic(
    code(ipfs_http::version_mismatch),
    help("upgrade or downgrade the daemon, or connect with a wider VersionRange")
)]
pub struct VersionMismatch {
    /// Version reported by the daemon
    pub current: Version,
    /// Inclusive lower bound
    pub minimum: Version,
    /// Exclusive upper bound
    pub maximum: Version,
}

/// Accepted daemon versions: `minimum <= v < maximum` and `v` not blacklisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    minimum: Version,
    maximum: Version,
    blacklist: Vec<Version>,
}

impl VersionRange {
    /// Build a range from version strings.
    pub fn new(minimum: &str, maximum: &str) -> Result<Self, DecodeError> {
        Ok(Self {
            minimum: minimum.parse()?,
            maximum: maximum.parse()?,
            blacklist: Vec::new(),
        })
    }

    /// Add a version that is rejected even though it lies inside the range.
    pub fn blacklist(mut self, version: &str) -> Result<Self, DecodeError> {
        self.blacklist.push(version.parse()?);
        Ok(self)
    }

    /// Inclusive lower bound.
    pub fn minimum(&self) -> &Version {
        &self.minimum
    }

    /// Exclusive upper bound.
    pub fn maximum(&self) -> &Version {
        &self.maximum
    }

    /// Check a daemon-reported version string against this range.
    ///
    /// Returns the parsed version on success.
    pub fn check(&self, reported: &str) -> crate::Result<Version> {
        let current: Version = reported.parse()?;
        let mismatch = || VersionMismatch {
            current: current.clone(),
            minimum: self.minimum.clone(),
            maximum: self.maximum.clone(),
        };

        if current < self.minimum || current >= self.maximum {
            return Err(mismatch().into());
        }
        if self.blacklist.contains(&current) {
            return Err(mismatch().into());
        }
        Ok(current)
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        let mut range = VersionRange::new(VERSION_MINIMUM, VERSION_MAXIMUM)
            .expect("built-in version bounds should parse");
        for v in VERSION_BLACKLIST {
            range = range
                .blacklist(v)
                .expect("built-in version blacklist should parse");
        }
        range
    }
}

/// Check a daemon version against the built-in supported range.
pub fn assert_version(reported: &str) -> crate::Result<Version> {
    VersionRange::default().check(reported)
}
