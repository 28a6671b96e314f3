//! Shared types used across keyprobe.
//!
//! These newtypes keep codes, keyspace bounds and destination identifiers
//! validated once at construction so the scanning hot path never re-checks them.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Widest code supported; keeps every code value inside `u64`.
pub const MAX_CODE_WIDTH: usize = 18;

/// A fixed-width, zero-padded numeric code.
///
/// Leading zeros are significant: `"000042"` and `"42"` are different codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Code(String);

impl Code {
    /// Render `value` as a code of exactly `width` digits.
    ///
    /// Callers are expected to have checked that `value` fits in `width`
    /// digits (see [`Keyspace::new`]).
    #[must_use]
    pub fn from_number(value: u64, width: usize) -> Self {
        Self(format!("{value:0width$}"))
    }

    /// Create a code from an existing string.
    ///
    /// # Errors
    /// Returns error if the string is empty, too wide, or not all ASCII digits.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || code.len() > MAX_CODE_WIDTH {
            return Err(CoreError::Validation(format!(
                "invalid code: must be 1-{MAX_CODE_WIDTH} digits, got {} characters",
                code.len()
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::Validation(format!(
                "invalid code: must be numeric, got '{code}'"
            )));
        }
        Ok(Self(code))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits in the code.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Numeric value of the code.
    #[must_use]
    pub fn value(&self) -> u64 {
        // Construction guarantees at most MAX_CODE_WIDTH ASCII digits.
        self.0.parse().unwrap_or_default()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The half-open numeric range `[lower, upper)` of codes of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyspace {
    lower: u64,
    upper: u64,
    width: usize,
}

impl Keyspace {
    /// Create a keyspace.
    ///
    /// # Errors
    /// Returns error if the range is empty or inverted, the width is zero or
    /// wider than [`MAX_CODE_WIDTH`], or the largest code does not fit in `width` digits.
    pub fn new(lower: u64, upper: u64, width: usize) -> Result<Self> {
        if upper <= lower {
            return Err(CoreError::Validation(format!(
                "invalid keyspace: upper bound {upper} must be greater than lower bound {lower}"
            )));
        }
        if width == 0 || width > MAX_CODE_WIDTH {
            return Err(CoreError::Validation(format!(
                "invalid keyspace: code width must be 1-{MAX_CODE_WIDTH}, got {width}"
            )));
        }
        let limit = 10u64.pow(u32::try_from(width).unwrap_or(u32::MAX));
        if upper > limit {
            return Err(CoreError::Validation(format!(
                "invalid keyspace: upper bound {upper} does not fit in {width} digits"
            )));
        }
        Ok(Self {
            lower,
            upper,
            width,
        })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Exclusive upper bound.
    #[must_use]
    pub fn upper(&self) -> u64 {
        self.upper
    }

    /// Code width in digits.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of codes in the keyspace.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.upper - self.lower
    }

    /// Always false; an empty keyspace cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `code` belongs to this keyspace.
    #[must_use]
    pub fn contains(&self, code: &Code) -> bool {
        code.width() == self.width && (self.lower..self.upper).contains(&code.value())
    }

    /// Render a number as a code of this keyspace's width.
    #[must_use]
    pub fn code(&self, value: u64) -> Code {
        Code::from_number(value, self.width)
    }
}

/// Identifier of a notification destination (a chat server, a webhook, the log).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DestinationId(String);

impl DestinationId {
    /// Create a new `DestinationId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not 1-64 characters of ASCII alphanumerics,
    /// `-` or `_`, starting with an alphanumeric.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        static DESTINATION_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = DESTINATION_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("valid regex")
        });

        let id = id.into();
        if regex.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(CoreError::Validation(format!(
                "invalid destination ID '{id}': expected 1-64 alphanumeric, '-' or '_' characters"
            )))
        }
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit of work carried by the discovery queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A code the remote service accepted.
    Discovery {
        /// The valid code
        code: Code,
        /// Link a user can follow to join with the code
        join_link: String,
        /// When the code was found
        found_at: DateTime<Utc>,
    },
    /// Periodic note on how many codes have been checked.
    ProgressNote {
        /// Total codes checked since process start
        checked: u64,
        /// When the threshold was crossed
        at: DateTime<Utc>,
    },
}

impl Message {
    /// Discovery message stamped with the current time.
    #[must_use]
    pub fn discovery(code: Code, join_link: impl Into<String>) -> Self {
        Self::Discovery {
            code,
            join_link: join_link.into(),
            found_at: Utc::now(),
        }
    }

    /// Progress message stamped with the current time.
    #[must_use]
    pub fn progress(checked: u64) -> Self {
        Self::ProgressNote {
            checked,
            at: Utc::now(),
        }
    }

    /// Creation time of the message.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Discovery { found_at, .. } => *found_at,
            Self::ProgressNote { at, .. } => *at,
        }
    }

    /// Whether this message reports a discovered code.
    #[must_use]
    pub fn is_discovery(&self) -> bool {
        matches!(self, Self::Discovery { .. })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery {
                code, join_link, ..
            } => write!(f, "📢 New code found: {code}\n\nJoin link: {join_link}"),
            Self::ProgressNote { checked, .. } => write!(f, "🔄 {checked} codes checked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_zero_padding() {
        assert_eq!(Code::from_number(42, 6).as_str(), "000042");
        assert_eq!(Code::from_number(123_456, 6).as_str(), "123456");
        assert_eq!(Code::from_number(0, 3).as_str(), "000");
    }

    #[test]
    fn test_code_validation() {
        assert!(Code::new("001234").is_ok());
        assert!(Code::new("").is_err());
        assert!(Code::new("12a4").is_err());
        assert!(Code::new("1".repeat(MAX_CODE_WIDTH + 1)).is_err());
        assert_eq!(Code::new("000042").expect("valid code").value(), 42);
    }

    #[test]
    fn test_keyspace_rejects_bad_bounds() {
        assert!(Keyspace::new(10, 10, 6).is_err());
        assert!(Keyspace::new(20, 10, 6).is_err());
        assert!(Keyspace::new(0, 10, 0).is_err());
        assert!(Keyspace::new(0, 1_000_001, 6).is_err());
        assert!(Keyspace::new(0, 1_000_000, 6).is_ok());
    }

    #[test]
    fn test_keyspace_contains() {
        let keyspace = Keyspace::new(100_000, 100_010, 6).expect("valid keyspace");
        assert_eq!(keyspace.len(), 10);
        assert!(keyspace.contains(&keyspace.code(100_005)));
        assert!(!keyspace.contains(&keyspace.code(100_010)));
        assert!(!keyspace.contains(&Code::from_number(100_005, 7)));
    }

    #[test]
    fn test_destination_id_validation() {
        assert!(DestinationId::new("default").is_ok());
        assert!(DestinationId::new("guild_123456789").is_ok());
        assert!(DestinationId::new("").is_err());
        assert!(DestinationId::new("-leading").is_err());
        assert!(DestinationId::new("has space").is_err());
    }

    #[test]
    fn test_message_rendering() {
        let code = Code::from_number(100_005, 6);
        let msg = Message::discovery(code, "https://example.com/join?gc=100005");
        let text = msg.to_string();
        assert!(text.contains("100005"));
        assert!(text.contains("https://example.com/join?gc=100005"));
        assert!(msg.is_discovery());

        let msg = Message::progress(3000);
        assert_eq!(msg.to_string(), "🔄 3000 codes checked");
        assert!(!msg.is_discovery());
    }
}
