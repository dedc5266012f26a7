//!
//! Permission assertions: one normalized, dot-delimited path plus a grant flag.
//!
//! Paths are case-insensitive. They are trimmed and lower-cased before being
//! used as a key or compared. Relatedness between two paths follows dot
//! segments: `server.kick` covers `server.kick.vote`, but `a.bc` does not
//! cover `a.bcd`.

use std::fmt;
use std::str::FromStr;

use crate::error::{PermissionError, PermissionResult};

/// Segment separator inside a permission path.
pub const SEPARATOR: char = '.';

/// Separator between a path and its flag token in the textual form.
pub const FLAG_SEPARATOR: char = ':';

/// Trims and lower-cases a path.
#[inline]
pub fn normalize(path: &str) -> String {
    path.trim().to_lowercase()
}

/// Rejects paths that cannot name a permission node.
///
/// Checked before normalization. An empty (or whitespace-only) path yields
/// [`PermissionError::EmptyPath`]; empty segments, inner whitespace and the
/// reserved `:` / `*` characters yield [`PermissionError::MalformedPath`].
pub fn validate(path: &str) -> PermissionResult<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PermissionError::EmptyPath);
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| c.is_whitespace() || *c == FLAG_SEPARATOR || *c == '*')
    {
        return Err(malformed(path, format!("illegal character {:?}", c)));
    }
    if trimmed.split(SEPARATOR).any(str::is_empty) {
        return Err(malformed(path, "empty segment".to_string()));
    }
    Ok(())
}

/// `validate` followed by `normalize`.
pub fn canonical(path: &str) -> PermissionResult<String> {
    validate(path)?;
    Ok(normalize(path))
}

/// True iff `ancestor` is a strict dot-segment prefix of `path`.
///
/// Both arguments must already be normalized.
#[inline]
pub(crate) fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == SEPARATOR as u8
}

fn malformed(path: &str, reason: String) -> PermissionError {
    PermissionError::MalformedPath { path: path.to_string(), reason }
}

fn parse_flag(token: &str, text: &str) -> PermissionResult<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(malformed(text, format!("unknown flag token {:?}", other))),
    }
}

/// A stored `(path, granted)` pair.
///
/// Equality compares both the path and the flag. Sets key their entries by
/// path alone, so two unequal assertions can still compete for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Assertion {
    path: String,
    granted: bool,
}

impl Assertion {
    /// Builds an assertion from a raw path, validating then normalizing it.
    pub fn new(path: &str, granted: bool) -> PermissionResult<Self> {
        Ok(Assertion { path: canonical(path)?, granted })
    }

    pub fn granted(path: &str) -> PermissionResult<Self> {
        Self::new(path, true)
    }

    pub fn denied(path: &str) -> PermissionResult<Self> {
        Self::new(path, false)
    }

    /// Parses `"path"`, `"path:1"`, `"path:true"`, `"path:0"` or `"path:false"`.
    ///
    /// A missing flag means granted. The flag token is case-insensitive.
    pub fn parse(text: &str) -> PermissionResult<Self> {
        let mut parts = text.splitn(3, FLAG_SEPARATOR);
        let path = parts.next().unwrap_or_default();
        let granted = match parts.next() {
            None => true,
            Some(token) => parse_flag(token, text)?,
        };
        if parts.next().is_some() {
            return Err(malformed(text, "more than one flag separator".to_string()));
        }
        Self::new(path, granted)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    pub(crate) fn set_granted(&mut self, granted: bool) {
        self.granted = granted;
    }

    /// Exact equality of normalized paths.
    pub fn matches(&self, path: &str) -> bool {
        self.path == normalize(path)
    }

    /// True iff this assertion's path is a strict ancestor of `path`.
    ///
    /// `a.b` covers `a.b.c`; it covers neither `a.b` itself nor `a.bc`.
    pub fn covers(&self, path: &str) -> bool {
        is_ancestor(&self.path, &normalize(path))
    }

    /// True iff this assertion sits strictly beneath `root`.
    pub fn is_within(&self, root: &str) -> bool {
        is_ancestor(&normalize(root), &self.path)
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.path, FLAG_SEPARATOR, if self.granted { "1" } else { "0" })
    }
}

impl FromStr for Assertion {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Assertion::parse(s)
    }
}

impl TryFrom<String> for Assertion {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Assertion::parse(&value)
    }
}

impl From<Assertion> for String {
    fn from(assertion: Assertion) -> Self {
        assertion.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Server.Kick "), "server.kick");
        assert_eq!(Assertion::granted(" A.B ").unwrap().path(), "a.b");
    }

    #[test]
    fn test_parse_flag_variants() {
        let a = Assertion::parse("Sledgehammer.Test:TRUE").unwrap();
        assert_eq!(a.path(), "sledgehammer.test");
        assert!(a.is_granted());

        assert!(Assertion::parse("a.b").unwrap().is_granted());
        assert!(Assertion::parse("a.b:1").unwrap().is_granted());
        assert!(!Assertion::parse("a.b:0").unwrap().is_granted());
        assert!(!Assertion::parse("a.b:False").unwrap().is_granted());
    }

    #[test]
    fn test_parse_rejects_bad_flags() {
        assert!(matches!(Assertion::parse("a.b:yes"), Err(PermissionError::MalformedPath { .. })));
        assert!(matches!(Assertion::parse("a.b:1:0"), Err(PermissionError::MalformedPath { .. })));
        assert_eq!(Assertion::parse(":1"), Err(PermissionError::EmptyPath));
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(""), Err(PermissionError::EmptyPath));
        assert_eq!(validate("   "), Err(PermissionError::EmptyPath));
        assert!(validate("a..b").is_err());
        assert!(validate(".a").is_err());
        assert!(validate("a.").is_err());
        assert!(validate("a b").is_err());
        assert!(validate("a.*").is_err());
        assert!(validate(" a.b.c ").is_ok());
    }

    #[test]
    fn test_equality_needs_path_and_flag() {
        assert_eq!(Assertion::granted("A.b").unwrap(), Assertion::granted("a.B").unwrap());
        assert_ne!(Assertion::granted("a.b").unwrap(), Assertion::denied("a.b").unwrap());
    }

    #[test]
    fn test_covers_respects_segment_boundary() {
        let short = Assertion::granted("a.bc").unwrap();
        assert!(!short.covers("a.bcd"));
        assert!(short.covers("a.bc.d"));
        assert!(!short.covers("a.bc"));

        let kick = Assertion::granted("server.kick").unwrap();
        let vote = Assertion::granted("server.kick.vote").unwrap();
        assert!(kick.covers(vote.path()));
        assert!(!vote.covers(kick.path()));
    }

    #[test]
    fn test_is_within() {
        let a = Assertion::granted("a.b.c").unwrap();
        assert!(a.is_within("a"));
        assert!(!a.is_within("A.B.C"));
        assert!(!a.is_within("a.b.c.d"));
        assert!(!a.is_within("a.bb"));
    }

    #[test]
    fn test_display_and_serde_use_flag_form() {
        let a = Assertion::denied("server.ban").unwrap();
        assert_eq!(a.to_string(), "server.ban:0");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"server.ban:0\"");
        let back: Assertion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Assertion>("\"bad path:1\"").is_err());
    }
}
