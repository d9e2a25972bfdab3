//! Identifier newtypes for risk computation scoping.
//!
//! Every computed metric is scoped to a `(SubjectId, TenantId)` pair. The
//! newtypes prevent accidental transposition of the two strings at call
//! sites.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the subject (account/user) whose portfolio is analysed.
///
/// # Examples
///
/// ```rust
/// use risk_engine::types::SubjectId;
///
/// let subject = SubjectId::new("acct-42");
/// assert_eq!(subject.as_str(), "acct-42");
/// assert_eq!(format!("{}", subject), "acct-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new subject identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the tenant (organisation) the subject belongs to.
///
/// # Examples
///
/// ```rust
/// use risk_engine::types::TenantId;
///
/// let tenant = TenantId::new("desk-eu");
/// assert_eq!(tenant.as_str(), "desk-eu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_display() {
        let id = SubjectId::new("acct-1");
        assert_eq!(format!("{}", id), "acct-1");
    }

    #[test]
    fn test_tenant_id_equality() {
        assert_eq!(TenantId::new("t1"), TenantId::new("t1"));
        assert_ne!(TenantId::new("t1"), TenantId::new("t2"));
    }

    #[test]
    fn test_ids_serde_transparent() {
        let id = SubjectId::new("acct-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acct-1\"");
        let back: SubjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
