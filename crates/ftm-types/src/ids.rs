//! The investigation identifier.
//!
//! A fresh [`InvestigationId`] is minted every time the user selects a
//! publication. Every asynchronous result carries the id it was issued
//! for, so a result that arrives after the user moved on is recognised
//! and dropped. UUID v7 keeps ids time-ordered in logs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifies one investigation (one publication selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InvestigationId(Uuid);

impl InvestigationId {
    /// Mint a new time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID.
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for InvestigationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InvestigationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for InvestigationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = InvestigationId::new();
        let b = InvestigationId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = InvestigationId::from(Uuid::nil());
        assert_eq!(
            serde_json::to_string(&id).ok().as_deref(),
            Some("\"00000000-0000-0000-0000-000000000000\"")
        );
        assert_eq!(id.to_string(), Uuid::nil().to_string());
    }
}
