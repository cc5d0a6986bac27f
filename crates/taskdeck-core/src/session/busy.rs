//! Cross-session busy lock.

use std::collections::HashMap;

use crate::api::types::{Session, SessionStatus};

/// Tracks which sessions have a stream in flight.
///
/// The flag is first derived from server-reported status, so a session left
/// executing by another client (or a previous process) counts as busy before
/// any local stream exists. Explicit start/stop calls then override the
/// derived value until the next reconcile.
#[derive(Debug, Default)]
pub struct BusyLedger {
    flags: HashMap<String, bool>,
}

impl BusyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds derived state from a freshly loaded session list. Local
    /// overrides are discarded; the list is authoritative.
    pub fn reconcile(&mut self, sessions: &[Session]) {
        self.flags.clear();
        for session in sessions {
            self.flags.insert(
                session.id.clone(),
                session.status == SessionStatus::Executing,
            );
        }
    }

    pub fn set_busy(&mut self, session_id: &str, busy: bool) {
        self.flags.insert(session_id.to_string(), busy);
    }

    pub fn is_busy(&self, session_id: &str) -> bool {
        self.flags.get(session_id).copied().unwrap_or(false)
    }

    /// A busy session other than `session_id`, if any.
    pub fn other_busy(&self, session_id: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(id, busy)| **busy && id.as_str() != session_id)
            .map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, status: SessionStatus) -> Session {
        Session {
            id: id.to_string(),
            title: format!("Session {id}"),
            status,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_busy_derived_from_session_list() {
        let mut ledger = BusyLedger::new();
        ledger.reconcile(&[
            session("a", SessionStatus::Planning),
            session("b", SessionStatus::Executing),
        ]);
        assert!(!ledger.is_busy("a"));
        assert!(ledger.is_busy("b"));
        assert!(!ledger.is_busy("unknown"));
    }

    #[test]
    fn test_local_override_supersedes_derived() {
        let mut ledger = BusyLedger::new();
        ledger.reconcile(&[session("a", SessionStatus::Executing)]);
        ledger.set_busy("a", false);
        assert!(!ledger.is_busy("a"));
    }

    #[test]
    fn test_reconcile_discards_overrides() {
        let mut ledger = BusyLedger::new();
        ledger.set_busy("a", true);
        ledger.reconcile(&[session("a", SessionStatus::Planning)]);
        assert!(!ledger.is_busy("a"));
    }

    #[test]
    fn test_other_busy_skips_own_session() {
        let mut ledger = BusyLedger::new();
        ledger.reconcile(&[
            session("a", SessionStatus::Executing),
            session("b", SessionStatus::Planning),
        ]);
        assert_eq!(ledger.other_busy("a"), None);
        assert_eq!(ledger.other_busy("b"), Some("a"));
    }
}
