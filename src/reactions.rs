// src/reactions.rs
//! In-memory community reaction ledger: per-session "verify" / "clear"
//! signals on stored reports, mutually exclusive per session per report.
//! One lock covers the whole table — this is a low-contention, best-effort
//! social signal, not a system of record, and it is allowed to vanish on
//! restart. The lock is never held across an await point.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Verify,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MyReactions {
    pub verified: bool,
    pub cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub rid: String,
    pub verify_count: usize,
    pub clear_count: usize,
    pub me: MyReactions,
}

#[derive(Default)]
struct Buckets {
    verify: HashSet<String>,
    clear: HashSet<String>,
}

impl Buckets {
    fn counts(&self, rid: &str, session_id: &str) -> ReactionCounts {
        ReactionCounts {
            rid: rid.to_string(),
            verify_count: self.verify.len(),
            clear_count: self.clear.len(),
            me: MyReactions {
                verified: self.verify.contains(session_id),
                cleared: self.clear.contains(session_id),
            },
        }
    }
}

#[derive(Default)]
pub struct ReactionLedger {
    inner: Mutex<HashMap<String, Buckets>>,
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent toggle. Setting one signal removes the session from the
    /// other; returns the record's counts and the caller's own state.
    pub fn react(
        &self,
        rid: &str,
        session_id: &str,
        action: ReactionAction,
        value: bool,
    ) -> ReactionCounts {
        let mut table = self.inner.lock().expect("reactions mutex poisoned");
        let b = table.entry(rid.to_string()).or_default();
        match (action, value) {
            (ReactionAction::Verify, true) => {
                b.verify.insert(session_id.to_string());
                b.clear.remove(session_id);
            }
            (ReactionAction::Verify, false) => {
                b.verify.remove(session_id);
            }
            (ReactionAction::Clear, true) => {
                b.clear.insert(session_id.to_string());
                b.verify.remove(session_id);
            }
            (ReactionAction::Clear, false) => {
                b.clear.remove(session_id);
            }
        }
        b.counts(rid, session_id)
    }

    /// Batched read under a single lock acquisition. Unknown ids report
    /// zero counts rather than being omitted.
    pub fn get_many(&self, ids: &[String], session_id: &str) -> HashMap<String, ReactionCounts> {
        let mut table = self.inner.lock().expect("reactions mutex poisoned");
        let mut out = HashMap::with_capacity(ids.len());
        for rid in ids {
            let b = table.entry(rid.clone()).or_default();
            out.insert(rid.clone(), b.counts(rid, session_id));
        }
        out
    }
}
