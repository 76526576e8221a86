use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::error::AgentError;

/// Attempts made to find an unused id before giving up.
pub const MAX_ID_ATTEMPTS: usize = 16;

const ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A staged, unapplied generator answer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub user_request: String,
    pub raw_content: String,
    pub created_at: OffsetDateTime,
    /// Insertion position in the owning store; survives take/restore.
    sequence: u64,
}

/// Source of candidate proposal ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Short ids taken from the first eight hex digits of a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        id
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<ProposalId, Proposal>,
    next_sequence: u64,
}

/// In-memory proposal map. Lookup-and-remove is a single locked step, so a
/// proposal can be taken exactly once even under racing accept/reject calls.
pub struct ProposalStore {
    inner: Mutex<StoreInner>,
    ids: Box<dyn IdSource>,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::with_id_source(RandomIdSource)
    }
}

impl fmt::Debug for ProposalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProposalStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_source(ids: impl IdSource + 'static) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            ids: Box::new(ids),
        }
    }

    /// Stores a new proposal under a fresh id. Candidate ids that are already
    /// taken are retried up to [`MAX_ID_ATTEMPTS`] times.
    pub fn insert(
        &self,
        user_request: impl Into<String>,
        raw_content: impl Into<String>,
    ) -> Result<Proposal, AgentError> {
        let mut inner = lock_unpoisoned(&self.inner);

        let id = (0..MAX_ID_ATTEMPTS)
            .map(|_| ProposalId::new(self.ids.next_id()))
            .find(|candidate| !inner.entries.contains_key(candidate))
            .ok_or(AgentError::ProposalIdExhausted {
                attempts: MAX_ID_ATTEMPTS,
            })?;

        let proposal = Proposal {
            id: id.clone(),
            user_request: user_request.into(),
            raw_content: raw_content.into(),
            created_at: OffsetDateTime::now_utc(),
            sequence: inner.next_sequence,
        };
        inner.next_sequence += 1;
        inner.entries.insert(id, proposal.clone());

        debug!(id = %proposal.id, pending = inner.entries.len(), "proposal stored");
        Ok(proposal)
    }

    pub fn get(&self, id: &str) -> Option<Proposal> {
        lock_unpoisoned(&self.inner)
            .entries
            .get(&ProposalId::new(id.trim()))
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        lock_unpoisoned(&self.inner)
            .entries
            .contains_key(&ProposalId::new(id.trim()))
    }

    /// Removes and returns the proposal in one step.
    pub fn take(&self, id: &str) -> Result<Proposal, AgentError> {
        let id = id.trim();
        lock_unpoisoned(&self.inner)
            .entries
            .remove(&ProposalId::new(id))
            .ok_or_else(|| AgentError::ProposalNotFound { id: id.to_string() })
    }

    /// Puts a taken proposal back at its original position. Returns `false` if
    /// its id was reused in the meantime, in which case nothing changes.
    pub fn restore(&self, proposal: Proposal) -> bool {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.entries.contains_key(&proposal.id) {
            return false;
        }

        inner.entries.insert(proposal.id.clone(), proposal);
        true
    }

    /// Pending proposals, oldest first.
    pub fn pending(&self) -> Vec<Proposal> {
        let inner = lock_unpoisoned(&self.inner);
        let mut pending: Vec<Proposal> = inner.entries.values().cloned().collect();
        pending.sort_by_key(|proposal| proposal.sequence);
        pending
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    struct ScriptedIds(Mutex<VecDeque<String>>);

    impl ScriptedIds {
        fn new(ids: &[&str]) -> Self {
            Self(Mutex::new(ids.iter().map(|id| id.to_string()).collect()))
        }
    }

    impl IdSource for ScriptedIds {
        fn next_id(&self) -> String {
            lock_unpoisoned(&self.0)
                .pop_front()
                .unwrap_or_else(|| "deadbeef".to_string())
        }
    }

    #[test]
    fn random_ids_are_eight_hex_chars() {
        let id = RandomIdSource.next_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn colliding_ids_are_retried() {
        let store = ProposalStore::with_id_source(ScriptedIds::new(&[
            "aaaa0001", "aaaa0001", "bbbb0002",
        ]));

        let first = store.insert("one", "x").expect("first insert");
        let second = store.insert("two", "y").expect("second insert");

        assert_eq!(first.id.as_str(), "aaaa0001");
        assert_eq!(second.id.as_str(), "bbbb0002");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn exhausted_ids_fail_without_overwriting() {
        let store = ProposalStore::with_id_source(ScriptedIds::new(&[]));
        store.insert("one", "x").expect("first insert uses fallback id");

        let error = store.insert("two", "y").expect_err("every candidate collides");
        assert!(matches!(
            error,
            AgentError::ProposalIdExhausted {
                attempts: MAX_ID_ATTEMPTS
            }
        ));
        assert_eq!(
            store.get("deadbeef").map(|proposal| proposal.user_request),
            Some("one".to_string())
        );
    }

    #[test]
    fn take_removes_exactly_once() {
        let store = ProposalStore::new();
        let proposal = store.insert("req", "content").expect("insert");

        let taken = store.take(proposal.id.as_str()).expect("first take");
        assert_eq!(taken, proposal);
        assert!(matches!(
            store.take(proposal.id.as_str()),
            Err(AgentError::ProposalNotFound { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_takes_have_a_single_winner() {
        let store = Arc::new(ProposalStore::new());
        let id = store.insert("req", "content").expect("insert").id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || store.take(id.as_str()).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread should not panic"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn restore_refuses_reused_ids() {
        let store = ProposalStore::with_id_source(ScriptedIds::new(&["cafe0001", "cafe0001"]));
        store.insert("old", "x").expect("insert");
        let taken = store.take("cafe0001").expect("take");
        store.insert("new", "y").expect("id is free again");

        assert!(!store.restore(taken));
        assert_eq!(
            store.get("cafe0001").map(|proposal| proposal.user_request),
            Some("new".to_string())
        );
    }

    #[test]
    fn pending_lists_oldest_first() {
        let store = ProposalStore::with_id_source(ScriptedIds::new(&[
            "ffff0001", "0000aaaa", "7777beef",
        ]));
        for request in ["first", "second", "third"] {
            store.insert(request, "").expect("insert");
        }
        store.take("0000aaaa").expect("take middle");

        let requests: Vec<String> = store
            .pending()
            .into_iter()
            .map(|proposal| proposal.user_request)
            .collect();
        assert_eq!(requests, vec!["first", "third"]);
    }

    #[test]
    fn restored_proposal_keeps_its_place() {
        let store = ProposalStore::with_id_source(ScriptedIds::new(&[
            "ffff0001", "0000aaaa", "7777beef",
        ]));
        for request in ["first", "second", "third"] {
            store.insert(request, "").expect("insert");
        }

        let taken = store.take("ffff0001").expect("take oldest");
        assert!(store.restore(taken));

        let requests: Vec<String> = store
            .pending()
            .into_iter()
            .map(|proposal| proposal.user_request)
            .collect();
        assert_eq!(requests, vec!["first", "second", "third"]);
    }

    #[test]
    fn ids_are_trimmed_on_lookup() {
        let store = ProposalStore::new();
        let proposal = store.insert("req", "content").expect("insert");

        assert!(store.contains(&format!(" {} ", proposal.id)));
    }
}
