//! Per-peer conversation state.
//!
//! A conversation holds at most one live key wheel and at most one pending
//! call. Each lives behind its own mutex. The pending slot is written by call
//! handlers; the live slot is written only by the
//! [`SessionActivator`](crate::activator::SessionActivator) while it holds the
//! admission lock.
//!
//! Lock order: admission lock, then conversation locks. Never acquire the
//! admission lock while holding a conversation lock.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use callwheel_core::keywheel::KeyWheelInfo;
use callwheel_core::{KeyWheel, KeyWheelStart, Round, SessionKey, Username};

/// Lock a mutex, recovering the data if a holder panicked.
///
/// Every critical section here leaves the guarded value consistent, so a
/// poisoned lock carries no torn state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The single-slot queue of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingCall {
    #[default]
    None,
    Pending(KeyWheelStart),
}

impl PendingCall {
    /// Take the pending start, leaving the slot empty.
    pub fn take(&mut self) -> Option<KeyWheelStart> {
        match std::mem::take(self) {
            PendingCall::None => None,
            PendingCall::Pending(start) => Some(start),
        }
    }

    /// Borrow the pending start.
    pub fn as_start(&self) -> Option<&KeyWheelStart> {
        match self {
            PendingCall::None => None,
            PendingCall::Pending(start) => Some(start),
        }
    }

    /// Whether a call is waiting.
    pub fn is_pending(&self) -> bool {
        matches!(self, PendingCall::Pending(_))
    }
}

/// Point-in-time copy of a conversation's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSnapshot {
    pub peer: Username,
    pub pending: Option<KeyWheelStart>,
    pub active: Option<KeyWheelStart>,
}

/// Session container for one peer.
#[derive(Debug)]
pub struct Conversation {
    peer: Username,
    pending: Mutex<PendingCall>,
    session: Mutex<Option<KeyWheel>>,
}

impl Conversation {
    /// Create an idle conversation.
    pub fn new(peer: Username) -> Self {
        Self {
            peer,
            pending: Mutex::new(PendingCall::None),
            session: Mutex::new(None),
        }
    }

    /// The peer this conversation is with.
    pub fn peer(&self) -> &Username {
        &self.peer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pending call
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue a call that could not be admitted.
    ///
    /// The slot holds one call; a newer call replaces an older one, which is
    /// returned.
    pub fn queue_call(&self, start: KeyWheelStart) -> Option<KeyWheelStart> {
        let mut pending = lock(&self.pending);
        let superseded = pending.take();
        *pending = PendingCall::Pending(start);
        superseded
    }

    /// Remove and return the pending call.
    pub fn take_pending_call(&self) -> Option<KeyWheelStart> {
        lock(&self.pending).take()
    }

    /// Copy of the pending call, if any.
    pub fn pending_call(&self) -> Option<KeyWheelStart> {
        lock(&self.pending).as_start().cloned()
    }

    /// Put a call back in the slot unless a newer one arrived meanwhile.
    ///
    /// Returns true if the call was restored.
    pub(crate) fn restore_pending_call(&self, start: KeyWheelStart) -> bool {
        let mut pending = lock(&self.pending);
        if pending.is_pending() {
            return false;
        }
        *pending = PendingCall::Pending(start);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Live session
    // ─────────────────────────────────────────────────────────────────────────

    /// Install a new key wheel. Caller must hold the admission lock.
    ///
    /// Any pending call is superseded by the admitted one.
    pub(crate) fn install_session(&self, start: KeyWheelStart) {
        let mut session = lock(&self.session);
        *session = Some(KeyWheel::new(start));
        drop(session);

        if let Some(stale) = lock(&self.pending).take() {
            tracing::debug!(
                peer = %self.peer,
                round = %stale.convo_round,
                "pending call superseded by admitted call"
            );
        }
    }

    /// Drop the live key wheel. Caller must hold the admission lock.
    pub(crate) fn clear_session(&self) -> Option<KeyWheel> {
        lock(&self.session).take()
    }

    /// Whether a key wheel is installed.
    pub fn is_active(&self) -> bool {
        lock(&self.session).is_some()
    }

    /// The start of the live session, if any.
    pub fn active_start(&self) -> Option<KeyWheelStart> {
        lock(&self.session).as_ref().map(|wheel| wheel.start().clone())
    }

    /// Summary of the live session, if any.
    pub fn session_info(&self) -> Option<KeyWheelInfo> {
        lock(&self.session).as_ref().map(KeyWheel::info)
    }

    /// Key for `round` in the live session, erasing earlier keys.
    pub fn session_key(&self, round: Round) -> Option<SessionKey> {
        lock(&self.session)
            .as_mut()
            .and_then(|wheel| wheel.session_key(round))
    }

    /// Copy the current state.
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            peer: self.peer.clone(),
            pending: self.pending_call(),
            active: self.active_start(),
        }
    }
}

/// All conversations known to the client, keyed by peer.
#[derive(Debug, Default)]
pub struct ConversationTable {
    convos: Mutex<BTreeMap<Username, Arc<Conversation>>>,
}

impl ConversationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the conversation with `peer`, creating it on first use.
    pub fn get_or_create(&self, peer: &Username) -> Arc<Conversation> {
        let mut convos = lock(&self.convos);
        let convo = convos.entry(peer.clone()).or_insert_with(|| {
            tracing::debug!(peer = %peer, "created conversation");
            Arc::new(Conversation::new(peer.clone()))
        });
        Arc::clone(convo)
    }

    /// Fetch an existing conversation.
    pub fn get(&self, peer: &Username) -> Option<Arc<Conversation>> {
        lock(&self.convos).get(peer).cloned()
    }

    /// Number of conversations.
    pub fn len(&self) -> usize {
        lock(&self.convos).len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every conversation, ordered by peer.
    pub fn snapshot(&self) -> Vec<ConversationSnapshot> {
        let convos: Vec<Arc<Conversation>> = lock(&self.convos).values().cloned().collect();
        convos.iter().map(|convo| convo.snapshot()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(byte: u8, round: u32) -> KeyWheelStart {
        KeyWheelStart::new(SessionKey::from_bytes([byte; 32]), Round(round))
    }

    #[test]
    fn test_queue_call_last_writer_wins() {
        let convo = Conversation::new(Username::from("bob"));

        assert_eq!(convo.queue_call(start(1, 110)), None);
        assert_eq!(convo.queue_call(start(2, 120)), Some(start(1, 110)));
        assert_eq!(convo.pending_call(), Some(start(2, 120)));
    }

    #[test]
    fn test_take_pending_clears_slot() {
        let convo = Conversation::new(Username::from("bob"));
        convo.queue_call(start(1, 110));

        assert_eq!(convo.take_pending_call(), Some(start(1, 110)));
        assert_eq!(convo.take_pending_call(), None);
    }

    #[test]
    fn test_restore_does_not_overwrite_newer_call() {
        let convo = Conversation::new(Username::from("bob"));
        convo.queue_call(start(2, 120));

        assert!(!convo.restore_pending_call(start(1, 110)));
        assert_eq!(convo.pending_call(), Some(start(2, 120)));

        convo.take_pending_call();
        assert!(convo.restore_pending_call(start(1, 110)));
        assert_eq!(convo.pending_call(), Some(start(1, 110)));
    }

    #[test]
    fn test_install_session_supersedes_pending() {
        let convo = Conversation::new(Username::from("bob"));
        convo.queue_call(start(1, 110));

        convo.install_session(start(2, 120));

        assert!(convo.is_active());
        assert_eq!(convo.pending_call(), None);
        assert_eq!(convo.active_start(), Some(start(2, 120)));
    }

    #[test]
    fn test_session_key_follows_wheel() {
        let convo = Conversation::new(Username::from("bob"));
        assert_eq!(convo.session_key(Round(110)), None);

        convo.install_session(start(7, 110));
        let expected = KeyWheel::new(start(7, 110)).key_at(Round(112));
        assert_eq!(convo.session_key(Round(112)), expected);
        assert_eq!(convo.session_key(Round(111)), None);
        assert_eq!(convo.session_info().unwrap().current_round, Round(112));
    }

    #[test]
    fn test_session_key_far_round_refused() {
        let convo = Conversation::new(Username::from("bob"));
        convo.install_session(start(7, 110));

        assert_eq!(convo.session_key(Round(u32::MAX)), None);
        assert_eq!(convo.session_info().unwrap().current_round, Round(110));
    }

    #[test]
    fn test_clear_session() {
        let convo = Conversation::new(Username::from("bob"));
        convo.install_session(start(7, 110));

        assert!(convo.clear_session().is_some());
        assert!(!convo.is_active());
        assert!(convo.clear_session().is_none());
    }

    #[test]
    fn test_table_get_or_create_shares_handle() {
        let table = ConversationTable::new();
        let peer = Username::from("carol");

        let a = table.get_or_create(&peer);
        let b = table.get_or_create(&peer);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
        assert!(table.get(&Username::from("dave")).is_none());
    }

    #[test]
    fn test_table_snapshot_ordered() {
        let table = ConversationTable::new();
        table.get_or_create(&Username::from("zed"));
        table.get_or_create(&Username::from("amy")).queue_call(start(3, 30));

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].peer, Username::from("amy"));
        assert_eq!(snapshot[0].pending, Some(start(3, 30)));
        assert_eq!(snapshot[1].peer, Username::from("zed"));
    }
}
