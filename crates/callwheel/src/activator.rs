//! Bounded admission of live sessions.
//!
//! The activator owns the active set: the conversations that currently run a
//! key wheel. One mutex serializes every check-and-install, so concurrent
//! call events can never admit more sessions than the capacity allows.
//!
//! A rejected call is not an error. The caller queues it on the conversation
//! and the user may resume it later, after hanging up another session.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use callwheel_core::{KeyWheelStart, Round, Username};

use crate::conversation::{lock, Conversation};

/// Result of resuming a conversation's pending call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The pending call is now the live session, starting at this round.
    Activated(Round),
    /// Nothing was waiting.
    NoPendingCall,
    /// Still no free slot; the call stays pending.
    AtCapacity,
}

/// Admission controller shared by every call handler.
#[derive(Debug)]
pub struct SessionActivator {
    capacity: usize,
    active: Mutex<BTreeMap<Username, Arc<Conversation>>>,
}

impl SessionActivator {
    /// Create an activator admitting at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: Mutex::new(BTreeMap::new()),
        }
    }

    /// Maximum number of live sessions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Try to make `start` the live session of `convo`.
    ///
    /// Returns false, without mutating anything, when every slot is taken.
    /// This holds for a conversation that is already live too: its wheel is
    /// only replaced while a slot is free, otherwise the new call must wait
    /// for a hang-up and an explicit resume.
    pub fn activate(&self, convo: &Arc<Conversation>, start: KeyWheelStart) -> bool {
        let mut active = lock(&self.active);
        let peer = convo.peer();

        if active.len() >= self.capacity {
            tracing::debug!(
                peer = %peer,
                active = active.len(),
                capacity = self.capacity,
                "admission rejected"
            );
            return false;
        }

        let round = start.convo_round;
        convo.install_session(start);
        active.insert(peer.clone(), Arc::clone(convo));
        tracing::info!(peer = %peer, round = %round, "session activated");
        true
    }

    /// Remove `peer` from the active set and drop its key wheel.
    ///
    /// Frees one slot. Pending calls elsewhere are not promoted.
    pub fn deactivate(&self, peer: &Username) -> bool {
        let mut active = lock(&self.active);
        match active.remove(peer) {
            Some(convo) => {
                convo.clear_session();
                tracing::info!(peer = %peer, "session deactivated");
                true
            }
            None => false,
        }
    }

    /// Promote the conversation's pending call, if a slot is free.
    pub fn resume(&self, convo: &Arc<Conversation>) -> ResumeOutcome {
        let Some(start) = convo.take_pending_call() else {
            return ResumeOutcome::NoPendingCall;
        };

        let round = start.convo_round;
        if self.activate(convo, start.clone()) {
            return ResumeOutcome::Activated(round);
        }

        if !convo.restore_pending_call(start) {
            tracing::debug!(peer = %convo.peer(), "newer call queued during resume");
        }
        ResumeOutcome::AtCapacity
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    /// Whether `peer` has a live session.
    pub fn is_active(&self, peer: &Username) -> bool {
        lock(&self.active).contains_key(peer)
    }

    /// Peers with live sessions, in order.
    pub fn active_peers(&self) -> Vec<Username> {
        lock(&self.active).keys().cloned().collect()
    }
}
