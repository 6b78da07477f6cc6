//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use callwheel::call::memory::{TestIncomingCall, TestOutgoingCall};
use callwheel::{CallClient, CallOutcome, RecordingNotifier, Result, SessionActivator};
use callwheel_core::{Intent, Round, RoundSyncer, SessionKey, Username};
use callwheel_rounds::ManualRoundSource;

/// Client type used by fixtures.
pub type FixtureClient = CallClient<Arc<ManualRoundSource>, Arc<RecordingNotifier>>;

/// A client wired to a controllable round source and a recording notifier.
pub struct TestFixture {
    pub rounds: Arc<ManualRoundSource>,
    pub notifier: Arc<RecordingNotifier>,
    pub client: FixtureClient,
}

impl TestFixture {
    /// Create a client with the standard syncer.
    pub fn new(capacity: usize, round: u32) -> Self {
        Self::with_activator(Arc::new(SessionActivator::new(capacity)), round)
    }

    /// Create a client around a shared activator.
    pub fn with_activator(activator: Arc<SessionActivator>, round: u32) -> Self {
        let rounds = Arc::new(ManualRoundSource::new(Round(round)));
        let notifier = Arc::new(RecordingNotifier::new());
        let client = CallClient::new(
            Arc::clone(&rounds),
            Arc::clone(&notifier),
            RoundSyncer::STANDARD,
            activator,
        );
        Self {
            rounds,
            notifier,
            client,
        }
    }

    /// Place a call to `peer` with a random session key.
    pub async fn call(&self, peer: &str) -> Result<CallOutcome> {
        let call = TestOutgoingCall::new(peer, SessionKey::generate());
        self.client.sending_call(&call).await
    }

    /// Receive a call from `peer` with a random session key.
    pub async fn receive(&self, peer: &str, intent: Intent) -> Result<CallOutcome> {
        let call = TestIncomingCall::new(peer, SessionKey::generate(), intent);
        self.client.received_call(&call).await
    }
}

/// Two clients, one per side of a call, each with its own view of the round.
pub struct CallPair {
    pub caller: TestFixture,
    pub callee: TestFixture,
}

/// Outcome of a call placed through a [`CallPair`].
#[derive(Debug)]
pub struct PairOutcome {
    pub intent: Intent,
    pub caller: CallOutcome,
    pub callee: CallOutcome,
}

impl CallPair {
    /// Create a pair whose sides see different latest rounds.
    pub fn new(capacity: usize, caller_round: u32, callee_round: u32) -> Self {
        Self {
            caller: TestFixture::new(capacity, caller_round),
            callee: TestFixture::new(capacity, callee_round),
        }
    }

    /// Place a call from `caller_name` to `callee_name` and deliver it.
    pub async fn dial(&self, caller_name: &str, callee_name: &str) -> Result<PairOutcome> {
        let session_key = SessionKey::generate();
        let outgoing = TestOutgoingCall::new(callee_name, session_key.clone());
        let caller = self.caller.client.sending_call(&outgoing).await?;

        let intent = outgoing
            .sent_intent()
            .expect("admitted or queued calls always carry an intent");
        let incoming = TestIncomingCall::new(caller_name, session_key, intent);
        let callee = self.callee.client.received_call(&incoming).await?;

        Ok(PairOutcome {
            intent,
            caller,
            callee,
        })
    }

    /// Whether both sides run the same key wheel for the call.
    pub fn same_wheel(&self, caller_name: &str, callee_name: &str) -> bool {
        let on_caller = self
            .caller
            .client
            .conversation(&Username::from(callee_name))
            .and_then(|c| c.active_start());
        let on_callee = self
            .callee
            .client
            .conversation(&Username::from(caller_name))
            .and_then(|c| c.active_start());
        on_caller.is_some() && on_caller == on_callee
    }
}

/// Names for `count` distinct peers.
pub fn peer_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("peer-{:03}", i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_call_activates() {
        let fixture = TestFixture::new(1, 100);
        let outcome = fixture.call("bob").await.unwrap();
        assert_eq!(outcome, CallOutcome::Activated { round: Round(110) });
    }

    #[tokio::test]
    async fn test_pair_agrees_on_wheel() {
        let pair = CallPair::new(1, 100, 107);
        let outcome = pair.dial("alice", "bob").await.unwrap();

        assert_eq!(outcome.caller.round(), outcome.callee.round());
        assert!(pair.same_wheel("alice", "bob"));
    }

    #[test]
    fn test_peer_names_distinct() {
        let names = peer_names(3);
        assert_eq!(names, vec!["peer-000", "peer-001", "peer-002"]);
    }
}
