//! Proptest generators for property-based testing.

use proptest::prelude::*;

use callwheel_core::{Intent, KeyWheelStart, Round, RoundSyncer, SessionKey, Username};

/// Generate a round far enough from `u32::MAX` that start rounds never overflow.
pub fn round() -> impl Strategy<Value = Round> {
    (0u32..=u32::MAX / 2).prop_map(Round)
}

/// Generate a random session key.
pub fn session_key() -> impl Strategy<Value = SessionKey> {
    any::<[u8; 32]>().prop_map(SessionKey::from_bytes)
}

/// Generate a key wheel start.
pub fn keywheel_start() -> impl Strategy<Value = KeyWheelStart> {
    (session_key(), round()).prop_map(|(key, round)| KeyWheelStart::new(key, round))
}

/// Generate a peer name.
pub fn username() -> impl Strategy<Value = Username> {
    "[a-z][a-z0-9]{0,11}".prop_map(Username::from)
}

/// Generate syncer parameters that satisfy the agreement inequality.
pub fn syncer() -> impl Strategy<Value = RoundSyncer> {
    (1u32..=128, 1u32..=512, 0u32..=3).prop_map(|(epoch_len, lead, extra)| {
        let intents = (lead + epoch_len).div_ceil(epoch_len) + extra;
        RoundSyncer::new(epoch_len, lead, intents).expect("parameters satisfy agreement inequality")
    })
}

/// Generate an intent valid for `syncer`.
pub fn intent(syncer: RoundSyncer) -> impl Strategy<Value = Intent> {
    (0..syncer.intents()).prop_map(Intent)
}

/// A caller/callee observation pair inside the agreement window.
#[derive(Debug, Clone)]
pub struct AgreementCase {
    pub syncer: RoundSyncer,
    pub caller_round: Round,
    /// Position of the callee's round within `[caller_round, epoch_start]`,
    /// scaled to `0..=u16::MAX`.
    pub callee_position: u16,
}

impl AgreementCase {
    /// The caller's start round and intent.
    pub fn outgoing(&self) -> (Round, Intent) {
        self.syncer
            .outgoing_call_convo_round(self.caller_round)
            .expect("generated rounds never overflow")
    }

    /// The callee's latest round, inside the agreement window.
    pub fn callee_round(&self) -> Round {
        let (start, _) = self.outgoing();
        let window = u64::from(start.0 - self.caller_round.0);
        let offset = window * u64::from(self.callee_position) / u64::from(u16::MAX);
        Round(self.caller_round.0 + offset as u32)
    }
}

impl Arbitrary for AgreementCase {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (syncer(), round(), any::<u16>())
            .prop_map(|(syncer, caller_round, callee_position)| AgreementCase {
                syncer,
                caller_round,
                callee_position,
            })
            .boxed()
    }
}
