//! Per-session key ratchet.
//!
//! A key wheel starts at a round with the call's session key and derives one
//! key per round:
//!
//! ```text
//! k[start]   = session_key
//! k[r + 1]   = Blake3-derive(KEYWHEEL_CONTEXT, k[r] || r)
//! ```
//!
//! Advancing the wheel discards earlier keys, so a compromised wheel does not
//! reveal the keys of rounds it has already passed.

use serde::{Deserialize, Serialize};

use crate::crypto::SessionKey;
use crate::types::Round;

/// Key derivation context for the ratchet step.
pub const KEYWHEEL_CONTEXT: &str = "callwheel keywheel v1";

/// Most rounds a single lookup or advance may ratchet through.
///
/// Each round costs one Blake3 derivation, so a request further ahead than
/// this is refused instead of computed.
pub const MAX_RATCHET_SPAN: u32 = 1 << 16;

/// The point at which a session's ratchet begins.
///
/// Immutable once built. Two starts are interchangeable only if both the key
/// and the round match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWheelStart {
    pub session_key: SessionKey,
    pub convo_round: Round,
}

impl KeyWheelStart {
    /// Create a new start.
    pub fn new(session_key: SessionKey, convo_round: Round) -> Self {
        Self {
            session_key,
            convo_round,
        }
    }
}

/// Serializable summary of a wheel, safe to log or display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWheelInfo {
    pub start_round: Round,
    pub current_round: Round,
    pub fingerprint: String,
}

/// Ratchet state for a live session.
#[derive(Debug, Clone)]
pub struct KeyWheel {
    start: KeyWheelStart,
    round: Round,
    key: SessionKey,
}

impl KeyWheel {
    /// Build a wheel positioned at its start round.
    pub fn new(start: KeyWheelStart) -> Self {
        Self {
            round: start.convo_round,
            key: start.session_key.clone(),
            start,
        }
    }

    /// The start this wheel was built from.
    pub fn start(&self) -> &KeyWheelStart {
        &self.start
    }

    /// The earliest round whose key is still held.
    pub fn current_round(&self) -> Round {
        self.round
    }

    /// Compute the key for `round` without advancing the wheel.
    ///
    /// Returns None for rounds whose keys were already erased, and for rounds
    /// more than [`MAX_RATCHET_SPAN`] ahead of the wheel.
    pub fn key_at(&self, round: Round) -> Option<SessionKey> {
        if !self.within_reach(round) {
            return None;
        }
        let mut key = self.key.clone();
        for r in self.round.0..round.0 {
            key = ratchet_step(&key, Round(r));
        }
        Some(key)
    }

    /// Get the key for `round`, erasing every earlier key.
    ///
    /// An unreachable round returns None and leaves the wheel untouched.
    pub fn session_key(&mut self, round: Round) -> Option<SessionKey> {
        let key = self.key_at(round)?;
        self.key = key.clone();
        self.round = round;
        Some(key)
    }

    /// Advance the wheel to `round`. Earlier rounds become unavailable.
    ///
    /// A round at or before the current one is a no-op. Returns false, without
    /// advancing, when `round` is more than [`MAX_RATCHET_SPAN`] ahead.
    pub fn erase_before(&mut self, round: Round) -> bool {
        if round <= self.round {
            return true;
        }
        self.session_key(round).is_some()
    }

    fn within_reach(&self, round: Round) -> bool {
        round >= self.round && round.0 - self.round.0 <= MAX_RATCHET_SPAN
    }

    /// Summary for logs and status displays.
    pub fn info(&self) -> KeyWheelInfo {
        KeyWheelInfo {
            start_round: self.start.convo_round,
            current_round: self.round,
            fingerprint: self.start.session_key.fingerprint(),
        }
    }
}

fn ratchet_step(key: &SessionKey, round: Round) -> SessionKey {
    let mut material = [0u8; 36];
    material[..32].copy_from_slice(key.as_bytes());
    material[32..].copy_from_slice(&round.0.to_le_bytes());
    SessionKey::from_bytes(blake3::derive_key(KEYWHEEL_CONTEXT, &material))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(round: u32) -> KeyWheelStart {
        KeyWheelStart::new(SessionKey::from_bytes([0x11; 32]), Round(round))
    }

    #[test]
    fn test_start_round_uses_session_key() {
        let wheel = KeyWheel::new(start(110));
        assert_eq!(wheel.key_at(Round(110)), Some(SessionKey::from_bytes([0x11; 32])));
    }

    #[test]
    fn test_rounds_before_start_unavailable() {
        let wheel = KeyWheel::new(start(110));
        assert_eq!(wheel.key_at(Round(109)), None);
    }

    #[test]
    fn test_equal_starts_same_schedule() {
        let a = KeyWheel::new(start(50));
        let b = KeyWheel::new(start(50));
        for r in 50..60 {
            assert_eq!(a.key_at(Round(r)), b.key_at(Round(r)));
        }
    }

    #[test]
    fn test_different_round_different_schedule() {
        let a = KeyWheel::new(start(50));
        let b = KeyWheel::new(start(51));
        assert_ne!(a.key_at(Round(55)), b.key_at(Round(55)));
    }

    #[test]
    fn test_keys_differ_per_round() {
        let wheel = KeyWheel::new(start(0));
        assert_ne!(wheel.key_at(Round(1)), wheel.key_at(Round(2)));
    }

    #[test]
    fn test_session_key_erases_earlier() {
        let mut wheel = KeyWheel::new(start(10));
        let expected = wheel.key_at(Round(15));

        assert_eq!(wheel.session_key(Round(15)), expected);
        assert_eq!(wheel.current_round(), Round(15));
        assert_eq!(wheel.key_at(Round(12)), None);
        // Advancing does not change later keys.
        let fresh = KeyWheel::new(start(10));
        assert_eq!(wheel.key_at(Round(20)), fresh.key_at(Round(20)));
    }

    #[test]
    fn test_erase_before_is_monotonic() {
        let mut wheel = KeyWheel::new(start(10));
        wheel.erase_before(Round(20));
        wheel.erase_before(Round(15));
        assert_eq!(wheel.current_round(), Round(20));
    }

    #[test]
    fn test_far_rounds_refused_without_advancing() {
        let mut wheel = KeyWheel::new(start(110));
        let far = Round(110 + MAX_RATCHET_SPAN + 1);

        assert_eq!(wheel.key_at(far), None);
        assert_eq!(wheel.session_key(Round(u32::MAX)), None);
        assert!(!wheel.erase_before(far));
        assert_eq!(wheel.current_round(), Round(110));
        assert!(wheel.key_at(Round(111)).is_some());
    }

    #[test]
    fn test_span_limit_is_relative_to_current_round() {
        let mut wheel = KeyWheel::new(start(0));
        assert!(wheel.erase_before(Round(MAX_RATCHET_SPAN)));
        assert!(wheel.key_at(Round(2 * MAX_RATCHET_SPAN)).is_some());
    }

    #[test]
    fn test_info_reports_rounds() {
        let mut wheel = KeyWheel::new(start(10));
        wheel.erase_before(Round(12));
        let info = wheel.info();
        assert_eq!(info.start_round, Round(10));
        assert_eq!(info.current_round, Round(12));
        assert_eq!(info.fingerprint.len(), 16);
    }
}
