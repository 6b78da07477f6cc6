//! # Callwheel Core
//!
//! Pure primitives for session activation: rounds, call intents, session keys,
//! key wheels, and the round-synchronization convention that lets a caller and
//! a callee agree on when a session starts.
//!
//! This crate contains no I/O, no locking, no networking. Fetching the latest
//! round lives in `callwheel-rounds`; admission control lives in `callwheel`.
//!
//! ## Key Types
//!
//! - [`Round`] - A global epoch of the underlying delivery protocol
//! - [`Intent`] - Value sent with a call so the callee can recompute the start round
//! - [`RoundSyncer`] - Maps (latest round, intent) to the agreed start round
//! - [`KeyWheelStart`] - Immutable (session key, start round) pair
//! - [`KeyWheel`] - Per-session key ratchet advanced once per round
//!
//! ## Agreement
//!
//! ```rust
//! use callwheel_core::{Round, RoundSyncer};
//!
//! let syncer = RoundSyncer::STANDARD;
//! let (epoch_start, intent) = syncer.outgoing_call_convo_round(Round(100)).unwrap();
//!
//! // The callee sees a later round, but lands on the same start.
//! let callee_start = syncer.incoming_call_convo_round(Round(104), intent).unwrap();
//! assert_eq!(epoch_start, callee_start);
//! ```

pub mod crypto;
pub mod error;
pub mod keywheel;
pub mod roundsync;
pub mod types;

pub use crypto::SessionKey;
pub use error::{CoreError, Result};
pub use keywheel::{KeyWheel, KeyWheelStart, MAX_RATCHET_SPAN};
pub use roundsync::RoundSyncer;
pub use types::{Intent, Round, Username};
