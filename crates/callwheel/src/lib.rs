//! # Callwheel
//!
//! Session activation for a metadata-private call client.
//!
//! ## Overview
//!
//! When a call is placed or received, two questions need answers:
//!
//! - **When** does the session's key wheel start? Caller and callee read the
//!   latest round independently, with different delays, and never exchange a
//!   second message. Both apply the [`RoundSyncer`] convention and land on the
//!   same start round.
//! - **Whether** the client can run the session now. The shared
//!   [`SessionActivator`] admits at most `capacity` live sessions. A call that
//!   does not fit waits in its conversation's single pending slot until the
//!   user answers it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use callwheel::{CallClient, ClientConfig, TracingNotifier};
//! use callwheel::call::memory::TestOutgoingCall;
//! use callwheel::primitives::{Round, SessionKey};
//! use callwheel::rounds::ManualRoundSource;
//!
//! async fn example() {
//!     let config = ClientConfig::default();
//!     let client = CallClient::from_config(
//!         ManualRoundSource::new(Round(100)),
//!         TracingNotifier,
//!         &config,
//!     )
//!     .unwrap();
//!
//!     let call = TestOutgoingCall::new("bob", SessionKey::generate());
//!     let outcome = client.sending_call(&call).await.unwrap();
//!     println!("session starts at round {}", outcome.round());
//! }
//! ```
//!
//! ## Concurrency
//!
//! Handlers may run concurrently. Admission is serialized by one mutex inside
//! the activator; each conversation's pending slot has its own mutex. Locks
//! are never held across the latest-round fetch.
//!
//! ## Re-exports
//!
//! - `callwheel::primitives` - Rounds, intents, key wheels, round syncer
//! - `callwheel::rounds` - Round sources

pub mod activator;
pub mod call;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod notify;

pub use callwheel_core as primitives;
pub use callwheel_rounds as rounds;

pub use activator::{ResumeOutcome, SessionActivator};
pub use call::{
    Call, Friend, IncomingCall, IncomingFriendRequest, OutgoingCall, OutgoingFriendRequest,
    SignedConfig,
};
pub use client::{CallClient, CallOutcome, ConfiguredRoundSource};
pub use config::{ClientConfig, RoundSyncerConfig};
pub use conversation::{Conversation, ConversationSnapshot, ConversationTable, PendingCall};
pub use error::{ClientError, Result};
pub use notify::{memory::RecordingNotifier, Notifier, TracingNotifier};

pub use callwheel_core::{Intent, KeyWheel, KeyWheelStart, Round, RoundSyncer, SessionKey, Username};
