//! # Callwheel Testkit
//!
//! Testing utilities for callwheel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed round-agreement cases every implementation must reproduce
//! - **Generators**: Proptest strategies for rounds, keys, and syncer parameters
//! - **Fixtures**: Clients wired to controllable round sources and recording notifiers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use callwheel_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use callwheel_testkit::generators::AgreementCase;
//!
//! proptest! {
//!     #[test]
//!     fn callee_agrees(case: AgreementCase) {
//!         let (start, intent) = case.outgoing();
//!         let callee = case.syncer.incoming_call_convo_round(case.callee_round(), intent).unwrap();
//!         prop_assert_eq!(start, callee);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use callwheel_testkit::fixtures::CallPair;
//!
//! async fn example() {
//!     let pair = CallPair::new(1, 100, 105);
//!     let outcome = pair.dial("alice", "bob").await.unwrap();
//!     assert_eq!(outcome.caller.round(), outcome.callee.round());
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{peer_names, CallPair, FixtureClient, PairOutcome, TestFixture};
pub use generators::AgreementCase;
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, RoundVector};
