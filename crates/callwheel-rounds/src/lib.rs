//! # Callwheel Rounds
//!
//! Sources for the latest round of the delivery protocol.
//!
//! ## Overview
//!
//! Session activation needs one fact from the outside world: the latest
//! round. This crate puts that query behind the [`RoundSource`] trait and
//! provides wrappers that make a raw source safer to use:
//!
//! - [`TimeoutRoundSource`] - fails a fetch that takes too long
//! - [`MonotonicRoundSource`] - never lets the observed round go backwards
//! - [`ManualRoundSource`] - settable, failure-injecting source for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use callwheel_core::Round;
//! use callwheel_rounds::{ManualRoundSource, MonotonicRoundSource, RoundSource, TimeoutRoundSource};
//!
//! async fn example() {
//!     let source = MonotonicRoundSource::new(TimeoutRoundSource::new(
//!         ManualRoundSource::new(Round(100)),
//!         Duration::from_secs(5),
//!     ));
//!     let latest = source.latest_round().await.unwrap();
//!     assert_eq!(latest, Round(100));
//! }
//! ```

pub mod error;
pub mod source;

pub use error::{Result, RoundError};
pub use source::{
    memory::ManualRoundSource, memory::StalledRoundSource, MonotonicRoundSource, RoundSource,
    TimeoutRoundSource,
};
