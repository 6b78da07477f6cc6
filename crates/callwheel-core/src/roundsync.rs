//! Round synchronization for call invitations.
//!
//! Caller and callee read the latest round independently and at different
//! times. There is no second message to settle on a start round, so both
//! sides apply a shared convention.
//!
//! Rounds are grouped into epochs of `epoch_len` rounds. A session always
//! starts on an epoch boundary. The caller picks the first boundary at least
//! `lead` rounds ahead of its latest round and sends the epoch index modulo
//! `intents` as the call's intent. The callee picks the first boundary at or
//! after its own latest round whose epoch index has that residue.
//!
//! ```text
//! epoch_len = 10, lead = 10, intents = 4
//!
//! caller latest = 100  ->  start 110 (epoch 11), intent 11 % 4 = 3
//! callee latest = 104  ->  first boundary >= 104 with epoch % 4 == 3  ->  110
//! ```
//!
//! The two sides agree whenever the callee's latest round lies between the
//! caller's latest round and the start round, provided
//! `intents * epoch_len >= lead + epoch_len`. [`RoundSyncer::new`] rejects
//! parameters that break this inequality.

use crate::error::{CoreError, Result};
use crate::types::{Intent, Round};

/// Deterministic start-round convention shared by caller and callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSyncer {
    epoch_len: u32,
    lead: u32,
    intents: u32,
}

impl RoundSyncer {
    /// The convention used by default clients.
    pub const STANDARD: Self = Self {
        epoch_len: 10,
        lead: 10,
        intents: 4,
    };

    /// Create a syncer, checking that the parameters guarantee agreement.
    pub fn new(epoch_len: u32, lead: u32, intents: u32) -> Result<Self> {
        if epoch_len == 0 || lead == 0 || intents == 0 {
            return Err(CoreError::InvalidSyncerParams(format!(
                "epoch_len={}, lead={}, intents={}: all must be positive",
                epoch_len, lead, intents
            )));
        }
        let coverage = u64::from(intents) * u64::from(epoch_len);
        let needed = u64::from(lead) + u64::from(epoch_len);
        if coverage < needed {
            return Err(CoreError::InvalidSyncerParams(format!(
                "intents * epoch_len = {} must be at least lead + epoch_len = {}",
                coverage, needed
            )));
        }
        Ok(Self {
            epoch_len,
            lead,
            intents,
        })
    }

    /// Rounds per epoch.
    pub fn epoch_len(&self) -> u32 {
        self.epoch_len
    }

    /// Minimum distance between the caller's latest round and the start round.
    pub fn lead(&self) -> u32 {
        self.lead
    }

    /// Number of distinct intents.
    pub fn intents(&self) -> u32 {
        self.intents
    }

    /// Choose the start round for an outgoing call.
    ///
    /// The start is strictly ahead of `latest` by at least `lead` rounds.
    pub fn outgoing_call_convo_round(&self, latest: Round) -> Result<(Round, Intent)> {
        let target = latest
            .checked_add(self.lead)
            .ok_or(CoreError::RoundOverflow(latest))?;
        let epoch = self.epoch_at_or_after(target);
        let start = self.epoch_start(epoch, latest)?;
        let intent = Intent((epoch % u64::from(self.intents)) as u32);
        Ok((start, intent))
    }

    /// Recompute the caller's start round from the callee's latest round.
    pub fn incoming_call_convo_round(&self, latest: Round, intent: Intent) -> Result<Round> {
        if intent.0 >= self.intents {
            return Err(CoreError::InvalidIntent {
                intent,
                intents: self.intents,
            });
        }
        let intents = u64::from(self.intents);
        let epoch = self.epoch_at_or_after(latest);
        let skip = (u64::from(intent.0) + intents - epoch % intents) % intents;
        self.epoch_start(epoch + skip, latest)
    }

    /// Index of the first epoch starting at or after `round`.
    fn epoch_at_or_after(&self, round: Round) -> u64 {
        let len = u64::from(self.epoch_len);
        (u64::from(round.0) + len - 1) / len
    }

    fn epoch_start(&self, epoch: u64, from: Round) -> Result<Round> {
        let start = epoch * u64::from(self.epoch_len);
        u32::try_from(start)
            .map(Round)
            .map_err(|_| CoreError::RoundOverflow(from))
    }
}

impl Default for RoundSyncer {
    fn default() -> Self {
        Self::STANDARD
    }
}
