//! The call client: event handlers for the dialing layer.
//!
//! The client turns call events into live sessions. For every call it
//! fetches the latest round, agrees on a start round, and offers the
//! resulting key wheel to the shared [`SessionActivator`]. Calls that do not
//! fit are queued on their conversation until the user answers them.
//!
//! Fetching the latest round is the only await point. No lock is held across
//! it, and a failed fetch leaves every conversation untouched.

use std::sync::Arc;

use callwheel_core::{KeyWheelStart, Round, RoundSyncer, Username};
use callwheel_rounds::{MonotonicRoundSource, RoundSource, TimeoutRoundSource};

use crate::activator::{ResumeOutcome, SessionActivator};
use crate::call::{
    Friend, IncomingCall, IncomingFriendRequest, OutgoingCall, OutgoingFriendRequest,
    SignedConfig,
};
use crate::config::ClientConfig;
use crate::conversation::{Conversation, ConversationTable};
use crate::error::{ClientError, Result};
use crate::notify::Notifier;

const TOO_MANY_CONVOS: &str =
    "Too many active conversations! Hang up another convo and type /answer to answer the call.";

/// What happened to a call that reached admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call is the conversation's live session from `round` on.
    Activated { round: Round },
    /// No slot was free; the call waits in the conversation's pending slot.
    Queued { round: Round },
}

impl CallOutcome {
    /// The agreed start round.
    pub fn round(&self) -> Round {
        match self {
            CallOutcome::Activated { round } | CallOutcome::Queued { round } => *round,
        }
    }

    /// Whether the call was admitted.
    pub fn is_activated(&self) -> bool {
        matches!(self, CallOutcome::Activated { .. })
    }
}

/// Round source stack used by [`CallClient::from_config`].
pub type ConfiguredRoundSource<R> = MonotonicRoundSource<TimeoutRoundSource<R>>;

/// Event handlers and user commands for calls.
pub struct CallClient<R: RoundSource, N: Notifier> {
    rounds: R,
    notifier: N,
    syncer: RoundSyncer,
    activator: Arc<SessionActivator>,
    convos: ConversationTable,
    debug: bool,
}

impl<R: RoundSource, N: Notifier> CallClient<R, N> {
    /// Create a client around an existing activator.
    pub fn new(
        rounds: R,
        notifier: N,
        syncer: RoundSyncer,
        activator: Arc<SessionActivator>,
    ) -> Self {
        Self {
            rounds,
            notifier,
            syncer,
            activator,
            convos: ConversationTable::new(),
            debug: false,
        }
    }

    /// Show every error, including the benign class.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The shared admission controller.
    pub fn activator(&self) -> &Arc<SessionActivator> {
        &self.activator
    }

    /// All known conversations.
    pub fn conversations(&self) -> &ConversationTable {
        &self.convos
    }

    /// The conversation with `peer`, if one exists.
    pub fn conversation(&self, peer: &Username) -> Option<Arc<Conversation>> {
        self.convos.get(peer)
    }

    /// The start-round convention in use.
    pub fn syncer(&self) -> &RoundSyncer {
        &self.syncer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a call the local user is placing.
    ///
    /// Attaches the intent to `call` before admission. On error nothing is
    /// attached and no conversation state changes.
    pub async fn sending_call(&self, call: &dyn OutgoingCall) -> Result<CallOutcome> {
        let peer = call.username();

        let latest = match self.rounds.latest_round().await {
            Ok(round) => round,
            Err(err) => {
                self.notifier.warn(
                    Some(peer),
                    &format!(
                        "Error calling {}: failed to fetch latest convo round: {}",
                        peer, err
                    ),
                );
                tracing::warn!(peer = %peer, error = %err, "outgoing call aborted");
                return Err(err.into());
            }
        };

        self.notifier.warn(Some(peer), &format!("Calling {} ...", peer));

        let (epoch_start, intent) = match self.syncer.outgoing_call_convo_round(latest) {
            Ok(agreed) => agreed,
            Err(err) => {
                self.notifier
                    .warn(Some(peer), &format!("Error calling {}: {}", peer, err));
                return Err(err.into());
            }
        };
        call.update_intent(intent);
        tracing::debug!(
            peer = %peer,
            latest = %latest,
            start = %epoch_start,
            intent = %intent,
            "outgoing call round chosen"
        );

        let start = KeyWheelStart::new(call.session_key(), epoch_start);
        Ok(self.admit(peer, start))
    }

    /// Handle a call placed by a peer.
    pub async fn received_call(&self, call: &dyn IncomingCall) -> Result<CallOutcome> {
        let peer = call.username();
        self.notifier
            .warn(Some(peer), &format!("Received call: {}", peer));
        self.notifier.alert(&format!("Call from {}", peer));

        let latest = match self.rounds.latest_round().await {
            Ok(round) => round,
            Err(err) => {
                self.notifier.warn(
                    Some(peer),
                    &format!(
                        "Error activating convo: failed to fetch latest convo round: {}",
                        err
                    ),
                );
                tracing::warn!(peer = %peer, error = %err, "incoming call aborted");
                return Err(err.into());
            }
        };

        let epoch_start = match self.syncer.incoming_call_convo_round(latest, call.intent()) {
            Ok(round) => round,
            Err(err) => {
                self.notifier
                    .warn(Some(peer), &format!("Error activating convo: {}", err));
                return Err(err.into());
            }
        };
        tracing::debug!(
            peer = %peer,
            latest = %latest,
            start = %epoch_start,
            intent = %call.intent(),
            "incoming call round recomputed"
        );

        let start = KeyWheelStart::new(call.session_key(), epoch_start);
        Ok(self.admit(peer, start))
    }

    /// Offer `start` to the activator, queueing it on rejection.
    fn admit(&self, peer: &Username, start: KeyWheelStart) -> CallOutcome {
        let convo = self.convos.get_or_create(peer);
        let round = start.convo_round;

        if self.activator.activate(&convo, start.clone()) {
            return CallOutcome::Activated { round };
        }

        if let Some(superseded) = convo.queue_call(start) {
            tracing::debug!(
                peer = %peer,
                round = %superseded.convo_round,
                "unanswered pending call replaced"
            );
        }
        tracing::warn!(peer = %peer, round = %round, "call queued: no free session slot");
        self.notifier.warn(Some(peer), TOO_MANY_CONVOS);
        CallOutcome::Queued { round }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User commands
    // ─────────────────────────────────────────────────────────────────────────

    /// The `/answer` command: promote the peer's pending call.
    pub fn answer(&self, peer: &Username) -> ResumeOutcome {
        let outcome = match self.convos.get(peer) {
            Some(convo) => self.activator.resume(&convo),
            None => ResumeOutcome::NoPendingCall,
        };

        match outcome {
            ResumeOutcome::Activated(round) => self.notifier.warn(
                Some(peer),
                &format!("Answered call from {} (session starts at round {})", peer, round),
            ),
            ResumeOutcome::NoPendingCall => self
                .notifier
                .warn(Some(peer), &format!("No pending call from {}", peer)),
            ResumeOutcome::AtCapacity => self.notifier.warn(Some(peer), TOO_MANY_CONVOS),
        }
        outcome
    }

    /// The `/hangup` command: end the peer's live session.
    pub fn hang_up(&self, peer: &Username) -> bool {
        let ended = self.activator.deactivate(peer);
        if ended {
            self.notifier
                .warn(Some(peer), &format!("Hung up on {}", peer));
        } else {
            self.notifier
                .warn(Some(peer), &format!("No active call with {}", peer));
        }
        ended
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pass-through notifications
    // ─────────────────────────────────────────────────────────────────────────

    /// A friend request completed.
    pub fn confirmed_friend(&self, friend: &Friend) {
        self.notifier
            .warn(None, &format!("Confirmed friend: {}", friend.username));
    }

    /// A friend request was sent.
    pub fn sent_friend_request(&self, request: &OutgoingFriendRequest) {
        self.notifier
            .warn(None, &format!("Sent friend request: {}", request.username));
    }

    /// A friend request arrived.
    pub fn received_friend_request(&self, request: &IncomingFriendRequest) {
        let name = &request.username;
        self.notifier
            .warn(None, &format!("Received friend request: {}", name));
        self.notifier.warn(
            None,
            &format!("Type `/approve {}` to approve the friend request.", name),
        );
        self.notifier
            .alert(&format!("Friend request from {}", name));
    }

    /// A friend request arrived signed with a key other than the expected one.
    pub fn unexpected_signing_key(
        &self,
        incoming: &IncomingFriendRequest,
        _outgoing: &OutgoingFriendRequest,
    ) {
        self.notifier.warn(
            None,
            &format!("Unexpected signing key: {}", incoming.username),
        );
    }

    /// A service published a new configuration.
    ///
    /// `chain` runs newest first; the last entry is the config being replaced.
    pub fn new_config(&self, chain: &[SignedConfig]) {
        let (Some(next), Some(prev)) = (chain.first(), chain.last()) else {
            tracing::debug!("ignoring empty config chain");
            return;
        };
        self.notifier.warn(
            None,
            &format!(
                "New {:?} config: {} -> {}",
                prev.service,
                prev.hash(),
                next.hash()
            ),
        );
        self.notifier
            .alert(&format!("New {} config", prev.service));
    }

    /// A message for every user of the service.
    pub fn global_announcement(&self, message: &str) {
        let text = format!("Global Announcement: {}", message);
        self.notifier.warn(None, &text);
        self.notifier.alert(&text);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Errors
    // ─────────────────────────────────────────────────────────────────────────

    /// An error from the dialing layer, shown to the user as is.
    ///
    /// Outside debug mode the benign "round not configured" class is dropped.
    pub fn error(&self, err: &ClientError) {
        if !self.debug && err.is_benign() {
            tracing::trace!(error = %err, "suppressed benign error");
            return;
        }
        self.report(err);
    }

    /// An error only worth showing in debug mode.
    pub fn debug_error(&self, err: &ClientError) {
        if self.debug {
            self.report(err);
        }
    }

    fn report(&self, err: &ClientError) {
        tracing::error!(error = %err, "client error");
        self.notifier.warn(None, &err.to_string());
    }
}

impl<R: RoundSource, N: Notifier> CallClient<ConfiguredRoundSource<R>, N> {
    /// Build a client from configuration.
    ///
    /// Wraps `rounds` with the configured fetch timeout and a monotonic
    /// guard, and creates a fresh activator with the configured capacity.
    pub fn from_config(rounds: R, notifier: N, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let syncer = config.round_syncer.build()?;
        let rounds = MonotonicRoundSource::new(TimeoutRoundSource::new(
            rounds,
            config.round_fetch_timeout(),
        ));
        let activator = Arc::new(SessionActivator::new(config.capacity));
        tracing::info!(capacity = config.capacity, "call client ready");
        Ok(Self::new(rounds, notifier, syncer, activator).with_debug(config.debug))
    }
}
