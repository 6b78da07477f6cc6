//! Call and friend-request objects handed to the client by the dialing layer.
//!
//! The dialing layer owns the wire format. The client only needs the session
//! key, the intent, and a way to attach an intent to an outgoing call.

use std::fmt;

use callwheel_core::{Intent, SessionKey, Username};

/// Common surface of incoming and outgoing calls.
pub trait Call: Send + Sync {
    /// The peer on the other end.
    fn username(&self) -> &Username;

    /// The session key agreed for this call.
    fn session_key(&self) -> SessionKey;
}

/// A call placed by the local user.
pub trait OutgoingCall: Call {
    /// Attach the intent that lets the callee recompute the start round.
    fn update_intent(&self, intent: Intent);
}

/// A call placed by a peer.
pub trait IncomingCall: Call {
    /// The intent chosen by the caller.
    fn intent(&self) -> Intent;
}

/// A peer whose friend request completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friend {
    pub username: Username,
}

/// A friend request sent by the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFriendRequest {
    pub username: Username,
}

/// A friend request received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFriendRequest {
    pub username: Username,
}

/// A signed service configuration, as delivered in a config update chain.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedConfig {
    pub service: String,
    pub body: Vec<u8>,
}

impl SignedConfig {
    /// Create a config for `service`.
    pub fn new(service: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            service: service.into(),
            body: body.into(),
        }
    }

    /// Blake3 digest of the body, hex encoded.
    pub fn hash(&self) -> String {
        blake3::hash(&self.body).to_hex().to_string()
    }
}

impl fmt::Debug for SignedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedConfig")
            .field("service", &self.service)
            .field("hash", &self.hash())
            .finish()
    }
}

/// Simple call objects for tests.
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// Outgoing call that records the intent it is given.
    #[derive(Debug)]
    pub struct TestOutgoingCall {
        username: Username,
        session_key: SessionKey,
        intent: Mutex<Option<Intent>>,
    }

    impl TestOutgoingCall {
        /// Create a call to `username`.
        pub fn new(username: impl Into<Username>, session_key: SessionKey) -> Self {
            Self {
                username: username.into(),
                session_key,
                intent: Mutex::new(None),
            }
        }

        /// The intent attached so far.
        pub fn sent_intent(&self) -> Option<Intent> {
            *self.intent.lock().unwrap()
        }
    }

    impl Call for TestOutgoingCall {
        fn username(&self) -> &Username {
            &self.username
        }

        fn session_key(&self) -> SessionKey {
            self.session_key.clone()
        }
    }

    impl OutgoingCall for TestOutgoingCall {
        fn update_intent(&self, intent: Intent) {
            *self.intent.lock().unwrap() = Some(intent);
        }
    }

    /// Incoming call with fixed fields.
    #[derive(Debug, Clone)]
    pub struct TestIncomingCall {
        pub username: Username,
        pub session_key: SessionKey,
        pub intent: Intent,
    }

    impl TestIncomingCall {
        /// Create a call from `username`.
        pub fn new(username: impl Into<Username>, session_key: SessionKey, intent: Intent) -> Self {
            Self {
                username: username.into(),
                session_key,
                intent,
            }
        }
    }

    impl Call for TestIncomingCall {
        fn username(&self) -> &Username {
            &self.username
        }

        fn session_key(&self) -> SessionKey {
            self.session_key.clone()
        }
    }

    impl IncomingCall for TestIncomingCall {
        fn intent(&self) -> Intent {
            self.intent
        }
    }
}
