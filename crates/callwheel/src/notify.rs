//! User-facing notification sink.
//!
//! The core only ever pushes text out. Delivery is best-effort: nothing
//! returned by a notifier is observed.

use std::sync::Arc;

use callwheel_core::Username;

/// Sink for user-facing text and OS-level alerts.
pub trait Notifier: Send + Sync {
    /// Show a line to the user, in the conversation's window when `convo` is
    /// set, otherwise in the main window.
    fn warn(&self, convo: Option<&Username>, message: &str);

    /// Raise a desktop notification.
    fn alert(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn warn(&self, convo: Option<&Username>, message: &str) {
        (**self).warn(convo, message)
    }

    fn alert(&self, message: &str) {
        (**self).alert(message)
    }
}

/// Forwards notifications to `tracing`; used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, convo: Option<&Username>, message: &str) {
        match convo {
            Some(peer) => tracing::info!(peer = %peer, "{}", message),
            None => tracing::info!("{}", message),
        }
    }

    fn alert(&self, message: &str) {
        tracing::info!(alert = true, "{}", message);
    }
}

/// A recording notifier for tests.
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    /// One recorded notification.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Notification {
        Warn {
            convo: Option<Username>,
            message: String,
        },
        Alert(String),
    }

    /// Notifier that keeps everything it receives.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        /// Create an empty recorder.
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything recorded so far, in order.
        pub fn notifications(&self) -> Vec<Notification> {
            self.events.lock().unwrap().clone()
        }

        /// Messages shown in `peer`'s conversation window.
        pub fn warnings_for(&self, peer: &Username) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|n| match n {
                    Notification::Warn {
                        convo: Some(p),
                        message,
                    } if p == peer => Some(message.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Messages shown in the main window.
        pub fn main_warnings(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|n| match n {
                    Notification::Warn {
                        convo: None,
                        message,
                    } => Some(message.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Desktop alerts.
        pub fn alerts(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|n| match n {
                    Notification::Alert(message) => Some(message.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Forget everything recorded.
        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl Notifier for RecordingNotifier {
        fn warn(&self, convo: Option<&Username>, message: &str) {
            self.events.lock().unwrap().push(Notification::Warn {
                convo: convo.cloned(),
                message: message.to_string(),
            });
        }

        fn alert(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Notification::Alert(message.to_string()));
        }
    }
}
