//! Exactly-once resolution of a pending send.

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const CANCELLED_BY_USER: &str = "Send cancelled by user.";
pub const CANCELLED: &str = "Send cancelled.";

/// What the host is told when a send is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub allow_event: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allow_event: true,
            error_message: None,
        }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self {
            allow_event: false,
            error_message: Some(message.into()),
        }
    }
}

/// One pending send, as handed over by the host. The host expects `completed` exactly once.
pub trait SendEvent: Send + Sync {
    fn completed(&self, decision: Decision);
}

/// The single gate every exit path goes through.
///
/// Holds the host's event and a resolved flag; the first `complete` wins and every later
/// call is discarded.
pub struct CompletionGuard {
    event: Option<Arc<dyn SendEvent>>,
    resolved: AtomicBool,
}

impl CompletionGuard {
    pub fn new(event: Arc<dyn SendEvent>) -> Self {
        Self::from_handle(Some(event))
    }

    /// The host may hand over no event at all; such a guard logs and ignores completions.
    pub fn from_handle(event: Option<Arc<dyn SendEvent>>) -> Self {
        Self {
            event,
            resolved: AtomicBool::new(false),
        }
    }

    /// Forwards `decision` to the host if nothing has been forwarded yet.
    /// Returns whether this call was the one that resolved the event.
    pub fn complete(&self, decision: Decision) -> bool {
        let Some(event) = &self.event else {
            warn!("No send event to complete, dropping {:?}", decision);
            return false;
        };

        if self
            .resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Send event already resolved, discarding {:?}", decision);
            return false;
        }

        match &decision.error_message {
            None if decision.allow_event => info!("Send allowed"),
            Some(message) if !decision.allow_event => info!("Send blocked: {}", message),
            _ => info!("Send resolved: {:?}", decision),
        }
        event.completed(decision);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEvent;

    #[test]
    fn first_completion_wins() {
        let event = RecordingEvent::new();
        let guard = CompletionGuard::new(event.clone());

        assert!(!guard.is_resolved());
        assert!(guard.complete(Decision::block(CANCELLED_BY_USER)));
        assert!(!guard.complete(Decision::allow()));
        assert!(!guard.complete(Decision::block(CANCELLED)));

        assert!(guard.is_resolved());
        assert_eq!(event.decisions(), vec![Decision::block(CANCELLED_BY_USER)]);
    }

    #[test]
    fn missing_event_is_a_no_op() {
        let guard = CompletionGuard::from_handle(None);
        assert!(!guard.complete(Decision::allow()));
        assert!(!guard.is_resolved());
    }

    #[test]
    fn racing_threads_resolve_once() {
        let event = RecordingEvent::new();
        let guard = Arc::new(CompletionGuard::new(event.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let guard = guard.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        guard.complete(Decision::allow())
                    } else {
                        guard.complete(Decision::block(CANCELLED))
                    }
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(event.decisions().len(), 1);
    }

    #[test]
    fn decision_serializes_like_host_options() {
        assert_eq!(
            serde_json::to_value(Decision::allow()).unwrap(),
            serde_json::json!({"allowEvent": true})
        );
        assert_eq!(
            serde_json::to_value(Decision::block(CANCELLED_BY_USER)).unwrap(),
            serde_json::json!({"allowEvent": false, "errorMessage": "Send cancelled by user."})
        );
    }
}
