//! The Correlator (C5): bridges a blocking HTTP request to an out-of-band
//! WebSocket response, keyed by request id. Grounded on the
//! pending-request-map-with-oneshot pattern used by broker-style dispatch
//! loops — a `HashMap<RequestId, PendingEntry>` raced against
//! `tokio::time::timeout`.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::ApiError;

pub type RequestId = String;

/// The three correlated call kinds, each with its own deadline (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Mermaid,
    ExportImage,
    Viewport,
}

impl RequestKind {
    pub fn deadline(self) -> Duration {
        match self {
            RequestKind::Mermaid => Duration::from_secs(30),
            RequestKind::ExportImage => Duration::from_secs(30),
            RequestKind::Viewport => Duration::from_secs(10),
        }
    }
}

struct PendingEntry {
    /// Taken (and the entry removed) on the first successful `resolve`.
    tx: Option<oneshot::Sender<Result<serde_json::Value, String>>>,
    /// Most recent per-peer error report. Per spec §4.5 fan-in semantics,
    /// an error report never fails the waiter by itself — it's only
    /// surfaced if the deadline elapses with zero successful peers.
    last_error: Option<String>,
}

/// The pending-request map. Fan-in across multiple peers: the first
/// success wins immediately; per-peer errors are recorded but only turn
/// into a failure if no success arrives before the deadline (spec §4.5).
/// Once a success has been delivered, everything after is a late result
/// and must be accepted, not rejected (the "late-result-200" contract).
#[derive(Default)]
pub struct Correlator {
    pending: Mutex<HashMap<RequestId, PendingEntry>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a request id and register a pending entry. Returns the id
    /// and a future that resolves on `resolve`/deadline.
    pub fn issue(
        &self,
        kind: RequestKind,
    ) -> (RequestId, oneshot::Receiver<Result<serde_json::Value, String>>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(
            id.clone(),
            PendingEntry {
                tx: Some(tx),
                last_error: None,
            },
        );
        tracing::debug!(request_id = %id, kind = ?kind, "correlated request issued");
        (id, rx)
    }

    /// First successful call for `id` wins and removes the entry; unknown
    /// ids are silently accepted (spec §4.5 late-result policy) and return
    /// `false`.
    pub fn resolve(&self, id: &str, payload: serde_json::Value) -> bool {
        match self.pending.lock().remove(id) {
            Some(entry) => {
                if let Some(tx) = entry.tx {
                    let _ = tx.send(Ok(payload));
                }
                true
            }
            None => {
                tracing::debug!(request_id = id, "late result ignored (no pending waiter)");
                false
            }
        }
    }

    /// Records a per-peer error. Does not remove or fail the pending
    /// entry — a later `resolve` from another peer still wins. Only
    /// surfaced as a failure if the deadline elapses without a success.
    pub fn fail(&self, id: &str, err: String) -> bool {
        match self.pending.lock().get_mut(id) {
            Some(entry) => {
                tracing::debug!(request_id = id, error = %err, "peer error recorded");
                entry.last_error = Some(err);
                true
            }
            None => false,
        }
    }

    /// Removes the pending entry (if still present) and reports whether a
    /// peer error had been recorded against it.
    fn cancel(&self, id: &str) -> Option<String> {
        self.pending.lock().remove(id).and_then(|e| e.last_error)
    }

    /// Await a correlated call's result, racing it against the kind's
    /// deadline. Cleans up the pending entry on timeout: if at least one
    /// peer reported an error and no peer succeeded, that error is
    /// surfaced as `PeerError`; otherwise it's a plain `Timeout`.
    pub async fn wait(
        &self,
        id: &RequestId,
        kind: RequestKind,
        rx: oneshot::Receiver<Result<serde_json::Value, String>>,
    ) -> Result<serde_json::Value, ApiError> {
        match tokio::time::timeout(kind.deadline(), rx).await {
            Ok(Ok(Ok(payload))) => Ok(payload),
            Ok(Ok(Err(peer_err))) => Err(ApiError::peer_error(peer_err)),
            Ok(Err(_recv_error)) => Err(ApiError::internal("correlator channel dropped")),
            Err(_elapsed) => match self.cancel(id) {
                Some(peer_err) => Err(ApiError::peer_error(peer_err)),
                None => Err(ApiError::timeout(format!("{kind:?} request timed out"))),
            },
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_delivers_payload_to_waiter() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.issue(RequestKind::Viewport);
        assert!(correlator.resolve(&id, serde_json::json!({"ok": true})));
        let result = correlator.wait(&id, RequestKind::Viewport, rx).await;
        assert_eq!(result.unwrap(), serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn late_result_is_accepted_but_has_no_effect() {
        let correlator = Correlator::new();
        assert!(!correlator.resolve("ghost", serde_json::json!({})));
    }

    #[tokio::test]
    async fn second_resolve_is_a_noop() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.issue(RequestKind::Mermaid);
        assert!(correlator.resolve(&id, serde_json::json!(1)));
        assert!(!correlator.resolve(&id, serde_json::json!(2)));
        let result = correlator.wait(&id, RequestKind::Mermaid, rx).await;
        assert_eq!(result.unwrap(), serde_json::json!(1));
    }

    #[tokio::test]
    async fn peer_error_does_not_fail_waiter_when_a_later_peer_succeeds() {
        let correlator = Correlator::new();
        let (id, rx) = correlator.issue(RequestKind::Mermaid);
        assert!(correlator.fail(&id, "peer A failed".into()));
        assert!(correlator.resolve(&id, serde_json::json!({"elements": [1]})));
        let result = correlator.wait(&id, RequestKind::Mermaid, rx).await;
        assert_eq!(result.unwrap(), serde_json::json!({"elements": [1]}));
    }

    #[tokio::test]
    async fn fail_without_success_is_a_noop_for_unknown_id() {
        let correlator = Correlator::new();
        assert!(!correlator.fail("ghost", "whatever".into()));
    }
}
