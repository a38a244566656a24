//! The Broadcast Bus (C4): tracks connected WebSocket peers and fans out
//! scene-change frames, generalized from the teacher's single
//! `tokio::sync::broadcast::Sender` into a per-peer channel registry so that
//! `broadcast(msg, exclude)` and per-peer congestion drop are both possible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Identifies one attached WebSocket peer for the lifetime of its connection.
pub type PeerId = u64;

struct Peer {
    tx: mpsc::UnboundedSender<Message>,
}

/// Registry of attached peers plus the monotonically increasing id source.
#[derive(Default)]
pub struct BroadcastBus {
    peers: Mutex<HashMap<PeerId, Peer>>,
    next_id: AtomicU64,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new peer and return its id plus the receiving half of its
    /// outbound channel, which the caller forwards onto the live socket.
    pub fn attach(&self) -> (PeerId, mpsc::UnboundedReceiver<Message>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().insert(id, Peer { tx });
        tracing::info!(peer = id, "peer attached");
        (id, rx)
    }

    pub fn detach(&self, id: PeerId) {
        if self.peers.lock().remove(&id).is_some() {
            tracing::info!(peer = id, "peer detached");
        }
    }

    pub fn count(&self) -> usize {
        self.peers.lock().len()
    }

    /// Serialize `value` once and send it to every attached peer except
    /// `exclude`. A peer whose channel is closed is dropped silently —
    /// send failures never propagate to the caller (spec §4.4, §7).
    pub fn broadcast(&self, value: &serde_json::Value, exclude: Option<PeerId>) {
        let text = value.to_string();
        let mut dead = Vec::new();
        {
            let peers = self.peers.lock();
            for (&id, peer) in peers.iter() {
                if Some(id) == exclude {
                    continue;
                }
                if peer.tx.send(Message::Text(text.clone().into())).is_err() {
                    dead.push(id);
                }
            }
        }
        if !dead.is_empty() {
            let mut peers = self.peers.lock();
            for id in dead {
                peers.remove(&id);
            }
        }
    }

    /// Send a value to exactly one peer (used for the three initial-sync
    /// frames on attach). Silently dropped if the peer has already gone.
    pub fn send_to(&self, id: PeerId, value: &serde_json::Value) {
        let peers = self.peers.lock();
        if let Some(peer) = peers.get(&id) {
            let _ = peer.tx.send(Message::Text(value.to_string().into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_broadcast_excludes_sender() {
        let bus = BroadcastBus::new();
        let (a, mut a_rx) = bus.attach();
        let (_b, mut b_rx) = bus.attach();
        assert_eq!(bus.count(), 2);

        bus.broadcast(&serde_json::json!({"type": "canvas_cleared"}), Some(a));

        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_ok());
    }

    #[test]
    fn detach_removes_peer() {
        let bus = BroadcastBus::new();
        let (a, _rx) = bus.attach();
        bus.detach(a);
        assert_eq!(bus.count(), 0);
    }
}
