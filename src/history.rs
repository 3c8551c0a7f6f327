//! The outbound history stream (spec section 3/6).
//!
//! Persistence is an external collaborator's job; this module defines
//! only the immutable record shape and the bounded-queue contract the
//! `Simulation` driver pushes into, plus `ChannelHistoryQueue`, a thin
//! `std::sync::mpsc` stand-in used by tests and the demo binary in
//! place of the out-of-scope persistence-backed queue.

use std::sync::mpsc::{SendError, Sender};

use crate::ReactionId;

/// One fired event, immutable once pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryElement {
    pub seed: u64,
    pub reaction_id: ReactionId,
    pub time: f64,
    pub step: u64,
}

/// A chunk of history moved into the queue together, sized
/// `chunk_size` (spec section 3 "Lifecycles").
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPacket {
    pub seed: u64,
    pub history: Vec<HistoryElement>,
}

/// The external sink `Simulation` pushes finished chunks into.
/// `insert_history` is the sole operation that may block (spec section
/// 5); the driver treats it as uninterruptible. Independent seeds run
/// independent `Simulation`s that each own a cloned handle (mirroring
/// `mpsc::Sender`'s multi-producer-via-clone model), so implementors
/// need only be `Send + Clone`, not `Sync`.
pub trait HistoryQueue: Send + Clone {
    fn insert_history(&self, packet: HistoryPacket);
}

/// A `HistoryQueue` backed by a `std::sync::mpsc::Sender`, standing in
/// for the out-of-scope persistence-backed multi-producer queue (spec
/// section 5).
#[derive(Clone)]
pub struct ChannelHistoryQueue {
    sender: Sender<HistoryPacket>,
}

impl ChannelHistoryQueue {
    pub fn new(sender: Sender<HistoryPacket>) -> ChannelHistoryQueue {
        ChannelHistoryQueue { sender }
    }

    pub fn try_send(&self, packet: HistoryPacket) -> Result<(), SendError<HistoryPacket>> {
        self.sender.send(packet)
    }
}

impl HistoryQueue for ChannelHistoryQueue {
    fn insert_history(&self, packet: HistoryPacket) {
        // The driver never recovers from a disconnected receiver; that
        // would mean the external consumer has already gone away.
        self.sender
            .send(packet)
            .expect("history queue receiver dropped while a simulation was still producing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn pushed_packets_arrive_in_order() {
        let (tx, rx) = channel();
        let queue = ChannelHistoryQueue::new(tx);
        queue.insert_history(HistoryPacket {
            seed: 1,
            history: vec![HistoryElement { seed: 1, reaction_id: 0, time: 0.1, step: 0 }],
        });
        let packet = rx.recv().unwrap();
        assert_eq!(packet.history[0].step, 0);
    }
}
