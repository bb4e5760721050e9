// SPDX-License-Identifier: Apache-2.0
//! FIFO transfer queue with bounded head-of-line bypass (spec §4.3).

use fabcell_model::TransferRequest;
use std::collections::VecDeque;

/// The reference bypass bound: a dispatch cycle examines at most this
/// many head-of-queue entries before giving up (spec §4.3, §8).
pub const BYPASS_BOUND: usize = 10;

/// FIFO buffer of pending transfer requests.
///
/// This type does no route validation itself — callers (the
/// dispatcher) validate before pushing, so the queue stays a plain
/// container.
#[derive(Default)]
pub struct TransferQueue {
    entries: VecDeque<TransferRequest>,
}

impl TransferQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request to the tail.
    pub fn push_back(&mut self, request: TransferRequest) {
        self.entries.push_back(request);
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrows the request at `idx`, if present.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&TransferRequest> {
        self.entries.get(idx)
    }

    /// Removes and returns the request at `idx`, preserving the
    /// relative order of the remaining entries.
    pub fn remove_at(&mut self, idx: usize) -> Option<TransferRequest> {
        self.entries.remove(idx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabcell_model::{StationName, WaferId};

    fn req(id: u64) -> TransferRequest {
        TransferRequest::new(
            WaferId::new(id).unwrap(),
            StationName::Carrier,
            StationName::Polisher,
            Box::new(|_| {}),
        )
    }

    #[test]
    fn remove_at_preserves_relative_order_of_survivors() {
        let mut q = TransferQueue::new();
        q.push_back(req(1));
        q.push_back(req(2));
        q.push_back(req(3));
        let removed = q.remove_at(1).unwrap();
        assert_eq!(removed.wafer_id, WaferId::new(2).unwrap());
        assert_eq!(q.get(0).unwrap().wafer_id, WaferId::new(1).unwrap());
        assert_eq!(q.get(1).unwrap().wafer_id, WaferId::new(3).unwrap());
    }
}
