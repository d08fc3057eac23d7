// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded conductor -> sender command queue.
//!
//! Backed by `crossbeam::queue::ArrayQueue`: lock-free, allocation-free after
//! construction, FIFO per producer. `offer` never blocks; when the queue is
//! full the command comes back to the caller, who owns the retry policy.

use crate::engine::command::SenderCmd;
use crossbeam::queue::ArrayQueue;

/// Single-consumer command queue.
#[derive(Debug)]
pub struct CommandQueue {
    ring: ArrayQueue<SenderCmd>,
}

impl CommandQueue {
    /// # Panics
    /// If `capacity` is zero (use `SenderConfig::normalized`).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: ArrayQueue::new(capacity),
        }
    }

    /// Enqueue without blocking. `Err` hands the command back when full.
    #[inline]
    pub fn offer(&self, cmd: SenderCmd) -> Result<(), SenderCmd> {
        self.ring.push(cmd)
    }

    /// Pop and apply every command present when the call began.
    ///
    /// Commands offered while draining wait for the next call. Returns the
    /// number applied.
    #[inline]
    pub fn drain<F>(&self, mut apply: F) -> usize
    where
        F: FnMut(SenderCmd),
    {
        let limit = self.ring.len();
        let mut count = 0;
        while count < limit {
            let Some(cmd) = self.ring.pop() else {
                break;
            };
            apply(cmd);
            count += 1;
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
