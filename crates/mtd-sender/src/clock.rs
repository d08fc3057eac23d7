// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monotonic nanosecond clocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of the `now` passed to every `send` in a duty cycle.
pub trait NanoClock: Send + Sync {
    /// Nanoseconds since an arbitrary, fixed origin. Never decreases.
    fn nano_time(&self) -> u64;
}

/// `Instant`-backed clock; origin is construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemNanoClock {
    origin: Instant,
}

impl SystemNanoClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemNanoClock {
    fn default() -> Self {
        Self::new()
    }
}

impl NanoClock for SystemNanoClock {
    #[inline]
    fn nano_time(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of uptime
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Clock advanced by hand. Used by tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ns: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ns),
        }
    }

    pub fn advance(&self, delta_ns: u64) {
        self.now.fetch_add(delta_ns, Ordering::AcqRel);
    }

    pub fn set(&self, now_ns: u64) {
        self.now.fetch_max(now_ns, Ordering::AcqRel);
    }
}

impl NanoClock for ManualClock {
    #[inline]
    fn nano_time(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
