// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! System counters shared between the sender thread and observers.
//!
//! Counters are handed to the sender as an `Arc<SystemCounters>` rather than
//! living in a global, so tests and embedders each get their own set.
//!
//! # Ordering
//!
//! - [`AtomicCounter::add_ordered`]: single writer only. Relaxed load followed by
//!   a Release store, no read-modify-write.
//! - [`AtomicCounter::add`] / [`AtomicCounter::increment`]: `fetch_add`, any writer.
//! - [`AtomicCounter::get`]: Acquire load. Observers may lag but never see
//!   a value go backwards.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic 64-bit counter.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    #[inline]
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Add with release visibility. Caller guarantees it is the only writer.
    #[inline]
    pub fn add_ordered(&self, delta: u64) {
        let current = self.value.load(Ordering::Relaxed);
        self.value
            .store(current.wrapping_add(delta), Ordering::Release);
    }

    /// Add from any thread.
    #[inline]
    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}

/// Identifies one counter in [`SystemCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCounterDescriptor {
    BytesSent,
    SenderCycles,
    SenderCommands,
    PublicationsAdded,
    PublicationsRemoved,
    DuplicatePublications,
    ControlBytesReceived,
    SenderProxyFails,
    Errors,
}

impl SystemCounterDescriptor {
    pub const ALL: [SystemCounterDescriptor; 9] = [
        SystemCounterDescriptor::BytesSent,
        SystemCounterDescriptor::SenderCycles,
        SystemCounterDescriptor::SenderCommands,
        SystemCounterDescriptor::PublicationsAdded,
        SystemCounterDescriptor::PublicationsRemoved,
        SystemCounterDescriptor::DuplicatePublications,
        SystemCounterDescriptor::ControlBytesReceived,
        SystemCounterDescriptor::SenderProxyFails,
        SystemCounterDescriptor::Errors,
    ];

    /// Human readable label, as printed by `CountersSnapshot`'s `Display`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SystemCounterDescriptor::BytesSent => "Bytes sent",
            SystemCounterDescriptor::SenderCycles => "Sender duty cycles",
            SystemCounterDescriptor::SenderCommands => "Sender commands applied",
            SystemCounterDescriptor::PublicationsAdded => "Publications added",
            SystemCounterDescriptor::PublicationsRemoved => "Publications removed",
            SystemCounterDescriptor::DuplicatePublications => "Duplicate publications rejected",
            SystemCounterDescriptor::ControlBytesReceived => "Control bytes received",
            SystemCounterDescriptor::SenderProxyFails => "Failed offers to sender proxy",
            SystemCounterDescriptor::Errors => "Errors",
        }
    }
}

/// Counters written by the sender (and the proxy for `SenderProxyFails`).
#[derive(Debug, Default)]
pub struct SystemCounters {
    pub bytes_sent: AtomicCounter,
    pub sender_cycles: AtomicCounter,
    pub sender_commands: AtomicCounter,
    pub publications_added: AtomicCounter,
    pub publications_removed: AtomicCounter,
    pub duplicate_publications: AtomicCounter,
    pub control_bytes_received: AtomicCounter,
    /// Written by producer threads, hence `add`, never `add_ordered`
    pub sender_proxy_fails: AtomicCounter,
    pub errors: AtomicCounter,
}

impl SystemCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, descriptor: SystemCounterDescriptor) -> &AtomicCounter {
        match descriptor {
            SystemCounterDescriptor::BytesSent => &self.bytes_sent,
            SystemCounterDescriptor::SenderCycles => &self.sender_cycles,
            SystemCounterDescriptor::SenderCommands => &self.sender_commands,
            SystemCounterDescriptor::PublicationsAdded => &self.publications_added,
            SystemCounterDescriptor::PublicationsRemoved => &self.publications_removed,
            SystemCounterDescriptor::DuplicatePublications => &self.duplicate_publications,
            SystemCounterDescriptor::ControlBytesReceived => &self.control_bytes_received,
            SystemCounterDescriptor::SenderProxyFails => &self.sender_proxy_fails,
            SystemCounterDescriptor::Errors => &self.errors,
        }
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            bytes_sent: self.bytes_sent.get(),
            sender_cycles: self.sender_cycles.get(),
            sender_commands: self.sender_commands.get(),
            publications_added: self.publications_added.get(),
            publications_removed: self.publications_removed.get(),
            duplicate_publications: self.duplicate_publications.get(),
            control_bytes_received: self.control_bytes_received.get(),
            sender_proxy_fails: self.sender_proxy_fails.get(),
            errors: self.errors.get(),
        }
    }
}

/// Plain-value copy of [`SystemCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub bytes_sent: u64,
    pub sender_cycles: u64,
    pub sender_commands: u64,
    pub publications_added: u64,
    pub publications_removed: u64,
    pub duplicate_publications: u64,
    pub control_bytes_received: u64,
    pub sender_proxy_fails: u64,
    pub errors: u64,
}

impl CountersSnapshot {
    #[must_use]
    pub fn value(&self, descriptor: SystemCounterDescriptor) -> u64 {
        match descriptor {
            SystemCounterDescriptor::BytesSent => self.bytes_sent,
            SystemCounterDescriptor::SenderCycles => self.sender_cycles,
            SystemCounterDescriptor::SenderCommands => self.sender_commands,
            SystemCounterDescriptor::PublicationsAdded => self.publications_added,
            SystemCounterDescriptor::PublicationsRemoved => self.publications_removed,
            SystemCounterDescriptor::DuplicatePublications => self.duplicate_publications,
            SystemCounterDescriptor::ControlBytesReceived => self.control_bytes_received,
            SystemCounterDescriptor::SenderProxyFails => self.sender_proxy_fails,
            SystemCounterDescriptor::Errors => self.errors,
        }
    }
}

impl fmt::Display for CountersSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for descriptor in SystemCounterDescriptor::ALL {
            writeln!(f, "{:>32}: {}", descriptor.label(), self.value(descriptor))?;
        }
        Ok(())
    }
}
