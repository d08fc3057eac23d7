// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sender -> conductor notifications.
//!
//! When the sender stops scheduling a publication it moves its `Arc` into a
//! [`ConductorEvent::PublicationClosed`]. From then on the conductor owns the
//! disposal obligation (freeing log buffers, closing files). The sender never
//! disposes anything itself.
//!
//! The default transport is an unbounded `crossbeam::channel`, so notifying
//! never blocks the sender thread.

use crate::transport::NetworkPublication;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::fmt;
use std::sync::Arc;

/// Message from the sender thread to the conductor thread.
pub enum ConductorEvent {
    /// The sender no longer references this publication for scheduling.
    PublicationClosed(Arc<dyn NetworkPublication>),
}

impl fmt::Debug for ConductorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductorEvent::PublicationClosed(publication) => f
                .debug_struct("PublicationClosed")
                .field("registration_id", &publication.registration_id())
                .finish(),
        }
    }
}

/// Fire-and-forget callback into the conductor.
///
/// Implementations must not block and must tolerate a notification for a
/// publication the conductor is already disposing.
pub trait ConductorNotifier: Send + Sync {
    fn close_network_publication(&self, publication: Arc<dyn NetworkPublication>);
}

/// Channel-backed [`ConductorNotifier`] held by the sender.
#[derive(Clone)]
pub struct ConductorProxy {
    tx: Sender<ConductorEvent>,
}

impl ConductorProxy {
    /// Create the proxy and the receiving half for the conductor thread.
    #[must_use]
    pub fn channel() -> (Self, ConductorEvents) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, ConductorEvents { rx })
    }
}

impl ConductorNotifier for ConductorProxy {
    fn close_network_publication(&self, publication: Arc<dyn NetworkPublication>) {
        let registration_id = publication.registration_id();
        if self
            .tx
            .send(ConductorEvent::PublicationClosed(publication))
            .is_err()
        {
            // Conductor gone: nobody left to dispose, dropping our reference is all we can do.
            log::warn!(
                "[SENDER] conductor disconnected, dropping close for registration_id={}",
                registration_id
            );
        }
    }
}

/// Conductor-side receiver of [`ConductorEvent`]s.
pub struct ConductorEvents {
    rx: Receiver<ConductorEvent>,
}

impl ConductorEvents {
    /// Next pending event, if any.
    #[must_use]
    pub fn try_next(&self) -> Option<ConductorEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Hand every pending event to `handler`. Returns how many were handled.
    pub fn drain<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(ConductorEvent),
    {
        let mut count = 0;
        while let Some(event) = self.try_next() {
            handler(event);
            count += 1;
        }
        count
    }

    /// Block until an event arrives or `timeout` elapses.
    #[must_use]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<ConductorEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}
