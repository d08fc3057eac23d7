// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Copy-on-write set of scheduled publications.
//!
//! Each mutation builds a new array and publishes it with a single `ArcSwap`
//! store. A reader holding a snapshot keeps seeing that exact array, complete,
//! even if the set is replaced underneath it. Only the sender thread mutates.
//!
//! Order is insertion order with removals closing the gap. Order does not
//! matter for correctness but it is what the round-robin rotation walks.

use crate::error::SenderError;
use crate::transport::NetworkPublication;
use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;

/// Immutable array of publications as seen by one duty cycle.
pub type PublicationSnapshot = Arc<Vec<Arc<dyn NetworkPublication>>>;

/// Atomically replaced publication array.
pub struct PublicationSet {
    current: ArcSwap<Vec<Arc<dyn NetworkPublication>>>,
}

impl PublicationSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Current array. Cheap: one refcount increment, no copy.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> PublicationSnapshot {
        self.current.load_full()
    }

    /// Borrowed view of the current array for the hot path (no refcount bump).
    #[inline]
    pub fn load(&self) -> Guard<Arc<Vec<Arc<dyn NetworkPublication>>>> {
        self.current.load()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    #[must_use]
    pub fn contains(&self, registration_id: i64) -> bool {
        self.current
            .load()
            .iter()
            .any(|p| p.registration_id() == registration_id)
    }

    /// Append `publication`. Duplicates are rejected and leave the set untouched.
    ///
    /// Returns the new length.
    pub fn add(&self, publication: Arc<dyn NetworkPublication>) -> Result<usize, SenderError> {
        let current = self.current.load();
        let registration_id = publication.registration_id();
        if current
            .iter()
            .any(|p| p.registration_id() == registration_id)
        {
            return Err(SenderError::DuplicatePublication { registration_id });
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(publication);
        let len = next.len();
        self.current.store(Arc::new(next));
        Ok(len)
    }

    /// Remove by registration id. A miss is a no-op returning `None`.
    pub fn remove(&self, registration_id: i64) -> Option<Arc<dyn NetworkPublication>> {
        let current = self.current.load();
        let index = current
            .iter()
            .position(|p| p.registration_id() == registration_id)?;

        let mut next = Vec::with_capacity(current.len() - 1);
        next.extend(current[..index].iter().cloned());
        next.extend(current[index + 1..].iter().cloned());
        let removed = Arc::clone(&current[index]);
        self.current.store(Arc::new(next));
        Some(removed)
    }

    /// Empty the set, returning what it held. Used at shutdown.
    pub fn clear(&self) -> PublicationSnapshot {
        self.current.swap(Arc::new(Vec::new()))
    }
}

impl Default for PublicationSet {
    fn default() -> Self {
        Self::new()
    }
}
