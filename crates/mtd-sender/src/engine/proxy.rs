// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conductor-side handle for enqueuing sender commands.
//!
//! The blocking methods retry a full queue with `thread::yield_now` until the
//! sender drains it; every rejected attempt bumps `sender_proxy_fails`. The
//! `try_*` variants give the command back instead.
//!
//! The queue is single-producer: clone the proxy only if the clones are used
//! from one thread at a time.

use crate::engine::command::SenderCmd;
use crate::engine::queue::CommandQueue;
use crate::error::{Result, SenderError};
use crate::metrics::SystemCounters;
use crate::transport::{NetworkPublication, SendChannelEndpoint};
use std::sync::Arc;
use std::thread;

#[derive(Clone)]
pub struct SenderProxy {
    queue: Arc<CommandQueue>,
    counters: Arc<SystemCounters>,
}

impl SenderProxy {
    #[must_use]
    pub fn new(queue: Arc<CommandQueue>, counters: Arc<SystemCounters>) -> Self {
        Self { queue, counters }
    }

    pub fn register_endpoint(&self, endpoint: Arc<dyn SendChannelEndpoint>) {
        self.offer(SenderCmd::RegisterEndpoint(endpoint));
    }

    pub fn close_endpoint(&self, endpoint: Arc<dyn SendChannelEndpoint>) {
        self.offer(SenderCmd::CloseEndpoint(endpoint));
    }

    pub fn new_publication(&self, publication: Arc<dyn NetworkPublication>) {
        self.offer(SenderCmd::NewPublication(publication));
    }

    pub fn remove_publication(&self, publication: Arc<dyn NetworkPublication>) {
        self.offer(SenderCmd::RemovePublication(publication));
    }

    pub fn try_register_endpoint(&self, endpoint: Arc<dyn SendChannelEndpoint>) -> Result<()> {
        self.try_offer(SenderCmd::RegisterEndpoint(endpoint))
    }

    pub fn try_close_endpoint(&self, endpoint: Arc<dyn SendChannelEndpoint>) -> Result<()> {
        self.try_offer(SenderCmd::CloseEndpoint(endpoint))
    }

    pub fn try_new_publication(&self, publication: Arc<dyn NetworkPublication>) -> Result<()> {
        self.try_offer(SenderCmd::NewPublication(publication))
    }

    pub fn try_remove_publication(&self, publication: Arc<dyn NetworkPublication>) -> Result<()> {
        self.try_offer(SenderCmd::RemovePublication(publication))
    }

    /// Single non-blocking attempt.
    pub fn try_offer(&self, cmd: SenderCmd) -> Result<()> {
        self.queue.offer(cmd).map_err(|command| {
            self.counters.sender_proxy_fails.increment();
            log::debug!("[SENDER-PROXY] queue full, rejected {}", command.name());
            SenderError::QueueFull { command }
        })
    }

    /// Commands waiting for the sender.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn offer(&self, mut cmd: SenderCmd) {
        log::trace!("[SENDER-PROXY] offer {}", cmd.name());
        loop {
            match self.queue.offer(cmd) {
                Ok(()) => return,
                Err(back) => {
                    self.counters.sender_proxy_fails.increment();
                    cmd = back;
                    thread::yield_now();
                }
            }
        }
    }
}
