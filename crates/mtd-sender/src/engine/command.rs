// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Commands sent from the conductor thread to the sender thread.
//!
//! A closed set of variants dispatched with a `match`. Each command is built by
//! the conductor, moved through the queue, executed once on the sender thread
//! and then dropped.

use crate::engine::sender::Sender;
use crate::transport::{NetworkPublication, SendChannelEndpoint};
use std::fmt;
use std::sync::Arc;

/// Cross-thread instruction mutating sender-owned state.
pub enum SenderCmd {
    /// Open the endpoint and watch it for control traffic.
    RegisterEndpoint(Arc<dyn SendChannelEndpoint>),
    /// Close the endpoint.
    CloseEndpoint(Arc<dyn SendChannelEndpoint>),
    /// Start scheduling a publication.
    NewPublication(Arc<dyn NetworkPublication>),
    /// Stop scheduling a publication and hand it back to the conductor.
    RemovePublication(Arc<dyn NetworkPublication>),
}

impl SenderCmd {
    /// Apply this command to the sender. Sender thread only.
    #[inline]
    pub fn execute(self, sender: &mut Sender) {
        match self {
            SenderCmd::RegisterEndpoint(endpoint) => sender.on_register_send_channel_endpoint(endpoint),
            SenderCmd::CloseEndpoint(endpoint) => sender.on_close_send_channel_endpoint(&endpoint),
            SenderCmd::NewPublication(publication) => sender.on_new_network_publication(publication),
            SenderCmd::RemovePublication(publication) => {
                sender.on_remove_network_publication(&publication);
            }
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            SenderCmd::RegisterEndpoint(_) => "RegisterEndpoint",
            SenderCmd::CloseEndpoint(_) => "CloseEndpoint",
            SenderCmd::NewPublication(_) => "NewPublication",
            SenderCmd::RemovePublication(_) => "RemovePublication",
        }
    }
}

impl fmt::Debug for SenderCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderCmd::RegisterEndpoint(endpoint) | SenderCmd::CloseEndpoint(endpoint) => f
                .debug_struct(self.name())
                .field("channel", &endpoint.channel())
                .finish(),
            SenderCmd::NewPublication(publication) | SenderCmd::RemovePublication(publication) => f
                .debug_struct(self.name())
                .field("registration_id", &publication.registration_id())
                .finish(),
        }
    }
}
