// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport-side collaborators of the sender.
//!
//! The sender only orchestrates these objects. Framing, retransmission and
//! flow control live behind [`NetworkPublication::send`]; socket handling lives
//! in the endpoint and the poller.
//!
//! # Thread Safety
//!
//! Publications and endpoints are shared (`Arc`) between the sender thread and
//! the conductor thread. Non-destructive calls may come from whichever side
//! holds a reference; destructive disposal is the conductor's job and happens
//! only after the sender hands the publication back.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

/// Control-message poller binding.
pub mod poller;
/// UDP send channel endpoint.
pub mod udp;

pub use poller::MioControlPoller;
pub use udp::UdpSendChannelEndpoint;

/// One outbound stream scheduled by the sender.
///
/// # Examples
/// ```no_run
/// use mtd_sender::transport::{NetworkPublication, SendChannelEndpoint};
/// use std::sync::Arc;
///
/// struct Silent {
///     id: i64,
///     endpoint: Arc<dyn SendChannelEndpoint>,
/// }
///
/// impl NetworkPublication for Silent {
///     fn registration_id(&self) -> i64 {
///         self.id
///     }
///     fn send_channel_endpoint(&self) -> &Arc<dyn SendChannelEndpoint> {
///         &self.endpoint
///     }
///     fn send(&self, _now_ns: u64) -> usize {
///         0
///     }
/// }
/// ```
pub trait NetworkPublication: Send + Sync {
    /// Identity used for duplicate detection and removal.
    fn registration_id(&self) -> i64;

    /// Endpoint this publication transmits through.
    fn send_channel_endpoint(&self) -> &Arc<dyn SendChannelEndpoint>;

    /// Transmit whatever is pending. Non-blocking, bounded in cost.
    ///
    /// Returns bytes put on the wire. Socket errors are handled inside.
    fn send(&self, now_ns: u64) -> usize;

    /// Inbound control datagram (status message, NAK, ...) seen on the endpoint.
    ///
    /// Called on the sender thread from inside `poll_transports`. The
    /// publication decides whether the datagram concerns it.
    fn on_control_message(&self, _data: &[u8], _src: SocketAddr) {}
}

/// Network resource a publication transmits through.
pub trait SendChannelEndpoint: Send + Sync {
    /// Channel description for logs (e.g. `udp://127.0.0.1:40123`).
    fn channel(&self) -> &str;

    /// Acquire the underlying socket.
    fn open_channel(&self) -> io::Result<()>;

    /// Release the underlying socket. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;

    /// Hand this endpoint's control socket to `poller`.
    ///
    /// Implementations typically call
    /// `poller.register_for_read(&socket, self)`.
    fn register_for_read(self: Arc<Self>, poller: &mut dyn ControlTransportPoller)
        -> io::Result<()>;

    /// Start routing control traffic to `publication`.
    fn register_for_send(&self, publication: Arc<dyn NetworkPublication>);

    /// Stop routing control traffic to the publication with this id.
    fn unregister_for_send(&self, registration_id: i64);

    /// Deliver one inbound control datagram. Called by the poller.
    fn on_control_datagram(&self, data: &[u8], src: SocketAddr);
}

/// Drains inbound control bytes for every endpoint registered for read.
pub trait ControlTransportPoller: Send {
    /// Watch `socket` and route its datagrams to `endpoint`.
    fn register_for_read(
        &mut self,
        socket: &UdpSocket,
        endpoint: Arc<dyn SendChannelEndpoint>,
    ) -> io::Result<()>;

    /// Non-blocking poll. Returns bytes (or events) processed, 0 when idle.
    fn poll_transports(&mut self) -> usize;
}

/// Identity comparison for trait objects that ignores vtable pointers.
#[inline]
pub(crate) fn same_endpoint(a: &Arc<dyn SendChannelEndpoint>, b: &Arc<dyn SendChannelEndpoint>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
