// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP send channel endpoint.
//!
//! One non-blocking socket per channel. Publications use [`UdpSendChannelEndpoint::send`]
//! to put frames on the wire; receivers answer with control datagrams on the same
//! socket, which the poller hands back to [`SendChannelEndpoint::on_control_datagram`].
//!
//! ```text
//! Publication.send() -> endpoint.send() -> send_to(destination)
//!                                              v
//!                                         (receivers)
//!                                              v
//! MioControlPoller -> recv_from() -> on_control_datagram() -> Publication.on_control_message()
//! ```

use crate::transport::{ControlTransportPoller, NetworkPublication, SendChannelEndpoint};
use dashmap::DashMap;
use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// UDP endpoint shared by every publication on one channel.
pub struct UdpSendChannelEndpoint {
    channel: String,
    bind_addr: SocketAddr,
    destination: SocketAddr,
    socket: RwLock<Option<Arc<UdpSocket>>>,
    closed: AtomicBool,
    /// Publications registered for send, keyed by registration id
    publications: DashMap<i64, Arc<dyn NetworkPublication>>,
}

impl UdpSendChannelEndpoint {
    /// Describe an endpoint. No socket is created until [`SendChannelEndpoint::open_channel`].
    ///
    /// # Arguments
    /// * `bind_addr` - Local address (port 0 picks an ephemeral port)
    /// * `destination` - Where data frames are sent
    pub fn new(bind_addr: SocketAddr, destination: SocketAddr) -> Self {
        Self {
            channel: format!("udp://{}", destination),
            bind_addr,
            destination,
            socket: RwLock::new(None),
            closed: AtomicBool::new(true),
            publications: DashMap::new(),
        }
    }

    #[must_use]
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Bound address once open (resolves ephemeral ports).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self.socket.read().as_ref() {
            Some(socket) => socket.local_addr(),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "send channel endpoint not open",
            )),
        }
    }

    /// Send one frame to the destination.
    ///
    /// Returns `Ok(0)` when the socket buffer is full or the endpoint is closed,
    /// so a publication can simply retry on its next `send`.
    pub fn send(&self, frame: &[u8]) -> io::Result<usize> {
        let guard = self.socket.read();
        let Some(socket) = guard.as_ref() else {
            return Ok(0);
        };
        match socket.send_to(frame, self.destination) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn publication_count(&self) -> usize {
        self.publications.len()
    }

    fn create_socket(&self) -> io::Result<UdpSocket> {
        let socket = Socket::new(
            Domain::for_address(self.bind_addr),
            Type::DGRAM,
            Some(Protocol::UDP),
        )?;
        socket.set_reuse_address(true)?;
        socket.bind(&self.bind_addr.into())?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }
}

impl SendChannelEndpoint for UdpSendChannelEndpoint {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn open_channel(&self) -> io::Result<()> {
        let mut slot = self.socket.write();
        if slot.is_some() {
            return Ok(());
        }
        let socket = self.create_socket()?;
        log::debug!(
            "[UDP-SEND] open channel={} local={:?}",
            self.channel,
            socket.local_addr()
        );
        *slot = Some(Arc::new(socket));
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.socket.write().take();
        log::debug!(
            "[UDP-SEND] close channel={} publications={}",
            self.channel,
            self.publications.len()
        );
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn register_for_read(
        self: Arc<Self>,
        poller: &mut dyn ControlTransportPoller,
    ) -> io::Result<()> {
        let socket = self.socket.read().clone().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                "register_for_read on a closed endpoint",
            )
        })?;
        poller.register_for_read(&socket, self)
    }

    fn register_for_send(&self, publication: Arc<dyn NetworkPublication>) {
        let id = publication.registration_id();
        if self.publications.insert(id, publication).is_some() {
            log::debug!(
                "[UDP-SEND] register_for_send replaced registration_id={} channel={}",
                id,
                self.channel
            );
        }
    }

    fn unregister_for_send(&self, registration_id: i64) {
        self.publications.remove(&registration_id);
    }

    fn on_control_datagram(&self, data: &[u8], src: SocketAddr) {
        log::trace!(
            "[UDP-SEND] control len={} src={} channel={}",
            data.len(),
            src,
            self.channel
        );
        for entry in self.publications.iter() {
            entry.value().on_control_message(data, src);
        }
    }
}

impl Drop for UdpSendChannelEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}
