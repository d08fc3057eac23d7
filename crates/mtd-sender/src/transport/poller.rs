// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! mio-based control transport poller.
//!
//! Invoked once per sender duty cycle. Polls with a zero timeout, reads every
//! readable socket until `WouldBlock` or until `max_control_datagrams`, and
//! routes each datagram to its endpoint. mio is edge-triggered, so a socket cut
//! off by the limit is remembered and read first on the next call.
//!
//! # Architecture
//!
//! ```text
//! Sender.do_work() -> poll_transports()
//!                       v
//!                mio::poll(timeout=0)
//!                       v
//!        recv_from(buffer) -> endpoint.on_control_datagram()
//! ```
//!
//! Closed endpoints are deregistered lazily at the start of the next poll.

use crate::config::SenderConfig;
use crate::metrics::SystemCounters;
use crate::transport::{ControlTransportPoller, SendChannelEndpoint};
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

struct ControlTransport {
    token: Token,
    socket: mio::net::UdpSocket,
    endpoint: Arc<dyn SendChannelEndpoint>,
    /// Hit the per-call datagram limit, read first on the next poll
    backlogged: bool,
    /// Read during the current poll
    serviced: bool,
}

/// Poller owned by the sender thread.
pub struct MioControlPoller {
    poll: Poll,
    events: Events,
    transports: Vec<ControlTransport>,
    next_token: usize,
    buffer: Vec<u8>,
    max_datagrams: usize,
    counters: Arc<SystemCounters>,
}

impl MioControlPoller {
    pub fn new(config: &SenderConfig, counters: Arc<SystemCounters>) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(config.max_poll_events),
            transports: Vec::new(),
            next_token: 0,
            buffer: vec![0u8; config.control_buffer_len],
            max_datagrams: config.max_control_datagrams.max(1),
            counters,
        })
    }

    /// Endpoints currently watched (closed ones count until the next poll).
    #[must_use]
    pub fn transport_count(&self) -> usize {
        self.transports.len()
    }

    fn prune_closed(&mut self) {
        let registry = self.poll.registry();
        self.transports.retain_mut(|transport| {
            if !transport.endpoint.is_closed() {
                return true;
            }
            if let Err(e) = registry.deregister(&mut transport.socket) {
                log::debug!(
                    "[CTRL-POLL] deregister channel={} failed: {}",
                    transport.endpoint.channel(),
                    e
                );
            }
            log::debug!(
                "[CTRL-POLL] dropped closed channel={}",
                transport.endpoint.channel()
            );
            false
        });
    }
}

impl ControlTransportPoller for MioControlPoller {
    fn register_for_read(
        &mut self,
        socket: &UdpSocket,
        endpoint: Arc<dyn SendChannelEndpoint>,
    ) -> io::Result<()> {
        // The clone shares the file description, so it is already non-blocking.
        let mut socket = mio::net::UdpSocket::from_std(socket.try_clone()?);
        let token = Token(self.next_token);
        self.poll
            .registry()
            .register(&mut socket, token, Interest::READABLE)?;
        self.next_token += 1;

        log::debug!(
            "[CTRL-POLL] register channel={} token={}",
            endpoint.channel(),
            token.0
        );
        self.transports.push(ControlTransport {
            token,
            socket,
            endpoint,
            backlogged: false,
            serviced: false,
        });
        Ok(())
    }

    fn poll_transports(&mut self) -> usize {
        self.prune_closed();
        if self.transports.is_empty() {
            return 0;
        }
        for transport in &mut self.transports {
            transport.serviced = false;
        }

        let limit = self.max_datagrams;
        let mut bytes_received = 0usize;

        // Capped last time: mio will not report these again until new data arrives
        for transport in self.transports.iter_mut().filter(|t| t.backlogged) {
            let bytes = read_datagrams(transport, &mut self.buffer, limit);
            bytes_received = bytes_received.saturating_add(bytes);
        }

        match self.poll.poll(&mut self.events, Some(Duration::ZERO)) {
            Ok(()) => {
                for event in self.events.iter() {
                    let Some(transport) = self
                        .transports
                        .iter_mut()
                        .find(|t| t.token == event.token())
                    else {
                        continue;
                    };
                    if transport.serviced {
                        // Already had its share this call
                        transport.backlogged = true;
                        continue;
                    }
                    let bytes = read_datagrams(transport, &mut self.buffer, limit);
                    bytes_received = bytes_received.saturating_add(bytes);
                }
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    log::debug!("[CTRL-POLL] poll error: {:?}", e);
                    self.counters.errors.increment();
                }
            }
        }

        if bytes_received > 0 {
            self.counters
                .control_bytes_received
                .add_ordered(bytes_received as u64);
        }
        bytes_received
    }
}

/// Read at most `limit` datagrams from one transport. Returns bytes read.
///
/// Stopping at the limit leaves the transport `backlogged`.
fn read_datagrams(transport: &mut ControlTransport, buffer: &mut [u8], limit: usize) -> usize {
    transport.serviced = true;
    transport.backlogged = false;

    let mut bytes = 0usize;
    let mut datagrams = 0usize;
    while datagrams < limit {
        match transport.socket.recv_from(buffer) {
            Ok((len, src)) => {
                transport
                    .endpoint
                    .on_control_datagram(&buffer[..len], src);
                bytes = bytes.saturating_add(len);
                datagrams += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return bytes,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // ICMP port unreachable surfaces here as ConnectionRefused
                log::debug!(
                    "[CTRL-POLL] recv_from channel={} error: {:?}",
                    transport.endpoint.channel(),
                    e
                );
                return bytes;
            }
        }
    }

    transport.backlogged = true;
    bytes
}
