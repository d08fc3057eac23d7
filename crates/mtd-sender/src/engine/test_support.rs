// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory collaborators for unit tests.

use crate::transport::{ControlTransportPoller, NetworkPublication, SendChannelEndpoint};
use parking_lot::Mutex;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared record of `send` calls: (registration_id, now_ns).
pub type SendLog = Arc<Mutex<Vec<(i64, u64)>>>;

pub struct FakePublication {
    id: i64,
    endpoint: Arc<dyn SendChannelEndpoint>,
    bytes_per_send: usize,
    log: SendLog,
    sends: AtomicUsize,
}

impl FakePublication {
    pub fn new(id: i64, endpoint: Arc<dyn SendChannelEndpoint>, bytes_per_send: usize) -> Arc<Self> {
        Self::with_log(id, endpoint, bytes_per_send, SendLog::default())
    }

    pub fn with_log(
        id: i64,
        endpoint: Arc<dyn SendChannelEndpoint>,
        bytes_per_send: usize,
        log: SendLog,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            endpoint,
            bytes_per_send,
            log,
            sends: AtomicUsize::new(0),
        })
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

impl NetworkPublication for FakePublication {
    fn registration_id(&self) -> i64 {
        self.id
    }

    fn send_channel_endpoint(&self) -> &Arc<dyn SendChannelEndpoint> {
        &self.endpoint
    }

    fn send(&self, now_ns: u64) -> usize {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push((self.id, now_ns));
        self.bytes_per_send
    }
}

/// Endpoint that records every lifecycle call.
pub struct FakeEndpoint {
    channel: String,
    fail_open: bool,
    closed: AtomicBool,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub read_registrations: AtomicUsize,
    pub registered: Mutex<Vec<i64>>,
    pub unregistered: Mutex<Vec<i64>>,
}

impl FakeEndpoint {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            fail_open: false,
            closed: AtomicBool::new(true),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            read_registrations: AtomicUsize::new(0),
            registered: Mutex::new(Vec::new()),
            unregistered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(channel: &str) -> Self {
        Self {
            fail_open: true,
            ..Self::new(channel)
        }
    }
}

impl SendChannelEndpoint for FakeEndpoint {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn open_channel(&self) -> io::Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(io::Error::new(io::ErrorKind::AddrInUse, "fake open failure"));
        }
        self.closed.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn register_for_read(
        self: Arc<Self>,
        _poller: &mut dyn ControlTransportPoller,
    ) -> io::Result<()> {
        self.read_registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn register_for_send(&self, publication: Arc<dyn NetworkPublication>) {
        self.registered.lock().push(publication.registration_id());
    }

    fn unregister_for_send(&self, registration_id: i64) {
        self.unregistered.lock().push(registration_id);
    }

    fn on_control_datagram(&self, _data: &[u8], _src: SocketAddr) {}
}

/// Poller returning a fixed count per call.
pub struct FakePoller {
    pub per_poll: usize,
    pub polls: Arc<AtomicUsize>,
}

impl FakePoller {
    pub fn new(per_poll: usize) -> Self {
        Self {
            per_poll,
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ControlTransportPoller for FakePoller {
    fn register_for_read(
        &mut self,
        _socket: &UdpSocket,
        _endpoint: Arc<dyn SendChannelEndpoint>,
    ) -> io::Result<()> {
        Ok(())
    }

    fn poll_transports(&mut self) -> usize {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.per_poll
    }
}
