// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared collaborators for the integration tests.

#![allow(dead_code)] // Each test binary uses a subset

use mtd_sender::transport::{
    ControlTransportPoller, NetworkPublication, SendChannelEndpoint, UdpSendChannelEndpoint,
};
use parking_lot::Mutex;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ordered record of (registration_id, now_ns) for every `send`.
pub type SendLog = Arc<Mutex<Vec<(i64, u64)>>>;

/// Publication sending a fixed byte count and recording each call.
pub struct CountingPublication {
    id: i64,
    endpoint: Arc<dyn SendChannelEndpoint>,
    bytes_per_send: usize,
    log: SendLog,
    pub sends: AtomicUsize,
    pub last_now: AtomicU64,
}

impl CountingPublication {
    pub fn new(
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
            last_now: AtomicU64::new(0),
        })
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

impl NetworkPublication for CountingPublication {
    fn registration_id(&self) -> i64 {
        self.id
    }

    fn send_channel_endpoint(&self) -> &Arc<dyn SendChannelEndpoint> {
        &self.endpoint
    }

    fn send(&self, now_ns: u64) -> usize {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.last_now.store(now_ns, Ordering::SeqCst);
        self.log.lock().push((self.id, now_ns));
        self.bytes_per_send
    }
}

/// Endpoint without a socket; counts lifecycle calls.
#[derive(Default)]
pub struct NullEndpoint {
    closed: AtomicBool,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub registered: Mutex<Vec<i64>>,
    pub unregistered: Mutex<Vec<i64>>,
}

impl SendChannelEndpoint for NullEndpoint {
    fn channel(&self) -> &str {
        "null://"
    }

    fn open_channel(&self) -> io::Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
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

/// Poller with nothing to poll.
pub struct IdlePoller;

impl ControlTransportPoller for IdlePoller {
    fn register_for_read(
        &mut self,
        _socket: &UdpSocket,
        _endpoint: Arc<dyn SendChannelEndpoint>,
    ) -> io::Result<()> {
        Ok(())
    }

    fn poll_transports(&mut self) -> usize {
        0
    }
}

/// Publication writing one fixed frame per `send` through a real UDP endpoint.
pub struct UdpPublication {
    id: i64,
    endpoint: Arc<dyn SendChannelEndpoint>,
    udp: Arc<UdpSendChannelEndpoint>,
    frame: Vec<u8>,
    pub control: Mutex<Vec<Vec<u8>>>,
}

impl UdpPublication {
    pub fn new(id: i64, udp: Arc<UdpSendChannelEndpoint>, frame: &[u8]) -> Arc<Self> {
        let endpoint: Arc<dyn SendChannelEndpoint> = udp.clone();
        Arc::new(Self {
            id,
            endpoint,
            udp,
            frame: frame.to_vec(),
            control: Mutex::new(Vec::new()),
        })
    }
}

impl NetworkPublication for UdpPublication {
    fn registration_id(&self) -> i64 {
        self.id
    }

    fn send_channel_endpoint(&self) -> &Arc<dyn SendChannelEndpoint> {
        &self.endpoint
    }

    fn send(&self, _now_ns: u64) -> usize {
        // Errors are the publication's business; report nothing sent
        self.udp.send(&self.frame).unwrap_or(0)
    }

    fn on_control_message(&self, data: &[u8], _src: SocketAddr) {
        self.control.lock().push(data.to_vec());
    }
}

/// Poll `condition` until it holds or `timeout` expires.
pub fn wait_for<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
