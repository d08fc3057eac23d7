// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sender agent: round-robin transmission over the scheduled publications.
//!
//! One duty cycle ([`Sender::do_work`]):
//!
//! ```text
//! CommandQueue.drain() -> SenderCmd.execute()     (set mutations, endpoint lifecycle)
//!       v
//! do_send(now)  -> publications[start..], publications[..start]
//!       v
//! poller.poll_transports()                        (status messages, NAKs)
//! ```
//!
//! Everything here runs on the sender thread. The only structure shared with
//! other threads is the command queue (plus counters, which are read-only for
//! observers). No locks are taken on this path.

use crate::clock::NanoClock;
use crate::engine::agent::Agent;
use crate::engine::conductor::ConductorNotifier;
use crate::engine::publications::PublicationSet;
use crate::engine::queue::CommandQueue;
use crate::metrics::SystemCounters;
use crate::transport::{
    same_endpoint, ControlTransportPoller, NetworkPublication, SendChannelEndpoint,
};
use std::sync::Arc;

/// Role name reported by [`Agent::role_name`].
pub const SENDER_ROLE_NAME: &str = "sender";

/// Scheduler for outbound publications.
pub struct Sender {
    publications: PublicationSet,
    /// Start index of the next `do_send`
    round_robin_index: usize,
    /// Endpoints opened through this sender, closed in `on_close`
    endpoints: Vec<Arc<dyn SendChannelEndpoint>>,
    command_queue: Arc<CommandQueue>,
    poller: Box<dyn ControlTransportPoller>,
    conductor: Arc<dyn ConductorNotifier>,
    counters: Arc<SystemCounters>,
    clock: Arc<dyn NanoClock>,
}

impl Sender {
    /// # Arguments
    /// * `command_queue` - Consumer side of the conductor -> sender queue
    /// * `poller` - Control transport poller, owned by the sender thread from now on
    /// * `conductor` - Where removed publications are handed back
    /// * `counters` - Shared counters (`bytes_sent` is written only here)
    /// * `clock` - Source of the per-cycle `now`
    pub fn new(
        command_queue: Arc<CommandQueue>,
        poller: Box<dyn ControlTransportPoller>,
        conductor: Arc<dyn ConductorNotifier>,
        counters: Arc<SystemCounters>,
        clock: Arc<dyn NanoClock>,
    ) -> Self {
        Self {
            publications: PublicationSet::new(),
            round_robin_index: 0,
            endpoints: Vec::new(),
            command_queue,
            poller,
            conductor,
            counters,
            clock,
        }
    }

    #[must_use]
    pub fn publication_count(&self) -> usize {
        self.publications.len()
    }

    #[must_use]
    pub fn publications(&self) -> &PublicationSet {
        &self.publications
    }

    #[must_use]
    pub fn round_robin_index(&self) -> usize {
        self.round_robin_index
    }

    #[must_use]
    pub fn counters(&self) -> &Arc<SystemCounters> {
        &self.counters
    }

    /// Open `endpoint` and start polling it for control traffic.
    pub fn on_register_send_channel_endpoint(&mut self, endpoint: Arc<dyn SendChannelEndpoint>) {
        if let Err(e) = endpoint.open_channel() {
            log::error!(
                "[SENDER] open_channel failed channel={} err={}",
                endpoint.channel(),
                e
            );
            self.counters.errors.increment();
            return;
        }

        if let Err(e) = Arc::clone(&endpoint).register_for_read(self.poller.as_mut()) {
            log::error!(
                "[SENDER] register_for_read failed channel={} err={}",
                endpoint.channel(),
                e
            );
            self.counters.errors.increment();
        }

        if !self.endpoints.iter().any(|e| same_endpoint(e, &endpoint)) {
            log::debug!("[SENDER] endpoint registered channel={}", endpoint.channel());
            self.endpoints.push(endpoint);
        }
    }

    pub fn on_close_send_channel_endpoint(&mut self, endpoint: &Arc<dyn SendChannelEndpoint>) {
        endpoint.close();
        self.endpoints.retain(|e| !same_endpoint(e, endpoint));
        log::debug!("[SENDER] endpoint closed channel={}", endpoint.channel());
    }

    /// Start scheduling `publication`. A duplicate registration id is rejected.
    pub fn on_new_network_publication(&mut self, publication: Arc<dyn NetworkPublication>) {
        match self.publications.add(Arc::clone(&publication)) {
            Ok(len) => {
                publication
                    .send_channel_endpoint()
                    .register_for_send(Arc::clone(&publication));
                self.counters.publications_added.add_ordered(1);
                log::debug!(
                    "[SENDER] publication added registration_id={} channel={} count={}",
                    publication.registration_id(),
                    publication.send_channel_endpoint().channel(),
                    len
                );
            }
            Err(e) => {
                self.counters.duplicate_publications.add_ordered(1);
                log::error!("[SENDER] rejected NewPublication: {}", e);
            }
        }
    }

    /// Stop scheduling the publication and hand it to the conductor.
    ///
    /// Removing something not scheduled is a no-op.
    pub fn on_remove_network_publication(&mut self, publication: &Arc<dyn NetworkPublication>) {
        let registration_id = publication.registration_id();
        let Some(removed) = self.publications.remove(registration_id) else {
            log::debug!(
                "[SENDER] remove skip (not scheduled) registration_id={}",
                registration_id
            );
            return;
        };

        removed
            .send_channel_endpoint()
            .unregister_for_send(registration_id);
        self.counters.publications_removed.add_ordered(1);
        log::debug!(
            "[SENDER] publication removed registration_id={} count={}",
            registration_id,
            self.publications.len()
        );
        self.conductor.close_network_publication(removed);
    }

    /// Send on every publication once, starting from the rotating index.
    ///
    /// All publications see the same `now_ns`. Returns total bytes sent.
    pub fn do_send(&mut self, now_ns: u64) -> usize {
        let publications = self.publications.load();
        let length = publications.len();
        if length == 0 {
            return 0;
        }

        let mut starting_index = self.round_robin_index;
        if starting_index >= length {
            starting_index = 0;
        }
        self.round_robin_index = starting_index + 1;

        let mut bytes_sent = 0usize;
        for publication in &publications[starting_index..] {
            bytes_sent = bytes_sent.saturating_add(publication.send(now_ns));
        }
        for publication in &publications[..starting_index] {
            bytes_sent = bytes_sent.saturating_add(publication.send(now_ns));
        }

        self.counters.bytes_sent.add_ordered(bytes_sent as u64);
        bytes_sent
    }
}

impl Agent for Sender {
    /// Commands applied + bytes sent + poll result. Zero means idle.
    fn do_work(&mut self) -> usize {
        let command_queue = Arc::clone(&self.command_queue);
        let commands = command_queue.drain(|cmd| cmd.execute(self));
        if commands > 0 {
            self.counters.sender_commands.add_ordered(commands as u64);
        }

        let bytes_sent = self.do_send(self.clock.nano_time());
        let polled = self.poller.poll_transports();
        self.counters.sender_cycles.add_ordered(1);

        commands.saturating_add(bytes_sent).saturating_add(polled)
    }

    fn role_name(&self) -> &str {
        SENDER_ROLE_NAME
    }

    /// Close owned endpoints and hand every remaining publication back.
    fn on_close(&mut self) {
        let remaining = self.publications.clear();
        for publication in remaining.iter() {
            publication
                .send_channel_endpoint()
                .unregister_for_send(publication.registration_id());
            self.conductor
                .close_network_publication(Arc::clone(publication));
        }

        for endpoint in self.endpoints.drain(..) {
            endpoint.close();
        }

        log::info!(
            "[SENDER] closed, handed back {} publication(s)",
            remaining.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::command::SenderCmd;
    use crate::engine::conductor::{ConductorEvent, ConductorEvents, ConductorProxy};
    use crate::engine::test_support::{FakeEndpoint, FakePoller, FakePublication, SendLog};
    use std::sync::atomic::Ordering;

    struct Harness {
        sender: Sender,
        queue: Arc<CommandQueue>,
        events: ConductorEvents,
        counters: Arc<SystemCounters>,
        clock: Arc<ManualClock>,
        polls: Arc<std::sync::atomic::AtomicUsize>,
    }

    fn harness(poll_result: usize) -> Harness {
        let queue = Arc::new(CommandQueue::new(64));
        let (conductor, events) = ConductorProxy::channel();
        let counters = Arc::new(SystemCounters::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let poller = FakePoller::new(poll_result);
        let polls = Arc::clone(&poller.polls);
        let sender = Sender::new(
            Arc::clone(&queue),
            Box::new(poller),
            Arc::new(conductor),
            Arc::clone(&counters),
            clock.clone(),
        );
        Harness {
            sender,
            queue,
            events,
            counters,
            clock,
            polls,
        }
    }

    fn offer(queue: &CommandQueue, cmd: SenderCmd) {
        assert!(queue.offer(cmd).is_ok(), "queue unexpectedly full");
    }

    fn starting_ids(log: &SendLog, per_cycle: usize) -> Vec<i64> {
        log.lock()
            .chunks(per_cycle)
            .map(|cycle| cycle[0].0)
            .collect()
    }

    #[test]
    fn test_role_name() {
        let h = harness(0);
        assert_eq!(h.sender.role_name(), "sender");
    }

    #[test]
    fn test_empty_cycle_counts_only_poll() {
        let mut h = harness(3);
        assert_eq!(h.sender.do_work(), 3);
        assert_eq!(h.counters.bytes_sent.get(), 0);
        assert_eq!(h.polls.load(Ordering::SeqCst), 1);
        assert_eq!(h.counters.sender_cycles.get(), 1);
    }

    #[test]
    fn test_single_publication_always_starts_at_zero() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://one"));
        let p = FakePublication::new(1, endpoint.clone(), 4);
        offer(&h.queue, SenderCmd::NewPublication(p.clone()));

        let mut cursors = Vec::new();
        for cycle in 1..=3 {
            h.sender.do_work();
            cursors.push(h.sender.round_robin_index());
            assert_eq!(p.sends(), cycle);
        }
        assert_eq!(cursors, vec![1, 1, 1]);
        assert_eq!(h.counters.bytes_sent.get(), 12);
    }

    #[test]
    fn test_three_publications_rotate_start() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://rr"));
        let log = SendLog::default();
        for id in 1..=3 {
            offer(
                &h.queue,
                SenderCmd::NewPublication(FakePublication::with_log(
                    id,
                    endpoint.clone(),
                    10,
                    log.clone(),
                )),
            );
        }

        // First cycle also applies the three commands
        assert_eq!(h.sender.do_work(), 3 + 30);
        assert_eq!(h.sender.do_work(), 30);
        assert_eq!(h.sender.do_work(), 30);

        assert_eq!(h.counters.bytes_sent.get(), 90);
        assert_eq!(starting_ids(&log, 3), vec![1, 2, 3]);
        let all: Vec<i64> = log.lock().iter().map(|(id, _)| *id).collect();
        assert_eq!(all, vec![1, 2, 3, 2, 3, 1, 3, 1, 2]);
        assert_eq!(*endpoint.registered.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_same_now_within_cycle() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://now"));
        let log = SendLog::default();
        for id in 1..=4 {
            offer(
                &h.queue,
                SenderCmd::NewPublication(FakePublication::with_log(id, endpoint.clone(), 1, log.clone())),
            );
        }
        h.sender.do_work();
        h.clock.advance(500);
        h.sender.do_work();

        let log = log.lock();
        assert!(log[..4].iter().all(|(_, now)| *now == 1_000));
        assert!(log[4..].iter().all(|(_, now)| *now == 1_500));
    }

    #[test]
    fn test_cursor_resets_after_shrink() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://shrink"));
        let log = SendLog::default();
        let pubs: Vec<_> = (1..=3)
            .map(|id| FakePublication::with_log(id, endpoint.clone(), 5, log.clone()))
            .collect();
        for p in &pubs {
            offer(&h.queue, SenderCmd::NewPublication(p.clone()));
        }
        h.sender.do_work(); // start 0
        h.sender.do_work(); // start 1
        h.sender.do_work(); // start 2
        assert_eq!(h.sender.round_robin_index(), 3);

        offer(&h.queue, SenderCmd::RemovePublication(pubs[2].clone()));
        log.lock().clear();
        h.sender.do_work();

        assert_eq!(starting_ids(&log, 2), vec![1]);
        assert_eq!(log.lock().len(), 2);
        assert_eq!(h.sender.round_robin_index(), 1);
    }

    #[test]
    fn test_add_then_remove_in_one_drain() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://both"));
        let p = FakePublication::new(1, endpoint.clone(), 10);
        offer(&h.queue, SenderCmd::NewPublication(p.clone()));
        offer(&h.queue, SenderCmd::RemovePublication(p.clone()));

        assert_eq!(h.sender.do_work(), 2);
        assert_eq!(h.sender.publication_count(), 0);
        assert_eq!(p.sends(), 0);
        assert_eq!(*endpoint.registered.lock(), vec![1]);
        assert_eq!(*endpoint.unregistered.lock(), vec![1]);

        match h.events.try_next() {
            Some(ConductorEvent::PublicationClosed(closed)) => {
                assert_eq!(closed.registration_id(), 1);
            }
            None => panic!("expected close notification"),
        }
    }

    #[test]
    fn test_remove_unknown_is_silent() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://idem"));
        let p = FakePublication::new(9, endpoint.clone(), 10);
        offer(&h.queue, SenderCmd::NewPublication(p.clone()));
        offer(&h.queue, SenderCmd::RemovePublication(p.clone()));
        offer(&h.queue, SenderCmd::RemovePublication(p.clone()));
        h.sender.do_work();

        let mut closes = 0;
        h.events.drain(|_| closes += 1);
        assert_eq!(closes, 1);
        assert_eq!(endpoint.unregistered.lock().len(), 1);
        assert_eq!(h.counters.publications_removed.get(), 1);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://dup"));
        let p = FakePublication::new(5, endpoint.clone(), 7);
        offer(&h.queue, SenderCmd::NewPublication(p.clone()));
        offer(&h.queue, SenderCmd::NewPublication(p.clone()));

        assert_eq!(h.sender.do_work(), 2 + 7);
        assert_eq!(h.sender.publication_count(), 1);
        assert_eq!(p.sends(), 1);
        assert_eq!(*endpoint.registered.lock(), vec![5]);
        assert_eq!(h.counters.duplicate_publications.get(), 1);
    }

    #[test]
    fn test_endpoint_register_and_close() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://ep"));
        offer(&h.queue, SenderCmd::RegisterEndpoint(endpoint.clone()));
        h.sender.do_work();
        assert_eq!(endpoint.opens.load(Ordering::SeqCst), 1);
        assert_eq!(endpoint.read_registrations.load(Ordering::SeqCst), 1);

        offer(&h.queue, SenderCmd::CloseEndpoint(endpoint.clone()));
        h.sender.do_work();
        assert_eq!(endpoint.closes.load(Ordering::SeqCst), 1);

        // Already closed endpoints are not closed again at shutdown
        h.sender.on_close();
        assert_eq!(endpoint.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_endpoint_open_failure_is_counted() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::failing("fake://bad"));
        offer(&h.queue, SenderCmd::RegisterEndpoint(endpoint.clone()));
        h.sender.do_work();

        assert_eq!(endpoint.read_registrations.load(Ordering::SeqCst), 0);
        assert_eq!(h.counters.errors.get(), 1);
        h.sender.on_close();
        assert_eq!(endpoint.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_on_close_hands_back_everything() {
        let mut h = harness(0);
        let endpoint = Arc::new(FakeEndpoint::new("fake://close"));
        offer(&h.queue, SenderCmd::RegisterEndpoint(endpoint.clone()));
        for id in 1..=3 {
            offer(
                &h.queue,
                SenderCmd::NewPublication(FakePublication::new(id, endpoint.clone(), 1)),
            );
        }
        h.sender.do_work();
        h.sender.on_close();

        let mut ids = Vec::new();
        h.events.drain(|ConductorEvent::PublicationClosed(p)| ids.push(p.registration_id()));
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(h.sender.publication_count(), 0);
        assert_eq!(endpoint.closes.load(Ordering::SeqCst), 1);
        assert_eq!(*endpoint.unregistered.lock(), vec![1, 2, 3]);
    }
}
