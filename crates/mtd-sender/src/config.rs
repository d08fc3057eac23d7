// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sender runtime configuration.
//!
//! Defaults are compile-time constants; every field can be overridden from the
//! environment.
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MTD_SENDER_COMMAND_QUEUE_CAPACITY` | [`SenderConfig::command_queue_capacity`] |
//! | `MTD_SENDER_MAX_POLL_EVENTS` | [`SenderConfig::max_poll_events`] |
//! | `MTD_UDP_RECV_BUFFER` | [`SenderConfig::control_buffer_len`] |
//! | `MTD_SENDER_MAX_CONTROL_DATAGRAMS` | [`SenderConfig::max_control_datagrams`] |
//! | `MTD_IDLE_MAX_SPINS` | [`IdleConfig::max_spins`] |
//! | `MTD_IDLE_MAX_YIELDS` | [`IdleConfig::max_yields`] |
//! | `MTD_IDLE_MIN_PARK_US` | [`IdleConfig::min_park`] |
//! | `MTD_IDLE_MAX_PARK_US` | [`IdleConfig::max_park`] |
//!
//! Values that fail to parse are ignored (logged at `warn`).

use std::str::FromStr;
use std::time::Duration;

/// Default number of pending conductor -> sender commands.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Default mio event batch per `poll_transports` call.
pub const DEFAULT_MAX_POLL_EVENTS: usize = 64;

/// Default receive buffer for one control datagram (fits a 64 KiB UDP payload).
pub const DEFAULT_CONTROL_BUFFER_LEN: usize = 64 * 1024;

/// Default datagrams read from one control transport per `poll_transports` call.
pub const DEFAULT_MAX_CONTROL_DATAGRAMS: usize = 64;

pub const DEFAULT_IDLE_MAX_SPINS: u32 = 10;
pub const DEFAULT_IDLE_MAX_YIELDS: u32 = 20;
pub const DEFAULT_IDLE_MIN_PARK: Duration = Duration::from_micros(1);
pub const DEFAULT_IDLE_MAX_PARK: Duration = Duration::from_millis(1);

/// Backoff parameters for the agent runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleConfig {
    /// Busy-spin iterations before yielding
    pub max_spins: u32,
    /// `yield_now` iterations before parking
    pub max_yields: u32,
    /// First park duration
    pub min_park: Duration,
    /// Upper bound for the doubling park duration
    pub max_park: Duration,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            max_spins: DEFAULT_IDLE_MAX_SPINS,
            max_yields: DEFAULT_IDLE_MAX_YIELDS,
            min_park: DEFAULT_IDLE_MIN_PARK,
            max_park: DEFAULT_IDLE_MAX_PARK,
        }
    }
}

impl IdleConfig {
    /// Read overrides from `MTD_IDLE_*`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<u32>("MTD_IDLE_MAX_SPINS") {
            config.max_spins = v;
        }
        if let Some(v) = env_parse::<u32>("MTD_IDLE_MAX_YIELDS") {
            config.max_yields = v;
        }
        if let Some(v) = env_parse::<u64>("MTD_IDLE_MIN_PARK_US") {
            config.min_park = Duration::from_micros(v);
        }
        if let Some(v) = env_parse::<u64>("MTD_IDLE_MAX_PARK_US") {
            config.max_park = Duration::from_micros(v);
        }
        config.normalized()
    }

    /// Keep `min_park <= max_park` and both non-zero.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.min_park.is_zero() {
            self.min_park = DEFAULT_IDLE_MIN_PARK;
        }
        if self.max_park < self.min_park {
            self.max_park = self.min_park;
        }
        self
    }
}

/// Sender engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// Bounded capacity of the conductor -> sender command queue
    pub command_queue_capacity: usize,
    /// Event batch size handed to `mio::Poll`
    pub max_poll_events: usize,
    /// Receive buffer length for control datagrams
    pub control_buffer_len: usize,
    /// Datagrams read per control transport per poll; the rest waits a cycle
    pub max_control_datagrams: usize,
    /// Runner backoff
    pub idle: IdleConfig,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
            max_poll_events: DEFAULT_MAX_POLL_EVENTS,
            control_buffer_len: DEFAULT_CONTROL_BUFFER_LEN,
            max_control_datagrams: DEFAULT_MAX_CONTROL_DATAGRAMS,
            idle: IdleConfig::default(),
        }
    }
}

impl SenderConfig {
    /// Defaults overridden by `MTD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self {
            idle: IdleConfig::from_env(),
            ..Self::default()
        };
        if let Some(v) = env_parse::<usize>("MTD_SENDER_COMMAND_QUEUE_CAPACITY") {
            config.command_queue_capacity = v;
        }
        if let Some(v) = env_parse::<usize>("MTD_SENDER_MAX_POLL_EVENTS") {
            config.max_poll_events = v;
        }
        if let Some(v) = env_parse::<usize>("MTD_UDP_RECV_BUFFER") {
            config.control_buffer_len = v;
        }
        if let Some(v) = env_parse::<usize>("MTD_SENDER_MAX_CONTROL_DATAGRAMS") {
            config.max_control_datagrams = v;
        }
        config.normalized()
    }

    #[must_use]
    pub fn with_command_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = capacity;
        self.normalized()
    }

    #[must_use]
    pub fn with_max_poll_events(mut self, events: usize) -> Self {
        self.max_poll_events = events;
        self.normalized()
    }

    #[must_use]
    pub fn with_control_buffer_len(mut self, len: usize) -> Self {
        self.control_buffer_len = len;
        self.normalized()
    }

    #[must_use]
    pub fn with_max_control_datagrams(mut self, datagrams: usize) -> Self {
        self.max_control_datagrams = datagrams;
        self.normalized()
    }

    #[must_use]
    pub fn with_idle(mut self, idle: IdleConfig) -> Self {
        self.idle = idle.normalized();
        self
    }

    /// Zero capacities are not representable by the queue or the poller.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.command_queue_capacity == 0 {
            self.command_queue_capacity = DEFAULT_COMMAND_QUEUE_CAPACITY;
        }
        if self.max_poll_events == 0 {
            self.max_poll_events = DEFAULT_MAX_POLL_EVENTS;
        }
        if self.control_buffer_len == 0 {
            self.control_buffer_len = DEFAULT_CONTROL_BUFFER_LEN;
        }
        if self.max_control_datagrams == 0 {
            self.max_control_datagrams = DEFAULT_MAX_CONTROL_DATAGRAMS;
        }
        self.idle = self.idle.normalized();
        self
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("[CONFIG] ignoring {}={:?} (not a valid value)", name, raw);
            None
        }
    }
}
