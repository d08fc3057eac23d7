// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # mtd-sender - round-robin sender agent for a message transport driver
//!
//! The sender owns one dedicated thread. Every duty cycle it applies pending
//! commands from the conductor, gives each scheduled publication one chance to
//! transmit (rotating the starting point so nobody is always first), then
//! drains inbound control traffic (status messages, NAKs) from its endpoints.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Sender`] | Scheduler and duty cycle |
//! | [`SenderProxy`] | Conductor-side command producer |
//! | [`AgentRunner`] | Thread driving an [`Agent`] with backoff |
//! | [`UdpSendChannelEndpoint`] | socket2-built UDP endpoint |
//! | [`MioControlPoller`] | mio-based control transport poller |
//! | [`SystemCounters`] | Observable counters (`bytes_sent`, ...) |
//!
//! ## Modules Overview
//!
//! - [`engine`] - Sender, command channel, runner
//! - [`transport`] - Publication / endpoint / poller boundaries and UDP implementations
//! - [`metrics`] - Counters
//! - [`config`] - Defaults and `MTD_*` environment overrides
//! - [`clock`] - Nanosecond clocks
//! - [`error`] - [`SenderError`]
//!
//! Logging goes through the `log` facade; install any logger to see it.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod transport;

pub use clock::{ManualClock, NanoClock, SystemNanoClock};
pub use config::{IdleConfig, SenderConfig};
pub use engine::{
    Agent, AgentRunner, BackoffIdleStrategy, CommandQueue, ConductorEvent, ConductorEvents,
    ConductorNotifier, ConductorProxy, IdleStrategy, Sender, SenderCmd, SenderProxy,
};
pub use error::{Result, SenderError};
pub use metrics::{AtomicCounter, CountersSnapshot, SystemCounterDescriptor, SystemCounters};
pub use transport::{
    ControlTransportPoller, MioControlPoller, NetworkPublication, SendChannelEndpoint,
    UdpSendChannelEndpoint,
};
