// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sender engine: command channel, publication set, scheduler and runner.
//!
//! # Architecture
//!
//! ```text
//! conductor thread                         sender thread (AgentRunner "mtd-sender")
//! ----------------                         ----------------------------------------
//! SenderProxy.new_publication()
//!       v
//! CommandQueue (bounded, lock-free)  --->  Sender.do_work()
//!                                            |- drain -> SenderCmd.execute()
//!                                            |             |- PublicationSet (copy-on-write)
//!                                            |             '- endpoint open/close
//!                                            |- do_send(now): round-robin publications
//!                                            '- poller.poll_transports()
//!       ^                                           |
//! ConductorEvents  <--- ConductorProxy  <-----------'  (removed publications)
//! ```
//!
//! # Components
//!
//! - **CommandQueue / SenderCmd**: conductor -> sender instructions, applied in order
//! - **PublicationSet**: `ArcSwap` snapshot array walked by the scheduler
//! - **Sender**: the duty cycle (commands, round-robin send, control poll)
//! - **SenderProxy**: producer-side handle with retry-on-full
//! - **ConductorProxy / ConductorEvents**: hand-back of removed publications
//! - **AgentRunner / BackoffIdleStrategy**: dedicated thread and its backoff
//!
//! # Examples
//!
//! ```no_run
//! use mtd_sender::clock::SystemNanoClock;
//! use mtd_sender::config::SenderConfig;
//! use mtd_sender::engine::{
//!     AgentRunner, BackoffIdleStrategy, CommandQueue, ConductorProxy, Sender, SenderProxy,
//! };
//! use mtd_sender::metrics::SystemCounters;
//! use mtd_sender::transport::MioControlPoller;
//! use std::sync::Arc;
//!
//! # fn main() -> mtd_sender::Result<()> {
//! let config = SenderConfig::from_env();
//! let counters = Arc::new(SystemCounters::new());
//! let queue = Arc::new(CommandQueue::new(config.command_queue_capacity));
//! let (conductor, events) = ConductorProxy::channel();
//!
//! let sender = Sender::new(
//!     Arc::clone(&queue),
//!     Box::new(MioControlPoller::new(&config, Arc::clone(&counters))?),
//!     Arc::new(conductor),
//!     Arc::clone(&counters),
//!     Arc::new(SystemNanoClock::new()),
//! );
//! let runner = AgentRunner::start(sender, BackoffIdleStrategy::new(config.idle))?;
//! let proxy = SenderProxy::new(queue, counters);
//!
//! // ... proxy.register_endpoint(..), proxy.new_publication(..) ...
//!
//! runner.stop()?;
//! events.drain(|event| log::info!("dispose {:?}", event));
//! # let _ = proxy;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod command;
pub mod conductor;
pub mod proxy;
pub mod publications;
pub mod queue;
pub mod sender;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{
    Agent, AgentRunner, BackoffIdleStrategy, BackoffState, BusySpinIdleStrategy, IdleStrategy,
};
pub use command::SenderCmd;
pub use conductor::{ConductorEvent, ConductorEvents, ConductorNotifier, ConductorProxy};
pub use proxy::SenderProxy;
pub use publications::{PublicationSet, PublicationSnapshot};
pub use queue::CommandQueue;
pub use sender::{Sender, SENDER_ROLE_NAME};
