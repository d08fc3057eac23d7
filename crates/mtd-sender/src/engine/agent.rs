// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Duty-cycle agents and the thread that drives them.
//!
//! An [`Agent`] does a bounded amount of work per `do_work` call and reports
//! how much. [`AgentRunner`] owns one dedicated thread calling `do_work` in a
//! loop and backing off through an [`IdleStrategy`] when a cycle reports zero.
//!
//! ```text
//! loop {
//!     work = agent.do_work()
//!     idle.idle(work)        // spin -> yield -> park (doubling) ; reset on work
//! } until stop
//! agent.on_close()
//! ```

use crate::config::IdleConfig;
use crate::error::{Result, SenderError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Unit of work scheduled on its own thread.
pub trait Agent: Send {
    /// One bounded duty cycle. Returns a work count, 0 meaning nothing happened.
    fn do_work(&mut self) -> usize;

    /// Short name used for the thread name and logs.
    fn role_name(&self) -> &str;

    /// Called once on the agent thread before the first cycle.
    fn on_start(&mut self) {}

    /// Called once on the agent thread after the last cycle.
    fn on_close(&mut self) {}
}

/// Backoff policy between duty cycles.
pub trait IdleStrategy: Send {
    /// Called after every cycle with the work count it returned.
    fn idle(&mut self, work_count: usize);

    /// Forget accumulated backoff.
    fn reset(&mut self);
}

/// Never backs off. Burns a core; lowest latency.
#[derive(Debug, Default, Clone, Copy)]
pub struct BusySpinIdleStrategy;

impl IdleStrategy for BusySpinIdleStrategy {
    #[inline]
    fn idle(&mut self, _work_count: usize) {
        std::hint::spin_loop();
    }

    fn reset(&mut self) {}
}

/// Current phase of a [`BackoffIdleStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffState {
    NotIdle,
    Spinning,
    Yielding,
    Parking,
}

/// Spin, then yield, then park with a doubling timeout.
#[derive(Debug, Clone)]
pub struct BackoffIdleStrategy {
    config: IdleConfig,
    state: BackoffState,
    spins: u32,
    yields: u32,
    park: Duration,
}

impl BackoffIdleStrategy {
    #[must_use]
    pub fn new(config: IdleConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            state: BackoffState::NotIdle,
            spins: 0,
            yields: 0,
            park: config.min_park,
        }
    }

    #[must_use]
    pub fn state(&self) -> BackoffState {
        self.state
    }

    /// Timeout the next park will use.
    #[must_use]
    pub fn park_duration(&self) -> Duration {
        self.park
    }

    /// Advance the state machine by one idle step without sleeping.
    ///
    /// Returns the park duration when this step should park.
    fn step(&mut self) -> Option<Duration> {
        match self.state {
            BackoffState::NotIdle => {
                self.state = BackoffState::Spinning;
                self.spins = 1;
                self.step_spinning()
            }
            BackoffState::Spinning => {
                self.spins = self.spins.saturating_add(1);
                self.step_spinning()
            }
            BackoffState::Yielding => {
                self.yields = self.yields.saturating_add(1);
                if self.yields > self.config.max_yields {
                    self.state = BackoffState::Parking;
                    self.park = self.config.min_park;
                    Some(self.park)
                } else {
                    thread::yield_now();
                    None
                }
            }
            BackoffState::Parking => {
                self.park = (self.park * 2).min(self.config.max_park);
                Some(self.park)
            }
        }
    }

    fn step_spinning(&mut self) -> Option<Duration> {
        if self.spins > self.config.max_spins {
            self.state = BackoffState::Yielding;
            self.yields = 0;
        }
        std::hint::spin_loop();
        None
    }
}

impl Default for BackoffIdleStrategy {
    fn default() -> Self {
        Self::new(IdleConfig::default())
    }
}

impl IdleStrategy for BackoffIdleStrategy {
    fn idle(&mut self, work_count: usize) {
        if work_count > 0 {
            self.reset();
            return;
        }
        if let Some(timeout) = self.step() {
            // Unparked early by AgentRunner::stop
            thread::park_timeout(timeout);
        }
    }

    fn reset(&mut self) {
        self.state = BackoffState::NotIdle;
        self.spins = 0;
        self.yields = 0;
        self.park = self.config.min_park;
    }
}

/// Dedicated thread driving one [`Agent`].
///
/// Dropping the runner stops and joins the thread.
pub struct AgentRunner {
    role: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AgentRunner {
    /// Spawn the agent thread (named `mtd-<role>`).
    pub fn start<A, I>(mut agent: A, mut idle: I) -> Result<Self>
    where
        A: Agent + 'static,
        I: IdleStrategy + 'static,
    {
        let role = agent.role_name().to_string();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let thread_role = role.clone();

        let handle = thread::Builder::new()
            .name(format!("mtd-{}", role))
            .spawn(move || {
                log::debug!("[AGENT] {} starting", thread_role);
                agent.on_start();
                while running_clone.load(Ordering::Acquire) {
                    let work = agent.do_work();
                    idle.idle(work);
                }
                agent.on_close();
                log::debug!("[AGENT] {} stopped", thread_role);
            })?;

        Ok(Self {
            role,
            running,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role
    }

    /// `true` until `stop` or until the agent thread exits.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the agent, wait for `on_close` to finish.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.thread().unpark();
        handle.join().map_err(|_| SenderError::AgentPanicked {
            role: self.role.clone(),
        })
    }
}

impl Drop for AgentRunner {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("[AGENT] {}", e);
        }
    }
}
