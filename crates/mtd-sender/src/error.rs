// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the sender engine.

use crate::engine::command::SenderCmd;
use std::fmt;
use std::io;

/// Errors surfaced by the sender, its proxy and its runner.
///
/// Collaborator failures inside `send` or `poll_transports` never show up
/// here: those are opaque byte/event counts by contract.
#[derive(Debug)]
pub enum SenderError {
    /// The same registration id was added twice.
    DuplicatePublication { registration_id: i64 },
    /// The command queue had no free slot; the rejected command is handed back.
    QueueFull { command: SenderCmd },
    /// The agent thread panicked while running duty cycles.
    AgentPanicked { role: String },
    /// Socket or poller level failure.
    Io(io::Error),
}

impl fmt::Display for SenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderError::DuplicatePublication { registration_id } => {
                write!(f, "Publication already scheduled: registration_id={}", registration_id)
            }
            SenderError::QueueFull { command } => {
                write!(f, "Sender command queue full, rejected {}", command.name())
            }
            SenderError::AgentPanicked { role } => write!(f, "Agent thread panicked: {}", role),
            SenderError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SenderError {
    fn from(e: io::Error) -> Self {
        SenderError::Io(e)
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SenderError>;
