// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{QuireError, Result};

/// Stages every pipeline operation moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No operation running.
    Idle,
    /// Checking inputs before any work starts.
    Validating,
    /// Working through units (pages or images).
    Processing { completed: u32, total: u32 },
    /// Finished with a payload.
    Succeeded,
    /// Finished with an error.
    Failed,
}

/// Shared progress handle, observable from outside an operation.
///
/// Cloning shares the underlying phase.
#[derive(Debug, Clone)]
pub struct Progress {
    phase: Arc<Mutex<Phase>>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(Phase::Idle)),
        }
    }

    /// Current phase (`Idle` if the lock is poisoned).
    pub fn phase(&self) -> Phase {
        self.phase.lock().map(|p| *p).unwrap_or(Phase::Idle)
    }

    pub fn set(&self, phase: Phase) {
        if let Ok(mut p) = self.phase.lock() {
            *p = phase;
        }
    }

    /// Record `completed` finished units out of `total`.
    pub fn advance(&self, completed: u32, total: u32) {
        self.set(Phase::Processing { completed, total });
    }

    /// Run one operation through the phase lifecycle: `Validating` on
    /// entry, then `Succeeded` or `Failed` to match the outcome.
    pub fn track<T, E, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.set(Phase::Validating);
        match op() {
            Ok(value) => {
                self.set(Phase::Succeeded);
                Ok(value)
            }
            Err(err) => {
                self.set(Phase::Failed);
                Err(err)
            }
        }
    }
}

/// Cooperative cancellation token, checked between page iterations.
///
/// Cloning shares the underlying flag, so a host can hand one clone to an
/// operation and keep another to cancel from the outside.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fail with [`QuireError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(QuireError::Cancelled)
        } else {
            Ok(())
        }
    }
}
