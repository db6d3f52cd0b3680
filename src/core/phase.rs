//! Configuration pass phases.
//!
//! A pass moves strictly forward: `Configuring` while scripts and reactive
//! bindings run, `Finalizing` while the deferred queue drains, then `Closed`.
//! Every mutable piece of the model holds a [`PhaseGuard`] sharing the same
//! cell, so the model becomes read-only the moment closure begins.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{LinkError, LinkResult};

/// Phase of a single configuration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassPhase {
    /// Scripts, structural and reactive bindings are running.
    #[default]
    Configuring,
    /// The finalize-gated queue is draining.
    Finalizing,
    /// The pass is over.
    Closed,
}

impl fmt::Display for PassPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassPhase::Configuring => write!(f, "configuring"),
            PassPhase::Finalizing => write!(f, "finalizing"),
            PassPhase::Closed => write!(f, "closed"),
        }
    }
}

/// Shared handle on the phase of one pass.
#[derive(Debug, Clone, Default)]
pub struct PhaseGuard {
    phase: Rc<Cell<PassPhase>>,
}

impl PhaseGuard {
    /// Create a guard for a fresh pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn current(&self) -> PassPhase {
        self.phase.get()
    }

    /// Move the pass forward. Phases never go backwards.
    pub(crate) fn advance(&self, to: PassPhase) {
        if to > self.phase.get() {
            tracing::debug!("pass phase: {} -> {}", self.phase.get(), to);
            self.phase.set(to);
        }
    }

    /// Fail unless the model may still be mutated.
    pub fn ensure_mutable(&self, operation: impl FnOnce() -> String) -> LinkResult<()> {
        match self.current() {
            PassPhase::Configuring => Ok(()),
            phase => Err(LinkError::ordering(operation(), phase)),
        }
    }

    /// Fail unless closure has begun, i.e. final values are observable.
    pub fn ensure_finalized(&self, operation: impl FnOnce() -> String) -> LinkResult<()> {
        match self.current() {
            PassPhase::Configuring => Err(LinkError::ordering(operation(), PassPhase::Configuring)),
            _ => Ok(()),
        }
    }

    /// Whether two guards observe the same pass.
    pub fn same_pass(&self, other: &PhaseGuard) -> bool {
        Rc::ptr_eq(&self.phase, &other.phase)
    }
}
