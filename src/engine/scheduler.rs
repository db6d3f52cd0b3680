//! Two-queue pass scheduler.
//!
//! `run_now` executes a binding immediately; `run_at_close` queues it until
//! the host closes the pass. `close` drains the queue exactly once, in
//! registration order, with the pass phase set to `Finalizing` so the model
//! is read-only while deferred bindings run.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::core::error::LinkResult;
use crate::core::phase::{PassPhase, PhaseGuard};

/// When a binding runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingPhase {
    /// Immediately, at model creation.
    Structural,
    /// Whenever a matching target is added.
    Reactive,
    /// Once, after the pass is closed.
    Finalize,
}

impl fmt::Display for BindingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingPhase::Structural => write!(f, "structural"),
            BindingPhase::Reactive => write!(f, "reactive"),
            BindingPhase::Finalize => write!(f, "finalize"),
        }
    }
}

/// A binding that has executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRecord {
    pub phase: BindingPhase,
    pub subject: String,
}

/// Handle for recording reactive bindings from inside observer callbacks.
///
/// Holds only the history, so callbacks can keep it without keeping the
/// scheduler alive.
#[derive(Debug, Clone)]
pub struct ReactiveLog {
    history: Rc<RefCell<Vec<BindingRecord>>>,
}

impl ReactiveLog {
    pub fn record(&self, subject: impl Into<String>) {
        push_record(&self.history, BindingPhase::Reactive, subject.into());
    }
}

fn push_record(history: &RefCell<Vec<BindingRecord>>, phase: BindingPhase, subject: String) {
    tracing::debug!("{} binding `{}`", phase, subject);
    history.borrow_mut().push(BindingRecord { phase, subject });
}

type Action = Box<dyn FnOnce() -> LinkResult<()>>;

struct Deferred {
    subject: String,
    action: Action,
}

/// Scheduler for one configuration pass.
pub struct PassScheduler {
    guard: PhaseGuard,
    deferred: RefCell<VecDeque<Deferred>>,
    history: Rc<RefCell<Vec<BindingRecord>>>,
}

impl PassScheduler {
    pub fn new(guard: &PhaseGuard) -> Self {
        PassScheduler {
            guard: guard.clone(),
            deferred: RefCell::new(VecDeque::new()),
            history: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Execute a structural binding now.
    pub fn run_now(
        &self,
        subject: impl Into<String>,
        action: impl FnOnce() -> LinkResult<()>,
    ) -> LinkResult<()> {
        let subject = subject.into();
        self.guard
            .ensure_mutable(|| format!("structural binding `{}`", subject))?;
        action()?;
        self.record(BindingPhase::Structural, subject);
        Ok(())
    }

    /// Queue a finalize-gated binding.
    pub fn run_at_close(
        &self,
        subject: impl Into<String>,
        action: impl FnOnce() -> LinkResult<()> + 'static,
    ) -> LinkResult<()> {
        let subject = subject.into();
        self.guard
            .ensure_mutable(|| format!("queueing finalize binding `{}`", subject))?;
        tracing::debug!("queued finalize binding `{}`", subject);
        self.deferred.borrow_mut().push_back(Deferred {
            subject,
            action: Box::new(action),
        });
        Ok(())
    }

    /// Note that a reactive binding ran.
    pub fn record_reactive(&self, subject: impl Into<String>) {
        self.record(BindingPhase::Reactive, subject.into());
    }

    /// Handle for recording reactive bindings later.
    pub fn reactive_log(&self) -> ReactiveLog {
        ReactiveLog {
            history: Rc::clone(&self.history),
        }
    }

    fn record(&self, phase: BindingPhase, subject: String) {
        push_record(&self.history, phase, subject);
    }

    /// Close the pass: drain the finalize queue in registration order.
    ///
    /// The first failing binding aborts the pass; the rest are dropped.
    pub fn close(&self) -> LinkResult<()> {
        self.guard.ensure_mutable(|| "closing the pass".to_string())?;
        self.guard.advance(PassPhase::Finalizing);

        let result = loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some(Deferred { subject, action }) = next else {
                break Ok(());
            };
            if let Err(err) = action() {
                tracing::debug!("finalize binding `{}` failed: {}", subject, err);
                break Err(err);
            }
            self.record(BindingPhase::Finalize, subject);
        };

        self.deferred.borrow_mut().clear();
        self.guard.advance(PassPhase::Closed);
        result
    }

    /// Number of finalize bindings still queued.
    pub fn pending(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Every binding executed so far, in execution order.
    pub fn history(&self) -> Vec<BindingRecord> {
        self.history.borrow().clone()
    }

    pub fn phase(&self) -> PassPhase {
        self.guard.current()
    }
}

impl fmt::Debug for PassScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassScheduler")
            .field("phase", &self.guard.current())
            .field("pending", &self.pending())
            .field("executed", &self.history.borrow().len())
            .finish()
    }
}
