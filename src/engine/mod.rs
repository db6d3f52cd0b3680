//! In-memory build-configuration engine.
//!
//! The linker only talks to the engine through the pieces in this module:
//!
//! - [`ExtensionContainer`] - named extension objects
//! - [`ConfigurationContainer`] - named dependency buckets
//! - [`PassScheduler`] - structural and finalize-gated binding queues
//! - [`Project`] - the per-pass context tying them together

pub mod configurations;
pub mod extensions;
pub mod scheduler;

use std::cell::RefCell;
use std::rc::Rc;

pub use configurations::{ConfigurationContainer, DependencyBucket};
pub use extensions::ExtensionContainer;
pub use scheduler::{BindingPhase, BindingRecord, PassScheduler, ReactiveLog};

use crate::core::error::LinkResult;
use crate::core::phase::PhaseGuard;
use crate::toolchain::ToolchainPlugin;

/// Per-pass engine context for one build unit.
///
/// Nothing here is global: a new `Project` is created for every pass and
/// dropped with it.
#[derive(Debug)]
pub struct Project {
    name: String,
    guard: PhaseGuard,
    extensions: Rc<ExtensionContainer>,
    configurations: Rc<ConfigurationContainer>,
    scheduler: PassScheduler,
    plugins: RefCell<Vec<&'static str>>,
}

impl Project {
    /// Create a fresh project for one pass.
    pub fn new(name: impl Into<String>) -> Self {
        let guard = PhaseGuard::new();
        Project {
            name: name.into(),
            scheduler: PassScheduler::new(&guard),
            extensions: Rc::new(ExtensionContainer::new()),
            configurations: Rc::new(ConfigurationContainer::new()),
            plugins: RefCell::new(Vec::new()),
            guard,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phase guard shared by everything created in this pass.
    pub fn guard(&self) -> &PhaseGuard {
        &self.guard
    }

    pub fn extensions(&self) -> &Rc<ExtensionContainer> {
        &self.extensions
    }

    pub fn configurations(&self) -> &Rc<ConfigurationContainer> {
        &self.configurations
    }

    pub fn scheduler(&self) -> &PassScheduler {
        &self.scheduler
    }

    /// Queue `action` to run once the pass is closed.
    pub fn after_evaluate(
        &self,
        subject: impl Into<String>,
        action: impl FnOnce() -> LinkResult<()> + 'static,
    ) -> LinkResult<()> {
        self.scheduler.run_at_close(subject, action)
    }

    /// Apply a toolchain plugin. Applying the same plugin twice is a no-op.
    pub fn apply_plugin(&self, plugin: &dyn ToolchainPlugin) -> LinkResult<()> {
        let id = plugin.id();
        if self.has_plugin(id) {
            tracing::debug!("plugin `{}` already applied to `{}`", id, self.name);
            return Ok(());
        }
        self.guard
            .ensure_mutable(|| format!("applying plugin `{}`", id))?;
        plugin.apply(self)?;
        self.plugins.borrow_mut().push(id);
        tracing::debug!("applied plugin `{}` to `{}`", id, self.name);
        Ok(())
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.borrow().iter().any(|p| *p == id)
    }
}
