//! Composition host - drives configuration passes.
//!
//! The host knows which software types exist and hands out one
//! [`ConfigurationPass`] per build unit. Nothing outlives a pass except the
//! [`BoundConfiguration`] it produces.

pub mod pass;
pub mod registry;
pub mod snapshot;

pub use pass::ConfigurationPass;
pub use registry::SoftwareTypeRegistry;
pub use snapshot::{BoundBucket, BoundCompileTarget, BoundConfiguration, BoundSourceSet};

use crate::util::config::Config;

/// Entry point for configuring build units.
#[derive(Debug)]
pub struct CompositionHost {
    registry: SoftwareTypeRegistry,
    config: Config,
}

impl CompositionHost {
    /// Host with the built-in software types, configured by `config`.
    pub fn new(config: Config) -> Self {
        CompositionHost {
            registry: SoftwareTypeRegistry::with_builtins(&config.toolchain),
            config,
        }
    }

    /// Host with a custom registry.
    pub fn with_registry(registry: SoftwareTypeRegistry, config: Config) -> Self {
        CompositionHost { registry, config }
    }

    pub fn registry(&self) -> &SoftwareTypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SoftwareTypeRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a pass for build unit `unit`.
    pub fn begin_pass(&self, unit: &str) -> ConfigurationPass<'_> {
        ConfigurationPass::new(&self.registry, unit)
    }
}

impl Default for CompositionHost {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
