//! Software type registry - the plugins a host can instantiate models from.
//!
//! Registration never fails: registering a name twice replaces the earlier
//! plugin.

use std::fmt;

use crate::link::{ApplicationPlugin, LibraryPlugin, SoftwareTypePlugin};
use crate::util::config::ToolchainSettings;

/// Registry of software type plugins, keyed by software type name.
#[derive(Default)]
pub struct SoftwareTypeRegistry {
    plugins: Vec<Box<dyn SoftwareTypePlugin>>,
}

impl SoftwareTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in application and library types.
    pub fn with_builtins(settings: &ToolchainSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ApplicationPlugin::new(settings.clone())));
        registry.register(Box::new(LibraryPlugin::new(settings.clone())));
        registry
    }

    /// Register a plugin.
    pub fn register(&mut self, plugin: Box<dyn SoftwareTypePlugin>) {
        let name = plugin.software_type().name().to_string();
        match self
            .plugins
            .iter()
            .position(|p| p.software_type().name() == name)
        {
            Some(index) => {
                tracing::debug!("replacing software type `{}`", name);
                self.plugins[index] = plugin;
            }
            None => {
                tracing::debug!("registered software type `{}`", name);
                self.plugins.push(plugin);
            }
        }
    }

    /// Get the plugin for a software type.
    pub fn get(&self, name: &str) -> Option<&dyn SoftwareTypePlugin> {
        self.plugins
            .iter()
            .find(|p| p.software_type().name() == name)
            .map(|p| p.as_ref())
    }

    /// Registered software type names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.plugins
            .iter()
            .map(|p| p.software_type().name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl fmt::Debug for SoftwareTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareTypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
