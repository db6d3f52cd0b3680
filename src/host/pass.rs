//! One configuration pass over one build unit.

use std::rc::Rc;

use crate::core::error::{LinkError, LinkResult};
use crate::core::model::DeclarativeModel;
use crate::engine::Project;
use crate::host::registry::SoftwareTypeRegistry;
use crate::host::snapshot::BoundConfiguration;

/// A configuration pass.
///
/// Owns a fresh [`Project`]; at most one model may be instantiated. The pass
/// is consumed by [`ConfigurationPass::close`].
#[derive(Debug)]
pub struct ConfigurationPass<'h> {
    registry: &'h SoftwareTypeRegistry,
    project: Project,
    model: Option<Rc<DeclarativeModel>>,
}

impl<'h> ConfigurationPass<'h> {
    pub(crate) fn new(registry: &'h SoftwareTypeRegistry, unit: &str) -> Self {
        tracing::info!("configuring `{}`", unit);
        ConfigurationPass {
            registry,
            project: Project::new(unit),
            model: None,
        }
    }

    /// Name of the build unit.
    pub fn unit(&self) -> &str {
        self.project.name()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The instantiated model, if any.
    pub fn model(&self) -> Option<&Rc<DeclarativeModel>> {
        self.model.as_ref()
    }

    /// Instantiate the model of software type `name`.
    pub fn instantiate(&mut self, name: &str) -> LinkResult<Rc<DeclarativeModel>> {
        if let Some(existing) = &self.model {
            return Err(LinkError::DuplicateBuildUnit {
                unit: self.unit().to_string(),
                existing: existing.name().to_string(),
            });
        }
        let plugin = self
            .registry
            .get(name)
            .ok_or_else(|| LinkError::UnknownSoftwareType(name.to_string()))?;

        let model = plugin.apply(&self.project)?;
        tracing::debug!("instantiated {} for `{}`", model.describe(), self.unit());
        self.model = Some(Rc::clone(&model));
        Ok(model)
    }

    /// Close the pass: run every finalize binding once and snapshot the result.
    pub fn close(self) -> LinkResult<BoundConfiguration> {
        let model = self.model.ok_or_else(|| {
            LinkError::ordering(
                format!("closing `{}` without a model", self.project.name()),
                self.project.guard().current(),
            )
        })?;

        self.project.scheduler().close()?;
        let bound = BoundConfiguration::capture(&self.project, &model)?;
        tracing::info!(
            "closed `{}`: {} compile target(s), {} binding(s)",
            bound.unit,
            bound.compile_targets.len(),
            bound.bindings.len()
        );
        Ok(bound)
    }
}
