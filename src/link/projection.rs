//! Projection of declarative dependency scopes onto engine buckets.
//!
//! Projection never copies dependencies. Each collector is registered as a
//! lazy source of its bucket, so declarations made after the projection are
//! still visible when the bucket is read.

use std::rc::Rc;

use crate::core::dependency::{DependencyCollector, DependencyScopes, ScopeName};
use crate::core::error::{LinkError, LinkResult};
use crate::core::model::ModelKind;
use crate::engine::ConfigurationContainer;
use crate::link::naming::SourceSetNames;

/// Wires dependency collectors into the buckets of one project.
#[derive(Debug, Clone)]
pub struct DependencyProjection {
    configurations: Rc<ConfigurationContainer>,
    model: ModelKind,
}

impl DependencyProjection {
    pub fn new(configurations: Rc<ConfigurationContainer>, model: ModelKind) -> Self {
        DependencyProjection {
            configurations,
            model,
        }
    }

    /// Project every scope `scopes` has onto the buckets named by `names`.
    pub fn project(&self, scopes: &DependencyScopes, names: &SourceSetNames) -> LinkResult<()> {
        for collector in scopes.iter() {
            self.project_scope(collector, names)?;
        }
        Ok(())
    }

    /// Project a single scope.
    ///
    /// Re-projecting the same collector onto the same bucket does nothing.
    pub fn project_scope(
        &self,
        collector: &DependencyCollector,
        names: &SourceSetNames,
    ) -> LinkResult<()> {
        let scope = collector.scope();
        if scope == ScopeName::Api && !self.model.supports_api() {
            return Err(LinkError::InvalidScopeWiring {
                scope: scope.to_string(),
                owner: collector.owner().to_string(),
                reason: format!("{} models do not publish an api", self.model),
            });
        }

        let bucket = self.configurations.get_by_name(names.bucket(scope))?;
        if bucket.add_all_later(collector) {
            tracing::debug!(
                "projected {} of {} onto `{}`",
                scope,
                collector.owner(),
                bucket.name()
            );
        }
        Ok(())
    }
}
