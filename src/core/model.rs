//! The declarative model tree.
//!
//! One [`DeclarativeModel`] exists per build unit per pass. Its shape is
//! fixed by the [`SoftwareType`] that created it.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::collection::VariantCollection;
use crate::core::dependency::DependencyScopes;
use crate::core::error::LinkResult;
use crate::core::phase::PhaseGuard;
use crate::core::property::LazyProperty;
use crate::core::target::{Target, TargetKind};

/// Application or library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Application,
    Library,
}

impl ModelKind {
    /// Whether the `api` scope means anything for this kind.
    pub fn supports_api(&self) -> bool {
        matches!(self, ModelKind::Library)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Application => write!(f, "application"),
            ModelKind::Library => write!(f, "library"),
        }
    }
}

/// A discoverable, named model exposed by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftwareType {
    name: String,
    model: ModelKind,
}

impl SoftwareType {
    pub fn new(name: impl Into<String>, model: ModelKind) -> Self {
        SoftwareType {
            name: name.into(),
            model,
        }
    }

    /// Extension name, e.g. `kotlinLibrary`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of model this type exposes.
    pub fn model(&self) -> ModelKind {
        self.model
    }
}

/// Root model of a build unit.
#[derive(Debug)]
pub struct DeclarativeModel {
    name: String,
    kind: ModelKind,
    language_version: LazyProperty<String>,
    dependencies: DependencyScopes,
    targets: VariantCollection<Target>,
}

impl DeclarativeModel {
    /// Create an empty model for one pass.
    pub fn new(name: impl Into<String>, kind: ModelKind, guard: &PhaseGuard) -> Self {
        let name = name.into();
        let owner = format!("{} `{}`", kind, name);
        let dependencies = match kind {
            ModelKind::Library => DependencyScopes::library(&owner, guard),
            ModelKind::Application => DependencyScopes::application(&owner, guard),
        };
        let target_guard = guard.clone();
        let targets = VariantCollection::<Target>::new(
            format!("targets of {}", owner),
            guard,
            move |target_name: &str, target_kind: TargetKind| {
                Target::new(target_name, target_kind, kind, &target_guard)
            },
        );

        DeclarativeModel {
            language_version: LazyProperty::new(&owner, "languageVersion", guard),
            name,
            kind,
            dependencies,
            targets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Language version applied to every source set, e.g. "2.0".
    pub fn language_version(&self) -> &LazyProperty<String> {
        &self.language_version
    }

    /// Root dependency scopes.
    pub fn dependencies(&self) -> &DependencyScopes {
        &self.dependencies
    }

    pub fn targets(&self) -> &VariantCollection<Target> {
        &self.targets
    }

    /// Get or create the JVM target `name`.
    pub fn jvm(&self, name: &str) -> LinkResult<Rc<Target>> {
        self.targets.get_or_create(name, TargetKind::Jvm)
    }

    /// Get or create the script target `name`.
    pub fn script(&self, name: &str) -> LinkResult<Rc<Target>> {
        self.targets.get_or_create(name, TargetKind::Script)
    }

    /// Get or create the native target `name`.
    pub fn native(&self, name: &str) -> LinkResult<Rc<Target>> {
        self.targets.get_or_create(name, TargetKind::Native)
    }

    /// Human-readable description, e.g. "library `kotlinLibrary`".
    pub fn describe(&self) -> String {
        format!("{} `{}`", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::Variant;
    use crate::core::dependency::ScopeName;
    use crate::core::error::LinkError;

    #[test]
    fn test_library_model_shape() {
        let guard = PhaseGuard::new();
        let model = DeclarativeModel::new("kotlinLibrary", ModelKind::Library, &guard);
        assert!(model.dependencies().supports(ScopeName::Api));
        assert_eq!(model.language_version().owner(), "library `kotlinLibrary`");
        assert!(model.targets().is_empty());
    }

    #[test]
    fn test_targets_and_properties_in_any_order() {
        let guard = PhaseGuard::new();
        let model = DeclarativeModel::new("kotlinApplication", ModelKind::Application, &guard);

        let native = model.native("main").unwrap();
        model.language_version().set("2.0".into()).unwrap();
        native.entry_point().unwrap().set("app.main".into()).unwrap();
        let jvm = model.jvm("desktop").unwrap();

        assert_eq!(model.targets().names(), vec!["main", "desktop"]);
        assert_eq!(jvm.kind(), TargetKind::Jvm);
        assert!(jvm.dependencies().is_none());
        assert_eq!(
            native.entry_point().unwrap().get().as_deref(),
            Some("app.main")
        );
    }

    #[test]
    fn test_colliding_target_kinds() {
        let guard = PhaseGuard::new();
        let model = DeclarativeModel::new("kotlinLibrary", ModelKind::Library, &guard);
        model.jvm("main").unwrap();
        assert!(matches!(
            model.script("main"),
            Err(LinkError::NamingCollision { .. })
        ));
    }
}
