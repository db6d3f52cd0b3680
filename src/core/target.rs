//! Target definitions - named compile destinations of a model.
//!
//! A Target is one of three kinds: JVM, script-engine (JS) or native. Each
//! kind carries its own lazy properties. Library targets own dependency
//! scopes; application targets inherit the model's.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::collection::Variant;
use crate::core::dependency::DependencyScopes;
use crate::core::model::ModelKind;
use crate::core::phase::PhaseGuard;
use crate::core::property::LazyProperty;

/// The kind of compile destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// JVM bytecode
    Jvm,

    /// Script engine (Node.js or browser)
    #[serde(alias = "js")]
    Script,

    /// Native executable or library
    Native,
}

impl TargetKind {
    /// Directory name used for the target's source root.
    pub fn source_dir(&self) -> &'static str {
        match self {
            TargetKind::Jvm => "kotlin",
            TargetKind::Script => "js",
            TargetKind::Native => "native",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Jvm => write!(f, "jvm"),
            TargetKind::Script => write!(f, "script"),
            TargetKind::Native => write!(f, "native"),
        }
    }
}

/// Where a script target runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEnvironment {
    #[serde(alias = "nodejs")]
    Node,
    Browser,
}

impl fmt::Display for ScriptEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptEnvironment::Node => write!(f, "node"),
            ScriptEnvironment::Browser => write!(f, "browser"),
        }
    }
}

/// Kind-specific target properties.
#[derive(Debug, Clone)]
pub enum TargetSettings {
    Jvm {
        /// JVM bytecode level, e.g. 17
        language_version: LazyProperty<u32>,
        /// Main class used by the run configuration
        main_class: LazyProperty<String>,
    },
    Script {
        environment: LazyProperty<ScriptEnvironment>,
    },
    Native {
        entry_point: LazyProperty<String>,
    },
}

/// A named compile destination.
#[derive(Debug)]
pub struct Target {
    name: String,
    kind: TargetKind,
    settings: TargetSettings,
    dependencies: Option<DependencyScopes>,
}

impl Target {
    /// Create a target of `kind` for a model of `model` kind.
    pub fn new(name: &str, kind: TargetKind, model: ModelKind, guard: &PhaseGuard) -> Self {
        let owner = format!("{} target `{}`", kind, name);
        let settings = match kind {
            TargetKind::Jvm => TargetSettings::Jvm {
                language_version: LazyProperty::new(&owner, "languageVersion", guard),
                main_class: LazyProperty::new(&owner, "mainClass", guard),
            },
            TargetKind::Script => TargetSettings::Script {
                environment: LazyProperty::new(&owner, "environment", guard),
            },
            TargetKind::Native => TargetSettings::Native {
                entry_point: LazyProperty::new(&owner, "entryPoint", guard),
            },
        };
        let dependencies = match model {
            ModelKind::Library => Some(DependencyScopes::library(owner, guard)),
            ModelKind::Application => None,
        };

        Target {
            name: name.to_string(),
            kind,
            settings,
            dependencies,
        }
    }

    pub fn settings(&self) -> &TargetSettings {
        &self.settings
    }

    /// Own dependency scopes; `None` when the target inherits the model's.
    pub fn dependencies(&self) -> Option<&DependencyScopes> {
        self.dependencies.as_ref()
    }

    /// JVM bytecode level (JVM targets only).
    pub fn language_version(&self) -> Option<&LazyProperty<u32>> {
        match &self.settings {
            TargetSettings::Jvm {
                language_version, ..
            } => Some(language_version),
            _ => None,
        }
    }

    /// Run configuration main class (JVM targets only).
    pub fn main_class(&self) -> Option<&LazyProperty<String>> {
        match &self.settings {
            TargetSettings::Jvm { main_class, .. } => Some(main_class),
            _ => None,
        }
    }

    /// Script environment (script targets only).
    pub fn environment(&self) -> Option<&LazyProperty<ScriptEnvironment>> {
        match &self.settings {
            TargetSettings::Script { environment } => Some(environment),
            _ => None,
        }
    }

    /// Native entry point (native targets only).
    pub fn entry_point(&self) -> Option<&LazyProperty<String>> {
        match &self.settings {
            TargetSettings::Native { entry_point } => Some(entry_point),
            _ => None,
        }
    }

    /// Human-readable description, e.g. "jvm target `main`".
    pub fn describe(&self) -> String {
        format!("{} target `{}`", self.kind, self.name)
    }
}

impl Variant for Target {
    type Kind = TargetKind;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TargetKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_specific_properties() {
        let guard = PhaseGuard::new();
        let jvm = Target::new("main", TargetKind::Jvm, ModelKind::Library, &guard);
        assert!(jvm.language_version().is_some());
        assert!(jvm.main_class().is_some());
        assert!(jvm.environment().is_none());
        assert!(jvm.entry_point().is_none());

        let native = Target::new("main", TargetKind::Native, ModelKind::Application, &guard);
        let entry = native.entry_point().unwrap();
        assert_eq!(entry.name(), "entryPoint");
        assert_eq!(entry.owner(), "native target `main`");
    }

    #[test]
    fn test_library_targets_own_scopes() {
        let guard = PhaseGuard::new();
        let lib = Target::new("browser", TargetKind::Script, ModelKind::Library, &guard);
        let app = Target::new("browser", TargetKind::Script, ModelKind::Application, &guard);

        assert!(lib.dependencies().unwrap().api().is_ok());
        assert!(app.dependencies().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TargetKind::Script.to_string(), "script");
        assert_eq!(TargetKind::Native.source_dir(), "native");
        let kind: TargetKind = serde_json::from_str("\"js\"").unwrap();
        assert_eq!(kind, TargetKind::Script);
        let env: ScriptEnvironment = serde_json::from_str("\"nodejs\"").unwrap();
        assert_eq!(env, ScriptEnvironment::Node);
    }
}
