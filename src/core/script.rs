//! TOML build scripts.
//!
//! A build script holds one table named after a software type:
//!
//! ```toml
//! [kotlinLibrary]
//! languageVersion = "2.0"
//!
//! [kotlinLibrary.dependencies]
//! implementation = ["org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0"]
//!
//! [[kotlinLibrary.targets]]
//! name = "jvm"
//! kind = "jvm"
//! languageVersion = 17
//! ```
//!
//! Applying a script instantiates the model on a [`ConfigurationPass`] and
//! mutates it the way a hand-written configuration block would.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use miette::{NamedSource, SourceSpan};
use serde::Deserialize;

use crate::core::dependency::{DependencyScopes, ScopeName};
use crate::core::error::{LinkError, LinkResult};
use crate::core::model::DeclarativeModel;
use crate::core::property::LazyProperty;
use crate::core::target::{ScriptEnvironment, Target, TargetKind};
use crate::host::ConfigurationPass;
use crate::util::diagnostic::{suggestions, ScriptError};

/// A parsed build script.
#[derive(Debug, Clone)]
pub struct BuildScript {
    software_type: String,
    model: RawModel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawModel {
    language_version: Option<String>,
    #[serde(default)]
    dependencies: RawDependencies,
    #[serde(default)]
    targets: Vec<RawTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDependencies {
    #[serde(default)]
    api: Vec<String>,
    #[serde(default)]
    implementation: Vec<String>,
    #[serde(default)]
    compile_only: Vec<String>,
    #[serde(default)]
    runtime_only: Vec<String>,
}

impl RawDependencies {
    fn is_empty(&self) -> bool {
        self.iter().all(|(_, notations)| notations.is_empty())
    }

    fn iter(&self) -> impl Iterator<Item = (ScopeName, &[String])> + '_ {
        [
            (ScopeName::Api, self.api.as_slice()),
            (ScopeName::Implementation, self.implementation.as_slice()),
            (ScopeName::CompileOnly, self.compile_only.as_slice()),
            (ScopeName::RuntimeOnly, self.runtime_only.as_slice()),
        ]
        .into_iter()
    }

    fn apply(&self, scopes: &DependencyScopes) -> LinkResult<()> {
        for (scope, notations) in self.iter().filter(|(_, n)| !n.is_empty()) {
            let collector = scopes.scope(scope)?;
            for notation in notations {
                collector.add_notation(notation)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTarget {
    name: String,
    kind: TargetKind,
    language_version: Option<u32>,
    main_class: Option<String>,
    environment: Option<ScriptEnvironment>,
    entry_point: Option<String>,
    #[serde(default)]
    dependencies: RawDependencies,
}

impl RawTarget {
    fn configure(&self, target: &Target) -> LinkResult<()> {
        set_if_some(target, "languageVersion", target.language_version(), &self.language_version)?;
        set_if_some(target, "mainClass", target.main_class(), &self.main_class)?;
        set_if_some(target, "environment", target.environment(), &self.environment)?;
        set_if_some(target, "entryPoint", target.entry_point(), &self.entry_point)?;

        if self.dependencies.is_empty() {
            return Ok(());
        }
        match target.dependencies() {
            Some(scopes) => self.dependencies.apply(scopes),
            None => Err(LinkError::InvalidScopeWiring {
                scope: "dependencies".to_string(),
                owner: target.describe(),
                reason: "application targets use the model's dependencies".to_string(),
            }),
        }
    }
}

fn set_if_some<T: Clone>(
    target: &Target,
    name: &str,
    property: Option<&LazyProperty<T>>,
    value: &Option<T>,
) -> LinkResult<()> {
    let Some(value) = value else {
        return Ok(());
    };
    match property {
        Some(property) => property.set(value.clone()),
        None => Err(LinkError::UnsupportedProperty {
            property: name.to_string(),
            owner: target.describe(),
        }),
    }
}

impl BuildScript {
    /// Load a build script from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build script: {}", path.display()))?;

        Self::parse(&content, &path.display().to_string())
            .with_context(|| format!("failed to parse build script: {}", path.display()))
    }

    /// Parse build script content; `name` labels the source in diagnostics.
    pub fn parse(content: &str, name: &str) -> std::result::Result<Self, ScriptError> {
        let error = |message: String, span: Option<SourceSpan>| ScriptError {
            message,
            src: NamedSource::new(name, content.to_string()),
            span,
        };

        let raw: BTreeMap<String, RawModel> = toml::from_str(content)
            .map_err(|e| error(e.message().to_string(), e.span().map(SourceSpan::from)))?;

        let mut tables = raw.into_iter();
        let (software_type, model) = tables.next().ok_or_else(|| {
            error(
                format!("no software type declared ({})", suggestions::NO_SOFTWARE_TYPE),
                None,
            )
        })?;
        if let Some((extra, _)) = tables.next() {
            return Err(error(
                format!(
                    "a build unit declares one software type, found `{}` and `{}`",
                    software_type, extra
                ),
                None,
            ));
        }

        Ok(BuildScript {
            software_type,
            model,
        })
    }

    /// Software type the script configures.
    pub fn software_type(&self) -> &str {
        &self.software_type
    }

    /// Names of the targets the script declares, in order.
    pub fn target_names(&self) -> Vec<&str> {
        self.model.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Instantiate the model on `pass` and configure it.
    pub fn apply(&self, pass: &mut ConfigurationPass<'_>) -> LinkResult<Rc<DeclarativeModel>> {
        let model = pass.instantiate(&self.software_type)?;

        if let Some(version) = &self.model.language_version {
            model.language_version().set(version.clone())?;
        }
        self.model.dependencies.apply(model.dependencies())?;

        for raw in &self.model.targets {
            let target = model
                .targets()
                .get_or_create_with(&raw.name, raw.kind, |target| raw.configure(target))?;
            tracing::debug!("script declared {}", target.describe());
        }
        Ok(model)
    }
}
