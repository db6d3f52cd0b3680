//! Bound configuration - what the engine looks like after a closed pass.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::dependency::{Dependency, ScopeName};
use crate::core::error::LinkResult;
use crate::core::model::{DeclarativeModel, ModelKind};
use crate::core::target::ScriptEnvironment;
use crate::engine::{BindingRecord, Project};
use crate::toolchain::{CompileTarget, MultiplatformExtension, Platform, SourceSet};

/// Snapshot of one closed configuration pass.
#[derive(Debug, Clone, Serialize)]
pub struct BoundConfiguration {
    /// Build unit the pass configured
    pub unit: String,

    /// Software type of the model
    pub software_type: String,

    pub model: ModelKind,

    /// Every bucket, in creation order
    pub buckets: Vec<BoundBucket>,

    /// Every compile target, in declaration order
    pub compile_targets: Vec<BoundCompileTarget>,

    pub source_sets: Vec<BoundSourceSet>,

    /// Bindings in execution order
    pub bindings: Vec<BindingRecord>,
}

/// A bucket and its own dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct BoundBucket {
    pub name: String,
    pub extends: Vec<String>,
    pub dependencies: Vec<Dependency>,
}

/// A compile target with its options and effective dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct BoundCompileTarget {
    pub name: String,
    pub platform: Platform,
    pub source_set: String,
    pub jvm_target: Option<u32>,
    pub main_class: Option<String>,
    pub environment: Option<ScriptEnvironment>,
    pub entry_point: Option<String>,

    /// Dependencies per scope, including everything inherited from `commonMain`
    pub dependencies: BTreeMap<ScopeName, Vec<Dependency>>,
}

/// Source set language settings after finalization.
#[derive(Debug, Clone, Serialize)]
pub struct BoundSourceSet {
    pub id: String,
    pub source_root: String,
    pub language_version: Option<String>,
    pub api_version: Option<String>,
}

impl BoundConfiguration {
    /// Capture the state of a closed `project`.
    pub(crate) fn capture(project: &Project, model: &DeclarativeModel) -> LinkResult<Self> {
        let kotlin = project.extensions().get_by_type::<MultiplatformExtension>()?;

        let buckets = project
            .configurations()
            .all()
            .iter()
            .map(|bucket| BoundBucket {
                name: bucket.name().to_string(),
                extends: bucket.parents(),
                dependencies: bucket.dependencies(),
            })
            .collect();

        let compile_targets = kotlin
            .targets()
            .iter()
            .map(|target| bind_compile_target(project, target))
            .collect::<LinkResult<Vec<_>>>()?;

        let source_sets = kotlin.source_sets().iter().map(|set| bind_source_set(set)).collect();

        Ok(BoundConfiguration {
            unit: project.name().to_string(),
            software_type: model.name().to_string(),
            model: model.kind(),
            buckets,
            compile_targets,
            source_sets,
            bindings: project.scheduler().history(),
        })
    }

    pub fn bucket(&self, name: &str) -> Option<&BoundBucket> {
        self.buckets.iter().find(|bucket| bucket.name == name)
    }

    pub fn compile_target(&self, name: &str) -> Option<&BoundCompileTarget> {
        self.compile_targets.iter().find(|target| target.name == name)
    }

    pub fn source_set(&self, id: &str) -> Option<&BoundSourceSet> {
        self.source_sets.iter().find(|set| set.id == id)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl BoundCompileTarget {
    /// Effective dependencies of `scope`.
    pub fn dependencies_of(&self, scope: ScopeName) -> &[Dependency] {
        self.dependencies
            .get(&scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn bind_compile_target(
    project: &Project,
    target: &CompileTarget,
) -> LinkResult<BoundCompileTarget> {
    let source_set = target.source_set();
    let mut dependencies = BTreeMap::new();
    for scope in ScopeName::ALL {
        let bucket = project
            .configurations()
            .get_by_name(source_set.bucket_name(scope))?;
        dependencies.insert(scope, bucket.all_dependencies());
    }

    Ok(BoundCompileTarget {
        name: target.name().to_string(),
        platform: target.platform().clone(),
        source_set: source_set.id().to_string(),
        jvm_target: target.jvm_target().get(),
        main_class: target.main_class().get(),
        environment: target.environment(),
        entry_point: target.entry_point(),
        dependencies,
    })
}

fn bind_source_set(source_set: &SourceSet) -> BoundSourceSet {
    let settings = source_set.settings();
    BoundSourceSet {
        id: source_set.id().to_string(),
        source_root: source_set.names().source_root.clone(),
        language_version: settings.language_version,
        api_version: settings.api_version,
    }
}
