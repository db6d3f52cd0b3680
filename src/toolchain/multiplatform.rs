//! Multiplatform toolchain plugin.
//!
//! Registers the `kotlin` extension, which owns compile targets and their
//! source sets. Every source set gets one bucket per dependency scope, and
//! each target bucket extends the matching `commonMain` bucket, so common
//! dependencies are visible to every target.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::core::dependency::ScopeName;
use crate::core::error::{LinkError, LinkResult};
use crate::core::phase::PhaseGuard;
use crate::core::property::LazyProperty;
use crate::core::target::{ScriptEnvironment, TargetKind};
use crate::engine::{ConfigurationContainer, Project};
use crate::link::naming::{self, SourceSetNames};
use crate::toolchain::ToolchainPlugin;

/// Native preset used when none is configured.
pub const DEFAULT_NATIVE_PRESET: &str = "macosArm64";

/// Compilation platform of a compile target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Platform {
    Jvm,
    Js,
    Native { preset: String },
}

impl Platform {
    /// Model target kind this platform compiles.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            Platform::Jvm => TargetKind::Jvm,
            Platform::Js => TargetKind::Script,
            Platform::Native { .. } => TargetKind::Native,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Jvm => write!(f, "jvm"),
            Platform::Js => write!(f, "js"),
            Platform::Native { preset } => write!(f, "native ({})", preset),
        }
    }
}

/// Language settings of a source set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSettings {
    pub language_version: Option<String>,
    pub api_version: Option<String>,
}

/// A source set and the names of its buckets.
#[derive(Debug)]
pub struct SourceSet {
    names: SourceSetNames,
    language_settings: RefCell<LanguageSettings>,
}

impl SourceSet {
    pub fn id(&self) -> &str {
        &self.names.id
    }

    pub fn names(&self) -> &SourceSetNames {
        &self.names
    }

    /// Bucket name for `scope`.
    pub fn bucket_name(&self, scope: ScopeName) -> &str {
        self.names.bucket(scope)
    }

    /// Configure the language settings.
    pub fn language_settings(&self, configure: impl FnOnce(&mut LanguageSettings)) {
        configure(&mut self.language_settings.borrow_mut());
    }

    /// Current language settings.
    pub fn settings(&self) -> LanguageSettings {
        self.language_settings.borrow().clone()
    }
}

/// A compile target declared on the toolchain.
#[derive(Debug)]
pub struct CompileTarget {
    name: String,
    platform: Platform,
    source_set: Rc<SourceSet>,
    jvm_target: LazyProperty<u32>,
    main_class: LazyProperty<String>,
    environment: RefCell<Option<ScriptEnvironment>>,
    entry_point: RefCell<Option<String>>,
}

impl CompileTarget {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Default source set of the `main` compilation.
    pub fn source_set(&self) -> &Rc<SourceSet> {
        &self.source_set
    }

    /// Bytecode level compiler option (JVM).
    pub fn jvm_target(&self) -> &LazyProperty<u32> {
        &self.jvm_target
    }

    /// Run configuration main class (JVM).
    pub fn main_class(&self) -> &LazyProperty<String> {
        &self.main_class
    }

    /// Run on Node.js (JS).
    pub fn nodejs(&self) {
        *self.environment.borrow_mut() = Some(ScriptEnvironment::Node);
    }

    /// Run in a browser (JS).
    pub fn browser(&self) {
        *self.environment.borrow_mut() = Some(ScriptEnvironment::Browser);
    }

    pub fn environment(&self) -> Option<ScriptEnvironment> {
        *self.environment.borrow()
    }

    /// Build an executable binary starting at `entry_point` (native).
    pub fn executable(&self, entry_point: &str) {
        *self.entry_point.borrow_mut() = Some(entry_point.to_string());
    }

    pub fn entry_point(&self) -> Option<String> {
        self.entry_point.borrow().clone()
    }
}

/// The `kotlin` extension.
#[derive(Debug)]
pub struct MultiplatformExtension {
    configurations: Rc<ConfigurationContainer>,
    guard: PhaseGuard,
    native_preset: String,
    source_sets: RefCell<Vec<Rc<SourceSet>>>,
    targets: RefCell<Vec<Rc<CompileTarget>>>,
}

impl MultiplatformExtension {
    fn new(
        configurations: Rc<ConfigurationContainer>,
        guard: &PhaseGuard,
        native_preset: &str,
    ) -> Self {
        MultiplatformExtension {
            configurations,
            guard: guard.clone(),
            native_preset: native_preset.to_string(),
            source_sets: RefCell::new(Vec::new()),
            targets: RefCell::new(Vec::new()),
        }
    }

    fn create_source_set(
        &self,
        names: SourceSetNames,
        parent: Option<&SourceSet>,
    ) -> Rc<SourceSet> {
        for scope in ScopeName::ALL {
            let bucket = self.configurations.dependency_scope(names.bucket(scope));
            if let Some(parent) = parent {
                let parent_bucket = self
                    .configurations
                    .dependency_scope(parent.bucket_name(scope));
                bucket.extends_from(&parent_bucket);
            }
        }
        let source_set = Rc::new(SourceSet {
            names,
            language_settings: RefCell::new(LanguageSettings::default()),
        });
        self.source_sets.borrow_mut().push(Rc::clone(&source_set));
        source_set
    }

    /// The `commonMain` source set.
    pub fn common_source_set(&self) -> LinkResult<Rc<SourceSet>> {
        self.source_set(naming::COMMON_SOURCE_SET)
            .ok_or_else(|| LinkError::UnknownBucket(naming::COMMON_SOURCE_SET.to_string()))
    }

    pub fn source_set(&self, id: &str) -> Option<Rc<SourceSet>> {
        self.source_sets
            .borrow()
            .iter()
            .find(|set| set.id() == id)
            .cloned()
    }

    /// All source sets in creation order.
    pub fn source_sets(&self) -> Vec<Rc<SourceSet>> {
        self.source_sets.borrow().clone()
    }

    /// Declare (or get) a JVM target.
    pub fn jvm(&self, name: &str) -> LinkResult<Rc<CompileTarget>> {
        self.declare(name, Platform::Jvm)
    }

    /// Declare (or get) a JS target.
    pub fn js(&self, name: &str) -> LinkResult<Rc<CompileTarget>> {
        self.declare(name, Platform::Js)
    }

    /// Declare (or get) a native target using the configured preset.
    pub fn native(&self, name: &str) -> LinkResult<Rc<CompileTarget>> {
        self.declare(
            name,
            Platform::Native {
                preset: self.native_preset.clone(),
            },
        )
    }

    /// Declare a compile target, or return the existing one.
    pub fn declare(&self, name: &str, platform: Platform) -> LinkResult<Rc<CompileTarget>> {
        if let Some(existing) = self.find(name) {
            if existing.platform != platform {
                return Err(LinkError::NamingCollision {
                    name: name.to_string(),
                    existing: existing.platform.to_string(),
                    requested: platform.to_string(),
                });
            }
            return Ok(existing);
        }
        // A source set without a compile target belongs to the toolchain.
        if self.source_set(name).is_some() {
            return Err(LinkError::InvalidTargetName {
                name: name.to_string(),
                reason: format!("source set `{}` is owned by the toolchain", name),
            });
        }

        let common = self.common_source_set()?;
        let names = naming::resolve_named(name, platform.target_kind());
        let source_set = self.create_source_set(names, Some(&common));
        let owner = format!("{} compile target `{}`", platform, name);
        let target = Rc::new(CompileTarget {
            name: name.to_string(),
            jvm_target: LazyProperty::new(&owner, "jvmTarget", &self.guard),
            main_class: LazyProperty::new(&owner, "mainClass", &self.guard),
            platform,
            source_set,
            environment: RefCell::new(None),
            entry_point: RefCell::new(None),
        });
        self.targets.borrow_mut().push(Rc::clone(&target));
        tracing::debug!("declared {}", owner);
        Ok(target)
    }

    /// Bucket names of the compile target `name`.
    pub fn default_buckets(&self, name: &str) -> LinkResult<SourceSetNames> {
        self.find(name)
            .map(|target| target.source_set.names().clone())
            .ok_or_else(|| LinkError::UnknownCompileTarget(name.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<Rc<CompileTarget>> {
        self.targets
            .borrow()
            .iter()
            .find(|target| target.name == name)
            .cloned()
    }

    /// All compile targets in declaration order.
    pub fn targets(&self) -> Vec<Rc<CompileTarget>> {
        self.targets.borrow().clone()
    }
}

/// Applies the `kotlin` extension.
#[derive(Debug, Clone)]
pub struct MultiplatformPlugin {
    native_preset: String,
}

impl MultiplatformPlugin {
    pub const ID: &'static str = "org.jetbrains.kotlin.multiplatform";

    pub fn new(native_preset: impl Into<String>) -> Self {
        MultiplatformPlugin {
            native_preset: native_preset.into(),
        }
    }
}

impl Default for MultiplatformPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_NATIVE_PRESET)
    }
}

impl ToolchainPlugin for MultiplatformPlugin {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn apply(&self, project: &Project) -> LinkResult<()> {
        let kotlin = MultiplatformExtension::new(
            Rc::clone(project.configurations()),
            project.guard(),
            &self.native_preset,
        );
        kotlin.create_source_set(naming::common(), None);
        project.extensions().create("kotlin", Rc::new(kotlin))?;
        Ok(())
    }
}
