//! Binding steps shared by the software type plugins.
//!
//! A plugin links its model to the engine in a fixed order:
//!
//! 1. structural: create the model and the root buckets ([`create_model`])
//! 2. register the finalize-gated binding ([`register_finalize`])
//! 3. apply the toolchain ([`apply_toolchain`])
//! 4. reactive: link `commonMain` and observe targets ([`Linker`])
//!
//! Step 2 happens before step 3 so that the finalize binding runs before
//! anything the toolchain queues for the end of the pass.

use std::rc::Rc;

use crate::core::collection::Variant;
use crate::core::error::LinkResult;
use crate::core::model::{DeclarativeModel, ModelKind, SoftwareType};
use crate::core::target::{ScriptEnvironment, Target, TargetKind};
use crate::engine::{ExtensionContainer, Project, ReactiveLog};
use crate::link::naming;
use crate::link::projection::DependencyProjection;
use crate::toolchain::{CompileTarget, MultiplatformExtension, MultiplatformPlugin};
use crate::util::config::ToolchainSettings;

/// A plugin exposing one software type.
pub trait SoftwareTypePlugin {
    /// The software type this plugin registers.
    fn software_type(&self) -> SoftwareType;

    /// Create the model on `project` and register every binding for it.
    fn apply(&self, project: &Project) -> LinkResult<Rc<DeclarativeModel>>;
}

/// Create the model extension and its root buckets.
///
/// Each root bucket is fed lazily from the matching root collector.
pub(crate) fn create_model(
    project: &Project,
    software_type: &SoftwareType,
) -> LinkResult<Rc<DeclarativeModel>> {
    let model = Rc::new(DeclarativeModel::new(
        software_type.name(),
        software_type.model(),
        project.guard(),
    ));
    project
        .extensions()
        .create(software_type.name(), Rc::clone(&model))?;

    let projection = DependencyProjection::new(Rc::clone(project.configurations()), model.kind());
    let names = naming::root();
    for collector in model.dependencies().iter() {
        let bucket = names.bucket(collector.scope());
        project
            .scheduler()
            .run_now(format!("root bucket `{}`", bucket), || {
                project.configurations().dependency_scope(bucket);
                projection.project_scope(collector, &names)
            })?;
    }
    Ok(model)
}

/// Queue the finalize-gated binding for `model`.
///
/// The toolchain extension is looked up when the binding runs, so this can
/// be called before the toolchain is applied.
pub(crate) fn register_finalize(
    project: &Project,
    model: &Rc<DeclarativeModel>,
    settings: &ToolchainSettings,
) -> LinkResult<()> {
    let extensions: Rc<ExtensionContainer> = Rc::clone(project.extensions());
    let model = Rc::clone(model);
    let default_language = settings.language_version.clone();
    project.after_evaluate(format!("finalize {}", model.describe()), move || {
        let kotlin = extensions.get_by_type::<MultiplatformExtension>()?;
        finalize(&model, &kotlin, default_language)
    })
}

/// Apply the multiplatform toolchain and return its extension.
pub(crate) fn apply_toolchain(
    project: &Project,
    settings: &ToolchainSettings,
) -> LinkResult<Rc<MultiplatformExtension>> {
    project.apply_plugin(&MultiplatformPlugin::new(settings.native_preset()))?;
    project.extensions().get_by_type::<MultiplatformExtension>()
}

/// Everything a reactive binding needs.
///
/// Never holds the model: observers are stored inside the model's target
/// collection.
#[derive(Debug, Clone)]
pub(crate) struct Linker {
    kotlin: Rc<MultiplatformExtension>,
    projection: DependencyProjection,
    log: ReactiveLog,
}

impl Linker {
    pub(crate) fn new(
        project: &Project,
        kind: ModelKind,
        kotlin: Rc<MultiplatformExtension>,
    ) -> Self {
        Linker {
            kotlin,
            projection: DependencyProjection::new(Rc::clone(project.configurations()), kind),
            log: project.scheduler().reactive_log(),
        }
    }

    /// Feed the `commonMain` buckets from the model's root scopes.
    pub(crate) fn link_common(&self, model: &DeclarativeModel) -> LinkResult<()> {
        self.projection
            .project(model.dependencies(), &naming::common())?;
        self.log
            .record(format!("{} -> {}", model.describe(), naming::COMMON_SOURCE_SET));
        Ok(())
    }

    /// Run `bind` for every existing and future target of `kind`.
    pub(crate) fn on_targets(
        &self,
        model: &DeclarativeModel,
        kind: TargetKind,
        bind: impl Fn(&Linker, &Target) -> LinkResult<()> + 'static,
    ) -> LinkResult<()> {
        let linker = self.clone();
        model.targets().observe(kind, move |target| {
            bind(&linker, target.as_ref())?;
            linker.log.record(target.describe());
            Ok(())
        })
    }

    /// Declare the compile target matching `target`.
    pub(crate) fn declare(&self, target: &Target) -> LinkResult<Rc<CompileTarget>> {
        match target.kind() {
            TargetKind::Jvm => self.kotlin.jvm(target.name()),
            TargetKind::Script => self.kotlin.js(target.name()),
            TargetKind::Native => self.kotlin.native(target.name()),
        }
    }

    /// Link the compile target's bytecode level to the target's language version.
    pub(crate) fn link_jvm_target(
        &self,
        target: &Target,
        compile: &CompileTarget,
    ) -> LinkResult<()> {
        match target.language_version() {
            Some(version) => compile.jvm_target().link(version),
            None => Ok(()),
        }
    }

    /// Feed the compile target's buckets from the target's own scopes.
    ///
    /// Targets without their own scopes inherit `commonMain` instead.
    pub(crate) fn project_own_scopes(&self, target: &Target) -> LinkResult<()> {
        let Some(scopes) = target.dependencies() else {
            return Ok(());
        };
        let names = self.kotlin.default_buckets(target.name())?;
        self.projection.project(scopes, &names)
    }
}

/// The finalize-gated binding.
///
/// Runs once, with the model read-only.
fn finalize(
    model: &DeclarativeModel,
    kotlin: &MultiplatformExtension,
    default_language: Option<String>,
) -> LinkResult<()> {
    let language = model.language_version().get().or(default_language);
    if let Some(version) = language {
        for source_set in kotlin.source_sets() {
            source_set.language_settings(|settings| {
                settings.language_version = Some(version.clone());
                settings.api_version = Some(version.clone());
            });
        }
    }

    for target in model.targets().with_kind(TargetKind::Script) {
        let Some(environment) = target.environment() else {
            continue;
        };
        let compile = kotlin.js(target.name())?;
        match environment.require()? {
            ScriptEnvironment::Node => compile.nodejs(),
            ScriptEnvironment::Browser => compile.browser(),
        }
    }

    if model.kind() == ModelKind::Application {
        for target in model.targets().with_kind(TargetKind::Native) {
            let Some(entry_point) = target.entry_point() else {
                continue;
            };
            let compile = kotlin.native(target.name())?;
            compile.executable(&entry_point.require()?);
        }
    }

    tracing::debug!("finalized {}", model.describe());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LinkError;

    fn setup(kind: ModelKind) -> (Project, Rc<DeclarativeModel>, Rc<MultiplatformExtension>) {
        let project = Project::new("demo");
        let software_type = SoftwareType::new("model", kind);
        let settings = ToolchainSettings::default();
        let model = create_model(&project, &software_type).unwrap();
        register_finalize(&project, &model, &settings).unwrap();
        let kotlin = apply_toolchain(&project, &settings).unwrap();
        (project, model, kotlin)
    }

    #[test]
    fn test_root_buckets_by_kind() {
        let (project, _, _) = setup(ModelKind::Application);
        assert!(!project.configurations().contains("api"));
        assert!(project.configurations().contains("implementation"));

        let (project, _, _) = setup(ModelKind::Library);
        assert!(project.configurations().contains("api"));
        assert_eq!(project.scheduler().history().len(), 4);
    }

    #[test]
    fn test_language_version_applied_to_every_source_set() {
        let (project, model, kotlin) = setup(ModelKind::Library);
        kotlin.jvm("desktop").unwrap();
        model.language_version().set("2.0".into()).unwrap();

        project.scheduler().close().unwrap();
        for source_set in kotlin.source_sets() {
            let settings = source_set.settings();
            assert_eq!(settings.language_version.as_deref(), Some("2.0"));
            assert_eq!(settings.api_version.as_deref(), Some("2.0"));
        }
    }

    #[test]
    fn test_language_version_absent_leaves_settings_alone() {
        let (project, _, kotlin) = setup(ModelKind::Library);
        project.scheduler().close().unwrap();
        let settings = kotlin.common_source_set().unwrap().settings();
        assert!(settings.language_version.is_none());
    }

    #[test]
    fn test_configured_default_language_version() {
        let project = Project::new("demo");
        let settings = ToolchainSettings {
            language_version: Some("1.9".into()),
            ..Default::default()
        };
        let software_type = SoftwareType::new("model", ModelKind::Library);
        let model = create_model(&project, &software_type).unwrap();
        register_finalize(&project, &model, &settings).unwrap();
        let kotlin = apply_toolchain(&project, &settings).unwrap();

        project.scheduler().close().unwrap();
        assert_eq!(
            kotlin.common_source_set().unwrap().settings().language_version.as_deref(),
            Some("1.9")
        );
    }

    #[test]
    fn test_finalize_requires_script_environment() {
        let (project, model, kotlin) = setup(ModelKind::Library);
        model.script("web").unwrap();
        kotlin.js("web").unwrap();

        let err = project.scheduler().close().unwrap_err();
        assert!(matches!(
            err,
            LinkError::MissingRequiredProperty { ref property, .. } if property == "environment"
        ));
    }

    #[test]
    fn test_duplicate_model_extension() {
        let project = Project::new("demo");
        let software_type = SoftwareType::new("model", ModelKind::Library);
        create_model(&project, &software_type).unwrap();
        assert!(matches!(
            create_model(&project, &software_type),
            Err(LinkError::DuplicateExtension(_))
        ));
    }
}
