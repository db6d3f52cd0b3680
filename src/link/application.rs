//! The `kotlinApplication` software type.

use std::rc::Rc;

use crate::core::error::LinkResult;
use crate::core::model::{DeclarativeModel, ModelKind, SoftwareType};
use crate::core::target::TargetKind;
use crate::engine::Project;
use crate::link::linker::{self, Linker, SoftwareTypePlugin};
use crate::util::config::ToolchainSettings;

/// Extension name of the application model.
pub const APPLICATION_TYPE: &str = "kotlinApplication";

/// Links an application model to the multiplatform toolchain.
///
/// Application targets have no dependency scopes of their own; every compile
/// target sees the root scopes through `commonMain`.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPlugin {
    settings: ToolchainSettings,
}

impl ApplicationPlugin {
    pub fn new(settings: ToolchainSettings) -> Self {
        ApplicationPlugin { settings }
    }
}

impl SoftwareTypePlugin for ApplicationPlugin {
    fn software_type(&self) -> SoftwareType {
        SoftwareType::new(APPLICATION_TYPE, ModelKind::Application)
    }

    fn apply(&self, project: &Project) -> LinkResult<Rc<DeclarativeModel>> {
        let model = linker::create_model(project, &self.software_type())?;
        linker::register_finalize(project, &model, &self.settings)?;
        let kotlin = linker::apply_toolchain(project, &self.settings)?;

        let linker = Linker::new(project, model.kind(), kotlin);
        linker.link_common(&model)?;

        linker.on_targets(&model, TargetKind::Jvm, |linker, target| {
            let compile = linker.declare(target)?;
            linker.link_jvm_target(target, &compile)?;
            if let Some(main_class) = target.main_class() {
                compile.main_class().link(main_class)?;
            }
            Ok(())
        })?;

        linker.on_targets(&model, TargetKind::Script, |linker, target| {
            linker.declare(target).map(drop)
        })?;

        linker.on_targets(&model, TargetKind::Native, |linker, target| {
            linker.declare(target).map(drop)
        })?;

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::Dependency;
    use crate::core::error::LinkError;
    use crate::toolchain::{MultiplatformExtension, Platform};

    fn applied() -> (Project, Rc<DeclarativeModel>, Rc<MultiplatformExtension>) {
        let project = Project::new("app");
        let model = ApplicationPlugin::default().apply(&project).unwrap();
        let kotlin = project
            .extensions()
            .get_by_type::<MultiplatformExtension>()
            .unwrap();
        (project, model, kotlin)
    }

    #[test]
    fn test_jvm_main_class_is_linked_lazily() {
        let (project, model, kotlin) = applied();
        let jvm = model.jvm("desktop").unwrap();
        jvm.main_class().unwrap().set("app.MainKt".into()).unwrap();
        jvm.language_version().unwrap().set(21).unwrap();

        project.scheduler().close().unwrap();
        let compile = kotlin.find("desktop").unwrap();
        assert_eq!(compile.main_class().get().as_deref(), Some("app.MainKt"));
        assert_eq!(compile.jvm_target().get(), Some(21));
    }

    #[test]
    fn test_native_entry_point_set_after_add() {
        let (project, model, kotlin) = applied();
        let native = model.native("main").unwrap();
        assert_eq!(
            kotlin.find("main").unwrap().platform(),
            &Platform::Native {
                preset: "macosArm64".into()
            }
        );
        native.entry_point().unwrap().set("app.Main".into()).unwrap();

        project.scheduler().close().unwrap();
        assert_eq!(
            kotlin.find("main").unwrap().entry_point().as_deref(),
            Some("app.Main")
        );
    }

    #[test]
    fn test_missing_entry_point_fails_pass() {
        let (project, model, _) = applied();
        model.native("main").unwrap();
        match project.scheduler().close().unwrap_err() {
            LinkError::MissingRequiredProperty { property, owner } => {
                assert_eq!(property, "entryPoint");
                assert_eq!(owner, "native target `main`");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_root_dependencies_reach_targets() {
        let (project, model, _) = applied();
        model.jvm("desktop").unwrap();
        model
            .dependencies()
            .implementation()
            .add_notation("com.example:lib:1.0")
            .unwrap();

        let bucket = project
            .configurations()
            .get_by_name("desktopImplementation")
            .unwrap();
        assert!(bucket.dependencies().is_empty());
        assert_eq!(
            bucket.all_dependencies(),
            vec![Dependency::module("com.example", "lib", Some("1.0"))]
        );
    }

    #[test]
    fn test_no_api_scope() {
        let (project, model, _) = applied();
        assert!(model.dependencies().api().is_err());
        assert!(!project.configurations().contains("api"));
    }
}
