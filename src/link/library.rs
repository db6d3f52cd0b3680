//! The `kotlinLibrary` software type.

use std::rc::Rc;

use crate::core::error::LinkResult;
use crate::core::model::{DeclarativeModel, ModelKind, SoftwareType};
use crate::core::target::TargetKind;
use crate::engine::Project;
use crate::link::linker::{self, Linker, SoftwareTypePlugin};
use crate::util::config::ToolchainSettings;

/// Extension name of the library model.
pub const LIBRARY_TYPE: &str = "kotlinLibrary";

/// Links a library model to the multiplatform toolchain.
///
/// Library targets carry their own dependency scopes, projected onto the
/// buckets of the matching compile target.
#[derive(Debug, Clone, Default)]
pub struct LibraryPlugin {
    settings: ToolchainSettings,
}

impl LibraryPlugin {
    pub fn new(settings: ToolchainSettings) -> Self {
        LibraryPlugin { settings }
    }
}

impl SoftwareTypePlugin for LibraryPlugin {
    fn software_type(&self) -> SoftwareType {
        SoftwareType::new(LIBRARY_TYPE, ModelKind::Library)
    }

    fn apply(&self, project: &Project) -> LinkResult<Rc<DeclarativeModel>> {
        let model = linker::create_model(project, &self.software_type())?;
        linker::register_finalize(project, &model, &self.settings)?;
        let kotlin = linker::apply_toolchain(project, &self.settings)?;

        let linker = Linker::new(project, model.kind(), kotlin);
        linker.link_common(&model)?;

        linker.on_targets(&model, TargetKind::Jvm, |linker, target| {
            let compile = linker.declare(target)?;
            linker.project_own_scopes(target)?;
            linker.link_jvm_target(target, &compile)
        })?;

        for kind in [TargetKind::Script, TargetKind::Native] {
            linker.on_targets(&model, kind, |linker, target| {
                linker.declare(target)?;
                linker.project_own_scopes(target)
            })?;
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::Dependency;
    use crate::toolchain::MultiplatformExtension;

    fn applied() -> (Project, Rc<DeclarativeModel>, Rc<MultiplatformExtension>) {
        let project = Project::new("lib");
        let model = LibraryPlugin::default().apply(&project).unwrap();
        let kotlin = project
            .extensions()
            .get_by_type::<MultiplatformExtension>()
            .unwrap();
        (project, model, kotlin)
    }

    #[test]
    fn test_target_scopes_projected_onto_own_buckets() {
        let (project, model, _) = applied();
        let jvm = model.jvm("desktop").unwrap();
        jvm.dependencies()
            .unwrap()
            .api()
            .unwrap()
            .add_notation("com.example:api:1")
            .unwrap();

        let deps = project
            .configurations()
            .get_by_name("desktopApi")
            .unwrap()
            .dependencies();
        assert_eq!(deps, vec![Dependency::module("com.example", "api", Some("1"))]);
    }

    #[test]
    fn test_root_api_reaches_common() {
        let (project, model, _) = applied();
        model
            .dependencies()
            .api()
            .unwrap()
            .add_notation(":core")
            .unwrap();

        for bucket in ["api", "commonMainApi"] {
            assert_eq!(
                project.configurations().get_by_name(bucket).unwrap().dependencies(),
                vec![Dependency::project(":core")]
            );
        }
    }

    #[test]
    fn test_jvm_target_linked_before_value_is_set() {
        let (project, model, kotlin) = applied();
        let jvm = model.jvm("main").unwrap();
        let compile = kotlin.find("main").unwrap();
        assert_eq!(compile.jvm_target().get(), None);

        jvm.language_version().unwrap().set(17).unwrap();
        project.scheduler().close().unwrap();
        assert_eq!(compile.jvm_target().get(), Some(17));
    }

    #[test]
    fn test_script_environment_chosen_at_close() {
        let (project, model, kotlin) = applied();
        let web = model.script("web").unwrap();
        web.environment()
            .unwrap()
            .set(crate::core::target::ScriptEnvironment::Node)
            .unwrap();
        assert_eq!(kotlin.find("web").unwrap().environment(), None);

        project.scheduler().close().unwrap();
        assert_eq!(
            kotlin.find("web").unwrap().environment(),
            Some(crate::core::target::ScriptEnvironment::Node)
        );
    }
}
