//! Naming conventions for buckets and source roots.
//!
//! The toolchain creates one source set per compile target, and one bucket
//! per dependency scope for every source set. These functions compute the
//! names it uses so the linker can find them.

use serde::Serialize;

use crate::core::collection::Variant;
use crate::core::dependency::ScopeName;
use crate::core::target::{Target, TargetKind};

/// Source set id shared by every target.
pub const COMMON_SOURCE_SET: &str = "commonMain";

/// Names the toolchain uses for one source set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSetNames {
    pub id: String,
    pub api: String,
    pub implementation: String,
    pub compile_only: String,
    pub runtime_only: String,
    pub source_root: String,
}

impl SourceSetNames {
    fn with_prefix(id: &str, source_root: String) -> Self {
        SourceSetNames {
            id: id.to_string(),
            api: bucket_name(id, ScopeName::Api),
            implementation: bucket_name(id, ScopeName::Implementation),
            compile_only: bucket_name(id, ScopeName::CompileOnly),
            runtime_only: bucket_name(id, ScopeName::RuntimeOnly),
            source_root,
        }
    }

    /// Bucket name for `scope`.
    pub fn bucket(&self, scope: ScopeName) -> &str {
        match scope {
            ScopeName::Api => &self.api,
            ScopeName::Implementation => &self.implementation,
            ScopeName::CompileOnly => &self.compile_only,
            ScopeName::RuntimeOnly => &self.runtime_only,
        }
    }
}

/// Names for `target`.
pub fn resolve(target: &Target) -> SourceSetNames {
    resolve_named(target.name(), target.kind())
}

/// Names for a target called `name` of `kind`.
pub fn resolve_named(name: &str, kind: TargetKind) -> SourceSetNames {
    SourceSetNames::with_prefix(name, format!("src/{}/{}", name, kind.source_dir()))
}

/// Names for the source set every target depends on.
pub fn common() -> SourceSetNames {
    SourceSetNames::with_prefix(COMMON_SOURCE_SET, format!("src/{}/kotlin", COMMON_SOURCE_SET))
}

/// Names of the project-level buckets (`api`, `implementation`, ...).
pub fn root() -> SourceSetNames {
    SourceSetNames::with_prefix("", "src".to_string())
}

/// `prefix` + capitalized scope, or the bare scope name without a prefix.
fn bucket_name(prefix: &str, scope: ScopeName) -> String {
    if prefix.is_empty() {
        scope.as_str().to_string()
    } else {
        format!("{}{}", prefix, scope.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ModelKind;
    use crate::core::phase::PhaseGuard;

    #[test]
    fn test_target_names() {
        let guard = PhaseGuard::new();
        let target = Target::new("main", TargetKind::Jvm, ModelKind::Library, &guard);
        let names = resolve(&target);

        assert_eq!(names.id, "main");
        assert_eq!(names.api, "mainApi");
        assert_eq!(names.implementation, "mainImplementation");
        assert_eq!(names.compile_only, "mainCompileOnly");
        assert_eq!(names.runtime_only, "mainRuntimeOnly");
        assert_eq!(names.source_root, "src/main/kotlin");
    }

    #[test]
    fn test_kind_changes_source_root_only() {
        let jvm = resolve_named("browserMain", TargetKind::Jvm);
        let js = resolve_named("browserMain", TargetKind::Script);
        assert_eq!(jvm.implementation, js.implementation);
        assert_eq!(js.source_root, "src/browserMain/js");
    }

    #[test]
    fn test_common_and_root() {
        assert_eq!(common().bucket(ScopeName::CompileOnly), "commonMainCompileOnly");
        assert_eq!(root().bucket(ScopeName::CompileOnly), "compileOnly");
        assert_eq!(root().bucket(ScopeName::Api), "api");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        assert_eq!(
            resolve_named("ios", TargetKind::Native),
            resolve_named("ios", TargetKind::Native)
        );
    }
}
