//! Dependency declarations and scopes.
//!
//! A model (and, for libraries, each target) carries [`DependencyScopes`]:
//! up to four append-only [`DependencyCollector`]s. Collectors are shared
//! handles so the engine can read them lazily long after they were projected.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{LinkError, LinkResult};
use crate::core::phase::PhaseGuard;

/// A declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Dependency {
    /// External module coordinate: `group:name[:version]`
    Module {
        group: String,
        name: String,
        version: Option<String>,
    },

    /// Another project in the same build: `:path`
    Project { path: String },
}

impl Dependency {
    /// Create a module dependency.
    pub fn module(
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Dependency::Module {
            group: group.into(),
            name: name.into(),
            version: version.map(str::to_string),
        }
    }

    /// Create a project dependency.
    pub fn project(path: impl Into<String>) -> Self {
        Dependency::Project { path: path.into() }
    }
}

impl FromStr for Dependency {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notation = s.trim();
        if let Some(rest) = notation.strip_prefix(':') {
            if rest.is_empty() || rest.split(':').any(str::is_empty) {
                return Err(LinkError::InvalidNotation(s.to_string()));
            }
            return Ok(Dependency::project(notation));
        }

        let parts: Vec<&str> = notation.split(':').collect();
        match parts.as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(Dependency::module(*group, *name, None))
            }
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Dependency::module(*group, *name, Some(*version)))
            }
            _ => Err(LinkError::InvalidNotation(s.to_string())),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Module {
                group,
                name,
                version: Some(version),
            } => write!(f, "{}:{}:{}", group, name, version),
            Dependency::Module {
                group,
                name,
                version: None,
            } => write!(f, "{}:{}", group, name),
            Dependency::Project { path } => write!(f, "project({})", path),
        }
    }
}

/// The four dependency scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeName {
    Api,
    Implementation,
    CompileOnly,
    RuntimeOnly,
}

impl ScopeName {
    /// All scopes in declaration order.
    pub const ALL: [ScopeName; 4] = [
        ScopeName::Api,
        ScopeName::Implementation,
        ScopeName::CompileOnly,
        ScopeName::RuntimeOnly,
    ];

    /// Script-visible name (`compileOnly`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeName::Api => "api",
            ScopeName::Implementation => "implementation",
            ScopeName::CompileOnly => "compileOnly",
            ScopeName::RuntimeOnly => "runtimeOnly",
        }
    }

    /// Capitalized form used as a bucket-name suffix (`CompileOnly`).
    pub fn suffix(&self) -> &'static str {
        match self {
            ScopeName::Api => "Api",
            ScopeName::Implementation => "Implementation",
            ScopeName::CompileOnly => "CompileOnly",
            ScopeName::RuntimeOnly => "RuntimeOnly",
        }
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only list of declarations for one scope.
#[derive(Clone)]
pub struct DependencyCollector {
    scope: ScopeName,
    owner: Rc<str>,
    entries: Rc<RefCell<Vec<Dependency>>>,
    guard: PhaseGuard,
}

impl DependencyCollector {
    fn new(scope: ScopeName, owner: &Rc<str>, guard: &PhaseGuard) -> Self {
        DependencyCollector {
            scope,
            owner: Rc::clone(owner),
            entries: Rc::new(RefCell::new(Vec::new())),
            guard: guard.clone(),
        }
    }

    /// The scope this collector backs.
    pub fn scope(&self) -> ScopeName {
        self.scope
    }

    /// Human-readable owner of the scope.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Declare a dependency.
    pub fn add(&self, dependency: Dependency) -> LinkResult<()> {
        self.guard.ensure_mutable(|| {
            format!("adding `{}` to `{}` of {}", dependency, self.scope, self.owner)
        })?;
        self.entries.borrow_mut().push(dependency);
        Ok(())
    }

    /// Declare a dependency from string notation.
    pub fn add_notation(&self, notation: &str) -> LinkResult<()> {
        self.add(notation.parse()?)
    }

    /// Snapshot of the declarations so far, in declaration order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.entries.borrow().clone()
    }

    /// Number of declarations so far.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether both handles refer to the same collector.
    pub fn same_as(&self, other: &DependencyCollector) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for DependencyCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyCollector")
            .field("scope", &self.scope)
            .field("owner", &self.owner)
            .field("entries", &self.entries.borrow())
            .finish()
    }
}

/// Dependency scopes of a model or a target.
///
/// The `api` scope only exists for libraries.
#[derive(Debug, Clone)]
pub struct DependencyScopes {
    owner: Rc<str>,
    api: Option<DependencyCollector>,
    implementation: DependencyCollector,
    compile_only: DependencyCollector,
    runtime_only: DependencyCollector,
}

impl DependencyScopes {
    /// Scopes for a library owner, including `api`.
    pub fn library(owner: impl Into<String>, guard: &PhaseGuard) -> Self {
        Self::build(owner.into(), true, guard)
    }

    /// Scopes for an application owner, without `api`.
    pub fn application(owner: impl Into<String>, guard: &PhaseGuard) -> Self {
        Self::build(owner.into(), false, guard)
    }

    fn build(owner: String, with_api: bool, guard: &PhaseGuard) -> Self {
        let owner: Rc<str> = Rc::from(owner);
        DependencyScopes {
            api: with_api.then(|| DependencyCollector::new(ScopeName::Api, &owner, guard)),
            implementation: DependencyCollector::new(ScopeName::Implementation, &owner, guard),
            compile_only: DependencyCollector::new(ScopeName::CompileOnly, &owner, guard),
            runtime_only: DependencyCollector::new(ScopeName::RuntimeOnly, &owner, guard),
            owner,
        }
    }

    /// Whether the `api` scope exists.
    pub fn supports(&self, scope: ScopeName) -> bool {
        scope != ScopeName::Api || self.api.is_some()
    }

    /// Look up a scope, if it exists for this owner.
    pub fn get(&self, scope: ScopeName) -> Option<&DependencyCollector> {
        match scope {
            ScopeName::Api => self.api.as_ref(),
            ScopeName::Implementation => Some(&self.implementation),
            ScopeName::CompileOnly => Some(&self.compile_only),
            ScopeName::RuntimeOnly => Some(&self.runtime_only),
        }
    }

    /// Look up a scope a script wants to add to.
    pub fn scope(&self, scope: ScopeName) -> LinkResult<&DependencyCollector> {
        self.get(scope).ok_or_else(|| LinkError::InvalidScopeWiring {
            scope: scope.to_string(),
            owner: self.owner.to_string(),
            reason: "only libraries expose an `api` scope".to_string(),
        })
    }

    pub fn api(&self) -> LinkResult<&DependencyCollector> {
        self.scope(ScopeName::Api)
    }

    pub fn implementation(&self) -> &DependencyCollector {
        &self.implementation
    }

    pub fn compile_only(&self) -> &DependencyCollector {
        &self.compile_only
    }

    pub fn runtime_only(&self) -> &DependencyCollector {
        &self.runtime_only
    }

    /// Existing scopes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &DependencyCollector> + '_ {
        ScopeName::ALL.into_iter().filter_map(move |scope| self.get(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::PassPhase;

    #[test]
    fn test_parse_module_notation() {
        let dep: Dependency = "org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0"
            .parse()
            .unwrap();
        assert_eq!(
            dep,
            Dependency::module("org.jetbrains.kotlinx", "kotlinx-coroutines-core", Some("1.8.0"))
        );
        assert_eq!(
            dep.to_string(),
            "org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0"
        );

        let unversioned: Dependency = "com.example:core".parse().unwrap();
        assert_eq!(unversioned, Dependency::module("com.example", "core", None));
    }

    #[test]
    fn test_parse_project_notation() {
        let dep: Dependency = ":shared:model".parse().unwrap();
        assert_eq!(dep, Dependency::project(":shared:model"));
        assert_eq!(dep.to_string(), "project(:shared:model)");
    }

    #[test]
    fn test_parse_invalid_notation() {
        for bad in ["", "core", "a:b:c:d", ":", "a::1", "::x"] {
            assert!(
                matches!(bad.parse::<Dependency>(), Err(LinkError::InvalidNotation(_))),
                "`{bad}` should be rejected"
            );
        }
    }

    #[test]
    fn test_application_has_no_api() {
        let guard = PhaseGuard::new();
        let scopes = DependencyScopes::application("model `app`", &guard);
        assert!(!scopes.supports(ScopeName::Api));
        assert!(matches!(
            scopes.api().unwrap_err(),
            LinkError::InvalidScopeWiring { .. }
        ));
        let names: Vec<_> = scopes.iter().map(|c| c.scope()).collect();
        assert_eq!(
            names,
            vec![
                ScopeName::Implementation,
                ScopeName::CompileOnly,
                ScopeName::RuntimeOnly
            ]
        );
    }

    #[test]
    fn test_collector_is_shared_and_append_only() {
        let guard = PhaseGuard::new();
        let scopes = DependencyScopes::library("model `lib`", &guard);
        let handle = scopes.implementation().clone();

        scopes.implementation().add_notation("com.example:a:1").unwrap();
        handle.add_notation("com.example:b:1").unwrap();

        assert!(handle.same_as(scopes.implementation()));
        assert_eq!(scopes.implementation().len(), 2);
        assert_eq!(
            scopes.implementation().dependencies()[1].to_string(),
            "com.example:b:1"
        );
    }

    #[test]
    fn test_add_after_closure_fails() {
        let guard = PhaseGuard::new();
        let scopes = DependencyScopes::library("model `lib`", &guard);
        guard.advance(PassPhase::Finalizing);
        assert!(matches!(
            scopes.runtime_only().add_notation("com.example:a:1"),
            Err(LinkError::OrderingViolation { .. })
        ));
    }
}
