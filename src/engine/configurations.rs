//! Dependency buckets - the engine's named, lazily populated configurations.
//!
//! A bucket holds directly added dependencies plus lazy sources
//! ([`DependencyCollector`]s) that are only read when the bucket is read.
//! Buckets can extend other buckets; [`DependencyBucket::all_dependencies`]
//! includes everything inherited that way.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::core::dependency::{Dependency, DependencyCollector};
use crate::core::error::{LinkError, LinkResult};

/// A named dependency bucket.
pub struct DependencyBucket {
    name: String,
    declared: RefCell<Vec<Dependency>>,
    sources: RefCell<Vec<DependencyCollector>>,
    parents: RefCell<Vec<Rc<DependencyBucket>>>,
}

impl DependencyBucket {
    fn new(name: &str) -> Self {
        DependencyBucket {
            name: name.to_string(),
            declared: RefCell::new(Vec::new()),
            sources: RefCell::new(Vec::new()),
            parents: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a dependency directly.
    pub fn add(&self, dependency: Dependency) {
        self.declared.borrow_mut().push(dependency);
    }

    /// Read `collector` lazily whenever this bucket is read.
    ///
    /// Returns `false` if the collector was already a source.
    pub fn add_all_later(&self, collector: &DependencyCollector) -> bool {
        let mut sources = self.sources.borrow_mut();
        if sources.iter().any(|source| source.same_as(collector)) {
            return false;
        }
        sources.push(collector.clone());
        true
    }

    /// Inherit every dependency of `parent`.
    pub fn extends_from(&self, parent: &Rc<DependencyBucket>) {
        let mut parents = self.parents.borrow_mut();
        if !parents.iter().any(|p| Rc::ptr_eq(p, parent)) {
            parents.push(Rc::clone(parent));
        }
    }

    /// Names of the buckets this one extends.
    pub fn parents(&self) -> Vec<String> {
        self.parents
            .borrow()
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Number of lazy sources.
    pub fn source_count(&self) -> usize {
        self.sources.borrow().len()
    }

    /// Own dependencies: direct ones, then lazy sources, without duplicates.
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_own(&mut seen, &mut out);
        out
    }

    /// Own dependencies followed by inherited ones, without duplicates.
    pub fn all_dependencies(&self) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_all(&mut seen, &mut out, &mut visited);
        out
    }

    fn collect_own(&self, seen: &mut HashSet<Dependency>, out: &mut Vec<Dependency>) {
        let declared = self.declared.borrow().clone();
        let lazy = self
            .sources
            .borrow()
            .iter()
            .flat_map(|source| source.dependencies())
            .collect::<Vec<_>>();
        for dep in declared.into_iter().chain(lazy) {
            if seen.insert(dep.clone()) {
                out.push(dep);
            }
        }
    }

    fn collect_all(
        &self,
        seen: &mut HashSet<Dependency>,
        out: &mut Vec<Dependency>,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(self.name.clone()) {
            return;
        }
        self.collect_own(seen, out);
        for parent in self.parents.borrow().iter() {
            parent.collect_all(seen, out, visited);
        }
    }
}

impl fmt::Debug for DependencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyBucket")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies())
            .field("parents", &self.parents())
            .finish()
    }
}

/// All buckets of a project, in creation order.
#[derive(Debug, Default)]
pub struct ConfigurationContainer {
    buckets: RefCell<Vec<Rc<DependencyBucket>>>,
}

impl ConfigurationContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bucket `name`, creating it if needed.
    pub fn dependency_scope(&self, name: &str) -> Rc<DependencyBucket> {
        if let Some(existing) = self.find(name) {
            return existing;
        }
        let bucket = Rc::new(DependencyBucket::new(name));
        self.buckets.borrow_mut().push(Rc::clone(&bucket));
        tracing::debug!("created dependency bucket `{}`", name);
        bucket
    }

    /// Existing bucket `name`.
    pub fn get_by_name(&self, name: &str) -> LinkResult<Rc<DependencyBucket>> {
        self.find(name)
            .ok_or_else(|| LinkError::UnknownBucket(name.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<Rc<DependencyBucket>> {
        self.buckets
            .borrow()
            .iter()
            .find(|bucket| bucket.name == name)
            .cloned()
    }

    pub fn all(&self) -> Vec<Rc<DependencyBucket>> {
        self.buckets.borrow().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::DependencyScopes;
    use crate::core::phase::PhaseGuard;

    #[test]
    fn test_dependency_scope_is_get_or_create() {
        let configurations = ConfigurationContainer::new();
        let a = configurations.dependency_scope("implementation");
        let b = configurations.dependency_scope("implementation");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(configurations.all().len(), 1);
        assert!(matches!(
            configurations.get_by_name("api"),
            Err(LinkError::UnknownBucket(_))
        ));
    }

    #[test]
    fn test_lazy_source_sees_later_additions() {
        let guard = PhaseGuard::new();
        let scopes = DependencyScopes::library("model `lib`", &guard);
        let configurations = ConfigurationContainer::new();
        let bucket = configurations.dependency_scope("implementation");

        scopes.implementation().add_notation("com.example:early:1").unwrap();
        bucket.add_all_later(scopes.implementation());
        scopes.implementation().add_notation("com.example:late:1").unwrap();

        let names: Vec<_> = bucket.dependencies().iter().map(|d| d.to_string()).collect();
        assert_eq!(names, vec!["com.example:early:1", "com.example:late:1"]);
    }

    #[test]
    fn test_same_source_twice_is_idempotent() {
        let guard = PhaseGuard::new();
        let scopes = DependencyScopes::library("model `lib`", &guard);
        let bucket = ConfigurationContainer::new().dependency_scope("api");

        assert!(bucket.add_all_later(scopes.api().unwrap()));
        assert!(!bucket.add_all_later(&scopes.api().unwrap().clone()));
        scopes.api().unwrap().add_notation("com.example:a:1").unwrap();

        assert_eq!(bucket.source_count(), 1);
        assert_eq!(bucket.dependencies().len(), 1);
    }

    #[test]
    fn test_extends_from_includes_parent_once() {
        let configurations = ConfigurationContainer::new();
        let common = configurations.dependency_scope("commonMainImplementation");
        let jvm = configurations.dependency_scope("jvmImplementation");
        jvm.extends_from(&common);
        jvm.extends_from(&common);

        let shared: Dependency = "com.example:shared:1".parse().unwrap();
        common.add(shared.clone());
        jvm.add(shared.clone());
        jvm.add("com.example:jvm-only:1".parse().unwrap());

        assert_eq!(jvm.dependencies().len(), 2);
        assert_eq!(jvm.all_dependencies().len(), 2);
        assert_eq!(jvm.parents(), vec!["commonMainImplementation"]);
        assert!(common.all_dependencies().contains(&shared));
    }
}
