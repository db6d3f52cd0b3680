//! Lazy, single-assignment-or-absent properties.
//!
//! A [`LazyProperty`] is a shared handle: clones observe the same slot. A
//! property can hold a value or be linked to another property, in which case
//! reads follow the link at read time. This is how the linker wires toolchain
//! options to model properties during the reactive phase while the script is
//! still free to set the model property later.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{LinkError, LinkResult};
use crate::core::phase::PhaseGuard;

enum Slot<T> {
    Unset,
    Value(T),
    Linked(LazyProperty<T>),
}

/// A deferred configuration value.
pub struct LazyProperty<T> {
    name: Rc<str>,
    owner: Rc<str>,
    slot: Rc<RefCell<Slot<T>>>,
    guard: PhaseGuard,
}

impl<T> Clone for LazyProperty<T> {
    fn clone(&self) -> Self {
        LazyProperty {
            name: Rc::clone(&self.name),
            owner: Rc::clone(&self.owner),
            slot: Rc::clone(&self.slot),
            guard: self.guard.clone(),
        }
    }
}

impl<T: Clone> LazyProperty<T> {
    /// Create an unset property named `name`, owned by `owner`.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, guard: &PhaseGuard) -> Self {
        LazyProperty {
            name: Rc::from(name.into()),
            owner: Rc::from(owner.into()),
            slot: Rc::new(RefCell::new(Slot::Unset)),
            guard: guard.clone(),
        }
    }

    /// Property name, e.g. `entryPoint`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable owner, e.g. "native target `main`".
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Set the value. The last write before closure wins.
    pub fn set(&self, value: T) -> LinkResult<()> {
        self.guard
            .ensure_mutable(|| format!("setting `{}` on {}", self.name, self.owner))?;
        *self.slot.borrow_mut() = Slot::Value(value);
        Ok(())
    }

    /// Make this property read through to `source`.
    ///
    /// Linking a property to itself (directly or through a chain) is ignored.
    pub fn link(&self, source: &LazyProperty<T>) -> LinkResult<()> {
        self.guard
            .ensure_mutable(|| format!("linking `{}` on {}", self.name, self.owner))?;
        if source.reaches(self) {
            tracing::debug!("ignoring cyclic link of `{}` on {}", self.name, self.owner);
            return Ok(());
        }
        *self.slot.borrow_mut() = Slot::Linked(source.clone());
        Ok(())
    }

    /// Current value, or `None` if absent.
    pub fn get(&self) -> Option<T> {
        let linked = match &*self.slot.borrow() {
            Slot::Unset => return None,
            Slot::Value(value) => return Some(value.clone()),
            Slot::Linked(source) => source.clone(),
        };
        linked.get()
    }

    /// Current value, or the explicitly supplied default.
    pub fn get_or(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }

    /// Whether a value is present (directly or through a link).
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Run `action` with the value if one is present.
    pub fn if_present(&self, action: impl FnOnce(T)) {
        if let Some(value) = self.get() {
            action(value);
        }
    }

    /// Final value of a required property.
    ///
    /// Only valid once closure has begun; absence is reported as
    /// [`LinkError::MissingRequiredProperty`].
    pub fn require(&self) -> LinkResult<T> {
        self.guard
            .ensure_finalized(|| format!("reading final `{}` of {}", self.name, self.owner))?;
        self.get().ok_or_else(|| LinkError::MissingRequiredProperty {
            property: self.name.to_string(),
            owner: self.owner.to_string(),
        })
    }

    fn reaches(&self, target: &LazyProperty<T>) -> bool {
        if Rc::ptr_eq(&self.slot, &target.slot) {
            return true;
        }
        let next = match &*self.slot.borrow() {
            Slot::Linked(source) => source.clone(),
            _ => return false,
        };
        next.reaches(target)
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for LazyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProperty")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("value", &self.get())
            .finish()
    }
}
