//! Extension container - named, typed objects registered on a project.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{LinkError, LinkResult};

/// Named extension objects, looked up by name or by type.
#[derive(Default)]
pub struct ExtensionContainer {
    entries: RefCell<Vec<(String, Rc<dyn Any>)>>,
}

impl ExtensionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`. Names are unique.
    pub fn create<T: Any>(&self, name: &str, value: Rc<T>) -> LinkResult<Rc<T>> {
        if self.contains(name) {
            return Err(LinkError::DuplicateExtension(name.to_string()));
        }
        self.entries
            .borrow_mut()
            .push((name.to_string(), Rc::clone(&value) as Rc<dyn Any>));
        tracing::debug!("registered extension `{}`", name);
        Ok(value)
    }

    /// Extension registered under `name`, if it has type `T`.
    pub fn get_by_name<T: Any>(&self, name: &str) -> LinkResult<Rc<T>> {
        let entry = self
            .entries
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| Rc::clone(value))
            .ok_or_else(|| LinkError::UnknownExtension(name.to_string()))?;
        entry
            .downcast::<T>()
            .map_err(|_| LinkError::UnknownExtension(name.to_string()))
    }

    /// First extension of type `T`.
    pub fn get_by_type<T: Any>(&self) -> LinkResult<Rc<T>> {
        self.entries
            .borrow()
            .iter()
            .find_map(|(_, value)| Rc::clone(value).downcast::<T>().ok())
            .ok_or_else(|| LinkError::UnknownExtension(std::any::type_name::<T>().to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().iter().any(|(n, _)| n == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl fmt::Debug for ExtensionContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContainer")
            .field("names", &self.names())
            .finish()
    }
}
