//! Live, kind-discriminated collections of named model objects.
//!
//! Members are created on demand by a factory and never removed. Observers
//! registered with [`VariantCollection::observe`] see every member of their
//! kind exactly once: existing members are replayed at registration, later
//! members are delivered as they are added.
//!
//! Delivery goes through a FIFO queue. A member added from inside an observer
//! callback is queued and delivered once the running callback returns, so no
//! callback is ever re-entered and nothing is dropped.
//!
//! A failed callback poisons the collection: the member it was handling may
//! be only partly wired, so every later add or observe is refused.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{LinkError, LinkResult};
use crate::core::phase::PhaseGuard;

/// A named object with a runtime kind.
pub trait Variant {
    /// Discriminant used for creation and observer matching.
    type Kind: Copy + Eq + fmt::Display + fmt::Debug + 'static;

    fn name(&self) -> &str;

    fn kind(&self) -> Self::Kind;
}

type Factory<T> = Box<dyn Fn(&str, <T as Variant>::Kind) -> T>;
type Callback<T> = Box<dyn FnMut(&Rc<T>) -> LinkResult<()>>;

struct Observer<T: Variant> {
    kind: T::Kind,
    callback: RefCell<Callback<T>>,
}

/// A string-keyed collection of [`Variant`] members.
pub struct VariantCollection<T: Variant> {
    owner: String,
    members: RefCell<Vec<Rc<T>>>,
    observers: RefCell<Vec<Rc<Observer<T>>>>,
    pending: RefCell<VecDeque<(Rc<Observer<T>>, Rc<T>)>>,
    dispatching: Cell<bool>,
    poisoned: Cell<bool>,
    factory: Factory<T>,
    guard: PhaseGuard,
}

impl<T: Variant + 'static> VariantCollection<T> {
    /// Create an empty collection whose members are built by `factory`.
    pub fn new(
        owner: impl Into<String>,
        guard: &PhaseGuard,
        factory: impl Fn(&str, T::Kind) -> T + 'static,
    ) -> Self {
        VariantCollection {
            owner: owner.into(),
            members: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            poisoned: Cell::new(false),
            factory: Box::new(factory),
            guard: guard.clone(),
        }
    }

    /// Get the member called `name`, creating it with `kind` on first use.
    pub fn get_or_create(&self, name: &str, kind: T::Kind) -> LinkResult<Rc<T>> {
        self.get_or_create_with(name, kind, |_| Ok(()))
    }

    /// Like [`get_or_create`](Self::get_or_create), running `configure` on
    /// the member. A new member is configured before observers see it.
    pub fn get_or_create_with(
        &self,
        name: &str,
        kind: T::Kind,
        configure: impl FnOnce(&T) -> LinkResult<()>,
    ) -> LinkResult<Rc<T>> {
        self.ensure_usable()?;
        if name.trim().is_empty() {
            return Err(LinkError::InvalidTargetName {
                name: name.to_string(),
                reason: format!("{} needs non-empty member names", self.owner),
            });
        }
        if let Some(existing) = self.find(name) {
            if existing.kind() != kind {
                return Err(LinkError::NamingCollision {
                    name: name.to_string(),
                    existing: existing.kind().to_string(),
                    requested: kind.to_string(),
                });
            }
            configure(&existing)?;
            return Ok(existing);
        }

        self.guard
            .ensure_mutable(|| format!("adding {} `{}` to {}", kind, name, self.owner))?;

        let member = Rc::new((self.factory)(name, kind));
        configure(&member)?;
        self.members.borrow_mut().push(Rc::clone(&member));
        tracing::debug!("{}: added {} `{}`", self.owner, kind, name);

        let matching: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .filter(|observer| observer.kind == kind)
            .cloned()
            .collect();
        {
            let mut pending = self.pending.borrow_mut();
            for observer in matching {
                pending.push_back((observer, Rc::clone(&member)));
            }
        }
        self.dispatch()?;
        Ok(member)
    }

    /// Invoke `callback` for every current and future member of `kind`.
    pub fn observe(
        &self,
        kind: T::Kind,
        callback: impl FnMut(&Rc<T>) -> LinkResult<()> + 'static,
    ) -> LinkResult<()> {
        self.ensure_usable()?;
        let observer = Rc::new(Observer {
            kind,
            callback: RefCell::new(Box::new(callback) as Callback<T>),
        });
        let existing = self.with_kind(kind);
        self.observers.borrow_mut().push(Rc::clone(&observer));
        {
            let mut pending = self.pending.borrow_mut();
            for member in existing {
                pending.push_back((Rc::clone(&observer), member));
            }
        }
        self.dispatch()
    }

    fn dispatch(&self) -> LinkResult<()> {
        if self.dispatching.replace(true) {
            return Ok(());
        }
        let result = loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some((observer, member)) = next else {
                break Ok(());
            };
            let mut callback = observer.callback.borrow_mut();
            if let Err(err) = (&mut **callback)(&member) {
                break Err(err);
            }
        };
        if result.is_err() {
            self.pending.borrow_mut().clear();
            self.poisoned.set(true);
        }
        self.dispatching.set(false);
        result
    }

    fn ensure_usable(&self) -> LinkResult<()> {
        if self.poisoned.get() {
            return Err(LinkError::Poisoned {
                owner: self.owner.clone(),
            });
        }
        Ok(())
    }

    /// Member called `name`, if any.
    pub fn find(&self, name: &str) -> Option<Rc<T>> {
        self.members
            .borrow()
            .iter()
            .find(|member| member.name() == name)
            .cloned()
    }

    /// All members in insertion order.
    pub fn all(&self) -> Vec<Rc<T>> {
        self.members.borrow().clone()
    }

    /// Members of `kind` in insertion order.
    pub fn with_kind(&self, kind: T::Kind) -> Vec<Rc<T>> {
        self.members
            .borrow()
            .iter()
            .filter(|member| member.kind() == kind)
            .cloned()
            .collect()
    }

    /// Member names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.members
            .borrow()
            .iter()
            .map(|member| member.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }
}

impl<T: Variant> fmt::Debug for VariantCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self
            .members
            .borrow()
            .iter()
            .map(|member| format!("{} {}", member.kind(), member.name()))
            .collect();
        f.debug_struct("VariantCollection")
            .field("owner", &self.owner)
            .field("members", &members)
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phase::PassPhase;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Round,
        Square,
    }

    impl fmt::Display for Shape {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Shape::Round => write!(f, "round"),
                Shape::Square => write!(f, "square"),
            }
        }
    }

    struct Item {
        name: String,
        shape: Shape,
        label: RefCell<Option<String>>,
    }

    impl Variant for Item {
        type Kind = Shape;

        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> Shape {
            self.shape
        }
    }

    fn collection(guard: &PhaseGuard) -> Rc<VariantCollection<Item>> {
        Rc::new(VariantCollection::new("test items", guard, |name, shape| Item {
            name: name.to_string(),
            shape,
            label: RefCell::new(None),
        }))
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&Rc<Item>) -> LinkResult<()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |item: &Rc<Item>| {
            sink.borrow_mut().push(item.name.clone());
            Ok(())
        })
    }

    #[test]
    fn test_same_name_same_kind_returns_existing() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        let a = items.get_or_create("a", Shape::Round).unwrap();
        let again = items.get_or_create("a", Shape::Round).unwrap();
        assert!(Rc::ptr_eq(&a, &again));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_same_name_different_kind_collides() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        items.get_or_create("a", Shape::Round).unwrap();
        match items.get_or_create("a", Shape::Square) {
            Err(LinkError::NamingCollision {
                name,
                existing,
                requested,
            }) => {
                assert_eq!(name, "a");
                assert_eq!(existing, "round");
                assert_eq!(requested, "square");
            }
            other => panic!("expected collision, got {:?}", other.map(|i| i.name.clone())),
        }
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        for name in ["z", "a", "m"] {
            items.get_or_create(name, Shape::Square).unwrap();
        }
        assert_eq!(items.names(), vec!["z", "a", "m"]);
        assert_eq!(items.names(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_observer_registered_first_sees_later_members() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        let (seen, callback) = recorder();
        items.observe(Shape::Round, callback).unwrap();

        items.get_or_create("r1", Shape::Round).unwrap();
        items.get_or_create("s1", Shape::Square).unwrap();
        items.get_or_create("r2", Shape::Round).unwrap();

        assert_eq!(*seen.borrow(), vec!["r1", "r2"]);
    }

    #[test]
    fn test_observer_registered_late_gets_replay() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        items.get_or_create("r1", Shape::Round).unwrap();
        items.get_or_create("s1", Shape::Square).unwrap();

        let (seen, callback) = recorder();
        items.observe(Shape::Round, callback).unwrap();
        items.get_or_create("r2", Shape::Round).unwrap();

        assert_eq!(*seen.borrow(), vec!["r1", "r2"]);
    }

    #[test]
    fn test_two_registrations_replay_independently() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        items.get_or_create("r1", Shape::Round).unwrap();

        let (first, cb1) = recorder();
        let (second, cb2) = recorder();
        items.observe(Shape::Round, cb1).unwrap();
        items.observe(Shape::Round, cb2).unwrap();

        assert_eq!(*first.borrow(), vec!["r1"]);
        assert_eq!(*second.borrow(), vec!["r1"]);
    }

    #[test]
    fn test_configure_runs_before_notification() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        let labels = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&labels);
        items
            .observe(Shape::Round, move |item| {
                sink.borrow_mut().push(item.label.borrow().clone());
                Ok(())
            })
            .unwrap();

        items
            .get_or_create_with("r1", Shape::Round, |item| {
                *item.label.borrow_mut() = Some("configured".into());
                Ok(())
            })
            .unwrap();

        assert_eq!(*labels.borrow(), vec![Some("configured".to_string())]);
    }

    #[test]
    fn test_member_added_from_callback_is_delivered() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        let (seen, mut record) = recorder();
        let weak = Rc::downgrade(&items);

        items
            .observe(Shape::Round, move |item| {
                record(item)?;
                if item.name == "r1" {
                    if let Some(items) = weak.upgrade() {
                        items.get_or_create("r2", Shape::Round)?;
                    }
                }
                Ok(())
            })
            .unwrap();

        items.get_or_create("r1", Shape::Round).unwrap();
        assert_eq!(*seen.borrow(), vec!["r1", "r2"]);
    }

    #[test]
    fn test_callback_error_propagates() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        items
            .observe(Shape::Square, |item| {
                Err(LinkError::MissingRequiredProperty {
                    property: "label".into(),
                    owner: item.name.clone(),
                })
            })
            .unwrap();

        assert!(items.get_or_create("s1", Shape::Square).is_err());
        // `s1` is half wired; neither it nor anything new is handed out.
        for (name, shape) in [("s1", Shape::Square), ("r1", Shape::Round)] {
            assert!(matches!(
                items.get_or_create(name, shape),
                Err(LinkError::Poisoned { .. })
            ));
        }
        assert!(matches!(
            items.observe(Shape::Round, |_| Ok(())),
            Err(LinkError::Poisoned { .. })
        ));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        for name in ["", "  "] {
            assert!(matches!(
                items.get_or_create(name, Shape::Round),
                Err(LinkError::InvalidTargetName { .. })
            ));
        }
        assert!(items.is_empty());
    }

    #[test]
    fn test_add_after_closure_is_rejected() {
        let guard = PhaseGuard::new();
        let items = collection(&guard);
        items.get_or_create("r1", Shape::Round).unwrap();
        guard.advance(PassPhase::Finalizing);

        assert!(matches!(
            items.get_or_create("r2", Shape::Round),
            Err(LinkError::OrderingViolation { .. })
        ));
        // Looking up an existing member is still fine.
        assert!(items.get_or_create("r1", Shape::Round).is_ok());
    }
}
