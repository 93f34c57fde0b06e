//! Targets and bindings.
//!
//! A task never owns the object it animates. It holds a weak reference plus
//! a setter; once the host drops the object the task notices on its next
//! value write and stops its tree.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Identity of a target object, used to filter bulk operations.
///
/// Derived from the allocation address, so it is only meaningful while the
/// target is alive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TargetKey(pub usize);

impl TargetKey {
    pub fn of<T: ?Sized>(target: &Rc<T>) -> Self {
        TargetKey(Rc::as_ptr(target) as *const () as usize)
    }
}

type ApplyFn = Box<dyn FnMut(&dyn Any, &Value) -> bool>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    Applied,
    /// The target is alive but already borrowed elsewhere.
    Busy,
    Destroyed,
}

/// Weak reference to a target plus the setter that writes values into it.
pub struct Binding {
    target: Weak<dyn Any>,
    key: TargetKey,
    apply: ApplyFn,
}

impl Binding {
    /// Bind to a shared cell. `set` receives every value the task produces.
    pub fn new<T: 'static>(
        target: &Rc<RefCell<T>>,
        mut set: impl FnMut(&mut T, &Value) + 'static,
    ) -> Self {
        let erased: Rc<dyn Any> = target.clone();
        let apply: ApplyFn = Box::new(move |any, value| {
            let Some(cell) = any.downcast_ref::<RefCell<T>>() else {
                return false;
            };
            match cell.try_borrow_mut() {
                Ok(mut inner) => {
                    set(&mut inner, value);
                    true
                }
                Err(_) => false,
            }
        });
        Self {
            target: Rc::downgrade(&erased),
            key: TargetKey::of(target),
            apply,
        }
    }

    #[inline]
    pub fn key(&self) -> TargetKey {
        self.key
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    pub(crate) fn apply(&mut self, value: &Value) -> ApplyOutcome {
        let Some(strong) = self.target.upgrade() else {
            return ApplyOutcome::Destroyed;
        };
        if (self.apply)(&*strong, value) {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Busy
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}
