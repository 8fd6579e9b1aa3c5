//! Shared entity handles.
//!
//! A script variable and the registry entry for the same entity must be one
//! instance, so that `s.setSpeed(3)` after construction changes what gets
//! simulated. [`Handle`] is that shared instance.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

pub struct Handle<T: ?Sized>(Rc<RefCell<T>>);

impl<T> Handle<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }
}

impl<T: ?Sized> Handle<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Reference identity: true only for clones of the same handle.
    pub fn same_instance<U: ?Sized>(&self, other: &Handle<U>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub(crate) fn from_rc(inner: Rc<RefCell<T>>) -> Self {
        Self(inner)
    }

    pub(crate) fn rc(&self) -> &Rc<RefCell<T>> {
        &self.0
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0.borrow(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = Handle::new(1_u32);
        let b = a.clone();
        *b.borrow_mut() = 7;
        assert_eq!(*a.borrow(), 7);
        assert!(a.same_instance(&b));
    }

    #[test]
    fn test_equal_values_are_distinct_instances() {
        let a = Handle::new(5_u32);
        let b = Handle::new(5_u32);
        assert!(!a.same_instance(&b));
    }
}
