//! Multi-listener broadcast primitive.
//!
//! `Signal` keeps its listeners in a copy-on-mutate list: `tap` and `untap`
//! build a new list instead of editing the current one, and `raise` iterates
//! the list it captured on entry. A listener that taps or untaps while a raise
//! is in progress therefore only affects later raises.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Token identifying a tapped listener, used to untap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<dyn Fn(&T)>;

/// Synchronous broadcast of `&T` to every tapped listener, in tap order.
pub struct Signal<T> {
    listeners: RefCell<Rc<Vec<(ListenerId, Listener<T>)>>>,
    next_id: Cell<u64>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Rc::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register a listener. It is invoked on every subsequent `raise`.
    pub fn tap<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let mut listeners = self.listeners.borrow_mut();
        let mut next = Vec::with_capacity(listeners.len() + 1);
        next.extend(listeners.iter().cloned());
        next.push((id, Rc::new(listener) as Listener<T>));
        *listeners = Rc::new(next);
        id
    }

    /// Deregister a listener. Unknown ids are ignored.
    pub fn untap(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|(lid, _)| *lid == id) {
            return;
        }
        let next: Vec<_> = listeners
            .iter()
            .filter(|(lid, _)| *lid != id)
            .cloned()
            .collect();
        *listeners = Rc::new(next);
    }

    /// Invoke every listener registered at the time of the call.
    pub fn raise(&self, value: &T) {
        let snapshot = Rc::clone(&self.listeners.borrow());
        for (_, listener) in snapshot.iter() {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.len())
            .finish()
    }
}
