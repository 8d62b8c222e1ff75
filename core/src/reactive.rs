//! Observable cells and sequences.
//!
//! # Design
//! A [`Cell`] is a shared, single-threaded observable value: reads and writes
//! go through accessor methods, and writes notify subscribers. An
//! [`ObservableVec`] is the sequence counterpart, notifying on `push` and
//! `clear`. Cloning either shares the underlying state, so a cell embedded in
//! a model and the same cell held by a view observe one value.
//!
//! Listener bookkeeping uses monotonic ids and snapshot-before-notify: the
//! internal borrow is released before callbacks run, so a listener may
//! subscribe or unsubscribe reentrantly. A listener removed during a
//! notification round is still called in that round; one added during a round
//! is first called on the next write.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identifies a subscription so it can be removed later.
pub type ListenerId = u64;

struct CellState<T> {
    value: T,
    listeners: Vec<(ListenerId, Rc<dyn Fn(&T)>)>,
    next_id: ListenerId,
}

/// A shared observable value.
pub struct Cell<T> {
    state: Rc<RefCell<CellState<T>>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({:?})", self.state.borrow().value)
    }
}

impl<T: Clone> Cell<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(CellState {
                value,
                listeners: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Current value.
    pub fn read(&self) -> T {
        self.state.borrow().value.clone()
    }

    /// Replace the value and notify subscribers.
    pub fn write(&self, value: T) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.value = value.clone();
            state.listeners.clone()
        };
        for (_, listener) in listeners {
            listener(&value);
        }
    }

    /// Register `listener` to be called with every written value.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Remove a subscription. Does nothing if `id` is unknown.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }

    /// True when `self` and `other` share the same underlying state.
    pub fn shares_state(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

struct ObservableVecState<T> {
    items: Vec<T>,
    listeners: Vec<(ListenerId, Rc<dyn Fn(&[T])>)>,
    next_id: ListenerId,
}

/// A shared observable sequence, notifying subscribers with a snapshot of the
/// full contents after every mutation.
pub struct ObservableVec<T> {
    state: Rc<RefCell<ObservableVecState<T>>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableVec({:?})", self.state.borrow().items)
    }
}

impl<T: Clone> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ObservableVec<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ObservableVecState {
                items: Vec::new(),
                listeners: Vec::new(),
                next_id: 1,
            })),
        }
    }

    fn notify(&self) {
        let (items, listeners) = {
            let state = self.state.borrow();
            (state.items.clone(), state.listeners.clone())
        };
        for (_, listener) in listeners {
            listener(&items);
        }
    }

    /// Append one item and notify.
    pub fn push(&self, item: T) {
        self.state.borrow_mut().items.push(item);
        self.notify();
    }

    /// Remove all items and notify.
    pub fn clear(&self) {
        self.state.borrow_mut().items.clear();
        self.notify();
    }

    /// Snapshot of the current contents.
    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    /// Register `listener` to be called with a contents snapshot after every
    /// mutation.
    pub fn subscribe(&self, listener: impl Fn(&[T]) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Remove a subscription. Does nothing if `id` is unknown.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id);
    }
}
