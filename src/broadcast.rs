//! In-process latest-value broadcast channels.
//!
//! Selection and drag state fan out sideways between node instances that
//! share no useful ancestor, so they travel over a [`Channel`] instead of
//! the tree: whoever clicked or started the drag publishes, every mounted
//! node subscribes. A subscriber receives the current value immediately on
//! subscribe and on every later publish or clear.
//!
//! A [`Subscription`] unsubscribes when dropped. Mounted nodes own their
//! subscriptions, so unmounting a node releases its handlers and a stale
//! instance can never be called back after removal from the tree. This is a
//! required part of the teardown contract, not an optional cleanup.
//!
//! All of this is single-threaded; dispatch snapshots the handler list
//! before invoking, so a handler may subscribe or drop subscriptions
//! re-entrantly.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(Option<&T>)>;

struct Inner<T> {
    current: Option<T>,
    handlers: Vec<(u64, Handler<T>)>,
    next_id: u64,
}

/// A single-topic broadcast channel holding the latest published value.
pub struct Channel<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                current: None,
                handlers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Replace the current value and notify every subscriber.
    pub fn publish(&self, value: T) {
        self.set(Some(value));
    }

    /// Drop the current value and notify every subscriber with `None`.
    pub fn clear(&self) {
        self.set(None);
    }

    fn set(&self, value: Option<T>) {
        let (current, snapshot): (Option<T>, Vec<Handler<T>>) = {
            let mut inner = self.inner.borrow_mut();
            inner.current = value;
            (
                inner.current.clone(),
                inner.handlers.iter().map(|(_, h)| h.clone()).collect(),
            )
        };
        for handler in snapshot {
            handler(current.as_ref());
        }
    }

    /// The latest published value, if any.
    pub fn current(&self) -> Option<T> {
        self.inner.borrow().current.clone()
    }

    /// Register a handler. It is invoked once immediately with the current
    /// value, then on every publish/clear until the returned handle drops.
    pub fn subscribe(&self, handler: impl Fn(Option<&T>) + 'static) -> Subscription<T> {
        let handler: Handler<T> = Rc::new(handler);
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.push((id, handler.clone()));
            id
        };
        let current = self.inner.borrow().current.clone();
        handler(current.as_ref());
        Subscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions, mostly useful for teardown assertions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

/// Handle to a registered subscriber; dropping it unsubscribes.
pub struct Subscription<T> {
    id: u64,
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
