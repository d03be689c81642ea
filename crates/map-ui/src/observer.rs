//! Typed single-threaded observers.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Handler<E> = Box<dyn FnMut(&E)>;

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
    /// Ids unsubscribed while their handler list was checked out by `emit`.
    removed: Vec<u64>,
    emitting: bool,
}

/// An event stream with any number of subscribers.
///
/// Handlers may subscribe or unsubscribe from inside a callback. New
/// handlers first see the next emission.
pub struct Observable<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Observable<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
                removed: Vec::new(),
                emitting: false,
            })),
        }
    }

    /// Register `handler`. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Box::new(handler)));
            id
        };

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut registry = registry.borrow_mut();
                    registry.handlers.retain(|(h, _)| *h != id);
                    if registry.emitting {
                        registry.removed.push(id);
                    }
                }
            })),
        }
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn emit(&self, event: &E) {
        let mut handlers = {
            let mut registry = self.registry.borrow_mut();
            registry.emitting = true;
            std::mem::take(&mut registry.handlers)
        };

        for (id, handler) in handlers.iter_mut() {
            let cancelled = self.registry.borrow().removed.contains(id);
            if !cancelled {
                handler(event);
            }
        }

        let mut registry = self.registry.borrow_mut();
        let removed = std::mem::take(&mut registry.removed);
        handlers.retain(|(id, _)| !removed.contains(id));
        let added = std::mem::take(&mut registry.handlers);
        handlers.extend(added);
        registry.handlers = handlers;
        registry.emitting = false;
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }
}

impl<E: 'static> Default for Observable<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration handle returned by [`Observable::subscribe`].
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
