use std::cell::RefCell;
use std::rc::Rc;

/// Handle for a registered subscriber, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<S> = Rc<RefCell<dyn FnMut(&S)>>;

struct Inner<S> {
    value: S,
    subscribers: Vec<(SubscriptionId, Callback<S>)>,
    next_id: u64,
}

/// Single-value state container with change notification.
///
/// Subscribing replays the current value into the callback synchronously.
/// `notify` suppresses redundant updates: subscribers only run when the new
/// value differs from the current one. Single-threaded by design; all
/// callbacks run on the caller's stack.
pub struct ObservableState<S> {
    inner: Rc<RefCell<Inner<S>>>,
}

impl<S> Clone for ObservableState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + PartialEq + 'static> ObservableState<S> {
    pub fn new(value: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn get(&self) -> S {
        self.inner.borrow().value.clone()
    }

    /// Register a callback and immediately replay the current value into it.
    pub fn subscribe(&self, callback: impl FnMut(&S) + 'static) -> SubscriptionId {
        let callback: Callback<S> = Rc::new(RefCell::new(callback));
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = SubscriptionId(inner.next_id);
            inner.next_id += 1;
            inner.subscribers.push((id, Rc::clone(&callback)));
            (id, inner.value.clone())
        };
        // Replay outside the borrow: the callback may subscribe or
        // unsubscribe while it runs.
        (&mut *callback.borrow_mut())(&current);
        id
    }

    /// Remove a subscriber. Removing one that is already gone is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
        inner.subscribers.len() != before
    }

    /// Update the value and notify subscribers, unless the value is unchanged.
    ///
    /// Dispatch iterates a snapshot of the subscriber list, so a callback may
    /// unsubscribe itself (or others) mid-notification; removals take effect
    /// for the next notification.
    pub fn notify(&self, new_value: S) {
        let snapshot: Vec<Callback<S>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == new_value {
                return;
            }
            inner.value = new_value.clone();
            inner
                .subscribers
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect()
        };
        for callback in snapshot {
            (&mut *callback.borrow_mut())(&new_value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}
