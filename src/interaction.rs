use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::dom::events::{EventKind, EventTarget, ListenerId};
use crate::observable::ObservableState;

/// Event kinds that count as a user interaction.
pub const INTERACTION_EVENTS: [EventKind; 5] = [
    EventKind::Click,
    EventKind::Scroll,
    EventKind::KeyDown,
    EventKind::PointerMove,
    EventKind::TouchStart,
];

/// Detects the first qualifying user interaction on the window and fires
/// registered callbacks exactly once.
///
/// The flag is monotonic: false until the first qualifying event, then true
/// for the rest of the page's life. When the first event fires, every
/// listener for the whole event set is torn down in one sweep; single-fire
/// listener semantics would only remove the one that fired.
pub struct FirstInteractionSignal {
    state: ObservableState<bool>,
}

impl FirstInteractionSignal {
    pub fn new(window: Rc<EventTarget>) -> Self {
        let state = ObservableState::new(false);
        Self::install_listeners(&window, &state);
        Self { state }
    }

    fn install_listeners(window: &Rc<EventTarget>, state: &ObservableState<bool>) {
        let ids: Rc<RefCell<Vec<ListenerId>>> = Rc::new(RefCell::new(Vec::new()));
        for kind in INTERACTION_EVENTS {
            let state = state.clone();
            let window_handle = Rc::clone(window);
            let ids_handle = Rc::clone(&ids);
            let id = window.add_listener(kind, move |event, _state| {
                debug!(target: "interaction", event = event.kind.name(), "first interaction observed");
                // Tear down the whole set before notifying, so subscribers
                // observe the listeners already gone.
                for id in ids_handle.borrow_mut().drain(..) {
                    window_handle.remove_listener(id);
                }
                state.notify(true);
            });
            ids.borrow_mut().push(id);
        }
    }

    pub fn has_interacted(&self) -> bool {
        self.state.get()
    }

    /// Run `callback` exactly once: synchronously during registration if the
    /// interaction already happened, otherwise on the first interaction.
    /// Callbacks pending together fire in subscription order.
    pub fn on_first_interaction(&self, callback: impl FnOnce() + 'static) {
        let pending = Rc::new(RefCell::new(Some(callback)));
        let slot: Rc<Cell<Option<crate::observable::SubscriptionId>>> = Rc::new(Cell::new(None));

        let state = self.state.clone();
        let pending_handle = Rc::clone(&pending);
        let slot_handle = Rc::clone(&slot);
        let id = self.state.subscribe(move |interacted| {
            if !*interacted {
                return;
            }
            if let Some(callback) = pending_handle.borrow_mut().take() {
                callback();
            }
            // Drop the subscription after its single shot.
            if let Some(id) = slot_handle.take() {
                state.unsubscribe(id);
            }
        });

        if pending.borrow().is_some() {
            slot.set(Some(id));
        } else {
            // Replay consumed the callback during subscribe.
            self.state.unsubscribe(id);
        }
    }
}
