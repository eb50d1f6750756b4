use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kuchiki::NodeRef;

/// Event kinds the engine dispatches. Names mirror the DOM event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseOver,
    Scroll,
    KeyDown,
    PointerMove,
    TouchStart,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::MouseOver => "mouseover",
            EventKind::Scroll => "scroll",
            EventKind::KeyDown => "keydown",
            EventKind::PointerMove => "pointermove",
            EventKind::TouchStart => "touchstart",
        }
    }
}

/// A synthetic event aimed at an optional target node.
#[derive(Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: Option<NodeRef>,
}

impl DomEvent {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, target: None }
    }

    pub fn with_target(kind: EventKind, target: NodeRef) -> Self {
        Self {
            kind,
            target: Some(target),
        }
    }
}

/// Outcome flags a listener can set during dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventState {
    default_prevented: bool,
}

impl EventState {
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handle for a registered listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Rc<dyn Fn(&DomEvent, &mut EventState)>;

struct ListenerEntry {
    id: ListenerId,
    kind: EventKind,
    handler: Handler,
}

/// Window-level event target. Listeners are delegated: a single listener per
/// kind inspects `event.target` and decides for itself whether it applies.
#[derive(Default)]
pub struct EventTarget {
    listeners: RefCell<Vec<ListenerEntry>>,
    next_id: Cell<u64>,
}

impl EventTarget {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add_listener(
        &self,
        kind: EventKind,
        handler: impl Fn(&DomEvent, &mut EventState) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            kind,
            handler: Rc::new(handler),
        });
        id
    }

    /// Remove a listener. Removing one that is already gone is a no-op.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    pub fn total_listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Dispatch to every listener registered for the event's kind, in
    /// registration order. Dispatch iterates a snapshot, so a listener may
    /// add or remove listeners while it runs; removals take effect for the
    /// next dispatch.
    pub fn dispatch(&self, event: &DomEvent) -> EventState {
        let snapshot: Vec<Handler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.kind == event.kind)
            .map(|entry| Rc::clone(&entry.handler))
            .collect();

        let mut state = EventState::default();
        for handler in snapshot {
            handler(event, &mut state);
        }
        state
    }
}
