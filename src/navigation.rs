use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use kuchiki::NodeRef;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;
use crate::dom::events::{EventKind, EventTarget};
use crate::dom::{attribute, enclosing_anchor, node_key, Document, DomError, NodeKey};
use crate::history::History;
use crate::net::FetchError;
use crate::prefetch::{PagePrefetcher, PrefetchedPage, StyleRollback};

/// The opt-in attribute anchors carry. Anchors without it, or with an
/// unrecognized value, are left entirely alone.
pub const NAVIGATION_ATTRIBUTE: &str = "data-client-navigation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMarker {
    /// Prefetch on hover; also click-navigable.
    Hover,
    /// Intercept clicks only.
    Click,
}

impl NavigationMarker {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hover" => Some(Self::Hover),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("anchor has no usable href")]
    MissingHref,
    #[error("could not resolve href {href}: {source}")]
    InvalidHref {
        href: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("navigation superseded by a later click")]
    Superseded,
}

/// What a completed click navigation did.
#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    pub url: Url,
    pub reused_prefetch: bool,
    pub cleaned_previous_styles: bool,
}

/// Event-driven orchestrator for in-place navigation.
///
/// Installed on the window target with delegated hover and click listeners.
/// Owns the augmentation side table (anchor identity -> prefetched page) and
/// the single active style-rollback slot, so independent controllers share
/// no hidden state.
pub struct NavigationController {
    document: Rc<Document>,
    prefetcher: PagePrefetcher,
    history: Rc<History>,
    augmented: RefCell<HashMap<NodeKey, Rc<PrefetchedPage>>>,
    hover_in_flight: RefCell<HashSet<NodeKey>>,
    active_cleanup: RefCell<Option<StyleRollback>>,
    generation: Cell<u64>,
}

impl NavigationController {
    pub fn new(document: Rc<Document>, prefetcher: PagePrefetcher, history: Rc<History>) -> Rc<Self> {
        Rc::new(Self {
            document,
            prefetcher,
            history,
            augmented: RefCell::new(HashMap::new()),
            hover_in_flight: RefCell::new(HashSet::new()),
            active_cleanup: RefCell::new(None),
            generation: Cell::new(0),
        })
    }

    /// Register the delegated hover and click listeners. Registers nothing
    /// when client-side navigation is disabled by configuration; plain
    /// anchors then keep their default behavior end to end.
    pub fn install(self: &Rc<Self>, window: &EventTarget, settings: &Settings) {
        if !settings.client_navigation {
            debug!(target: "navigation", "client navigation disabled, not installing listeners");
            return;
        }

        let controller = Rc::clone(self);
        window.add_listener(EventKind::MouseOver, move |event, _state| {
            let Some(target) = event.target.as_ref() else {
                return;
            };
            let Some(anchor) = enclosing_anchor(target) else {
                return;
            };
            if controller.marker_for(&anchor) != Some(NavigationMarker::Hover) {
                return;
            }
            let controller = Rc::clone(&controller);
            tokio::task::spawn_local(async move {
                controller.on_hover(&anchor).await;
            });
        });

        let controller = Rc::clone(self);
        window.add_listener(EventKind::Click, move |event, state| {
            let Some(target) = event.target.as_ref() else {
                return;
            };
            let Some(anchor) = enclosing_anchor(target) else {
                return;
            };
            if controller.marker_for(&anchor).is_none() {
                // Not opted in: default navigation proceeds unimpeded.
                return;
            }
            state.prevent_default();
            let controller = Rc::clone(&controller);
            tokio::task::spawn_local(async move {
                if let Err(err) = controller.on_click(&anchor).await {
                    controller.handle_click_failure(&anchor, err);
                }
            });
        });
    }

    pub fn marker_for(&self, anchor: &NodeRef) -> Option<NavigationMarker> {
        attribute(anchor, NAVIGATION_ATTRIBUTE)
            .as_deref()
            .and_then(NavigationMarker::parse)
    }

    fn anchor_url(&self, anchor: &NodeRef) -> Result<Url, NavigationError> {
        let href = attribute(anchor, "href").ok_or(NavigationError::MissingHref)?;
        self.document
            .resolve_href(&href)
            .map_err(|source| NavigationError::InvalidHref { href, source })
    }

    /// Best-effort predictive prefetch. Errors are absorbed: a failed hover
    /// prefetch leaves the anchor un-augmented and the click path intact.
    pub async fn on_hover(&self, anchor: &NodeRef) {
        let key = node_key(anchor);
        if self.augmented.borrow().contains_key(&key)
            || self.hover_in_flight.borrow().contains(&key)
        {
            return;
        }
        let url = match self.anchor_url(anchor) {
            Ok(url) => url,
            Err(err) => {
                debug!(target: "navigation", error = %err, "ignoring hover on unusable anchor");
                return;
            }
        };

        self.hover_in_flight.borrow_mut().insert(key);
        match self.prefetcher.prefetch(&url).await {
            Ok(page) => {
                debug!(target: "navigation", url = %url, "anchor augmented with prefetched page");
                self.augmented.borrow_mut().insert(key, Rc::new(page));
            }
            Err(err) => {
                debug!(target: "navigation", url = %url, error = %err, "hover prefetch failed");
            }
        }
        self.hover_in_flight.borrow_mut().remove(&key);
    }

    /// Click-driven navigation: swap the body in place and push history.
    ///
    /// Uses the cached prefetch when the anchor was augmented, fetching
    /// fresh otherwise; augmentation is an optimization, never a
    /// correctness dependency. Overlapping clicks race latest-wins: each
    /// click bumps the generation before awaiting, and a handler that comes
    /// back stale discards its result.
    pub async fn on_click(&self, anchor: &NodeRef) -> Result<NavigationOutcome, NavigationError> {
        let url = self.anchor_url(anchor)?;
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        let cached = self.augmented.borrow_mut().remove(&node_key(anchor));
        let reused_prefetch = cached.is_some();
        let fetched = match cached {
            Some(page) => Ok(page),
            None => self.prefetcher.prefetch(&url).await.map(Rc::new),
        };

        // Latest navigation wins: a slower click that comes back stale must
        // not apply its result, and must not surface its fetch error either,
        // or the failure fallback would record a full load over the newer
        // navigation.
        if self.generation.get() != generation {
            debug!(target: "navigation", url = %url, "discarding superseded navigation");
            return Err(NavigationError::Superseded);
        }
        let page = fetched?;

        // At most one style injection is active; clear the previous one
        // before applying the new page's styles.
        let cleaned_previous_styles = match self.active_cleanup.borrow_mut().take() {
            Some(previous) => {
                previous.undo();
                true
            }
            None => false,
        };
        let rollback = page.append_extra_styles(&self.document)?;
        *self.active_cleanup.borrow_mut() = Some(rollback);

        page.replace_body(&self.document)?;
        self.history.push(url.clone());
        self.document.set_base_url(url.clone());

        debug!(target: "navigation", url = %url, reused_prefetch, "navigated in place");
        Ok(NavigationOutcome {
            url,
            reused_prefetch,
            cleaned_previous_styles,
        })
    }

    /// The default action was already prevented by the click listener, so a
    /// failed in-place navigation falls back to a full-document load rather
    /// than leaving the click silently dead.
    fn handle_click_failure(&self, anchor: &NodeRef, err: NavigationError) {
        if matches!(err, NavigationError::Superseded) {
            return;
        }
        match self.anchor_url(anchor) {
            Ok(url) => {
                warn!(
                    target: "navigation",
                    url = %url,
                    error = %err,
                    "in-place navigation failed, falling back to full load"
                );
                self.history.assign(url);
            }
            Err(resolve_err) => {
                warn!(
                    target: "navigation",
                    error = %resolve_err,
                    "in-place navigation failed and the href is unusable"
                );
            }
        }
    }

    pub fn is_augmented(&self, anchor: &NodeRef) -> bool {
        self.augmented.borrow().contains_key(&node_key(anchor))
    }

    pub fn has_pending_cleanup(&self) -> bool {
        self.active_cleanup.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_parses_only_known_values() {
        assert_eq!(NavigationMarker::parse("hover"), Some(NavigationMarker::Hover));
        assert_eq!(NavigationMarker::parse("click"), Some(NavigationMarker::Click));
        assert_eq!(NavigationMarker::parse("Hover"), None);
        assert_eq!(NavigationMarker::parse(""), None);
        assert_eq!(NavigationMarker::parse("prefetch"), None);
    }
}
