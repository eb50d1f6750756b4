// Library exports for testing

pub mod config;
pub mod diagrams;
pub mod dom;
pub mod history;
pub mod interaction;
pub mod navigation;
pub mod net;
pub mod observable;
pub mod prefetch;
pub mod script;

// Re-export commonly used types for tests
pub use config::Settings;
pub use diagrams::DiagramEnhancer;
pub use history::{History, HistoryEntry, Transition};
pub use interaction::FirstInteractionSignal;
pub use navigation::{NavigationController, NavigationMarker, NAVIGATION_ATTRIBUTE};
pub use observable::ObservableState;
pub use prefetch::{PagePrefetcher, PrefetchedPage};
pub use script::{DeferredScriptLoader, ScriptAttributes};
