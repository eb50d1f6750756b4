use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::dom::Document;
use crate::interaction::FirstInteractionSignal;
use crate::observable::ObservableState;
use crate::script::{DeferredScriptLoader, ScriptAttributes};

/// Loads the third-party diagram renderer once the user has interacted.
///
/// This is optional enhancement on top of working pages: a load failure is
/// logged and the page stays usable without diagrams.
pub struct DiagramEnhancer {
    document: Rc<Document>,
    loader: Rc<DeferredScriptLoader>,
    script_url: String,
    ready: ObservableState<bool>,
}

impl DiagramEnhancer {
    pub fn new(
        document: Rc<Document>,
        loader: Rc<DeferredScriptLoader>,
        settings: &Settings,
    ) -> Rc<Self> {
        Rc::new(Self {
            document,
            loader,
            script_url: settings.diagram_script_url.clone(),
            ready: ObservableState::new(false),
        })
    }

    /// Arm the enhancement behind the first-interaction gate.
    pub fn install(self: &Rc<Self>, signal: &FirstInteractionSignal) {
        let enhancer = Rc::clone(self);
        signal.on_first_interaction(move || {
            tokio::task::spawn_local(async move {
                enhancer.activate().await;
            });
        });
    }

    /// Load the renderer script now. Public so callers and tests can drive
    /// it without synthesizing an interaction.
    pub async fn activate(&self) {
        let attributes = ScriptAttributes::src(self.script_url.clone()).with_async();
        match self.loader.load(&self.document, attributes).await {
            Ok(script) => {
                debug!(target: "diagrams", src = %script.src, "diagram renderer loaded");
                self.ready.notify(true);
            }
            Err(err) => {
                warn!(
                    target: "diagrams",
                    error = %err,
                    "diagram renderer failed to load, continuing without diagrams"
                );
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn ready(&self) -> &ObservableState<bool> {
        &self.ready
    }
}
