use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use url::Url;

use softnav::config::Settings;
use softnav::diagrams::DiagramEnhancer;
use softnav::dom::events::EventTarget;
use softnav::dom::{attribute, Document};
use softnav::history::History;
use softnav::interaction::FirstInteractionSignal;
use softnav::navigation::{NavigationController, NAVIGATION_ATTRIBUTE};
use softnav::net::{HttpFetcher, SharedFetcher};
use softnav::prefetch::PagePrefetcher;
use softnav::script::DeferredScriptLoader;

fn main() -> anyhow::Result<()> {
    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let raw_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("https://example.com"));
    let start_url = Url::parse(&raw_url).with_context(|| format!("invalid start URL {raw_url}"))?;

    let settings_path = std::env::var("SOFTNAV_CONFIG").ok().map(PathBuf::from);
    let settings = Settings::load(settings_path).unwrap_or_else(|err| {
        eprintln!("Failed to load settings: {err}. Using defaults.");
        Settings::default()
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();

    rt.block_on(local.run_until(run(start_url, settings)))
}

async fn run(start_url: Url, settings: Settings) -> anyhow::Result<()> {
    let fetcher: SharedFetcher = Rc::new(HttpFetcher::new());

    let fetched = fetcher
        .fetch(&start_url)
        .await
        .with_context(|| format!("failed to load {start_url}"))?;
    let document = Rc::new(Document::parse(&fetched.contents, fetched.final_url.clone()));
    tracing::info!(url = %fetched.final_url, status = fetched.status, "loaded start page");

    let window = EventTarget::new();
    let history = Rc::new(History::new());
    let prefetcher = PagePrefetcher::new(Rc::clone(&fetcher));

    let controller = NavigationController::new(Rc::clone(&document), prefetcher, history);
    controller.install(&window, &settings);

    let signal = FirstInteractionSignal::new(Rc::clone(&window));
    if settings.diagrams {
        let loader = Rc::new(DeferredScriptLoader::new(Rc::clone(&fetcher)));
        let enhancer = DiagramEnhancer::new(Rc::clone(&document), loader, &settings);
        enhancer.install(&signal);
    }

    let navigable = document.select_all(&format!("a[{NAVIGATION_ATTRIBUTE}]"));
    tracing::info!(count = navigable.len(), "navigable anchors on the start page");
    for anchor in &navigable {
        let marker = attribute(anchor, NAVIGATION_ATTRIBUTE).unwrap_or_default();
        let href = attribute(anchor, "href").unwrap_or_default();
        tracing::info!(%marker, %href, "anchor");
    }

    Ok(())
}
