mod support;

use std::rc::Rc;

use softnav::dom::node_key;
use softnav::net::{FetchError, SharedFetcher};
use softnav::prefetch::PagePrefetcher;

use support::{base_url, document, StubFetcher};

fn prefetcher(fetcher: &Rc<StubFetcher>) -> PagePrefetcher {
    PagePrefetcher::new(Rc::clone(fetcher) as SharedFetcher)
}

#[tokio::test]
async fn apply_then_rollback_restores_the_exact_style_set() {
    let fetcher = StubFetcher::new();
    fetcher.route_html(
        "/about",
        "<html><head><style>.a{}</style><style>.b{}</style></head><body>About</body></html>",
    );

    let target = document("<html><head><style>.base{}</style></head><body>Home</body></html>");
    let before: Vec<_> = target.head_styles().iter().map(node_key).collect();
    assert_eq!(before.len(), 1);

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/about").unwrap())
        .await
        .expect("prefetch");
    assert_eq!(page.style_count(), 2);

    let rollback = page.append_extra_styles(&target).expect("apply styles");
    assert_eq!(target.head_styles().len(), 3);

    assert_eq!(rollback.undo(), 2);
    let after: Vec<_> = target.head_styles().iter().map(node_key).collect();
    assert_eq!(after, before, "head style set must be identical by reference");
}

#[tokio::test]
async fn rollback_is_idempotent() {
    let fetcher = StubFetcher::new();
    fetcher.route_html(
        "/styled",
        "<html><head><style>.x{}</style></head><body>S</body></html>",
    );
    let target = document("<html><head></head><body>Home</body></html>");

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/styled").unwrap())
        .await
        .expect("prefetch");
    let rollback = page.append_extra_styles(&target).expect("apply styles");

    assert_eq!(rollback.undo(), 1);
    assert!(rollback.is_spent());
    assert_eq!(rollback.undo(), 0);
    assert_eq!(target.head_styles().len(), 0);
}

#[tokio::test]
async fn styles_apply_in_source_order() {
    let fetcher = StubFetcher::new();
    fetcher.route_html(
        "/ordered",
        "<html><head><style>.first{}</style><style>.second{}</style></head><body>O</body></html>",
    );
    let target = document("<html><head></head><body>Home</body></html>");

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/ordered").unwrap())
        .await
        .expect("prefetch");
    page.append_extra_styles(&target).expect("apply styles");

    let styles = target.head_styles();
    assert_eq!(styles[0].text_contents(), ".first{}");
    assert_eq!(styles[1].text_contents(), ".second{}");
}

#[tokio::test]
async fn a_fetched_head_without_styles_is_not_an_error() {
    let fetcher = StubFetcher::new();
    fetcher.route_html("/plain", "<html><head></head><body>Plain</body></html>");
    let target = document("<html><head></head><body>Home</body></html>");

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/plain").unwrap())
        .await
        .expect("prefetch");
    assert_eq!(page.style_count(), 0);

    let rollback = page.append_extra_styles(&target).expect("apply styles");
    assert_eq!(rollback.undo(), 0);
}

#[tokio::test]
async fn replace_body_swaps_wholesale_and_consumes_the_page() {
    let fetcher = StubFetcher::new();
    fetcher.route_html("/about", "<html><head></head><body>About</body></html>");
    let target = document("<html><head></head><body>Home</body></html>");

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/about").unwrap())
        .await
        .expect("prefetch");
    page.replace_body(&target).expect("replace body");
    assert_eq!(target.body().unwrap().text_contents(), "About");

    // The fetched body moved into the target; a second swap has nothing
    // left to move.
    assert!(page.replace_body(&target).is_err());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let fetcher = StubFetcher::new();
    fetcher.route_status("/gone", 404, "not found");

    let err = prefetcher(&fetcher)
        .prefetch(&base_url().join("/gone").unwrap())
        .await
        .expect_err("404 must fail");
    match err {
        FetchError::Status { status, .. } => assert_eq!(status, 404),
        other => panic!("expected status error, got {other}"),
    }
}

#[tokio::test]
async fn transport_failures_propagate_as_is() {
    let fetcher = StubFetcher::new();
    fetcher.route_error("/down", "connection refused");

    let err = prefetcher(&fetcher)
        .prefetch(&base_url().join("/down").unwrap())
        .await
        .expect_err("transport failure must fail");
    match err {
        FetchError::Network { message, .. } => assert!(message.contains("connection refused")),
        other => panic!("expected network error, got {other}"),
    }
}

#[tokio::test]
async fn malformed_html_parses_permissively() {
    let fetcher = StubFetcher::new();
    fetcher.route_html("/broken", "<body><p>un<closed<style>.s{}</style>");
    let target = document("<html><head></head><body>Home</body></html>");

    let page = prefetcher(&fetcher)
        .prefetch(&base_url().join("/broken").unwrap())
        .await
        .expect("malformed HTML must still parse");
    // Whatever the parser recovered is usable; applying must not fail.
    page.append_extra_styles(&target).expect("apply styles");
}
