use std::cell::RefCell;
use std::fmt;

use kuchiki::NodeRef;
use tracing::debug;
use url::Url;

use crate::dom::{clone_element, Document, DomError};
use crate::net::{FetchError, SharedFetcher};

/// Fetches and parses remote pages ahead of navigation.
pub struct PagePrefetcher {
    fetcher: SharedFetcher,
}

impl PagePrefetcher {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }

    /// GET the URL and parse the response as HTML. Transport failures and
    /// non-success statuses are propagated as-is; parsing is permissive and
    /// never fails.
    pub async fn prefetch(&self, url: &Url) -> Result<PrefetchedPage, FetchError> {
        let fetched = self.fetcher.fetch(url).await?;
        if !fetched.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: fetched.status,
            });
        }
        debug!(
            target: "prefetch",
            url = %url,
            bytes = fetched.contents.len(),
            "fetched and parsed remote page"
        );
        Ok(PrefetchedPage::parse(&fetched.contents, fetched.final_url))
    }
}

/// A parsed remote page, split into the parts navigation needs: the head's
/// style elements (re-appliable, reversible) and the body (consumed once).
pub struct PrefetchedPage {
    url: Url,
    document: Document,
}

impl PrefetchedPage {
    pub fn parse(html: &str, url: Url) -> Self {
        let document = Document::parse(html, url.clone());
        Self { url, document }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn style_count(&self) -> usize {
        self.document.head_styles().len()
    }

    /// Insert a copy of every style element from the fetched head into the
    /// target head, in source order. The returned rollback detaches exactly
    /// those copies. A fetched head without styles yields an empty (but
    /// still well-formed) rollback.
    pub fn append_extra_styles(&self, target: &Document) -> Result<StyleRollback, DomError> {
        let head = target.head()?;
        let styles = self.document.head_styles();
        let mut inserted = Vec::with_capacity(styles.len());
        for style in &styles {
            if let Some(copy) = clone_element(style) {
                head.append(copy.clone());
                inserted.push(copy);
            }
        }
        debug!(target: "prefetch", url = %self.url, count = inserted.len(), "applied extra styles");
        Ok(StyleRollback::new(inserted))
    }

    /// Swap the fetched body into the target document, discarding the old
    /// one. Consuming: the fetched body moves into the target tree, so a
    /// second call fails with a missing-body error.
    pub fn replace_body(&self, target: &Document) -> Result<(), DomError> {
        let old_body = target.body()?;
        let new_body = self.document.body()?;
        new_body.detach();
        old_body.insert_before(new_body);
        old_body.detach();
        debug!(target: "prefetch", url = %self.url, "replaced document body");
        Ok(())
    }
}

// kuchiki trees carry no Debug impl, so report the parts that identify
// the page instead.
impl fmt::Debug for PrefetchedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchedPage")
            .field("url", &self.url)
            .field("styles", &self.style_count())
            .finish()
    }
}

/// Undoes one style application. Invoking it a second time is a no-op.
pub struct StyleRollback {
    inserted: RefCell<Option<Vec<NodeRef>>>,
}

impl StyleRollback {
    fn new(inserted: Vec<NodeRef>) -> Self {
        Self {
            inserted: RefCell::new(Some(inserted)),
        }
    }

    /// Detach the styles this rollback owns. Returns how many nodes were
    /// removed; zero on the second and later calls.
    pub fn undo(&self) -> usize {
        match self.inserted.borrow_mut().take() {
            Some(nodes) => {
                for node in &nodes {
                    node.detach();
                }
                nodes.len()
            }
            None => 0,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.inserted.borrow().is_none()
    }
}
