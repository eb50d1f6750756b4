use std::fmt;

use kuchiki::NodeRef;
use thiserror::Error;
use tracing::debug;

use crate::dom::{element_from_snippet, Document, DomError};
use crate::net::SharedFetcher;

/// Attributes for an injected script element. Only `src` is required.
#[derive(Debug, Clone)]
pub struct ScriptAttributes {
    pub src: String,
    pub async_load: bool,
    pub defer: bool,
}

impl ScriptAttributes {
    pub fn src(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            async_load: false,
            defer: false,
        }
    }

    pub fn with_async(mut self) -> Self {
        self.async_load = true;
        self
    }

    pub fn with_defer(mut self) -> Self {
        self.defer = true;
        self
    }

    fn to_tag(&self) -> String {
        let mut tag = format!(
            "<script src=\"{}\"",
            html_escape::encode_double_quoted_attribute(&self.src)
        );
        if self.async_load {
            tag.push_str(" async");
        }
        if self.defer {
            tag.push_str(" defer");
        }
        tag.push_str("></script>");
        tag
    }
}

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("script src {src} is not a valid URL")]
    InvalidSrc { src: String },
    #[error("failed to load script {src}: {message}")]
    Failed { src: String, message: String },
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ScriptLoadError {
    /// The source URL the failed request was for.
    pub fn src(&self) -> Option<&str> {
        match self {
            ScriptLoadError::InvalidSrc { src } => Some(src),
            ScriptLoadError::Failed { src, .. } => Some(src),
            ScriptLoadError::Dom(_) => None,
        }
    }
}

/// A script element that finished loading.
pub struct LoadedScript {
    pub src: String,
    pub element: NodeRef,
    pub contents: String,
}

// The element node has no Debug impl of its own.
impl fmt::Debug for LoadedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedScript")
            .field("src", &self.src)
            .field("bytes", &self.contents.len())
            .finish()
    }
}

/// Appends script elements to a document head and resolves them through the
/// fetch layer. Every call appends a fresh element; repeated requests for the
/// same source are the caller's problem to dedup.
pub struct DeferredScriptLoader {
    fetcher: SharedFetcher,
}

impl DeferredScriptLoader {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }

    /// Append the script element to the document head and resolve its source.
    /// Resolves exactly once on success; fails exactly once, with the source
    /// URL in the error, otherwise. The element stays appended either way.
    pub async fn load(
        &self,
        document: &Document,
        attributes: ScriptAttributes,
    ) -> Result<LoadedScript, ScriptLoadError> {
        let head = document.head()?;
        let element = element_from_snippet(&attributes.to_tag(), "script")
            .ok_or(DomError::MissingElement("script"))?;
        head.append(element.clone());

        let url = document
            .resolve_href(&attributes.src)
            .map_err(|_| ScriptLoadError::InvalidSrc {
                src: attributes.src.clone(),
            })?;

        match self.fetcher.fetch(&url).await {
            Ok(fetched) if fetched.is_success() => {
                debug!(
                    target: "script",
                    src = %attributes.src,
                    bytes = fetched.contents.len(),
                    "script loaded"
                );
                Ok(LoadedScript {
                    src: attributes.src,
                    element,
                    contents: fetched.contents,
                })
            }
            Ok(fetched) => Err(ScriptLoadError::Failed {
                src: attributes.src,
                message: format!("status {}", fetched.status),
            }),
            Err(err) => Err(ScriptLoadError::Failed {
                src: attributes.src,
                message: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_includes_requested_flags() {
        let plain = ScriptAttributes::src("https://cdn.example/lib.js").to_tag();
        assert_eq!(plain, "<script src=\"https://cdn.example/lib.js\"></script>");

        let full = ScriptAttributes::src("/lib.js").with_async().with_defer().to_tag();
        assert_eq!(full, "<script src=\"/lib.js\" async defer></script>");
    }

    #[test]
    fn tag_escapes_attribute_quotes() {
        let tag = ScriptAttributes::src("/lib.js?q=\"x\"").to_tag();
        assert!(!tag.contains("q=\"x\""), "quotes must be escaped: {tag}");
    }
}
