use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use url::Url;

/// A fetched response, before any HTML parsing.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// The URL the response came back from, after redirects.
    pub final_url: Url,
    pub status: u16,
    pub contents: String,
}

impl FetchedDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: Url, message: String },
    #[error("{url} answered with status {status}")]
    Status { url: Url, status: u16 },
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Fetches documents over plain GET. The engine never sends custom headers
/// or credentials; tests substitute scripted implementations.
pub trait DocumentFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<FetchedDocument, FetchError>>;
}

pub type SharedFetcher = Rc<dyn DocumentFetcher>;

/// Production fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<FetchedDocument, FetchError>> {
        async move {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|err| FetchError::Network {
                    url: url.clone(),
                    message: err.to_string(),
                })?;

            let status = response.status().as_u16();
            let final_url = response.url().clone();
            let bytes = response.bytes().await.map_err(|err| FetchError::Network {
                url: url.clone(),
                message: err.to_string(),
            })?;
            let contents = String::from_utf8(bytes.to_vec())?;

            Ok(FetchedDocument {
                final_url,
                status,
                contents,
            })
        }
        .boxed_local()
    }
}
