// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use url::Url;

use softnav::dom::Document;
use softnav::net::{DocumentFetcher, FetchError, FetchedDocument};

pub const BASE_URL: &str = "https://blog.example/";

pub fn base_url() -> Url {
    Url::parse(BASE_URL).unwrap()
}

pub fn document(html: &str) -> Rc<Document> {
    Rc::new(Document::parse(html, base_url()))
}

enum StubResponse {
    Html { status: u16, body: String },
    Error(String),
}

/// Scripted fetcher keyed by URL path. Routes answer with canned HTML or a
/// transport error; unrouted paths answer 404. Every fetch is logged so
/// tests can count them.
pub struct StubFetcher {
    routes: RefCell<HashMap<String, StubResponse>>,
    log: RefCell<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            routes: RefCell::new(HashMap::new()),
            log: RefCell::new(Vec::new()),
        })
    }

    pub fn route_html(&self, path: &str, body: &str) {
        self.routes.borrow_mut().insert(
            path.to_string(),
            StubResponse::Html {
                status: 200,
                body: body.to_string(),
            },
        );
    }

    pub fn route_status(&self, path: &str, status: u16, body: &str) {
        self.routes.borrow_mut().insert(
            path.to_string(),
            StubResponse::Html {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn route_error(&self, path: &str, message: &str) {
        self.routes
            .borrow_mut()
            .insert(path.to_string(), StubResponse::Error(message.to_string()));
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.log.borrow().iter().filter(|p| *p == path).count()
    }

    pub fn total_fetches(&self) -> usize {
        self.log.borrow().len()
    }
}

impl DocumentFetcher for StubFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<FetchedDocument, FetchError>> {
        async move {
            let path = url.path().to_string();
            self.log.borrow_mut().push(path.clone());
            match self.routes.borrow().get(&path) {
                Some(StubResponse::Html { status, body }) => Ok(FetchedDocument {
                    final_url: url.clone(),
                    status: *status,
                    contents: body.clone(),
                }),
                Some(StubResponse::Error(message)) => Err(FetchError::Network {
                    url: url.clone(),
                    message: message.clone(),
                }),
                None => Ok(FetchedDocument {
                    final_url: url.clone(),
                    status: 404,
                    contents: String::new(),
                }),
            }
        }
        .boxed_local()
    }
}
