//! In-memory [`PageFetcher`] for unit tests

use crate::crawler::parser::extract_links;
use crate::crawler::{FetchedPage, PageFetcher};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Serves canned documents and records every requested URL
#[derive(Default)]
pub(crate) struct StubFetcher {
    pages: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<String>>,
    cancel_on: Option<(String, CancellationToken)>,
    gate: Option<Arc<Semaphore>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), (200, body.to_string()));
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), (status, String::new()));
        self
    }

    /// Cancels `token` while serving `url`, as if a stop arrived mid-request
    pub(crate) fn cancel_on(mut self, url: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((url.to_string(), token));
        self
    }

    /// Holds every request until a permit is added to `gate`
    pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == url {
                token.cancel();
            }
        }

        match self.pages.get(url) {
            Some((status, body)) if (200..300).contains(status) => Ok(FetchedPage {
                url: url.to_string(),
                status_code: *status,
                body: body.clone(),
                links: extract_links(body),
            }),
            Some((status, _)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
