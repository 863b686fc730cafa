//! Blocking byte fetches over HTTP.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{CardError, CardResult};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; cardnews-renderer)";

/// Something that can download a resource.
pub trait Fetch {
    fn get(&self, url: &str) -> CardResult<Vec<u8>>;

    /// Downloads `url` and decodes it as UTF-8 text (lossily).
    fn get_text(&self, url: &str) -> CardResult<String> {
        Ok(String::from_utf8_lossy(&self.get(url)?).into_owned())
    }
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn get(&self, url: &str) -> CardResult<Vec<u8>> {
        (**self).get(url)
    }
}

impl<F: Fetch + ?Sized> Fetch for Box<F> {
    fn get(&self, url: &str) -> CardResult<Vec<u8>> {
        (**self).get(url)
    }
}

/// A `reqwest` client with a fixed timeout and a browser-like user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> CardResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CardError::fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> CardResult<Vec<u8>> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CardError::fetch(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CardError::fetch(format!("GET {url} returned {status}")));
        }

        let bytes = response
            .bytes()
            .map_err(|e| CardError::fetch(format!("reading {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// In-memory fetcher for tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct MapFetcher {
        pub responses: HashMap<String, Vec<u8>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.responses.insert(url.to_string(), body.into());
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Fetch for MapFetcher {
        fn get(&self, url: &str) -> CardResult<Vec<u8>> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| CardError::fetch(format!("GET {url} returned 404 Not Found")))
        }
    }
}
