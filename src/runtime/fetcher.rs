use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Url after redirects.
    pub final_url: String,
}

impl FetchResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network collaborator. Retries, timeouts and caching policy live behind
/// this trait; `use_cache` lets callers bypass a cache for bulk downloads.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, use_cache: bool) -> Result<FetchResponse, String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, use_cache: bool) -> Result<FetchResponse, String> {
        let mut request = self.client.get(url);
        if !use_cache {
            request = request.header("Cache-Control", "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("Network error fetching {url}: {e}"))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| format!("Error reading response body from {url}: {e}"))?;

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
            final_url,
        })
    }
}
