use async_trait::async_trait;

use crate::error::Result;

/// Transport seam for the remote API.
///
/// Implementations only move bytes; interpreting status codes and bodies is
/// left to the use cases. A transport failure is `ImportError::Network`.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse>;
    async fn post_json(&self, path: &str, body: Vec<u8>) -> Result<HttpResponse>;
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
