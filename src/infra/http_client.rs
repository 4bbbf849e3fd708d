use crate::app::ports::{HttpClientPort, HttpResponse};
use crate::auth::AuthContext;
use crate::config::ApiConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::RequestBuilder;
use tracing::debug;

/// reqwest-backed transport. Carries the caller's [`AuthContext`] and sends
/// its token as a bearer header when present. No request timeout is set.
pub struct ReqwestHttp {
    client: reqwest::Client,
    api: ApiConfig,
    auth: AuthContext,
}

impl ReqwestHttp {
    pub fn new(api: ApiConfig, auth: AuthContext) -> Self {
        Self { client: reqwest::Client::new(), api, auth }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<HttpResponse> {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(token) = self.auth.bearer() {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?.to_vec();
        debug!(%url, status, bytes = bytes.len(), "response received");
        Ok(HttpResponse { status, bytes })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.api.url(path);
        debug!(%url, "GET");
        self.send(&url, self.client.get(&url)).await
    }

    async fn post_json(&self, path: &str, body: Vec<u8>) -> Result<HttpResponse> {
        let url = self.api.url(path);
        debug!(%url, bytes = body.len(), "POST");
        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(&url, request).await
    }
}
