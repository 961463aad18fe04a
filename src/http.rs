//! The only place that talks to the network.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::error::Result;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Media types sent in the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Search endpoints, with the commit-search preview.
    Search,
    /// Search endpoints, also asking for text-match fragments.
    SearchTextMatch,
    Json,
}

impl Accept {
    pub fn header_value(self) -> &'static str {
        match self {
            Accept::Search => "application/json, application/vnd.github.cloak-preview",
            Accept::SearchTextMatch => {
                "application/json, application/vnd.github.cloak-preview, application/vnd.github.v3.text-match+json"
            }
            Accept::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: Url,
    pub accept: Accept,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// One authenticated GET. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// `reqwest` backed transport using basic auth with an empty user and the
/// API token as password.
pub struct ReqwestTransport {
    client: Client,
    token: String,
}

impl ReqwestTransport {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(ReqwestTransport {
            client,
            token: token.into(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("Requesting URL: {}", request.url);
        let response = self
            .client
            .get(request.url)
            .basic_auth("", Some(&self.token))
            .header(ACCEPT, request.accept.header_value())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        debug!("Response {} ({} bytes)", status, body.len());
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
