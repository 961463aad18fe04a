use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http::{Accept, ApiRequest, ApiResponse, Transport};
use crate::links::Links;
use crate::pagination::PageSource;
use crate::qualifiers::SearchType;
use crate::query::SortOrder;
use crate::rate_limit::RateLimit;
use crate::subjects::SubjectResolver;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// What a page was fetched from; decides how the body is read and how its
/// continuation is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search { text_match: bool },
    Notifications,
}

impl Endpoint {
    fn accept(self) -> Accept {
        match self {
            Endpoint::Search { text_match: true } => Accept::SearchTextMatch,
            Endpoint::Search { text_match: false } => Accept::Search,
            Endpoint::Notifications => Accept::Json,
        }
    }
}

/// Forward-only pointer to the page after the one it came with: the literal
/// `rel="next"` URL and the endpoint it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub url: Url,
    pub endpoint: Endpoint,
}

/// One page of results. `next` is present only when the response advertised
/// a `rel="next"` link.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<Cursor>,
    pub rate: RateLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    /// Ask for text-match fragments (code search).
    pub text_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationParams {
    pub all: bool,
    pub participating: bool,
    pub since: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    /// `(owner, repo)` to list a single repository's notifications.
    pub repository: Option<(String, String)>,
}

/// Client for `/search/{type}` and `/notifications`.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl SearchClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("invalid protocol `{}`", parsed.scheme()),
            });
        }
        Ok(SearchClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// First page of `GET /search/{type}`.
    pub async fn search(&self, search_type: SearchType, query: &str, params: &SearchParams) -> Result<Page> {
        let mut pairs = vec![("q", query.to_string())];
        // GitHub rejects an empty sort, so unset keys are left out entirely
        if let Some(sort) = params.sort.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("sort", sort.to_string()));
        }
        if let Some(order) = params.order {
            pairs.push(("order", order.as_str().to_string()));
        }

        let url = self.url(&format!("search/{}", search_type.as_str()), &pairs)?;
        info!("Searching {} for '{}'", search_type, query);
        let endpoint = Endpoint::Search {
            text_match: params.text_match,
        };
        self.fetch_page(&Cursor { url, endpoint }).await
    }

    /// First page of the authenticated user's notifications.
    pub async fn notifications(&self, params: &NotificationParams) -> Result<Page> {
        let path = match &params.repository {
            Some((owner, repo)) => format!("repos/{owner}/{repo}/notifications"),
            None => "notifications".to_string(),
        };
        let mut pairs = vec![
            ("all", params.all.to_string()),
            ("participating", params.participating.to_string()),
        ];
        if let Some(since) = params.since {
            pairs.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(before) = params.before {
            pairs.push(("before", before.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let url = self.url(&path, &pairs)?;
        info!("Listing notifications from {}", path);
        self.fetch_page(&Cursor {
            url,
            endpoint: Endpoint::Notifications,
        })
        .await
    }

    /// Fetch the page a cursor points at. Each call is a fresh request.
    pub async fn fetch_page(&self, cursor: &Cursor) -> Result<Page> {
        let response = self
            .transport
            .get(ApiRequest {
                url: cursor.url.clone(),
                accept: cursor.endpoint.accept(),
            })
            .await?;
        if !response.status.is_success() {
            return Err(api_error(&response));
        }

        let rate = RateLimit::from_headers(&response.headers);
        let body: Value = serde_json::from_str(&response.body)?;
        let mut items = match cursor.endpoint {
            Endpoint::Search { .. } => match body {
                Value::Object(mut map) => match map.remove("items") {
                    Some(Value::Array(items)) => items,
                    _ => {
                        warn!("No 'items' array found in response from {}", cursor.url);
                        Vec::new()
                    }
                },
                _ => {
                    warn!("Unexpected search response shape from {}", cursor.url);
                    Vec::new()
                }
            },
            Endpoint::Notifications => match body {
                Value::Array(items) => items,
                _ => {
                    warn!("Unexpected notifications response shape from {}", cursor.url);
                    Vec::new()
                }
            },
        };

        if cursor.endpoint == Endpoint::Notifications {
            SubjectResolver::new(self.transport.as_ref())
                .resolve_page(&mut items)
                .await?;
        }

        let next = Links::from_headers(&response.headers).next.map(|url| Cursor {
            url,
            endpoint: cursor.endpoint,
        });
        debug!(
            "Fetched {} items from {} (next page: {})",
            items.len(),
            cursor.url,
            next.is_some()
        );
        Ok(Page { items, next, rate })
    }

    fn url(&self, path: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(&raw, pairs).map_err(|e| Error::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for SearchClient {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<Page> {
        SearchClient::fetch_page(self, cursor).await
    }
}

/// Build an `Error::Api` from a failed response. Bodies that are not the
/// usual `{message, errors}` shape still produce an error.
pub(crate) fn api_error(response: &ApiResponse) -> Error {
    let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let text = response.body.trim();
            (!text.is_empty() && body.is_null()).then(|| text.to_string())
        })
        .unwrap_or_else(|| {
            response
                .status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    let errors = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|err| match err {
                    Value::String(s) => s.clone(),
                    Value::Object(obj) => obj
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| err.to_string()),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    debug!("API error {}: {}", response.status, message);
    Error::Api {
        status: response.status,
        message,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply};
    use reqwest::StatusCode;
    use serde_json::json;

    fn client(transport: &Arc<FakeTransport>) -> SearchClient {
        SearchClient::new(transport.clone(), "https://github.acme.com/api/v3").unwrap()
    }

    #[tokio::test]
    async fn search_sends_query_and_omits_unset_sort() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "https://github.acme.com/api/v3/search/code?q=something",
            Reply::json(200, json!({"items": [{"html_url": "a"}]})),
        );
        let page = client(&transport)
            .search(SearchType::Code, "something", &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next.is_none());
        assert_eq!(page.rate, RateLimit::default());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].accept, Accept::Search);
        assert!(!requests[0].url.as_str().contains("sort"));
    }

    #[tokio::test]
    async fn sort_order_and_text_match_reach_the_request() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "https://github.acme.com/api/v3/search/code?q=x+user%3Ame&sort=indexed&order=asc",
            Reply::json(200, json!({"items": []})),
        );
        let params = SearchParams {
            sort: Some("indexed".into()),
            order: Some(SortOrder::Asc),
            text_match: true,
        };
        client(&transport)
            .search(SearchType::Code, "x user:me", &params)
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].accept, Accept::SearchTextMatch);
    }

    #[tokio::test]
    async fn next_link_becomes_a_cursor_that_fetches_the_literal_url() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "https://github.acme.com/api/v3/search/code?q=something",
            Reply::json(200, json!({"items": [{"n": 1}]}))
                .link(r#"<https://github.acme.com/api/v3/search/code?q=something&page=2>; rel="next""#),
        );
        transport.on(
            "https://github.acme.com/api/v3/search/code?q=something&page=2",
            Reply::json(200, json!({"items": [{"n": 2}, {"n": 3}]})).link(
                r#"<https://github.acme.com/api/v3/search/code?q=something&page=1>; rel="prev", <https://github.acme.com/api/v3/search/code?q=something&page=1>; rel="first""#,
            ),
        );

        let client = client(&transport);
        let params = SearchParams {
            text_match: true,
            ..SearchParams::default()
        };
        let first = client.search(SearchType::Code, "something", &params).await.unwrap();
        assert_eq!(first.items.len(), 1);
        let cursor = first.next.expect("first page advertises a next link");
        assert_eq!(cursor.endpoint, Endpoint::Search { text_match: true });

        let second = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(second.next.is_none());
        assert_eq!(transport.requests()[1].accept, Accept::SearchTextMatch);
    }

    #[tokio::test]
    async fn failed_search_carries_message_and_sub_errors() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "https://github.acme.com/api/v3/search/repositories?q=user%3Anobody",
            Reply::json(
                422,
                json!({
                    "message": "Validation Failed",
                    "errors": [{"message": "The listed users and repositories cannot be searched either because the resources do not exist or you do not have permission to view them.", "resource": "Search", "field": "q", "code": "invalid"}]
                }),
            ),
        );
        let err = client(&transport)
            .search(SearchType::Repositories, "user:nobody", &SearchParams::default())
            .await
            .unwrap_err();
        match err {
            Error::Api { status, message, errors } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "Validation Failed");
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("resources do not exist"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn api_error_tolerates_odd_bodies() {
        let response = |status: u16, body: &str| ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: Default::default(),
            body: body.to_string(),
        };

        match api_error(&response(401, r#"{"message": "Bad credentials"}"#)) {
            Error::Api { message, errors, .. } => {
                assert_eq!(message, "Bad credentials");
                assert!(errors.is_empty());
            }
            other => panic!("{other:?}"),
        }
        match api_error(&response(502, "<html>bad gateway</html>")) {
            Error::Api { message, .. } => assert_eq!(message, "<html>bad gateway</html>"),
            other => panic!("{other:?}"),
        }
        match api_error(&response(500, "")) {
            Error::Api { message, .. } => assert_eq!(message, "Internal Server Error"),
            other => panic!("{other:?}"),
        }
        match api_error(&response(422, r#"{"message": "x", "errors": ["plain", {"code": "missing"}]}"#)) {
            Error::Api { errors, .. } => {
                assert_eq!(errors[0], "plain");
                assert!(errors[1].contains("missing"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn notifications_for_a_repository() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "https://api.github.com/repos/octo/widgets/notifications?all=true&participating=false&since=2024-01-02T00%3A00%3A00Z",
            Reply::json(200, json!([{"reason": "mention", "subject": {"title": "t", "latest_comment_url": null}}])),
        );
        let client = SearchClient::new(transport.clone(), DEFAULT_BASE_URL).unwrap();
        let params = NotificationParams {
            all: true,
            since: DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z")
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            repository: Some(("octo".into(), "widgets".into())),
            ..NotificationParams::default()
        };
        let page = client.notifications(&params).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(transport.requests()[0].accept, Accept::Json);
    }

    #[test]
    fn rejects_non_http_base_urls() {
        let transport = Arc::new(FakeTransport::new());
        match SearchClient::new(transport, "ftp://api.example.com") {
            Err(Error::InvalidUrl { reason, .. }) => assert!(reason.contains("invalid protocol")),
            other => panic!("expected InvalidUrl, got {:?}", other.err()),
        }
    }
}
