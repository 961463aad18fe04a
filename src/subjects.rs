//! Resolves a notification subject's "latest comment" API URL into the page
//! a person would open.

use futures::future::try_join_all;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::api_error;
use crate::error::{Error, Result};
use crate::http::{Accept, ApiRequest, Transport};

/// Field written into each notification's `subject` object.
pub const RESOLVED_URL_FIELD: &str = "latest_comment_html_url";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSubject {
    pub title: String,
    pub api_url: Option<String>,
    /// `None` until resolved, and after resolution when the resource is gone
    /// or no longer visible to the token.
    pub html_url: Option<String>,
}

impl NotificationSubject {
    pub fn from_notification(notification: &Value) -> Option<Self> {
        let subject = notification.get("subject")?;
        Some(NotificationSubject {
            title: subject
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            api_url: subject
                .get("latest_comment_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            html_url: subject
                .get(RESOLVED_URL_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

pub struct SubjectResolver<'a> {
    transport: &'a dyn Transport,
}

impl<'a> SubjectResolver<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        SubjectResolver { transport }
    }

    /// Fetch the subject's API URL and take `html_url` from it. A 404 leaves
    /// `html_url` empty; any other failure is returned.
    pub async fn resolve(&self, mut subject: NotificationSubject) -> Result<NotificationSubject> {
        let Some(api_url) = subject.api_url.as_deref() else {
            return Ok(subject);
        };
        let url = Url::parse(api_url).map_err(|e| Error::InvalidUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .transport
            .get(ApiRequest {
                url,
                accept: Accept::Json,
            })
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            // deleted, or the token lost access
            debug!("subject '{}' not found at {}", subject.title, api_url);
            subject.html_url = None;
            return Ok(subject);
        }
        if !response.status.is_success() {
            return Err(api_error(&response));
        }

        let body: Value = serde_json::from_str(&response.body)?;
        subject.html_url = body
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(subject)
    }

    /// Resolve every subject on a page concurrently and write the result back
    /// into each notification. Nothing is written unless all of them finish.
    pub async fn resolve_page(&self, notifications: &mut [Value]) -> Result<()> {
        let pending: Vec<(usize, NotificationSubject)> = notifications
            .iter()
            .enumerate()
            .filter_map(|(index, notification)| {
                NotificationSubject::from_notification(notification)
                    .filter(|subject| subject.api_url.is_some())
                    .map(|subject| (index, subject))
            })
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        info!("Resolving {} notification subjects", pending.len());
        let resolved = try_join_all(pending.into_iter().map(|(index, subject)| async move {
            self.resolve(subject).await.map(|subject| (index, subject))
        }))
        .await?;

        for (index, subject) in resolved {
            if let Some(Value::Object(fields)) = notifications[index].get_mut("subject") {
                let value = subject.html_url.map(Value::String).unwrap_or(Value::Null);
                fields.insert(RESOLVED_URL_FIELD.to_string(), value);
            }
        }
        Ok(())
    }
}
