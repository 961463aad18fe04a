use reqwest::StatusCode;
use thiserror::Error;

use crate::qualifiers::SearchType;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end a `ghs` invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// A qualifier the registry does not know for this search type.
    /// Raised before any request is made.
    #[error("invalid qualifier `{qualifier}` for {search_type} search: {reason}")]
    InvalidQualifier {
        search_type: SearchType,
        qualifier: String,
        reason: &'static str,
    },

    /// Non-2xx answer from the GitHub API.
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        errors: Vec<String>,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not open {url} in a browser: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl Error {
    /// Lines shown to the user on stderr: the API message and each of its
    /// sub-errors, or the display text for everything else.
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            Error::Api {
                message, errors, ..
            } => std::iter::once(message.clone())
                .chain(errors.iter().cloned())
                .collect(),
            other => vec![other.to_string()],
        }
    }

    /// True for an upstream 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Prompt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reports_message_then_sub_errors() {
        let err = Error::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation Failed".into(),
            errors: vec![
                "The listed users and repositories cannot be searched".into(),
                "second".into(),
            ],
        };
        assert_eq!(
            err.report_lines(),
            vec![
                "Validation Failed".to_string(),
                "The listed users and repositories cannot be searched".to_string(),
                "second".to_string(),
            ]
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn other_errors_report_a_single_line() {
        let err = Error::Config("no api token configured".into());
        assert_eq!(
            err.report_lines(),
            vec!["configuration error: no api token configured".to_string()]
        );
    }
}
