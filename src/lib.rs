//! # GitHub Search CLI
//!
//! A Rust library behind `ghs`: it turns command-line qualifiers into GitHub
//! search queries, pages through results lazily, and prints them as tables,
//! JSON, or opens them in a browser.
//!
//! ## Main Components
//!
//! - [`QueryBuilder`]: Builds the `q` parameter from free text and typed qualifier options
//! - [`SearchClient`]: Requests `/search/{type}` and `/notifications`, following `Link` headers
//! - [`SubjectResolver`]: Resolves notification subjects into web URLs, tolerating 404s
//! - [`PaginationController`]: The "show a page, ask for more" state machine
//! - [`Presenter`]: Tables, JSON or browser opens for a page of results
//! - [`Searcher`]: Ties the above together for one invocation
//!
//! ## Example
//!
//! ```no_run
//! use github_search_cli_lib::{
//!     build_query, AuthFile, Credentials, GitConfigIdentity, Invocation, PromptContinuation,
//!     Presenter, Searcher, SystemBrowser,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let Invocation::Search(search) = github_search_cli_lib::args::parse_from(["ghs", "repo", "tokio", "--language", "rust"])? else {
//!         return Ok(());
//!     };
//!     let query = build_query(&search, &GitConfigIdentity)?.unwrap_or_default();
//!
//!     let credentials = Credentials::resolve(None, None, &AuthFile::default_location()?)?;
//!     let searcher = Searcher::connect(&credentials)?;
//!     let mut presenter = Presenter::new(std::io::stdout(), std::io::stderr(), SystemBrowser);
//!     searcher.search(&query, &search, &mut presenter, PromptContinuation).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod links;
pub mod pagination;
pub mod present;
pub mod qualifiers;
pub mod query;
pub mod rate_limit;
pub mod searcher;
pub mod subjects;

#[cfg(test)]
pub mod testing;

// Re-export main components for documentation and external use
pub use crate::args::{Invocation, SearchInvocation};
pub use crate::client::{Cursor, Endpoint, NotificationParams, Page, SearchClient, SearchParams};
pub use crate::config::{AuthConfig, AuthFile, ConfigChange, Credentials};
pub use crate::error::{Error, Result};
pub use crate::http::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
pub use crate::identity::{GitConfigIdentity, Identity, StaticIdentity};
pub use crate::pagination::{Continuation, OutputMode, PageSource, PaginationController, PromptContinuation};
pub use crate::present::{Browser, OpenMode, PresentOptions, Presentation, Presenter, ResultKind, SystemBrowser};
pub use crate::qualifiers::SearchType;
pub use crate::query::{QualifierValue, QueryBuilder, QueryOptions, SortOrder};
pub use crate::searcher::{build_query, Searcher, Summary};
pub use crate::subjects::SubjectResolver;
