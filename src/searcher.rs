//! Runs one search or notifications listing from first request to last
//! printed page.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::args::{NotificationsArgs, SearchInvocation};
use crate::client::{Cursor, Page, SearchClient};
use crate::config::Credentials;
use crate::error::Result;
use crate::http::ReqwestTransport;
use crate::identity::Identity;
use crate::pagination::{Continuation, OutputMode, PageSource, PaginationController};
use crate::present::{Browser, PresentOptions, Presentation, Presenter, ResultKind};
use crate::query::QueryBuilder;

/// What an invocation printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    /// Outcome of the last page printed.
    pub last: Presentation,
}

/// The `q` parameter for a search invocation, `None` when it names no
/// criteria at all.
pub fn build_query(invocation: &SearchInvocation, identity: &dyn Identity) -> Result<Option<String>> {
    QueryBuilder::new(identity).build(invocation.query.as_deref(), &invocation.options)
}

pub struct Searcher {
    client: SearchClient,
    spinner: bool,
}

impl Searcher {
    pub fn new(client: SearchClient) -> Self {
        Searcher {
            client,
            spinner: false,
        }
    }

    /// A searcher talking to the real API with the given credentials.
    pub fn connect(credentials: &Credentials) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(credentials.token.clone())?);
        let client = SearchClient::new(transport, &credentials.base_url)?;
        Ok(Searcher {
            client,
            spinner: true,
        })
    }

    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }

    pub async fn search<W, E, B, C>(
        &self,
        query: &str,
        invocation: &SearchInvocation,
        presenter: &mut Presenter<W, E, B>,
        continuation: C,
    ) -> Result<Summary>
    where
        W: Write,
        E: Write,
        B: Browser,
        C: Continuation,
    {
        let search_type = invocation.search_type;
        let bar = self.spinner(&invocation.present, format!("Searching {search_type} for '{query}'"));
        let first = self
            .client
            .search(search_type, query, &invocation.params())
            .await;
        bar.finish_and_clear();

        self.page_through(
            first?,
            ResultKind::Search(search_type),
            &invocation.present,
            presenter,
            continuation,
        )
        .await
    }

    pub async fn notifications<W, E, B, C>(
        &self,
        args: &NotificationsArgs,
        presenter: &mut Presenter<W, E, B>,
        continuation: C,
    ) -> Result<Summary>
    where
        W: Write,
        E: Write,
        B: Browser,
        C: Continuation,
    {
        let present = args.present();
        let bar = self.spinner(&present, "Fetching notifications".to_string());
        let first = self.client.notifications(&args.params()).await;
        bar.finish_and_clear();

        self.page_through(first?, ResultKind::Notifications, &present, presenter, continuation)
            .await
    }

    async fn page_through<W, E, B, C>(
        &self,
        first: Page,
        kind: ResultKind,
        options: &PresentOptions,
        presenter: &mut Presenter<W, E, B>,
        continuation: C,
    ) -> Result<Summary>
    where
        W: Write,
        E: Write,
        B: Browser,
        C: Continuation,
    {
        let mode = if options.json {
            OutputMode::Json
        } else {
            OutputMode::Interactive
        };
        let source = Spinning {
            inner: &self.client,
            visible: self.spinner && !options.json,
        };

        let mut last = Presentation::NoResults;
        let mut controller = PaginationController::new(&source, continuation, mode);
        let pages = controller
            .run(first, |page| {
                last = presenter.present(&page.items, kind, options)?;
                Ok(())
            })
            .await?;

        info!("Printed {} page(s)", pages);
        Ok(Summary { pages, last })
    }

    fn spinner(&self, options: &PresentOptions, message: String) -> ProgressBar {
        spinner(self.spinner && !options.json, message)
    }
}

fn spinner(visible: bool, message: String) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Shows a spinner on stderr while a later page is fetched.
struct Spinning<'a, S: PageSource + ?Sized> {
    inner: &'a S,
    visible: bool,
}

#[async_trait]
impl<'a, S: PageSource + ?Sized> PageSource for Spinning<'a, S> {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<Page> {
        debug!("Fetching next page {}", cursor.url);
        let bar = spinner(self.visible, "Fetching next page".to_string());
        let page = self.inner.fetch_page(cursor).await;
        bar.finish_and_clear();
        page
    }
}
