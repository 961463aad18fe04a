//! Drives "show a page, ask for more, fetch the next one" as an explicit
//! state machine.

use std::io::IsTerminal;

use async_trait::async_trait;
use dialoguer::Confirm;
use tracing::debug;

use crate::client::{Cursor, Page};
use crate::error::Result;

/// Anything that can fetch the page a cursor points at.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &Cursor) -> Result<Page>;
}

/// Decides whether to fetch another page.
pub trait Continuation {
    fn proceed(&mut self) -> Result<bool>;
}

impl<F> Continuation for F
where
    F: FnMut() -> Result<bool>,
{
    fn proceed(&mut self) -> Result<bool> {
        self()
    }
}

/// Asks on the terminal. Declines without asking when stdin is not a
/// terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptContinuation;

impl Continuation for PromptContinuation {
    fn proceed(&mut self) -> Result<bool> {
        if !std::io::stdin().is_terminal() {
            return Ok(false);
        }
        Ok(Confirm::new()
            .with_prompt("More...")
            .default(true)
            .interact()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Interactive,
    /// A single page is always the whole result.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    /// A page has been printed.
    Ready(Option<Cursor>),
    AwaitingContinuation(Cursor),
    Paging(Cursor),
    Done,
}

pub struct PaginationController<'a, S: PageSource + ?Sized, C: Continuation> {
    source: &'a S,
    continuation: C,
    mode: OutputMode,
    state: PagerState,
    pages: usize,
}

impl<'a, S: PageSource + ?Sized, C: Continuation> PaginationController<'a, S, C> {
    pub fn new(source: &'a S, continuation: C, mode: OutputMode) -> Self {
        PaginationController {
            source,
            continuation,
            mode,
            state: PagerState::Done,
            pages: 0,
        }
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    /// Print `first`, then keep paging while the continuation agrees.
    /// Returns the number of pages printed. A failed fetch ends the run with
    /// its error; pages already printed stay printed.
    pub async fn run<P>(&mut self, first: Page, mut print: P) -> Result<usize>
    where
        P: FnMut(&Page) -> Result<()>,
    {
        self.pages = 0;
        print(&first)?;
        self.pages += 1;
        self.state = PagerState::Ready(first.next);

        loop {
            self.state = match std::mem::replace(&mut self.state, PagerState::Done) {
                PagerState::Ready(Some(cursor)) if self.mode == OutputMode::Interactive => {
                    PagerState::AwaitingContinuation(cursor)
                }
                PagerState::Ready(_) => PagerState::Done,
                PagerState::AwaitingContinuation(cursor) => {
                    if self.continuation.proceed()? {
                        PagerState::Paging(cursor)
                    } else {
                        debug!("pagination declined");
                        PagerState::Done
                    }
                }
                PagerState::Paging(cursor) => {
                    let page = self.source.fetch_page(&cursor).await?;
                    print(&page)?;
                    self.pages += 1;
                    PagerState::Ready(page.next)
                }
                PagerState::Done => break,
            };
        }
        self.state = PagerState::Done;
        Ok(self.pages)
    }
}
