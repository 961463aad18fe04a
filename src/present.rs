//! Turns a page of items into output: a notice, browser tabs, a JSON array,
//! or a table.

use std::io::Write;
use std::str::FromStr;
use std::sync::LazyLock;

use comfy_table::{presets, Table};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::qualifiers::SearchType;
use crate::subjects::RESOLVED_URL_FIELD;

/// Most tabs `--open all` will open.
pub const OPEN_ALL_LIMIT: usize = 20;

static TICKET_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^(\[?[A-Z]{2,10}-\d{1,5}\]?[\s|:]*)?(.*)$").unwrap());
static TICKET_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[^A-Z\d-]+").unwrap());
static BLOB_SHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"blob/([0-9a-f]{40})/").unwrap());

/// What a page of items is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Search(SearchType),
    Notifications,
}

/// How many results `--open` sends to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    First,
    Count(usize),
    All,
}

impl OpenMode {
    pub fn limit(self) -> usize {
        match self {
            OpenMode::First => 1,
            OpenMode::Count(n) => n,
            OpenMode::All => OPEN_ALL_LIMIT,
        }
    }
}

impl FromStr for OpenMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Ok(OpenMode::First)
        } else if s.eq_ignore_ascii_case("all") {
            Ok(OpenMode::All)
        } else {
            s.parse::<usize>()
                .map(OpenMode::Count)
                .map_err(|_| format!("expected a number or `all`, got `{s}`"))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentOptions {
    pub open: Option<OpenMode>,
    pub json: bool,
    /// Show code text-match fragments instead of the repository column.
    pub text: bool,
}

/// Opens URLs for the user.
pub trait Browser {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// The platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        info!("Opening {}", url);
        open::that(url).map_err(|source| Error::Browser {
            url: url.to_string(),
            source,
        })
    }
}

/// Which branch a `present` call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    NoResults,
    Opened(usize),
    Json(usize),
    Table(usize),
}

pub struct Presenter<W: Write, E: Write, B: Browser> {
    out: W,
    notices: E,
    browser: B,
}

impl<W: Write, E: Write, B: Browser> Presenter<W, E, B> {
    pub fn new(out: W, notices: E, browser: B) -> Self {
        Presenter {
            out,
            notices,
            browser,
        }
    }

    pub fn into_parts(self) -> (W, E, B) {
        (self.out, self.notices, self.browser)
    }

    pub fn present(&mut self, items: &[Value], kind: ResultKind, options: &PresentOptions) -> Result<Presentation> {
        if items.is_empty() {
            writeln!(self.notices, "no results found")?;
            return Ok(Presentation::NoResults);
        }

        if let Some(mode) = options.open {
            let urls: Vec<&str> = items
                .iter()
                .filter_map(|item| canonical_url(item, kind))
                .take(mode.limit())
                .collect();
            debug!("opening {} of {} results", urls.len(), items.len());
            for url in &urls {
                self.browser.open(url)?;
            }
            return Ok(Presentation::Opened(urls.len()));
        }

        if options.json {
            serde_json::to_writer(&mut self.out, items)?;
            writeln!(self.out)?;
            self.out.flush()?;
            return Ok(Presentation::Json(items.len()));
        }

        let (header, rows) = project(items, kind, options.text);
        let mut table = Table::new();
        table.load_preset(presets::NOTHING).set_header(header);
        for row in rows {
            table.add_row(row);
        }
        writeln!(self.out, "{table}")?;
        self.out.flush()?;
        Ok(Presentation::Table(items.len()))
    }
}

/// The web URL of an item, the one `--open` uses.
pub fn canonical_url(item: &Value, kind: ResultKind) -> Option<&str> {
    match kind {
        ResultKind::Search(_) => item.get("html_url").and_then(Value::as_str),
        ResultKind::Notifications => item
            .get("subject")
            .and_then(|subject| subject.get(RESOLVED_URL_FIELD))
            .and_then(Value::as_str),
    }
}

/// Column headers and one row per item.
pub fn project(items: &[Value], kind: ResultKind, text: bool) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let header = match kind {
        ResultKind::Search(SearchType::Repositories) => vec!["repo", "url"],
        ResultKind::Search(SearchType::Code) if text => vec!["code", "url"],
        ResultKind::Search(SearchType::Code) => vec!["repo", "url"],
        ResultKind::Search(SearchType::Issues) => vec!["title", "url"],
        ResultKind::Search(SearchType::Commits) => vec!["repo", "message", "url"],
        ResultKind::Notifications => vec!["subject", "reason", "url"],
    };
    let rows = items
        .iter()
        .map(|item| match kind {
            ResultKind::Search(SearchType::Repositories) => {
                vec![field(item, &["full_name"]), field(item, &["html_url"])]
            }
            ResultKind::Search(SearchType::Code) => {
                let first = if text {
                    text_fragments(item)
                } else {
                    field(item, &["repository", "name"])
                };
                vec![first, shorten_blob_sha(&field(item, &["html_url"]))]
            }
            ResultKind::Search(SearchType::Issues) => {
                vec![issue_title(&field(item, &["title"])), field(item, &["html_url"])]
            }
            ResultKind::Search(SearchType::Commits) => {
                let sha = field(item, &["sha"]);
                let url = field(item, &["html_url"]);
                let url = match sha.get(..7) {
                    Some(short) if !sha.is_empty() => url.replace(&sha, short),
                    _ => url,
                };
                let message = field(item, &["commit", "message"]);
                let message = message.lines().next().unwrap_or_default().to_string();
                vec![field(item, &["repository", "name"]), message, url]
            }
            ResultKind::Notifications => {
                let url = canonical_url(item, kind).unwrap_or("-").to_string();
                vec![field(item, &["subject", "title"]), field(item, &["reason"]), url]
            }
        })
        .collect();
    (header, rows)
}

fn field(item: &Value, path: &[&str]) -> String {
    path.iter()
        .try_fold(item, |value, key| value.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn text_fragments(item: &Value) -> String {
    item.get("text_matches")
        .and_then(Value::as_array)
        .map(|matches| {
            matches
                .iter()
                .filter_map(|m| m.get("fragment").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// `.../blob/<40 hex>/path` becomes `.../blob/<7 hex>/path`.
fn shorten_blob_sha(url: &str) -> String {
    BLOB_SHA
        .replacen(url, 1, |caps: &regex::Captures| format!("blob/{}/", &caps[1][..7]))
        .into_owned()
}

/// Splits a leading ticket key like `[ABC-123]:` from the rest of the title.
fn issue_title(title: &str) -> String {
    let Some(caps) = TICKET_TITLE.captures(title) else {
        return title.to_string();
    };
    let ticket = caps
        .get(1)
        .map(|m| TICKET_NOISE.replace_all(m.as_str(), "").into_owned())
        .unwrap_or_default();
    let label = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    format!("{ticket} {label}").trim().to_string()
}
