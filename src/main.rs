use std::io;
use std::process::ExitCode;

use dotenv::dotenv;
use github_search_cli_lib::args::{self, Invocation};
use github_search_cli_lib::config::apply_config;
use github_search_cli_lib::{
    build_query, AuthFile, ConfigChange, Credentials, GitConfigIdentity, Presenter, PromptContinuation, Result,
    Searcher, SystemBrowser,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Criteria or config flags were missing; help was printed instead.
const USAGE_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // stdout carries results only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let invocation = match args::from_matches(&args::command().get_matches()) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };

    match run(invocation).await {
        Ok(code) => code,
        Err(e) => {
            debug!("{:?}", e);
            for line in e.report_lines() {
                eprintln!("{line}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> Result<ExitCode> {
    match invocation {
        Invocation::Search(search) => {
            let Some(query) = build_query(&search, &GitConfigIdentity)? else {
                eprintln!("{}", args::usage(search.search_type.as_str()));
                return Ok(ExitCode::from(USAGE_EXIT));
            };
            let credentials = Credentials::resolve(
                search.api.api_token.as_deref(),
                search.api.api_base_url.as_deref(),
                &AuthFile::default_location()?,
            )?;

            let searcher = Searcher::connect(&credentials)?;
            let mut presenter = Presenter::new(io::stdout(), io::stderr(), SystemBrowser);
            searcher
                .search(&query, &search, &mut presenter, PromptContinuation)
                .await?;
        }
        Invocation::Notifications(notifications) => {
            let credentials = Credentials::resolve(
                notifications.api.api_token.as_deref(),
                notifications.api.api_base_url.as_deref(),
                &AuthFile::default_location()?,
            )?;

            let searcher = Searcher::connect(&credentials)?;
            let mut presenter = Presenter::new(io::stdout(), io::stderr(), SystemBrowser);
            searcher
                .notifications(&notifications, &mut presenter, PromptContinuation)
                .await?;
        }
        Invocation::Config(config) => {
            let file = AuthFile::default_location()?;
            match apply_config(&file, config.clear, config.token, config.base_url)? {
                ConfigChange::Cleared => println!("config file cleared"),
                ConfigChange::Saved(_) => info!("Saved config to {}", file.path().display()),
                ConfigChange::Usage => {
                    eprintln!("{}", args::usage("config"));
                    return Ok(ExitCode::from(USAGE_EXIT));
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
