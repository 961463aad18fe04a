use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches};

use crate::client::{NotificationParams, SearchParams};
use crate::present::{OpenMode, PresentOptions};
use crate::qualifiers::{self, QualifierFlag, QualifierKind, SearchType};
use crate::query::{QualifierValue, QueryOptions, SortOrder};

/// Credential overrides shared by every network command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiArgs {
    /// The github api token. Defaults to the configured token.
    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,

    /// The github api base url. Defaults to the configured url or https://api.github.com.
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputArgs {
    /// Return json. Can be piped to jq.
    #[arg(short, long)]
    pub json: bool,

    /// Open the first result, the first N results, or up to 20 with `all`, in your browser.
    #[arg(
        short,
        long,
        value_name = "N|all",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub open: Option<OpenMode>,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationsArgs {
    /// Show notifications marked as read.
    #[arg(short, long)]
    pub all: bool,

    /// Only notifications in which you are directly participating or mentioned.
    #[arg(short, long)]
    pub participating: bool,

    /// Only notifications updated after this time (ISO 8601 or YYYY-MM-DD).
    #[arg(short, long, value_parser = parse_timestamp)]
    pub since: Option<DateTime<Utc>>,

    /// Only notifications updated before this time (ISO 8601 or YYYY-MM-DD).
    #[arg(short, long, value_parser = parse_timestamp)]
    pub before: Option<DateTime<Utc>>,

    /// Repository owner; requires --repo.
    #[arg(long, requires = "repo")]
    pub owner: Option<String>,

    /// Repository name; requires --owner.
    #[arg(long, requires = "owner")]
    pub repo: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Clear the local config file, including the auth token.
    #[arg(long)]
    pub clear: bool,

    /// Set the github token to use.
    #[arg(long)]
    pub token: Option<String>,

    /// Set the api base url for github enterprise instances (ex: https://github.company.com/api/v3).
    #[arg(long)]
    pub base_url: Option<String>,
}

/// A parsed search subcommand.
#[derive(Debug, Clone)]
pub struct SearchInvocation {
    pub search_type: SearchType,
    pub query: Option<String>,
    pub options: QueryOptions,
    pub present: PresentOptions,
    pub api: ApiArgs,
}

impl SearchInvocation {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            sort: self.options.sort.clone(),
            order: self.options.order,
            text_match: self.present.text,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Invocation {
    Search(SearchInvocation),
    Notifications(NotificationsArgs),
    Config(ConfigArgs),
}

impl NotificationsArgs {
    pub fn params(&self) -> NotificationParams {
        NotificationParams {
            all: self.all,
            participating: self.participating,
            since: self.since,
            before: self.before,
            repository: self.owner.clone().zip(self.repo.clone()),
        }
    }

    pub fn present(&self) -> PresentOptions {
        PresentOptions {
            open: self.output.open,
            json: self.output.json,
            text: false,
        }
    }
}

/// The full `ghs` command line.
pub fn command() -> Command {
    Command::new("ghs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search GitHub repositories, code, issues, commits and notifications from the command line")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(search_command(SearchType::Repositories).visible_aliases(["repo", "repository"]))
        .subcommand(search_command(SearchType::Code))
        .subcommand(search_command(SearchType::Issues).visible_alias("issue"))
        .subcommand(search_command(SearchType::Commits).visible_alias("commit"))
        .subcommand(NotificationsArgs::augment_args(
            Command::new("notifications").about("List notifications"),
        ))
        .subcommand(ConfigArgs::augment_args(
            Command::new("config").about("Configure ghs settings"),
        ))
}

/// One search subcommand, with a flag per qualifier of `search_type`.
pub fn search_command(search_type: SearchType) -> Command {
    let about = match search_type {
        SearchType::Repositories => "Search github repositories",
        SearchType::Code => "Search github code",
        SearchType::Issues => "Search github issues and pull requests",
        SearchType::Commits => "Search github commits",
    };
    let mut cmd = Command::new(search_type.as_str())
        .about(about)
        .arg(Arg::new("query").value_name("QUERY").help("Free text to search for"));

    for flag in qualifiers::flags_for(search_type) {
        cmd = cmd.args(qualifier_args(flag));
    }

    cmd = cmd
        .arg(
            Arg::new("sort")
                .short('s')
                .long("sort")
                .help("The sort field. Default: results are sorted by best match")
                .value_parser(PossibleValuesParser::new(search_type.sort_fields())),
        )
        .arg(
            Arg::new("order")
                .long("order")
                .help("The sort order if sort is provided. Default: desc")
                .value_parser(value_parser!(SortOrder)),
        );
    if search_type == SearchType::Code {
        cmd = cmd.arg(
            Arg::new("text")
                .short('t')
                .long("text")
                .help("Show full text match")
                .action(ArgAction::SetTrue),
        );
    }
    ApiArgs::augment_args(OutputArgs::augment_args(cmd))
}

fn qualifier_args(flag: QualifierFlag) -> Vec<Arg> {
    let qualifier = flag.qualifier;
    let name = flag.name();

    if qualifier.kind == QualifierKind::Toggle {
        let off = format!("no-{}", qualifier.name);
        let mut on = Arg::new(name.clone())
            .long(name.clone())
            .help(qualifier.help)
            .action(ArgAction::SetTrue)
            .overrides_with(off.clone());
        if let Some(short) = qualifier.short {
            on = on.short(short);
        }
        let off = Arg::new(off.clone())
            .long(off)
            .hide(true)
            .action(ArgAction::SetTrue)
            .overrides_with(name);
        return vec![on, off];
    }

    let mut arg = Arg::new(name.clone())
        .long(name)
        .value_name("VALUE")
        .action(ArgAction::Set);
    if let QualifierKind::Choice(values) = qualifier.kind {
        arg = arg.value_parser(PossibleValuesParser::new(values));
    }

    if flag.negated {
        arg = arg.hide(true).conflicts_with(qualifier.name);
    } else {
        arg = arg.help(qualifier.help);
        if let Some(short) = qualifier.short {
            arg = arg.short(short);
        }
        if qualifier.user_substitutable {
            arg = arg.num_args(0..=1);
        }
    }
    vec![arg]
}

/// Parse a full command line; `args` includes the binary name.
pub fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    from_matches(&matches)
}

pub fn from_matches(matches: &ArgMatches) -> Result<Invocation, clap::Error> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(command().error(
            clap::error::ErrorKind::MissingSubcommand,
            "a subcommand is required",
        ));
    };
    match name {
        "notifications" => Ok(Invocation::Notifications(NotificationsArgs::from_arg_matches(sub)?)),
        "config" => Ok(Invocation::Config(ConfigArgs::from_arg_matches(sub)?)),
        other => {
            let search_type: SearchType = other.parse().map_err(|_| {
                command().error(
                    clap::error::ErrorKind::InvalidSubcommand,
                    format!("unknown subcommand `{other}`"),
                )
            })?;
            search_invocation(search_type, sub)
        }
    }
}

fn search_invocation(search_type: SearchType, matches: &ArgMatches) -> Result<Invocation, clap::Error> {
    let output = OutputArgs::from_arg_matches(matches)?;
    let api = ApiArgs::from_arg_matches(matches)?;
    let text = search_type == SearchType::Code && matches.get_flag("text");

    Ok(Invocation::Search(SearchInvocation {
        search_type,
        query: matches.get_one::<String>("query").cloned(),
        options: query_options(search_type, matches),
        present: PresentOptions {
            open: output.open,
            json: output.json,
            text,
        },
        api,
    }))
}

/// Collect qualifier flags in registry order.
pub fn query_options(search_type: SearchType, matches: &ArgMatches) -> QueryOptions {
    let mut options = QueryOptions::new(search_type);
    for qualifier in qualifiers::qualifiers_for(search_type) {
        if qualifier.kind == QualifierKind::Toggle {
            if matches.get_flag(qualifier.name) {
                options.set(qualifier.name, QualifierValue::Toggle(true), false);
            } else if matches.get_flag(&format!("no-{}", qualifier.name)) {
                options.set(qualifier.name, QualifierValue::Toggle(false), false);
            }
            continue;
        }

        if let Some(value) = matches.get_one::<String>(qualifier.name) {
            options.set(qualifier.name, QualifierValue::Text(value.clone()), false);
        } else if qualifier.user_substitutable && matches.contains_id(qualifier.name) {
            // flag given without a value
            options.set(qualifier.name, QualifierValue::CurrentUser, false);
        }
        if qualifier.negatable {
            if let Some(value) = matches.get_one::<String>(&format!("not-{}", qualifier.name)) {
                options.set(qualifier.name, QualifierValue::Text(value.clone()), true);
            }
        }
    }
    options.sort = matches.get_one::<String>("sort").cloned();
    options.order = matches.get_one::<SortOrder>("order").copied();
    options
}

/// Help text for a subcommand, shown when it is run without criteria.
pub fn usage(subcommand: &str) -> String {
    let mut cmd = command();
    cmd.build();
    cmd.find_subcommand_mut(subcommand)
        .map(|sub| sub.render_help().to_string())
        .unwrap_or_default()
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .ok_or_else(|| format!("`{input}` is not an ISO 8601 timestamp (YYYY-MM-DDTHH:MM:SSZ)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(args: &[&str]) -> SearchInvocation {
        match parse_from(std::iter::once("ghs").chain(args.iter().copied())).unwrap() {
            Invocation::Search(search) => search,
            other => panic!("expected a search, got {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn aliases_select_the_search_type() {
        assert_eq!(search(&["repo", "x"]).search_type, SearchType::Repositories);
        assert_eq!(search(&["issue", "x"]).search_type, SearchType::Issues);
        assert_eq!(search(&["commit", "x"]).search_type, SearchType::Commits);
    }

    #[test]
    fn qualifier_flags_become_options() {
        let inv = search(&["code", "something", "--user", "someuser", "--text"]);
        assert_eq!(inv.query.as_deref(), Some("something"));
        assert_eq!(
            inv.options.values.get("user"),
            Some(&QualifierValue::Text("someuser".into()))
        );
        assert!(inv.present.text);
        assert!(!inv.options.values.contains_key("text"));
        assert!(inv.params().text_match);
    }

    #[test]
    fn bare_user_flag_means_current_user() {
        let inv = search(&["issues", "--involves"]);
        assert_eq!(
            inv.options.values.get("involves"),
            Some(&QualifierValue::CurrentUser)
        );
    }

    #[test]
    fn not_flags_negate_and_conflict_with_the_plain_flag() {
        let inv = search(&["repositories", "parser", "--not-language", "java"]);
        assert!(inv.options.negated.contains("language"));
        assert!(parse_from(["ghs", "repositories", "--language", "rust", "--not-language", "java"]).is_err());
    }

    #[test]
    fn toggles_have_an_off_switch() {
        let inv = search(&["repositories", "x", "--no-fork", "--archived"]);
        assert_eq!(inv.options.values.get("fork"), Some(&QualifierValue::Toggle(false)));
        assert_eq!(inv.options.values.get("archived"), Some(&QualifierValue::Toggle(true)));
        assert!(parse_from(["ghs", "repositories", "--not-fork", "x"]).is_err());
    }

    #[test]
    fn sort_is_checked_per_type() {
        let inv = search(&["repositories", "x", "--sort", "stars", "--order", "asc"]);
        assert_eq!(inv.options.sort.as_deref(), Some("stars"));
        assert_eq!(inv.options.order, Some(SortOrder::Asc));
        assert!(parse_from(["ghs", "code", "x", "--sort", "stars"]).is_err());
    }

    #[test]
    fn open_takes_an_optional_count() {
        assert_eq!(search(&["repo", "x", "--open"]).present.open, Some(OpenMode::First));
        assert_eq!(search(&["repo", "x", "--open=all"]).present.open, Some(OpenMode::All));
        assert_eq!(search(&["repo", "x", "-o=3"]).present.open, Some(OpenMode::Count(3)));
        assert_eq!(search(&["repo", "x"]).present.open, None);
    }

    #[test]
    fn notifications_flags() {
        let inv = parse_from([
            "ghs",
            "notifications",
            "--all",
            "--since",
            "2024-01-02",
            "--owner",
            "octo",
            "--repo",
            "widgets",
        ])
        .unwrap();
        let Invocation::Notifications(args) = inv else {
            panic!("expected notifications");
        };
        let params = args.params();
        assert!(params.all);
        assert!(!params.participating);
        assert_eq!(params.since.unwrap().to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert_eq!(params.repository, Some(("octo".into(), "widgets".into())));

        assert!(parse_from(["ghs", "notifications", "--owner", "octo"]).is_err());
    }

    #[test]
    fn timestamps() {
        assert!(parse_timestamp("2024-01-02T03:04:05Z").is_ok());
        assert!(parse_timestamp("2024-01-02T03:04:05").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn usage_mentions_the_subcommand_flags() {
        let help = usage("code");
        assert!(help.contains("--extension"));
        assert!(!help.contains("--not-extension"));
    }
}
