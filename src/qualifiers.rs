//! Static vocabulary of GitHub search qualifiers, one table per search type.
//!
//! Tables are ordered; that order is the order qualifiers appear in a built
//! query, which keeps query strings stable no matter how the caller collected
//! its options.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The four GitHub search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Repositories,
    Code,
    Issues,
    Commits,
}

impl SearchType {
    pub const ALL: [SearchType; 4] = [
        SearchType::Repositories,
        SearchType::Code,
        SearchType::Issues,
        SearchType::Commits,
    ];

    /// Path segment under `/search/`.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Repositories => "repositories",
            SearchType::Code => "code",
            SearchType::Issues => "issues",
            SearchType::Commits => "commits",
        }
    }

    /// Values GitHub accepts for `sort` on this endpoint.
    pub fn sort_fields(self) -> &'static [&'static str] {
        match self {
            SearchType::Repositories => &["stars", "forks", "updated"],
            SearchType::Code => &["indexed"],
            SearchType::Issues => &["comments", "created", "updated"],
            SearchType::Commits => &["author-date", "committer-date"],
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repositories" | "repository" | "repo" => Ok(SearchType::Repositories),
            "code" => Ok(SearchType::Code),
            "issues" | "issue" => Ok(SearchType::Issues),
            "commits" | "commit" => Ok(SearchType::Commits),
            other => Err(Error::Config(format!("unknown search type `{other}`"))),
        }
    }
}

/// How a qualifier takes its value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierKind {
    /// Free-form value, `--language rust`.
    Text,
    /// One of a fixed set, `--state open`.
    Choice(&'static [&'static str]),
    /// Boolean with an explicit off switch, `--archived` / `--no-archived`.
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qualifier {
    pub name: &'static str,
    pub kind: QualifierKind,
    /// Can be excluded with `-name:value`.
    pub negatable: bool,
    /// Accepts "the invoking user" in place of a literal value.
    pub user_substitutable: bool,
    pub short: Option<char>,
    pub help: &'static str,
}

impl Qualifier {
    const fn text(name: &'static str, help: &'static str) -> Self {
        Qualifier {
            name,
            kind: QualifierKind::Text,
            negatable: true,
            user_substitutable: false,
            short: None,
            help,
        }
    }

    const fn choice(name: &'static str, values: &'static [&'static str], help: &'static str) -> Self {
        Qualifier {
            kind: QualifierKind::Choice(values),
            ..Qualifier::text(name, help)
        }
    }

    const fn toggle(name: &'static str, help: &'static str) -> Self {
        Qualifier {
            kind: QualifierKind::Toggle,
            negatable: false,
            ..Qualifier::text(name, help)
        }
    }

    const fn user(self) -> Self {
        Qualifier {
            user_substitutable: true,
            ..self
        }
    }

    const fn short(self, c: char) -> Self {
        Qualifier {
            short: Some(c),
            ..self
        }
    }
}

/// A command-line flag derived from a qualifier: the qualifier itself, or
/// its `not-` counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierFlag {
    pub qualifier: &'static Qualifier,
    pub negated: bool,
}

impl QualifierFlag {
    pub fn name(&self) -> String {
        if self.negated {
            format!("not-{}", self.qualifier.name)
        } else {
            self.qualifier.name.to_string()
        }
    }
}

const REPOSITORIES: &[Qualifier] = &[
    Qualifier::text("in", "Restrict the search to the name, description, readme, or any combination"),
    Qualifier::text("size", "Repositories of a certain size in kilobytes"),
    Qualifier::text("forks", "Filter on the number of forks"),
    Qualifier::toggle("fork", "Include forks (--fork) or leave them out (--no-fork)").short('f'),
    Qualifier::text("created", "Filter on creation date").short('c'),
    Qualifier::text("pushed", "Filter on the date of the last push").short('p'),
    Qualifier::text("user", "Limit to a user; omit the value for yourself").user().short('u'),
    Qualifier::text("repo", "Limit to a repository").short('r'),
    Qualifier::text("language", "Repositories written in a language").short('l'),
    Qualifier::text("license", "Filter by license or license family"),
    Qualifier::text("stars", "Filter on the number of stars"),
    Qualifier::text("followers", "Filter on the number of followers"),
    Qualifier::text("topic", "Repositories classified with a topic"),
    Qualifier::text("topics", "Filter on the number of applied topics"),
    Qualifier::toggle("mirror", "Only mirrors (--mirror) or no mirrors (--no-mirror)"),
    Qualifier::toggle("archived", "Only archived (--archived) or no archived (--no-archived)"),
    Qualifier::text("good-first-issues", "Minimum number of issues labeled good-first-issue"),
    Qualifier::text("help-wanted-issues", "Minimum number of issues labeled help-wanted"),
];

const CODE: &[Qualifier] = &[
    Qualifier::text("in", "Search the file contents (file), the path (path), or both"),
    Qualifier::text("language", "Code written in a language").short('l'),
    Qualifier::text("size", "Files of a certain size in bytes"),
    Qualifier::text("path", "Path prefix the file must be under"),
    Qualifier::text("filename", "Substring of the filename"),
    Qualifier::text("extension", "File extension"),
    Qualifier::text("user", "Limit to a user; omit the value for yourself").user().short('u'),
    Qualifier::text("repo", "Limit to a repository").short('r'),
    Qualifier::text("org", "Limit to an organization"),
];

const ISSUES: &[Qualifier] = &[
    Qualifier::choice("type", &["issue", "pr"], "Only issues or only pull requests").short('t'),
    Qualifier::text("in", "Search the title, body, comments, or any combination"),
    Qualifier::text("author", "Created by a user; omit the value for yourself").user(),
    Qualifier::text("assignee", "Assigned to a user; omit the value for yourself").user(),
    Qualifier::text("mentions", "Mentioning a user; omit the value for yourself").user(),
    Qualifier::text("commenter", "Commented on by a user; omit the value for yourself").user(),
    Qualifier::text("involves", "Involving a user in any way; omit the value for yourself").user(),
    Qualifier::text("team", "Mentioning a team within an organization"),
    Qualifier::choice("state", &["open", "closed"], "Open or closed"),
    Qualifier::text("label", "Filter on labels"),
    Qualifier::text("milestone", "Part of a milestone"),
    Qualifier::text("no", "Missing metadata such as label, milestone or assignee"),
    Qualifier::text("SHA", "Pull requests containing a commit SHA"),
    Qualifier::text("interactions", "Filter on the number of reactions and comments"),
    Qualifier::text("reactions", "Filter on the number of reactions"),
    Qualifier::choice("review", &["none", "required", "approved", "changes_requested"], "Pull request review status"),
    Qualifier::text("reviewed-by", "Pull requests reviewed by a user"),
    Qualifier::text("review-requested", "Pull requests with a review requested from a user"),
    Qualifier::text("team-review-requested", "Pull requests with a review requested from a team"),
    Qualifier::text("language", "Within repositories written in a language").short('l'),
    Qualifier::text("is", "State such as open, closed, or merged"),
    Qualifier::text("created", "Filter on creation date").short('c'),
    Qualifier::text("updated", "Filter on the date of the last update"),
    Qualifier::text("merged", "Filter on the merge date").short('m'),
    Qualifier::text("status", "Pull requests with a commit status"),
    Qualifier::text("base", "Pull requests into a branch"),
    Qualifier::text("head", "Pull requests from a branch"),
    Qualifier::text("closed", "Filter on the close date"),
    Qualifier::text("comments", "Filter on the number of comments"),
    Qualifier::text("user", "Limit to a user; omit the value for yourself").user().short('u'),
    Qualifier::text("repo", "Limit to a repository").short('r'),
    Qualifier::text("org", "Limit to an organization"),
    Qualifier::text("project", "Limit to a project board"),
    Qualifier::toggle("archived", "Only in archived (--archived) or non-archived (--no-archived) repositories"),
];

const COMMITS: &[Qualifier] = &[
    Qualifier::text("author", "Authored by a user; omit the value for yourself").user(),
    Qualifier::text("committer", "Committed by a user"),
    Qualifier::text("author-name", "Author name"),
    Qualifier::text("committer-name", "Committer name"),
    Qualifier::text("author-email", "Author email"),
    Qualifier::text("committer-email", "Committer email"),
    Qualifier::text("author-date", "Author date range"),
    Qualifier::text("committer-date", "Committer date range"),
    Qualifier::toggle("merge", "Only merge commits (--merge) or no merge commits (--no-merge)"),
    Qualifier::text("hash", "Commit hash"),
    Qualifier::text("tree", "Git tree hash"),
    Qualifier::text("parent", "Commits with a particular parent"),
    Qualifier::choice("is", &["public", "private"], "Public or private repositories"),
    Qualifier::text("user", "Limit to a user; omit the value for yourself").user().short('u'),
    Qualifier::text("org", "Limit to an organization"),
    Qualifier::text("repo", "Limit to a repository").short('r'),
];

/// Every qualifier recognized for `search_type`, in emission order.
pub fn qualifiers_for(search_type: SearchType) -> &'static [Qualifier] {
    match search_type {
        SearchType::Repositories => REPOSITORIES,
        SearchType::Code => CODE,
        SearchType::Issues => ISSUES,
        SearchType::Commits => COMMITS,
    }
}

pub fn lookup(search_type: SearchType, name: &str) -> Option<&'static Qualifier> {
    qualifiers_for(search_type).iter().find(|q| q.name == name)
}

/// Command-line flags for `search_type`: each qualifier followed by its
/// negated counterpart when it has one.
pub fn flags_for(search_type: SearchType) -> Vec<QualifierFlag> {
    qualifiers_for(search_type)
        .iter()
        .flat_map(|qualifier| {
            let plain = QualifierFlag {
                qualifier,
                negated: false,
            };
            let negated = qualifier.negatable.then_some(QualifierFlag {
                qualifier,
                negated: true,
            });
            std::iter::once(plain).chain(negated)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_per_type() {
        for search_type in SearchType::ALL {
            let names: HashSet<_> = qualifiers_for(search_type).iter().map(|q| q.name).collect();
            assert_eq!(names.len(), qualifiers_for(search_type).len(), "{search_type}");
        }
    }

    #[test]
    fn toggles_are_never_negatable() {
        for search_type in SearchType::ALL {
            for q in qualifiers_for(search_type) {
                if q.kind == QualifierKind::Toggle {
                    assert!(!q.negatable, "{search_type} {}", q.name);
                }
            }
        }
    }

    #[test]
    fn user_substitution_is_limited_to_identity_qualifiers() {
        let substitutable: Vec<_> = qualifiers_for(SearchType::Issues)
            .iter()
            .filter(|q| q.user_substitutable)
            .map(|q| q.name)
            .collect();
        assert_eq!(
            substitutable,
            vec!["author", "assignee", "mentions", "commenter", "involves", "user"]
        );
        assert!(!lookup(SearchType::Code, "language").unwrap().user_substitutable);
    }

    #[test]
    fn negated_flags_follow_their_base_flag() {
        let flags: Vec<_> = flags_for(SearchType::Repositories)
            .iter()
            .map(QualifierFlag::name)
            .take(8)
            .collect();
        assert_eq!(
            flags,
            vec!["in", "not-in", "size", "not-size", "forks", "not-forks", "fork", "created"]
        );
    }

    #[test]
    fn parses_type_names_and_aliases() {
        assert_eq!("repo".parse::<SearchType>().unwrap(), SearchType::Repositories);
        assert_eq!("commit".parse::<SearchType>().unwrap(), SearchType::Commits);
        assert!(matches!("wiki".parse::<SearchType>(), Err(Error::Config(_))));
    }

    #[test]
    fn lookup_is_scoped_to_the_type() {
        assert!(lookup(SearchType::Issues, "involves").is_some());
        assert!(lookup(SearchType::Repositories, "involves").is_none());
        assert_eq!(SearchType::Code.sort_fields(), &["indexed"]);
    }
}
