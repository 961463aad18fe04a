//! RFC 5988 `Link` header parsing.

use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;
use tracing::debug;

/// Navigation relations advertised by a paginated response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub next: Option<Url>,
    pub prev: Option<Url>,
    pub first: Option<Url>,
    pub last: Option<Url>,
}

impl Links {
    /// Collects every `Link` header in `headers`.
    pub fn from_headers(headers: &HeaderMap) -> Links {
        let mut links = Links::default();
        for value in headers.get_all(LINK) {
            match value.to_str() {
                Ok(value) => links.merge(Links::parse(value)),
                Err(_) => debug!("ignoring non-ascii Link header"),
            }
        }
        links
    }

    pub fn parse(header: &str) -> Links {
        let mut links = Links::default();
        let mut rest = header;

        while let Some(open) = rest.find('<') {
            let Some(close) = rest[open..].find('>').map(|i| open + i) else {
                break;
            };
            let target = &rest[open + 1..close];
            let after = &rest[close + 1..];
            let params_end = after.find('<').unwrap_or(after.len());
            let params = &after[..params_end];
            rest = &after[params_end..];

            let Ok(url) = Url::parse(target.trim()) else {
                debug!("skipping unparseable link target {}", target);
                continue;
            };
            for rel in relations(params) {
                links.assign(rel, url.clone());
            }
        }
        links
    }

    fn assign(&mut self, rel: &str, url: Url) {
        let slot = match rel.to_ascii_lowercase().as_str() {
            "next" => &mut self.next,
            "prev" | "previous" => &mut self.prev,
            "first" => &mut self.first,
            "last" => &mut self.last,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(url);
        }
    }

    fn merge(&mut self, other: Links) {
        self.next = self.next.take().or(other.next);
        self.prev = self.prev.take().or(other.prev);
        self.first = self.first.take().or(other.first);
        self.last = self.last.take().or(other.last);
    }
}

/// Relation types from a `; rel="next last"` parameter list.
fn relations(params: &str) -> Vec<&str> {
    params
        .split(';')
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("rel")
                .then(|| value.trim().trim_end_matches(',').trim().trim_matches('"'))
        })
        .flat_map(str::split_whitespace)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parses_next_and_last() {
        let links = Links::parse(
            r#"<https://api.github.com/search/repositories?q=user%3Aoclif&page=2>; rel="next", <https://api.github.com/search/repositories?q=user%3Aoclif&page=5>; rel="last""#,
        );
        assert_eq!(
            links.next.unwrap().as_str(),
            "https://api.github.com/search/repositories?q=user%3Aoclif&page=2"
        );
        assert_eq!(
            links.last.unwrap().as_str(),
            "https://api.github.com/search/repositories?q=user%3Aoclif&page=5"
        );
        assert!(links.prev.is_none());
    }

    #[test]
    fn last_page_has_no_next() {
        let links = Links::parse(
            r#"<https://api.github.com/search/code?q=x&page=1>; rel="prev", <https://api.github.com/search/code?q=x&page=1>; rel="first""#,
        );
        assert!(links.next.is_none());
        assert!(links.prev.is_some());
        assert!(links.first.is_some());
    }

    #[test]
    fn handles_multiple_relations_and_unquoted_values() {
        let links = Links::parse("<https://example.com/a?page=3>; rel=next last, <https://example.com/a?page=1>;rel=first");
        assert_eq!(links.next, links.last);
        assert_eq!(links.first.unwrap().as_str(), "https://example.com/a?page=1");
    }

    #[test]
    fn garbage_yields_no_links() {
        assert_eq!(Links::parse(""), Links::default());
        assert_eq!(Links::parse("not a link header"), Links::default());
        assert_eq!(Links::parse(r#"<not a url>; rel="next""#), Links::default());
    }

    #[test]
    fn reads_all_link_headers() {
        let mut headers = HeaderMap::new();
        headers.append(LINK, HeaderValue::from_static(r#"<https://example.com/x?page=2>; rel="next""#));
        headers.append(LINK, HeaderValue::from_static(r#"<https://example.com/x?page=9>; rel="last""#));
        let links = Links::from_headers(&headers);
        assert!(links.next.is_some());
        assert!(links.last.is_some());
    }
}
