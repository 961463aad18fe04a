//! Turns free text plus typed qualifier options into a GitHub search query.

use std::collections::{HashMap, HashSet};
use std::fmt;

use clap::ValueEnum;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::qualifiers::{self, Qualifier, QualifierKind, SearchType};

/// Value supplied for one qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierValue {
    Text(String),
    Toggle(bool),
    /// Substitute the invoking user's login.
    CurrentUser,
}

impl From<&str> for QualifierValue {
    fn from(value: &str) -> Self {
        QualifierValue::Text(value.to_string())
    }
}

impl From<String> for QualifierValue {
    fn from(value: String) -> Self {
        QualifierValue::Text(value)
    }
}

impl From<bool> for QualifierValue {
    fn from(value: bool) -> Self {
        QualifierValue::Toggle(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a search invocation asks for, keyed by qualifier name.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub search_type: SearchType,
    pub values: HashMap<String, QualifierValue>,
    /// Names whose value is emitted as `-name:value`.
    pub negated: HashSet<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

impl QueryOptions {
    pub fn new(search_type: SearchType) -> Self {
        QueryOptions {
            search_type,
            values: HashMap::new(),
            negated: HashSet::new(),
            sort: None,
            order: None,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<QualifierValue>) -> Self {
        self.set(name, value.into(), false);
        self
    }

    pub fn without(mut self, name: &str, value: impl Into<QualifierValue>) -> Self {
        self.set(name, value.into(), true);
        self
    }

    pub fn set(&mut self, name: &str, value: QualifierValue, negated: bool) {
        self.values.insert(name.to_string(), value);
        if negated {
            self.negated.insert(name.to_string());
        } else {
            self.negated.remove(name);
        }
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }
}

pub struct QueryBuilder<'a> {
    identity: &'a dyn Identity,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(identity: &'a dyn Identity) -> Self {
        QueryBuilder { identity }
    }

    /// Build the `q` parameter. `Ok(None)` means no criteria were given at
    /// all, which is for the caller to report.
    pub fn build(&self, free_text: Option<&str>, options: &QueryOptions) -> Result<Option<String>> {
        let search_type = options.search_type;
        self.validate(options)?;

        let mut tokens = Vec::new();
        if let Some(text) = free_text.map(str::trim).filter(|t| !t.is_empty()) {
            tokens.push(text.to_string());
        }

        let mut current_user: Option<String> = None;
        for qualifier in qualifiers::qualifiers_for(search_type) {
            let Some(value) = options.values.get(qualifier.name) else {
                continue;
            };
            let rendered = match value {
                QualifierValue::Text(text) if text.trim().is_empty() => continue,
                QualifierValue::Text(text) => text.trim().to_string(),
                QualifierValue::Toggle(on) => on.to_string(),
                QualifierValue::CurrentUser => {
                    if current_user.is_none() {
                        current_user = Some(self.identity.current_user()?);
                    }
                    current_user.clone().unwrap_or_default()
                }
            };
            if options.negated.contains(qualifier.name) {
                tokens.push(format!("-{}:{}", qualifier.name, rendered));
            } else {
                tokens.push(format!("{}:{}", qualifier.name, rendered));
            }
        }

        if tokens.is_empty() {
            debug!("no search criteria for {}", search_type);
            return Ok(None);
        }
        let query = tokens.join(" ");
        debug!("built {} query: {}", search_type, query);
        Ok(Some(query))
    }

    fn validate(&self, options: &QueryOptions) -> Result<()> {
        let search_type = options.search_type;
        let invalid = |qualifier: String, reason: &'static str| Error::InvalidQualifier {
            search_type,
            qualifier,
            reason,
        };

        for (name, value) in &options.values {
            let qualifier: &Qualifier = qualifiers::lookup(search_type, name)
                .ok_or_else(|| invalid(name.clone(), "not a recognized qualifier"))?;
            match (value, qualifier.kind) {
                (QualifierValue::CurrentUser, _) if !qualifier.user_substitutable => {
                    return Err(invalid(name.clone(), "requires a value"));
                }
                (QualifierValue::Toggle(_), QualifierKind::Text | QualifierKind::Choice(_)) => {
                    return Err(invalid(name.clone(), "requires a value"));
                }
                (QualifierValue::Text(text), QualifierKind::Choice(allowed))
                    if !allowed.contains(&text.trim()) =>
                {
                    return Err(invalid(name.clone(), "value is not one of the allowed choices"));
                }
                _ => {}
            }
        }

        for name in &options.negated {
            let qualifier = qualifiers::lookup(search_type, name)
                .ok_or_else(|| invalid(format!("not-{name}"), "not a recognized qualifier"))?;
            if !qualifier.negatable {
                return Err(invalid(format!("not-{name}"), "cannot be negated"));
            }
            if !options.values.contains_key(name) {
                return Err(invalid(format!("not-{name}"), "requires a value"));
            }
        }
        Ok(())
    }
}
