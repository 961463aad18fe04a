use std::process::Command;

use tracing::debug;

use crate::error::Result;

/// GitHub's own placeholder for the authenticated user.
pub const ME: &str = "@me";

/// Resolves "the invoking user" for qualifiers such as `--involves` given
/// without a value.
pub trait Identity {
    fn current_user(&self) -> Result<String>;
}

/// A fixed login.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl Identity for StaticIdentity {
    fn current_user(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads `github.user`, then `user.name`, from git config. Falls back to
/// `@me` when git is missing or neither key holds a usable login.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitConfigIdentity;

impl GitConfigIdentity {
    fn git_config(key: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["config", "--get", key])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let value = String::from_utf8(output.stdout).ok()?;
        let value = value.trim();
        // a display name like "Jane Doe" is not a login
        (!value.is_empty() && !value.contains(char::is_whitespace)).then(|| value.to_string())
    }
}

impl Identity for GitConfigIdentity {
    fn current_user(&self) -> Result<String> {
        let user = Self::git_config("github.user")
            .or_else(|| Self::git_config("user.name"))
            .unwrap_or_else(|| ME.to_string());
        debug!("current github user is '{}'", user);
        Ok(user)
    }
}
