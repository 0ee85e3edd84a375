use std::fmt;
use std::path::Path;

use reqwest::Url;

use crate::error::CoreError;

/// Basic-auth credentials for the node.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) user: String,
    pub(crate) pass: String,
}

impl Credentials {
    fn new(user: &str, pass: &str) -> Self {
        Self {
            user: user.to_owned(),
            pass: pass.to_owned(),
        }
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

/// Node URL with any `user:pass@` part split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub(crate) url: String,
    pub(crate) embedded: Option<Credentials>,
}

/// Credentials precedence:
/// 1. explicit `user` + `pass`
/// 2. cookie file (`username:password`) from `cookie_file`
/// 3. no auth
pub(crate) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
    cookie_file: Option<&Path>,
) -> Result<Option<Credentials>, CoreError> {
    match (user, pass) {
        (Some(u), Some(p)) => return Ok(Some(Credentials::new(u, p))),
        (Some(_), None) | (None, Some(_)) => {
            return Err(CoreError::Config(
                "both rpc user and rpc pass must be set together".to_owned(),
            ));
        }
        (None, None) => {}
    }

    let Some(cookie_file) = cookie_file else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(cookie_file).map_err(|e| {
        CoreError::Config(format!(
            "failed to read rpc cookie file {}: {e}",
            cookie_file.display()
        ))
    })?;
    let line = content
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            CoreError::Config(format!("rpc cookie file {} is empty", cookie_file.display()))
        })?;

    match line.split_once(':') {
        Some((u, p)) if !u.is_empty() && !p.is_empty() => Ok(Some(Credentials::new(u, p))),
        _ => Err(CoreError::Config(format!(
            "rpc cookie file {} must contain non-empty `username:password`",
            cookie_file.display()
        ))),
    }
}

pub(crate) fn parse_connection(connection: &str) -> Result<Endpoint, CoreError> {
    let mut parsed = Url::parse(connection).map_err(|e| {
        CoreError::Config(format!(
            "invalid rpc url `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::Config(format!(
            "unsupported rpc url scheme `{}`; expected http or https",
            parsed.scheme()
        )));
    }

    let embedded = match (parsed.username(), parsed.password()) {
        ("", None) => None,
        (user, Some(pass)) => Some(Credentials::new(user, pass)),
        (_, None) => {
            return Err(CoreError::Config(
                "rpc url carries a user without a password".to_owned(),
            ))
        }
    };
    if embedded.is_some() {
        // Both setters only fail for URLs that cannot carry credentials,
        // which the scheme check excludes.
        let _ = parsed.set_username("");
        let _ = parsed.set_password(None);
    }
    Ok(Endpoint {
        url: parsed.to_string(),
        embedded,
    })
}
