//! Remote image allow-list matching.
//!
//! The build tool only optimizes remote images whose URL is allowed by
//! `image.domains` or one of `image.remotePatterns`. These predicates
//! reproduce its matching rules so a config can be checked against real
//! image URLs before a build.
//!
//! ## Wildcards
//!
//! | Pattern part | Form | Matches |
//! |--------------|------|---------|
//! | `hostname` | `**.example.com` | any subdomain depth, not `example.com` itself |
//! | `hostname` | `*.example.com` | exactly one extra label |
//! | `pathname` | `/images/**` | anything below `/images/` |
//! | `pathname` | `/images/*` | exactly one segment below `/images/` |
//!
//! Anything else is an exact match.

use crate::config::ImageConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// One URL pattern. Absent parts match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemotePattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Compared against the URL's explicit port only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
}

impl RemotePattern {
    pub fn matches(&self, url: &Url) -> bool {
        let protocol_ok = self.protocol.as_deref().is_none_or(|protocol| {
            protocol
                .trim_end_matches(':')
                .eq_ignore_ascii_case(url.scheme())
        });
        let hostname_ok = self
            .hostname
            .as_deref()
            .is_none_or(|pattern| match_hostname(url.host_str().unwrap_or_default(), pattern));
        let port_ok = self
            .port
            .as_deref()
            .is_none_or(|port| url.port().is_some_and(|p| p.to_string() == port));
        let pathname_ok = self
            .pathname
            .as_deref()
            .is_none_or(|pattern| match_pathname(url.path(), pattern));

        protocol_ok && hostname_ok && port_ok && pathname_ok
    }
}

impl fmt::Display for RemotePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = self.protocol.as_deref().unwrap_or("*").trim_end_matches(':');
        write!(f, "{protocol}://{}", self.hostname.as_deref().unwrap_or("*"))?;
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(self.pathname.as_deref().unwrap_or("/**"))
    }
}

impl ImageConfig {
    /// Whether a remote image at `url` may be fetched and optimized.
    ///
    /// Only `http` and `https` URLs are ever allowed.
    pub fn is_remote_allowed(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let host = url.host_str().unwrap_or_default();
        self.domains.iter().any(|d| d.eq_ignore_ascii_case(host))
            || self.remote_patterns.iter().any(|p| p.matches(url))
    }
}

/// Match a host against a `hostname` pattern.
pub fn match_hostname(host: &str, pattern: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if let Some(suffix) = pattern.strip_prefix("**.") {
        subdomain_of(&host, suffix).is_some()
    } else if let Some(suffix) = pattern.strip_prefix("*.") {
        subdomain_of(&host, suffix).is_some_and(|label| !label.contains('.'))
    } else {
        host == pattern
    }
}

/// The non-empty labels in front of `.suffix`, if `host` is under it.
fn subdomain_of<'a>(host: &'a str, suffix: &str) -> Option<&'a str> {
    host.strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|labels| !labels.is_empty())
}

/// Match a URL path against a `pathname` pattern.
pub fn match_pathname(path: &str, pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        below(path, prefix).is_some()
    } else if let Some(prefix) = pattern.strip_suffix("/*") {
        below(path, prefix).is_some_and(|rest| !rest.trim_end_matches('/').contains('/'))
    } else {
        path == pattern
    }
}

/// The non-empty remainder of `path` after `prefix/`.
fn below<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}
