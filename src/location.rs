use std::{fmt, net::Ipv6Addr};

use thiserror::Error;

/// Schemes whose reassembled form carries a `//` authority marker even when
/// the authority itself is empty (`file:///tmp/a.html`).
const NETLOC_SCHEMES: &[&str] = &[
    "file", "ftp", "http", "https", "ws", "wss", "sftp", "git", "svn", "nfs", "rsync", "telnet",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedAddress {
    #[error("unbalanced brackets in authority `{0}`")]
    UnbalancedBrackets(String),
    #[error("`{0}` is not an IPv6 or IPvFuture literal")]
    InvalidBracketedHost(String),
}

/// An address split into its five components. Nothing is normalized:
/// components hold the literal text found between the delimiters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SourceLocation {
    pub(crate) scheme: String,
    pub(crate) authority: String,
    pub(crate) path: String,
    pub(crate) query: String,
    pub(crate) fragment: String,
}

impl SourceLocation {
    /// Split `address` into components, using `default_scheme` when it has none.
    pub(crate) fn parse(address: &str, default_scheme: &str) -> Result<Self, MalformedAddress> {
        let mut location = Self::split(address)?;
        if location.scheme.is_empty() {
            location.scheme = default_scheme.to_ascii_lowercase();
        }

        Ok(location)
    }

    /// Split `address` into components without substituting any default.
    /// An empty string yields a location with every component empty.
    pub(crate) fn split(address: &str) -> Result<Self, MalformedAddress> {
        let cleaned = clean(address);
        let mut rest = cleaned.as_str();
        let mut location = Self::default();

        if let Some((scheme, tail)) = split_scheme(rest) {
            location.scheme = scheme.to_ascii_lowercase();
            rest = tail;
        }

        if let Some(tail) = rest.strip_prefix("//") {
            let end = tail.find(['/', '?', '#']).unwrap_or(tail.len());
            let authority = &tail[..end];
            check_brackets(authority)?;
            location.authority = authority.to_string();
            rest = &tail[end..];
        }

        if let Some((head, fragment)) = rest.split_once('#') {
            location.fragment = fragment.to_string();
            rest = head;
        }

        if let Some((head, query)) = rest.split_once('?') {
            location.query = query.to_string();
            rest = head;
        }

        location.path = rest.to_string();

        Ok(location)
    }

    fn uses_authority_marker(&self) -> bool {
        NETLOC_SCHEMES.contains(&self.scheme.as_str())
    }
}

impl fmt::Display for SourceLocation {
    /// Reassemble the components. Empty query and fragment are omitted, so
    /// `a?` and `a#` do not survive a split/display round trip.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }

        let marker = !self.authority.is_empty()
            || (self.uses_authority_marker() && !self.path.starts_with("//"));
        if marker {
            f.write_str("//")?;
            f.write_str(&self.authority)?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;

        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }

        Ok(())
    }
}

/// An authority may only use brackets around an IP literal, optionally
/// preceded by user info.
fn check_brackets(authority: &str) -> Result<(), MalformedAddress> {
    let (open, close) = (authority.contains('['), authority.contains(']'));
    if open != close {
        return Err(MalformedAddress::UnbalancedBrackets(authority.to_string()));
    }
    if !open {
        return Ok(());
    }

    let host = authority
        .split_once('[')
        .and_then(|(_, tail)| tail.split_once(']'))
        .map_or("", |(host, _)| host);
    if !is_ip_literal(host) {
        return Err(MalformedAddress::InvalidBracketedHost(host.to_string()));
    }

    Ok(())
}

/// `v<hex>.<anything>` or an IPv6 address with an optional `%zone`.
fn is_ip_literal(host: &str) -> bool {
    if let Some(future) = host.strip_prefix('v') {
        return match future.split_once('.') {
            Some((version, rest)) => {
                !version.is_empty()
                    && version.chars().all(|c| c.is_ascii_hexdigit())
                    && !rest.is_empty()
            }
            None => false,
        };
    }

    let address = host.split_once('%').map_or(host, |(address, _)| address);
    address.parse::<Ipv6Addr>().is_ok()
}

/// Drop leading whitespace and control characters, and any embedded tab or
/// line break, the way attribute values are commonly sloppy. Trailing spaces
/// are part of the reference.
fn clean(address: &str) -> String {
    address
        .trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect()
}

/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`,
/// terminated by the first `:`.
fn split_scheme(address: &str) -> Option<(&str, &str)> {
    let colon = address.find(':')?;
    let scheme = &address[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }

    Some((scheme, &address[colon + 1..]))
}
