use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::parser::ExtractedReference;

/// Element class condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClassFilter {
    /// Every element passes, including ones without a `class` attribute.
    NoFilter,
    /// The element must carry at least one of these class tokens.
    MatchAny(Vec<String>),
}

impl ClassFilter {
    /// Build a filter from a space separated list of class tokens.
    /// A list without any token filters nothing.
    pub(crate) fn from_tokens(tokens: Option<&str>) -> Self {
        let tokens: Vec<String> = tokens
            .map(|t| t.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        if tokens.is_empty() {
            Self::NoFilter
        } else {
            Self::MatchAny(tokens)
        }
    }

    pub(crate) fn matches<'a>(&self, mut classes: impl Iterator<Item = &'a str>) -> bool {
        match self {
            Self::NoFilter => true,
            Self::MatchAny(tokens) => classes.any(|class| tokens.iter().any(|t| t == class)),
        }
    }
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::NoFilter
    }
}

/// Why a reference did not make it through the filters.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    Search,
    Regex,
    Class,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "doesn't contain the search string",
            Self::Regex => "doesn't match the regular expression",
            Self::Class => "carries none of the classes",
        })
    }
}

/// All conditions a reference has to satisfy. Absent conditions always hold.
#[derive(Debug, Clone, Default)]
pub(crate) struct FilterSpec {
    pub(crate) substring: Option<String>,
    /// Compiled with a leading anchor, so it only ever matches a prefix.
    pub(crate) regex: Option<Regex>,
    pub(crate) class: ClassFilter,
}

impl FilterSpec {
    /// Compile `pattern` so that it has to match at the start of a reference.
    /// The end stays unanchored unless the pattern anchors it itself.
    pub(crate) fn prefix_regex(pattern: &str) -> Result<Regex, regex::Error> {
        Regex::new(&format!("^(?:{})", pattern))
    }

    pub(crate) fn passes(&self, reference: &ExtractedReference) -> bool {
        match self.check(reference) {
            Ok(()) => true,
            Err(rejection) => {
                debug!("\"{}\" {}, skip.", reference.raw_value, rejection);
                false
            }
        }
    }

    /// Evaluate the conditions in order, reporting the first one that fails.
    pub(crate) fn check(&self, reference: &ExtractedReference) -> Result<(), Rejection> {
        let value = reference.raw_value.as_str();

        if let Some(substring) = &self.substring {
            if !value.contains(substring.as_str()) {
                return Err(Rejection::Search);
            }
        }

        if let Some(regex) = &self.regex {
            if !regex.is_match(value) {
                return Err(Rejection::Regex);
            }
        }

        if !self
            .class
            .matches(reference.classes.iter().map(String::as_str))
        {
            return Err(Rejection::Class);
        }

        Ok(())
    }
}
