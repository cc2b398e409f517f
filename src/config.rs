use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::{
    downloader::FetchOptions,
    filter::{ClassFilter, FilterSpec},
    format::Template,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "grablinks", version)]
#[command(
    about = "Extracts, and optionally filters, all links (`<a href=\"\"/>`) from an HTML document.",
    long_about = None
)]
pub(crate) struct Args {
    /// A fully qualified URL to the source HTML document (http, https, or file).
    #[arg(value_name = "URL")]
    pub(crate) url: String,

    /// A format string to wrap in the output: %url% is replaced by found URL entries;
    /// other supported placeholders: %id%, %guid%, %hash%, and %text%.
    #[arg(short, long = "format", value_name = "TEMPLATE")]
    pub(crate) format: Option<String>,

    /// Try to convert relative and fragmental URLs to absolute URLs (after filtering).
    #[arg(long)]
    pub(crate) fix_links: bool,

    /// Element to scan.
    #[arg(short, long, default_value = "a", value_name = "NAME")]
    pub(crate) tag: String,

    /// Attribute of the scanned element to extract.
    #[arg(short, long, default_value = "href", value_name = "NAME")]
    pub(crate) attribute: String,

    /// Only extract from elements with the specified class attribute content. Multiple
    /// classes, separated by space, are evaluated with a logical OR.
    #[arg(short, long = "class", value_name = "CLASS", help_heading = "Filter options")]
    pub(crate) class: Option<String>,

    /// Only output entries if the search string occurs in the URL.
    #[arg(short, long, value_name = "STRING", help_heading = "Filter options")]
    pub(crate) search: Option<String>,

    /// Only output entries if the start of the URL matches the regular expression.
    #[arg(short = 'x', long, value_name = "PATTERN", help_heading = "Filter options")]
    pub(crate) regex: Option<String>,

    /// Disable TLS certificate verification.
    #[arg(short = 'k', long)]
    pub(crate) insecure: bool,

    /// Network request timeout.
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub(crate) timeout: u64,

    /// Print diagnostic messages to stderr.
    #[arg(short, long)]
    pub(crate) debug: bool,
}

/// Everything one run needs, resolved from the command line up front.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) url: String,
    pub(crate) fetch: FetchOptions,
    pub(crate) tag: String,
    pub(crate) attribute: String,
    pub(crate) filter: FilterSpec,
    pub(crate) template: Option<Template>,
    pub(crate) fix_links: bool,
}

impl Config {
    /// A run over `url` that prints every `<a href>` as found.
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fetch: FetchOptions::default(),
            tag: "a".to_string(),
            attribute: "href".to_string(),
            filter: FilterSpec::default(),
            template: None,
            fix_links: false,
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let regex = args
            .regex
            .as_deref()
            .map(FilterSpec::prefix_regex)
            .transpose()?;

        Ok(Self {
            fetch: FetchOptions {
                timeout: Duration::from_secs(args.timeout),
                insecure: args.insecure,
            },
            tag: args.tag,
            attribute: args.attribute,
            filter: FilterSpec {
                substring: args.search,
                regex,
                class: ClassFilter::from_tokens(args.class.as_deref()),
            },
            template: args.format.map(Template::new),
            fix_links: args.fix_links,
            ..Self::new(args.url)
        })
    }
}
