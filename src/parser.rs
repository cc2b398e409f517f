use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{0}` is not a valid tag name")]
    InvalidTag(String),
}

/// One element that carries the scanned attribute, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExtractedReference {
    pub(crate) sequence_id: usize,
    pub(crate) raw_value: String,
    pub(crate) text_content: String,
    pub(crate) classes: Vec<String>,
}

/// HTML parser
#[derive(Debug)]
pub(crate) struct Parser {
    selector: Selector,
    html: Html,
}

impl Parser {
    /// Create a new parser for `html` that looks at `tag` elements. `tag` is a
    /// plain element name, not a CSS selector.
    pub(crate) fn new(html: &str, tag: &str) -> Result<Self, ParseError> {
        if !is_element_name(tag) {
            return Err(ParseError::InvalidTag(tag.to_string()));
        }
        let selector =
            Selector::parse(tag).map_err(|_| ParseError::InvalidTag(tag.to_string()))?;

        Ok(Self {
            selector,
            html: Html::parse_document(html),
        })
    }

    /// Returns an iterator over the `attribute` values of the selected elements.
    /// Elements without the attribute are skipped and do not consume a sequence id.
    pub(crate) fn extract<'a>(
        &'a self,
        attribute: &'a str,
    ) -> impl Iterator<Item = ExtractedReference> + 'a {
        self.html
            .select(&self.selector)
            .filter_map(move |el| {
                el.value()
                    .attr(attribute)
                    .map(|value| (value.to_string(), el))
            })
            .enumerate()
            .map(|(sequence_id, (raw_value, el))| ExtractedReference {
                sequence_id,
                raw_value,
                text_content: text_of(el),
                classes: el.value().classes().map(String::from).collect(),
            })
    }
}

/// An ASCII letter followed by letters, digits or `-` (custom elements).
fn is_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Descendant text with whitespace runs collapsed, so it fits on one line.
fn text_of(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
