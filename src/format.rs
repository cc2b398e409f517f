use std::cell::OnceCell;

use sha2::{Digest, Sha224};
use uuid::Uuid;

use crate::parser::ExtractedReference;

/// Everything a placeholder can draw from while one item is formatted.
struct Item<'a> {
    reference: &'a ExtractedReference,
    value: &'a str,
    hash: OnceCell<String>,
}

type Resolver = fn(&Item<'_>) -> String;

/// Recognized placeholders. Anything else between `%` signs is copied verbatim.
const TOKENS: &[(&str, Resolver)] = &[
    ("url", url),
    ("id", id),
    ("guid", guid),
    ("hash", hash),
    ("text", text),
];

fn url(item: &Item<'_>) -> String {
    item.value.to_string()
}

fn id(item: &Item<'_>) -> String {
    item.reference.sequence_id.to_string()
}

/// Drawn fresh for every occurrence, even within one line.
fn guid(_: &Item<'_>) -> String {
    Uuid::new_v4().to_string()
}

fn hash(item: &Item<'_>) -> String {
    item.hash
        .get_or_init(|| fingerprint(&item.reference.raw_value))
        .clone()
}

fn text(item: &Item<'_>) -> String {
    item.reference.text_content.clone()
}

/// Output template such as `<a href="%url%">%text%</a>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Template(String);

impl Template {
    pub(crate) fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Substitute every recognized placeholder in a single pass over the
    /// template, so substituted text is never scanned for placeholders again.
    fn render(&self, item: &Item<'_>) -> String {
        let mut out = String::with_capacity(self.0.len() + item.value.len());
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let token = after.find('%').and_then(|end| {
                let name = &after[..end];
                TOKENS
                    .iter()
                    .find(|(token, _)| *token == name)
                    .map(|(_, resolve)| (end, resolve))
            });

            match token {
                Some((end, resolve)) => {
                    out.push_str(&resolve(item));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        out
    }
}

/// Render one output line for `reference`, whose (possibly resolved) address
/// is `value`. Without a template the address is printed as is.
pub(crate) fn format(
    reference: &ExtractedReference,
    value: &str,
    template: Option<&Template>,
) -> String {
    match template {
        None => value.to_string(),
        Some(template) => template.render(&Item {
            reference,
            value,
            hash: OnceCell::new(),
        }),
    }
}

/// Stable content fingerprint of a raw reference: hex encoded SHA-224.
pub(crate) fn fingerprint(raw: &str) -> String {
    hex::encode(Sha224::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::{fingerprint, format, Template};
    use crate::parser::ExtractedReference;

    fn reference() -> ExtractedReference {
        ExtractedReference {
            sequence_id: 7,
            raw_value: "/x".to_string(),
            text_content: "Go there".to_string(),
            classes: vec![],
        }
    }

    #[test]
    fn test_without_template_prints_value() {
        assert_eq!(format(&reference(), "https://site/x", None), "https://site/x");
    }

    #[test]
    fn test_placeholders() {
        let template = Template::new(r#"<a href="%url%" data-id="%id%">%text%</a>"#);
        assert_eq!(
            format(&reference(), "https://site/x", Some(&template)),
            r#"<a href="https://site/x" data-id="7">Go there</a>"#
        );
    }

    #[test]
    fn test_repeated_placeholders() {
        let template = Template::new("%url% %url% %id%%id%");
        assert_eq!(format(&reference(), "v", Some(&template)), "v v 77");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let template = Template::new("100% %foo% %url%url% 50%");
        assert_eq!(
            format(&reference(), "v", Some(&template)),
            "100% %foo% vurl% 50%"
        );

        let template = Template::new("%bar%url%");
        assert_eq!(format(&reference(), "v", Some(&template)), "%barv");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let template = Template::new("%url%");
        assert_eq!(format(&reference(), "%id%", Some(&template)), "%id%");
    }

    #[test]
    fn test_hash_is_a_fingerprint_of_the_raw_reference() {
        let template = Template::new("%hash%");
        let first = format(&reference(), "https://site/x", Some(&template));
        let second = format(&reference(), "something else", Some(&template));

        assert_eq!(first, second);
        assert_eq!(first, fingerprint("/x"));
        assert_eq!(first.len(), 56);
        assert_eq!(
            fingerprint(""),
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"
        );
    }

    #[test]
    fn test_guid_is_fresh_per_occurrence() {
        let template = Template::new("%guid% %guid%");
        let line = format(&reference(), "v", Some(&template));
        let (a, b) = line.split_once(' ').unwrap();

        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a).is_ok());
        assert_ne!(line, format(&reference(), "v", Some(&template)));
    }
}
