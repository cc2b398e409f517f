use crate::location::{MalformedAddress, SourceLocation};

/// Combine the document's own `base` location with a `reference` found in it
/// to build an absolute address.
///
/// References that already carry a scheme come back untouched. Everything
/// else inherits from `base` component by component. Joined paths are not
/// normalized, so `./` and `../` segments survive literally.
pub(crate) fn resolve(base: &SourceLocation, reference: &str) -> Result<String, MalformedAddress> {
    let parts = SourceLocation::split(reference)?;
    if !parts.scheme.is_empty() {
        return Ok(reference.to_string());
    }

    let mut resolved = SourceLocation {
        scheme: base.scheme.clone(),
        ..parts
    };

    if resolved.authority.is_empty() {
        resolved.authority = base.authority.clone();

        if resolved.path.is_empty() {
            if resolved.query.is_empty() {
                resolved.query = base.query.clone();
            }
            resolved.path = base.path.clone();
        } else if !resolved.path.starts_with('/') {
            resolved.path = join(&directory_of(&base.path), &resolved.path);
        }
    }

    Ok(resolved.to_string())
}

/// The directory context of a path. A trailing `/` marks a directory,
/// anything else is taken to end in a file name, which is dropped.
fn directory_of(path: &str) -> String {
    if path.ends_with('/') {
        return path.to_string();
    }

    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };

    // Keep a root made of slashes only, strip trailing ones from anything else.
    if head.chars().all(|c| c == '/') {
        head.to_string()
    } else {
        head.trim_end_matches('/').to_string()
    }
}

/// Join two path fragments with exactly the seam a POSIX path join produces.
fn join(context: &str, path: &str) -> String {
    if path.starts_with('/') || context.is_empty() {
        path.to_string()
    } else if context.ends_with('/') {
        format!("{}{}", context, path)
    } else {
        format!("{}/{}", context, path)
    }
}

#[cfg(test)]
mod tests {
    use super::{directory_of, join, resolve};
    use crate::location::SourceLocation;

    fn base(address: &str) -> SourceLocation {
        SourceLocation::parse(address, "https").unwrap()
    }

    #[test]
    fn test_absolute_references_are_untouched() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1");

        for reference in [
            "http://other/y",
            "HTTP://Other/Y/../z",
            "mailto:me@example.com",
            "javascript:void(0)",
            "ftp://files.example.com/pub/",
        ] {
            assert_eq!(resolve(&base, reference)?, reference);
        }

        Ok(())
    }

    #[test]
    fn test_root_relative_path() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1#top");
        assert_eq!(resolve(&base, "/x")?, "https://site/x");
        assert_eq!(resolve(&base, "/x?y=2#z")?, "https://site/x?y=2#z");

        Ok(())
    }

    #[test]
    fn test_relative_path_against_file_like_base() -> anyhow::Result<()> {
        let base = base("https://site/a/b/page.html");
        assert_eq!(resolve(&base, "x")?, "https://site/a/b/x");
        assert_eq!(resolve(&base, "sub/x.html")?, "https://site/a/b/sub/x.html");

        Ok(())
    }

    #[test]
    fn test_relative_path_against_directory_base() -> anyhow::Result<()> {
        let base = base("https://site/a/b/");
        assert_eq!(resolve(&base, "x")?, "https://site/a/b/x");

        let base = self::base("https://site");
        assert_eq!(resolve(&base, "x")?, "https://site/x");

        let base = self::base("https://site/");
        assert_eq!(resolve(&base, "x")?, "https://site/x");

        Ok(())
    }

    #[test]
    fn test_dot_segments_are_not_normalized() -> anyhow::Result<()> {
        let base = base("https://site/a/b/page.html");
        assert_eq!(resolve(&base, "../c")?, "https://site/a/b/../c");
        assert_eq!(resolve(&base, "./c")?, "https://site/a/b/./c");

        Ok(())
    }

    #[test]
    fn test_fragment_only_reference() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1#old");
        assert_eq!(
            resolve(&base, "#section")?,
            "https://site/dir/page.html?q=1#section"
        );

        Ok(())
    }

    #[test]
    fn test_query_only_reference() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1#old");
        assert_eq!(resolve(&base, "?x=1")?, "https://site/dir/page.html?x=1");

        Ok(())
    }

    #[test]
    fn test_relative_path_drops_base_query() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1");
        assert_eq!(resolve(&base, "other.html")?, "https://site/dir/other.html");

        Ok(())
    }

    #[test]
    fn test_empty_reference_inherits_everything_but_fragment() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1#old");
        assert_eq!(resolve(&base, "")?, "https://site/dir/page.html?q=1");

        Ok(())
    }

    #[test]
    fn test_network_path_reference_inherits_scheme_only() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html?q=1");
        assert_eq!(
            resolve(&base, "//cdn.example.com/lib.js")?,
            "https://cdn.example.com/lib.js"
        );
        assert_eq!(resolve(&base, "//cdn.example.com")?, "https://cdn.example.com");

        Ok(())
    }

    #[test]
    fn test_file_base() -> anyhow::Result<()> {
        let base = base("file:///home/user/docs/index.html");
        assert_eq!(resolve(&base, "img/a.png")?, "file:///home/user/docs/img/a.png");
        assert_eq!(resolve(&base, "/etc/hosts")?, "file:///etc/hosts");

        Ok(())
    }

    #[test]
    fn test_unparsable_reference_fails() -> anyhow::Result<()> {
        let base = base("https://site/");
        assert!(resolve(&base, "http://[::1/broken").is_err());
        assert!(resolve(&base, "//[broken/x").is_err());
        assert!(resolve(&base, "//[abc]/x").is_err());
        assert_eq!(resolve(&base, "//[::1]/x")?, "https://[::1]/x");

        Ok(())
    }

    #[test]
    fn test_only_leading_whitespace_is_stripped() -> anyhow::Result<()> {
        let base = base("https://site/dir/page.html");
        assert_eq!(resolve(&base, " x ")?, "https://site/dir/x ");
        assert_eq!(resolve(&base, "\n\t/y")?, "https://site/y");

        Ok(())
    }

    #[test]
    fn test_directory_of() {
        assert_eq!(directory_of("/a/b/page.html"), "/a/b");
        assert_eq!(directory_of("/a/b/"), "/a/b/");
        assert_eq!(directory_of("/page.html"), "/");
        assert_eq!(directory_of("page.html"), "");
        assert_eq!(directory_of(""), "");
        assert_eq!(directory_of("/a//b"), "/a");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/a/b", "x"), "/a/b/x");
        assert_eq!(join("/a/b/", "x"), "/a/b/x");
        assert_eq!(join("", "x"), "x");
        assert_eq!(join("/a", "/x"), "/x");
    }
}
