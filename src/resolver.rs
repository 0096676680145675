// URL Resolver
// Resolves possibly-relative URLs found in a page against the page's own URL.

use url::Url;

/// Resolve `candidate` against `base_url`
///
/// Absolute candidates come back byte-for-byte unchanged. Anything that
/// cannot be parsed or joined is also returned unchanged; this never fails.
pub fn resolve(candidate: &str, base_url: &str) -> String {
    if Url::parse(candidate).is_ok() {
        return candidate.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(candidate)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => candidate.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_root_relative_path() {
        assert_eq!(
            resolve("/img/x.png", "https://example.com/page"),
            "https://example.com/img/x.png"
        );
    }

    #[test]
    fn test_document_relative_path() {
        assert_eq!(
            resolve("img/x.png", "https://example.com/blog/post"),
            "https://example.com/blog/img/x.png"
        );
        assert_eq!(
            resolve("../x.png", "https://example.com/a/b/c"),
            "https://example.com/a/x.png"
        );
    }

    #[test]
    fn test_scheme_relative_inherits_scheme() {
        assert_eq!(
            resolve("//cdn.example.com/x.png", "http://example.com/"),
            "http://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_absolute_candidate_kept_verbatim() {
        // Url::to_string would add a trailing slash here; the input must not change
        let candidate = "https://cdn.example.com";
        assert_eq!(resolve(candidate, "https://example.com/page"), candidate);
    }

    #[test]
    fn test_unparseable_base_returns_candidate() {
        assert_eq!(resolve("/x.png", "not a url"), "/x.png");
        assert_eq!(resolve("/x.png", ""), "/x.png");
    }

    #[test]
    fn test_empty_candidate_resolves_to_base() {
        assert_eq!(
            resolve("", "https://example.com/page?q=1"),
            "https://example.com/page?q=1"
        );
    }

    proptest! {
        #[test]
        fn prop_absolute_urls_unchanged(
            host in "[a-z]{1,12}\\.(com|org|test)",
            path in "(/[a-z0-9_-]{0,8}){0,4}",
            scheme in "https?",
        ) {
            let candidate = format!("{scheme}://{host}{path}");
            prop_assert_eq!(resolve(&candidate, "https://base.example/dir/page"), candidate);
        }

        #[test]
        fn prop_root_relative_paths_keep_base_origin(path in "(/[a-z0-9_-]{1,8}){1,4}") {
            let resolved = resolve(&path, "https://example.com/some/page");
            prop_assert_eq!(resolved, format!("https://example.com{path}"));
        }
    }
}
