use crate::UrlError;
use url::Url;

/// Placeholder values site extractors emit when a card has no link
const PLACEHOLDER_LINKS: &[&str] = &["n/a", "na", "none", "null", "#"];

/// Query parameters that only track where a visit came from
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "origin", "ref", "source", "src"];
const TRACKING_PREFIXES: &[&str] = &["utm_"];

/// Derives the identity key of a listing from its detail-page address
///
/// # Normalization Steps
///
/// 1. Trim; reject empty and placeholder values (`N/A`, `#`, ...)
/// 2. Parse as an absolute URL; only http and https are accepted
/// 3. Lowercase the host (done by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Always end with a trailing slash
/// 5. Remove the fragment and tracking query parameters (`utm_*`,
///    `origin`, ...); the remaining parameters are sorted by name
///
/// The same listing reached from different keyword searches carries
/// different tracking queries. Other parameters may hold the listing id
/// itself, so they stay in the key.
///
/// # Examples
///
/// ```
/// use listing_harvest::url::identity_key;
///
/// let key = identity_key("https://WWW.OCC.com.mx/empleos/empleo-123?origin=search#top").unwrap();
/// assert_eq!(key, "https://www.occ.com.mx/empleos/empleo-123/");
/// ```
pub fn identity_key(link: &str) -> Result<String, UrlError> {
    let link = link.trim();
    if link.is_empty() || PLACEHOLDER_LINKS.contains(&link.to_lowercase().as_str()) {
        return Err(UrlError::Unresolvable(link.to_string()));
    }

    let mut url = Url::parse(link).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    Ok(url.to_string())
}

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&name.as_str())
        || TRACKING_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Normalizes a URL path by removing dot segments and forcing a trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}/", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_collapses() {
        let a = identity_key("https://www.occ.com.mx/empleos/empleo-1").unwrap();
        let b = identity_key("https://www.occ.com.mx/empleos/empleo-1/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "https://www.occ.com.mx/empleos/empleo-1/");
    }

    #[test]
    fn test_tracking_query_and_fragment_removed() {
        let key = identity_key("https://example.com/job/7/?utm_source=x&origin=search#apply").unwrap();
        assert_eq!(key, "https://example.com/job/7/");
    }

    #[test]
    fn test_id_in_query_keeps_listings_apart() {
        let first = identity_key("https://jobs.test/job?id=1&utm_medium=mail").unwrap();
        let second = identity_key("https://jobs.test/job?id=2").unwrap();

        assert_ne!(first, second);
        assert_eq!(first, "https://jobs.test/job/?id=1");
    }

    #[test]
    fn test_query_order_is_irrelevant() {
        let a = identity_key("https://jobs.test/job?b=2&a=1").unwrap();
        let b = identity_key("https://jobs.test/job?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_host_lowercased() {
        let key = identity_key("https://EXAMPLE.com/Job/7").unwrap();
        assert_eq!(key, "https://example.com/Job/7/");
    }

    #[test]
    fn test_dot_segments() {
        let key = identity_key("https://example.com/a/./b/../c//d").unwrap();
        assert_eq!(key, "https://example.com/a/c/d/");
    }

    #[test]
    fn test_root_path() {
        let key = identity_key("https://example.com").unwrap();
        assert_eq!(key, "https://example.com/");
    }

    #[test]
    fn test_placeholders_rejected() {
        assert!(matches!(identity_key("N/A"), Err(UrlError::Unresolvable(_))));
        assert!(matches!(identity_key("   "), Err(UrlError::Unresolvable(_))));
        assert!(matches!(identity_key("#"), Err(UrlError::Unresolvable(_))));
    }

    #[test]
    fn test_relative_link_rejected() {
        assert!(matches!(
            identity_key("/empleos/empleo-1/"),
            Err(UrlError::Parse(_))
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(matches!(
            identity_key("mailto:jobs@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_http_kept_distinct_scheme() {
        let key = identity_key("http://127.0.0.1:8080/empleo-1").unwrap();
        assert_eq!(key, "http://127.0.0.1:8080/empleo-1/");
    }
}
