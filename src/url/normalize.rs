use crate::UrlError;
use url::Url;

/// Parses and validates a seed URL
///
/// The seed must be absolute, with an `http` or `https` scheme and a host.
/// Everything downstream (link discovery, site naming) assumes both.
///
/// # Examples
///
/// ```
/// use gleaner::parse_seed;
///
/// let seed = parse_seed("https://www.example.com/").unwrap();
/// assert_eq!(seed.host_str(), Some("www.example.com"));
///
/// assert!(parse_seed("ftp://example.com/").is_err());
/// assert!(parse_seed("/relative/path").is_err());
/// ```
pub fn parse_seed(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Canonicalizes a discovered link for membership in the link set
///
/// Strips trailing path separators so `.../page/` and `.../page` collapse to
/// one member. The set itself handles de-duplication of identical strings.
pub fn canonicalize_link(link: &str) -> String {
    link.trim_end_matches('/').to_string()
}
