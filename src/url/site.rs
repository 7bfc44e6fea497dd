use crate::UrlError;
use url::Url;

/// Derives the site identity used to name the sink destination
///
/// Takes the host of the URL, strips a leading `www.`, and returns the first
/// DNS label. Multi-label registrable domains are intentionally not resolved:
/// `blog.example.co.uk` yields `blog`, not `example`. That limitation is part
/// of the contract (container names stay short and predictable) rather than a
/// bug to fix here.
///
/// # Examples
///
/// ```
/// use gleaner::site_name;
/// use url::Url;
///
/// let url = Url::parse("https://www.example.com/").unwrap();
/// assert_eq!(site_name(&url).unwrap(), "example");
/// ```
pub fn site_name(url: &Url) -> Result<String, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();

    let host = host.strip_prefix("www.").unwrap_or(&host);

    let label = host.split('.').next().unwrap_or_default();
    if label.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    Ok(label.to_string())
}
