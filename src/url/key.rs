//! Short key derivation for harvested pages
//!
//! Keys double as map keys and output filename stems, so they must be safe
//! for filesystems and blob names and short enough to stay readable.

/// Maximum length of a derived key, in characters
pub const MAX_KEY_LEN: usize = 50;

/// Derives a short, storage-safe key from an absolute URL
///
/// # Derivation Steps
///
/// 1. Strip a leading `https://` or `http://` scheme prefix
/// 2. Strip a leading `www.`
/// 3. Remove `.com` tokens
/// 4. Replace every `/` with `_`
/// 5. Truncate to [`MAX_KEY_LEN`] characters
///
/// This is a readability heuristic, not a hash: distinct URLs that coincide
/// after these substitutions (or after truncation) collapse to the same key,
/// and the harvest map resolves such collisions last-write-wins.
///
/// # Examples
///
/// ```
/// use gleaner::derive_key;
///
/// assert_eq!(derive_key("https://www.example.com/about"), "example_about");
/// ```
pub fn derive_key(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);

    stripped
        .replace(".com", "")
        .replace('/', "_")
        .chars()
        .take(MAX_KEY_LEN)
        .collect()
}
