use url::Url;

use crate::merge::MergeError;

/// Normalizes a feed or item link to its canonical text form.
///
/// Feed identity is the normalized link text, so every comparison in the
/// engine must go through the same normalization. Parsing is strict: a stored
/// link that no longer parses is state corruption, reported at the point of
/// use instead of being silently masked.
///
/// # Arguments
///
/// * `raw` - The link as stored or as received from the fetch layer
///
/// # Returns
///
/// The canonical text (scheme and host lowercased by the parser, at most one
/// trailing slash removed), or [`MergeError::CorruptLink`] if the value is
/// not a parseable absolute URI.
pub fn normalize_link(raw: &str) -> Result<String, MergeError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|_| MergeError::CorruptLink(trimmed.to_string()))?;
    Ok(trim_trailing_slash(url.as_str()).to_string())
}

/// Removes at most one trailing `/` from a string.
///
/// Used for GUID and link comparisons where `.../article` and `.../article/`
/// denote the same resource. Only a single slash is removed; anything beyond
/// that is treated as meaningful.
pub fn trim_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}
