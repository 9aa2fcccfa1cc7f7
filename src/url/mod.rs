//! URL handling module for Review-Trawl
//!
//! This module provides URL normalization for visited-set keys and
//! resolution of link targets found on listing pages.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should not be followed:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - hrefs that fail to resolve
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use review_trawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/products/acme/reviews").unwrap();
/// let next = resolve_link("?page=2", &base).unwrap();
/// assert_eq!(next.as_str(), "https://example.com/products/acme/reviews?page=2");
/// assert!(resolve_link("#", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Returns the visited-set key for a URL
///
/// Falls back to the URL's own string form when it cannot be normalized, so
/// every URL still has a stable key.
pub fn visit_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
