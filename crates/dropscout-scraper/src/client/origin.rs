//! URL origin and host helpers shared by the fetcher and the feed source.

/// Extracts the scheme+host origin from a store URL.
///
/// Given `"https://shop.example.com/collections/all"`, returns
/// `"https://shop.example.com"`, so feed paths are always resolved against
/// the store root.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |e| {
            tracing::warn!(
                store_url,
                error = %e,
                "could not parse store URL, falling back to string split for origin"
            );
            // scheme and host are the first three slash-separated parts
            store_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for error messages.
///
/// Falls back to the full URL string if parsing fails.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Store label used as `source_store`: the host without a leading `www.`.
#[must_use]
pub fn store_label(url: &str) -> String {
    let domain = extract_domain(url);
    domain
        .strip_prefix("www.")
        .map_or(domain.clone(), str::to_owned)
}
