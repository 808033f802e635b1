// * Address Normalization
// * Opt-in canonical form for page addresses before tables are joined

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use url::Url;

// * Tracking parameters that never change page identity
static TRACKING_PARAMS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content", "gclid", "fbclid",
        "yclid", "_ga",
    ]
    .into()
});

/// Canonical form of an absolute address
///
/// Strips the fragment, lowercases the host, drops tracking parameters and
/// sorts the remaining query keys. Input that is not an absolute URL is
/// returned trimmed but otherwise verbatim.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        if lower_host != host && url.set_host(Some(&lower_host)).is_err() {
            return trimmed.to_string();
        }
    }

    let mut kept: BTreeMap<String, String> = BTreeMap::new();
    for (k, v) in url.query_pairs() {
        if !TRACKING_PARAMS.contains(k.to_lowercase().as_str()) {
            kept.insert(k.into_owned(), v.into_owned());
        }
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (k, v) in &kept {
            serializer.append_pair(k, v);
        }
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fragment_and_tracking() {
        assert_eq!(
            normalize_address("https://Example.COM/shoes?utm_source=x&size=9#reviews"),
            "https://example.com/shoes?size=9"
        );
    }

    #[test]
    fn test_sorts_query_keys() {
        assert_eq!(
            normalize_address("https://example.com/p?b=2&a=1"),
            "https://example.com/p?a=1&b=2"
        );
    }

    #[test]
    fn test_path_case_is_preserved() {
        assert_eq!(
            normalize_address("https://example.com/Blue-Widgets"),
            "https://example.com/Blue-Widgets"
        );
    }

    #[test]
    fn test_relative_address_is_trimmed_only() {
        assert_eq!(normalize_address("  /blog/post  "), "/blog/post");
    }
}
