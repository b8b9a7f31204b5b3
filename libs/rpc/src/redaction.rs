//! URL sanitization so API keys never reach a log line, error message, or
//! audit event. Every caller that wants to name an endpoint in emitted text
//! must go through [`sanitize_url`].

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*/)([^/]{21,})$").unwrap());

/// Strip the API-key segment out of an RPC endpoint URL.
///
/// Recognizes the Alchemy `/v2/{key}` convention, the QuickNode
/// `.pro/{key}/...` convention, and falls back to blanking any trailing path
/// segment longer than 20 characters (the generic case for providers we
/// don't special-case).
pub fn sanitize_url(url: &str) -> String {
    if let Some(idx) = url.find("/v2/") {
        let (base, _key) = url.split_at(idx);
        return format!("{base}/v2/***");
    }

    if let Some(idx) = url.find(".pro/") {
        let base = &url[..idx];
        return format!("{base}.pro/***/...");
    }

    if let Some(captures) = TRAILING_SEGMENT.captures(url) {
        return format!("{}***", &captures[1]);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_alchemy_style_key() {
        let url = "https://base-mainnet.g.alchemy.com/v2/abcdef0123456789abcdef01";
        assert_eq!(
            sanitize_url(url),
            "https://base-mainnet.g.alchemy.com/v2/***"
        );
    }

    #[test]
    fn redacts_quicknode_style_key() {
        let url = "https://example.quiknode.pro/abcdef0123456789abcdef01/";
        assert_eq!(sanitize_url(url), "https://example.quiknode.pro/***/...");
    }

    #[test]
    fn redacts_generic_long_trailing_segment() {
        let url = "https://rpc.example.com/secret-key-that-is-very-long-indeed";
        assert_eq!(sanitize_url(url), "https://rpc.example.com/***");
    }

    #[test]
    fn leaves_short_public_paths_untouched() {
        let url = "https://mainnet.base.org";
        assert_eq!(sanitize_url(url), url);
    }
}
