//! URL denylist applied to search results before any page is fetched

/// Substrings identifying app stores, ads, navigation, social, download and shortener URLs
pub const URL_DENYLIST: &[&str] = &[
    // Service sub-products
    "apps", "play", "maps", "drive", "mail", "calendar",
    // Low-value TLDs and binary downloads
    ".vip", ".top", ".club", ".xyz", ".wang", ".cc", ".info", ".tool", ".download", ".apk", ".zip",
    ".exe", ".pdf",
    // Social, video and portal sites
    "weibo.com", "douyin.com", "bilibili.com", "tiktok.com", "youtube.com", "hao123.com",
    "2345.com", "instagram.com", "cloudflare.com", "stackoverflow.com", "soundcloud.com",
    "sap.com", "ebay.com",
    // Ad and navigation hosts
    "ad.", "nav.", "tool.",
    // Non-content paths
    "/login", "/register", "/download", "/upload", "/pay", "/cart", "/about", "/contact", "/help",
    "/faq", "/menu", "/nav", "/widget", "/ad/", "/sponsor", "/promo",
    // Tracking parameters
    "?from=", "?adid=", "?track=",
    // Shorteners
    "shorturl.at", "url.cn", "t.cn", "bit.ly",
];

/// Case-sensitive substring match on the raw URL
pub fn is_denylisted(url: &str) -> bool {
    URL_DENYLIST.iter().any(|pattern| url.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denylisted_urls() {
        for url in [
            "https://play.google.com/store",
            "https://www.youtube.com/watch?v=1",
            "https://example.com/login",
            "https://example.com/file.pdf",
            "https://bit.ly/abc",
            "https://news.example.com/?from=feed",
            "https://ad.doubleclick.net/x",
        ] {
            assert!(is_denylisted(url), "{} should be denylisted", url);
        }
    }

    #[test]
    fn test_content_urls_pass() {
        for url in [
            "https://en.wikipedia.org/wiki/Trigonometry",
            "https://www.rust-lang.org/learn",
            "https://docs.rs/tokio/latest/tokio/",
        ] {
            assert!(!is_denylisted(url), "{} should pass", url);
        }
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(is_denylisted("https://example.com/Login/apps"));
        assert!(!is_denylisted("https://example.com/LOGIN"));
    }
}
