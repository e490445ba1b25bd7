use regex::Regex;
use serde::{Deserialize, Serialize};

/// Path fragments that mark a response as product or listing data
pub const PRODUCT_API_FRAGMENTS: &[&str] = &[
    "/api/", "/v1/", "/v2/", "/graphql", "/search", "/catalog", "/commerce", "/product", "/plp",
    "/listing", "/lgecom", "/pim", "/sku", "/model", "/category",
];

/// Analytics and consent domains whose responses are never product data
pub const ANALYTICS_DOMAINS: &[&str] = &[
    "mpulse.net",
    "onetrust.com",
    "omtrdc.net",
    "adobedtm.com",
    "googletagmanager.com",
    "google-analytics.com",
    "hotjar.com",
    "doubleclick.net",
];

/// File extensions blocked at the browser when resource blocking is on
const HEAVY_RESOURCE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "ico", "woff", "woff2", "ttf", "otf", "eot",
    "mp4", "webm", "mp3",
];

/// Configuration for deciding which captured responses get parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureFilterConfig {
    /// Substrings of which at least one must appear in the URL
    #[serde(default = "default_allow_fragments")]
    pub allow_fragments: Vec<String>,

    /// Substrings (usually domains) that disqualify a URL
    #[serde(default = "default_deny_domains")]
    pub deny_domains: Vec<String>,

    /// Extra regex patterns; a match makes a URL eligible even without an allowed fragment
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Extra regex patterns for URLs to skip (these take precedence)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_allow_fragments() -> Vec<String> {
    PRODUCT_API_FRAGMENTS.iter().map(|s| s.to_string()).collect()
}

fn default_deny_domains() -> Vec<String> {
    ANALYTICS_DOMAINS.iter().map(|s| s.to_string()).collect()
}

impl Default for CaptureFilterConfig {
    fn default() -> Self {
        Self {
            allow_fragments: default_allow_fragments(),
            deny_domains: default_deny_domains(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Substring rules the in-page capture hook applies before storing a response.
///
/// Regexes stay on the Rust side, so any include pattern makes the hook keep
/// every non-denied response and leaves the decision to [`CaptureFilter`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRules {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub keep_all: bool,
}

/// Decides which intercepted responses are eligible for JSON extraction
#[derive(Debug)]
pub struct CaptureFilter {
    allow_fragments: Vec<String>,
    deny_domains: Vec<String>,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self::new(&CaptureFilterConfig::default()).expect("Default filter has no regex patterns")
    }
}

impl CaptureFilter {
    /// Create a new capture filter from configuration
    pub fn new(config: &CaptureFilterConfig) -> Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allow_fragments: lowercase_all(&config.allow_fragments),
            deny_domains: lowercase_all(&config.deny_domains),
            include_regexes,
            exclude_regexes,
        })
    }

    /// Whether a response from `url` should be parsed for models
    pub fn is_eligible(&self, url: &str) -> bool {
        let lower = url.to_lowercase();

        if self.is_analytics(&lower) {
            return false;
        }
        if self.exclude_regexes.iter().any(|re| re.is_match(url)) {
            return false;
        }

        self.allow_fragments.iter().any(|f| lower.contains(f.as_str()))
            || self.include_regexes.iter().any(|re| re.is_match(url))
    }

    fn is_analytics(&self, lower_url: &str) -> bool {
        self.deny_domains.iter().any(|d| lower_url.contains(d.as_str()))
    }

    /// The substring part of this filter, for the in-page hook
    pub fn capture_rules(&self) -> CaptureRules {
        CaptureRules {
            allow: self.allow_fragments.clone(),
            deny: self.deny_domains.clone(),
            keep_all: !self.include_regexes.is_empty(),
        }
    }

    /// URL patterns to block in the browser when resource blocking is enabled
    pub fn blocked_url_patterns(&self) -> Vec<String> {
        HEAVY_RESOURCE_EXTENSIONS
            .iter()
            .map(|ext| format!("*.{ext}*"))
            .chain(self.deny_domains.iter().map(|d| format!("*{d}*")))
            .collect()
    }
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = CaptureFilter::default();

        assert!(filter.is_eligible("https://www.lg.com/uk/api/plp/list?category=oled"));
        assert!(filter.is_eligible("https://shop.example.com/GraphQL"));
        assert!(filter.is_eligible("https://shop.example.com/catalog/items.json"));

        // No product fragment
        assert!(!filter.is_eligible("https://shop.example.com/static/app.js"));
    }

    #[test]
    fn test_analytics_always_rejected() {
        let filter = CaptureFilter::default();
        assert!(!filter.is_eligible("https://c.go-mpulse.net/api/config.json"));
        assert!(!filter.is_eligible("https://cdn.cookielaw.onetrust.com/consent/v2/product"));
        assert!(!filter.is_eligible("https://WWW.GOOGLE-ANALYTICS.COM/g/collect?v=2&product"));
    }

    #[test]
    fn test_regex_patterns() {
        let config = CaptureFilterConfig {
            include_patterns: vec![r"/bff/tiles\b".to_string()],
            exclude_patterns: vec![r"/api/recommendations".to_string()],
            ..CaptureFilterConfig::default()
        };
        let filter = CaptureFilter::new(&config).unwrap();

        assert!(filter.is_eligible("https://shop.example.com/bff/tiles?page=2"));
        assert!(!filter.is_eligible("https://shop.example.com/api/recommendations"));
        assert!(filter.is_eligible("https://shop.example.com/api/products"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let config = CaptureFilterConfig {
            exclude_patterns: vec!["(".to_string()],
            ..CaptureFilterConfig::default()
        };
        assert!(CaptureFilter::new(&config).is_err());
    }

    #[test]
    fn test_capture_rules() {
        let rules = CaptureFilter::default().capture_rules();
        assert!(rules.allow.contains(&"/graphql".to_string()));
        assert!(rules.deny.contains(&"google-analytics.com".to_string()));
        assert!(!rules.keep_all);

        let config = CaptureFilterConfig {
            allow_fragments: vec!["/API/".to_string()],
            include_patterns: vec![r"/bff/tiles\b".to_string()],
            ..CaptureFilterConfig::default()
        };
        let rules = CaptureFilter::new(&config).unwrap().capture_rules();
        assert_eq!(rules.allow, vec!["/api/".to_string()]);
        assert!(rules.keep_all);
    }

    #[test]
    fn test_blocked_url_patterns() {
        let patterns = CaptureFilter::default().blocked_url_patterns();
        assert!(patterns.contains(&"*.woff2*".to_string()));
        assert!(patterns.contains(&"*hotjar.com*".to_string()));
    }
}
