use crate::error::CompareError;
use crate::filter::CaptureFilterConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Accepted range for the per-page timeout, in seconds
pub const PAGE_TIMEOUT_RANGE: RangeInclusive<u64> = 5..=60;

/// Accepted range for navigation retries
pub const RETRY_RANGE: RangeInclusive<u8> = 0..=3;

/// Browser window presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewportPreset {
    #[default]
    #[serde(rename = "desktop-1440")]
    Desktop1440,
    #[serde(rename = "desktop-1280")]
    Desktop1280,
    #[serde(rename = "mobile-390")]
    Mobile390,
}

impl ViewportPreset {
    /// Window size as (width, height)
    pub fn size(self) -> (u32, u32) {
        match self {
            ViewportPreset::Desktop1440 => (1440, 900),
            ViewportPreset::Desktop1280 => (1280, 900),
            ViewportPreset::Mobile390 => (390, 844),
        }
    }
}

/// Options for one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default)]
    pub viewport: ViewportPreset,

    /// Navigation timeout per page, in seconds (5-60)
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Extra navigation attempts (0-3)
    #[serde(default = "default_retries")]
    pub retries: u8,

    /// Block images, fonts, media and analytics in the browser
    #[serde(default)]
    pub block_resources: bool,

    /// Maximum number of model candidates kept per page
    #[serde(default = "default_max_models")]
    pub max_models: usize,

    /// Maximum number of matched rows produced
    #[serde(default = "default_match_limit")]
    pub match_limit: usize,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Which intercepted responses get parsed
    #[serde(default)]
    pub capture: CaptureFilterConfig,
}

/// Default value for page_timeout_secs
fn default_page_timeout_secs() -> u64 {
    30
}

/// Default value for retries
fn default_retries() -> u8 {
    1
}

/// Default value for max_models
fn default_max_models() -> usize {
    80
}

/// Default value for match_limit
fn default_match_limit() -> usize {
    2
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            viewport: ViewportPreset::default(),
            page_timeout_secs: default_page_timeout_secs(),
            retries: default_retries(),
            block_resources: false,
            max_models: default_max_models(),
            match_limit: default_match_limit(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            capture: CaptureFilterConfig::default(),
        }
    }
}

impl RunOptions {
    /// Load options from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let options: Self = serde_json::from_str(&contents)?;
        Ok(options)
    }

    /// Checks option ranges
    pub fn validate(&self) -> Result<(), CompareError> {
        if !PAGE_TIMEOUT_RANGE.contains(&self.page_timeout_secs) {
            return Err(CompareError::Configuration(format!(
                "page timeout must be within {}-{}s, got {}",
                PAGE_TIMEOUT_RANGE.start(),
                PAGE_TIMEOUT_RANGE.end(),
                self.page_timeout_secs
            )));
        }
        if !RETRY_RANGE.contains(&self.retries) {
            return Err(CompareError::Configuration(format!(
                "retries must be within {}-{}, got {}",
                RETRY_RANGE.start(),
                RETRY_RANGE.end(),
                self.retries
            )));
        }
        if self.max_models == 0 {
            return Err(CompareError::Configuration(
                "max models must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Navigation timeout
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Readiness wait: four seconds under the page timeout, at least five
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.saturating_sub(4).max(5))
    }
}

/// Checks that `url` is an absolute http(s) URL with a host
pub fn validate_page_url(url: &str) -> Result<Url, CompareError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| CompareError::Configuration(format!("invalid URL {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CompareError::Configuration(format!(
            "URL must be absolute http(s): {url:?}"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = RunOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(options.idle_timeout(), Duration::from_secs(26));
    }

    #[test]
    fn test_idle_timeout_has_a_floor() {
        let options = RunOptions {
            page_timeout_secs: 6,
            ..RunOptions::default()
        };
        assert_eq!(options.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_out_of_range_options_rejected() {
        let options = RunOptions {
            page_timeout_secs: 90,
            ..RunOptions::default()
        };
        assert!(matches!(options.validate(), Err(CompareError::Configuration(_))));

        let options = RunOptions {
            retries: 4,
            ..RunOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: RunOptions =
            serde_json::from_str(r#"{"viewport":"mobile-390","retries":0}"#).unwrap();
        assert_eq!(options.viewport, ViewportPreset::Mobile390);
        assert_eq!(options.viewport.size(), (390, 844));
        assert_eq!(options.retries, 0);
        assert_eq!(options.page_timeout_secs, 30);
        assert_eq!(options.max_models, 80);
        assert!(options.headless);
        assert!(!options.capture.allow_fragments.is_empty());
    }

    #[test]
    fn test_viewport_names() {
        for (preset, name) in [
            (ViewportPreset::Desktop1440, "\"desktop-1440\""),
            (ViewportPreset::Desktop1280, "\"desktop-1280\""),
            (ViewportPreset::Mobile390, "\"mobile-390\""),
        ] {
            assert_eq!(serde_json::to_string(&preset).unwrap(), name);
            assert_eq!(serde_json::from_str::<ViewportPreset>(name).unwrap(), preset);
        }
        assert!(serde_json::from_str::<ViewportPreset>("\"mobile390\"").is_err());
    }

    #[test]
    fn test_validate_page_url() {
        assert!(validate_page_url("https://www.lg.com/uk/tvs/").is_ok());
        assert!(validate_page_url(" http://example.com ").is_ok());
        assert!(validate_page_url("ftp://example.com/").is_err());
        assert!(validate_page_url("/uk/tvs/").is_err());
        assert!(validate_page_url("").is_err());
    }
}
