pub mod browser;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod locale;
pub mod matcher;
pub mod normalizer;
pub mod parsers;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{RunOptions, ViewportPreset};
pub use error::CompareError;
pub use results::{Comparison, CtaClassification, MatchRow, ModelCandidate, PageExtractionResult};

use config::validate_page_url;
use filter::CaptureFilter;

/// Main builder for comparing an AS-IS and a TO-BE listing page
pub struct PlpComparison {
    as_is_url: String,
    to_be_url: String,
    options: RunOptions,
}

impl PlpComparison {
    /// Create a new comparison of two listing page URLs
    pub fn new(as_is_url: &str, to_be_url: &str) -> Self {
        Self {
            as_is_url: as_is_url.to_string(),
            to_be_url: to_be_url.to_string(),
            options: RunOptions::default(),
        }
    }

    /// Replace all options at once
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from a JSON file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let options = RunOptions::from_file(path)?;
        Ok(self.with_options(options))
    }

    pub fn with_viewport(mut self, viewport: ViewportPreset) -> Self {
        self.options.viewport = viewport;
        self
    }

    /// Set the per-page navigation timeout
    pub fn with_page_timeout(mut self, timeout_seconds: u64) -> Self {
        self.options.page_timeout_secs = timeout_seconds;
        self
    }

    /// Set the number of extra navigation attempts
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.options.retries = retries;
        self
    }

    /// Block images, fonts, media and analytics while loading
    pub fn with_block_resources(mut self, block: bool) -> Self {
        self.options.block_resources = block;
        self
    }

    pub fn with_max_models(mut self, max_models: usize) -> Self {
        self.options.max_models = max_models;
        self
    }

    pub fn with_match_limit(mut self, match_limit: usize) -> Self {
        self.options.match_limit = match_limit;
        self
    }

    pub fn with_webdriver_url(mut self, url: &str) -> Self {
        self.options.webdriver_url = url.to_string();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.options.headless = headless;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Fetch both pages in turn and pair up their models.
    ///
    /// Inputs are validated before any browser is started.
    pub async fn run(self) -> Result<Comparison, CompareError> {
        let as_is_url = validate_page_url(&self.as_is_url)?;
        let to_be_url = validate_page_url(&self.to_be_url)?;

        let mut options = self.options;
        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                options.webdriver_url = webdriver_url;
            }
        }
        options.validate()?;

        let filter = CaptureFilter::new(&options.capture).map_err(|e| {
            CompareError::Configuration(format!("invalid capture pattern: {e}"))
        })?;

        ::log::info!("Comparing AS-IS {} with TO-BE {}", as_is_url, to_be_url);
        let as_is = browser::fetch_page(as_is_url.as_str(), &options, &filter).await?;
        let to_be = browser::fetch_page(to_be_url.as_str(), &options, &filter).await?;

        let rows = matcher::match_rows(
            &as_is.candidates,
            &to_be.candidates,
            &as_is.classification,
            &to_be.classification,
            options.match_limit,
        );
        ::log::info!(
            "{} AS-IS and {} TO-BE models, {} row(s)",
            as_is.candidates.len(),
            to_be.candidates.len(),
            rows.len()
        );

        Ok(Comparison { as_is, to_be, rows })
    }
}
