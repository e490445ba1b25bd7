use clap::{Parser, ValueEnum};
use plp_compare::{RunOptions, ViewportPreset};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plp-compare")]
#[command(about = "Compares models and CTA styling between two product listing pages")]
#[command(version)]
pub struct Args {
    /// Current (AS-IS) listing page URL
    pub as_is: String,

    /// Redesigned (TO-BE) listing page URL
    pub to_be: String,

    /// JSON file with run options; flags given here override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Browser window preset
    #[arg(long, value_enum)]
    pub viewport: Option<ViewportArg>,

    /// Navigation timeout per page in seconds (5-60)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Extra navigation attempts (0-3)
    #[arg(short, long)]
    pub retries: Option<u8>,

    /// Block images, fonts, media and analytics while loading
    #[arg(long)]
    pub block_resources: bool,

    /// Maximum number of models kept per page
    #[arg(long)]
    pub max_models: Option<usize>,

    /// Maximum number of matched rows
    #[arg(long)]
    pub match_limit: Option<usize>,

    /// WebDriver endpoint (WEBDRIVER_URL takes precedence)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewportArg {
    #[value(name = "desktop-1440")]
    Desktop1440,
    #[value(name = "desktop-1280")]
    Desktop1280,
    #[value(name = "mobile-390")]
    Mobile390,
}

impl From<ViewportArg> for ViewportPreset {
    fn from(arg: ViewportArg) -> Self {
        match arg {
            ViewportArg::Desktop1440 => ViewportPreset::Desktop1440,
            ViewportArg::Desktop1280 => ViewportPreset::Desktop1280,
            ViewportArg::Mobile390 => ViewportPreset::Mobile390,
        }
    }
}

impl Args {
    /// Applies the flags that were given on top of `options`
    pub fn apply_to(&self, mut options: RunOptions) -> RunOptions {
        if let Some(viewport) = self.viewport {
            options.viewport = viewport.into();
        }
        if let Some(timeout) = self.timeout {
            options.page_timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            options.retries = retries;
        }
        if self.block_resources {
            options.block_resources = true;
        }
        if let Some(max_models) = self.max_models {
            options.max_models = max_models;
        }
        if let Some(match_limit) = self.match_limit {
            options.match_limit = match_limit;
        }
        if let Some(url) = &self.webdriver_url {
            options.webdriver_url = url.clone();
        }
        if self.headful {
            options.headless = false;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_options() {
        let args = Args::parse_from([
            "plp-compare",
            "https://www.lg.com/uk/tvs/",
            "https://new.lg.com/uk/tvs/",
            "--viewport",
            "mobile-390",
            "--timeout",
            "45",
            "--block-resources",
            "--match-limit",
            "5",
        ]);
        let options = args.apply_to(RunOptions::default());

        assert_eq!(options.viewport, ViewportPreset::Mobile390);
        assert_eq!(options.page_timeout_secs, 45);
        assert!(options.block_resources);
        assert_eq!(options.match_limit, 5);
        assert_eq!(options.retries, 1);
        assert!(options.headless);
    }

    #[test]
    fn test_no_flags_keep_options() {
        let args = Args::parse_from(["plp-compare", "https://a.example/", "https://b.example/"]);
        let base = RunOptions {
            retries: 3,
            block_resources: true,
            ..RunOptions::default()
        };
        let options = args.apply_to(base);
        assert_eq!(options.retries, 3);
        assert!(options.block_resources);
    }
}
