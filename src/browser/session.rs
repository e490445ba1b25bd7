use super::capture::capture_script;
use crate::config::RunOptions;
use crate::error::{CompareError, Fault};
use crate::filter::CaptureFilter;
use crate::locale::Locale;
use fantoccini::wd::{Capabilities, TimeoutConfiguration, WebDriverCompatibleCommand};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Desktop Chrome identity presented to every page
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

/// Well-known local WebDriver endpoints tried after the configured one
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// A Chrome DevTools command sent through chromedriver's pass-through endpoint
#[derive(Debug, Clone)]
pub struct CdpCommand {
    cmd: String,
    params: Value,
}

impl CdpCommand {
    pub fn new(cmd: &str, params: Value) -> Self {
        Self {
            cmd: cmd.to_string(),
            params,
        }
    }
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(
        &self,
        base_url: &Url,
        session_id: Option<&str>,
    ) -> Result<Url, url::ParseError> {
        let session_id = session_id.unwrap_or_default();
        base_url.join(&format!("session/{session_id}/goog/cdp/execute"))
    }

    fn method_and_body(&self, _request_url: &Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.cmd, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }
}

/// Chrome capabilities for a viewport preset and locale
pub fn capabilities(options: &RunOptions, locale: &Locale) -> Capabilities {
    let (width, height) = options.viewport.size();
    let mut args = vec![
        format!("--lang={}", locale.language_tag()),
        format!("--window-size={width},{height}"),
        format!("--user-agent={USER_AGENT}"),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    if !cfg!(target_os = "macos") {
        args.push("--no-sandbox".to_string());
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("acceptInsecureCerts".to_string(), json!(true));
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "prefs": { "intl.accept_languages": locale.accept_language },
        }),
    );
    caps
}

/// Connects to the configured WebDriver, falling back to well-known local ports
pub async fn connect_to_webdriver(
    webdriver_url: &str,
    caps: &Capabilities,
) -> Result<Client, CompareError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps.clone());

    let first_error = match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e.to_string()
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(CompareError::WebDriver {
        url: webdriver_url.to_string(),
        reason: first_error,
    })
}

/// One browser session, owned by a single page fetch
pub struct BrowserSession {
    client: Client,
    capture_script: String,
    capture_preinstalled: bool,
}

impl BrowserSession {
    /// Opens a session and applies locale, blocking and capture settings
    pub async fn open(
        options: &RunOptions,
        locale: &Locale,
        filter: &CaptureFilter,
    ) -> Result<Self, CompareError> {
        let caps = capabilities(options, locale);
        let client = connect_to_webdriver(&options.webdriver_url, &caps).await?;

        let timeouts = TimeoutConfiguration::new(
            Some(SCRIPT_TIMEOUT),
            Some(options.navigation_timeout()),
            Some(Duration::ZERO),
        );
        if let Err(e) = client.update_timeouts(timeouts).await {
            ::log::warn!("Could not set WebDriver timeouts: {}", e);
        }

        let mut session = Self {
            client,
            capture_script: capture_script(filter),
            capture_preinstalled: false,
        };
        session.apply_locale(locale).await;
        if options.block_resources {
            session.block_resources(filter).await;
        }
        session.capture_preinstalled = session.preinstall_capture().await;
        Ok(session)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends a DevTools command
    pub async fn cdp(&self, cmd: &str, params: Value) -> Result<Value, Fault> {
        Ok(self.client.issue_cmd(CdpCommand::new(cmd, params)).await?)
    }

    async fn best_effort(&self, cmd: &str, params: Value) -> bool {
        match self.cdp(cmd, params).await {
            Ok(_) => true,
            Err(e) => {
                ::log::warn!("DevTools command {} failed: {}", cmd, e);
                false
            }
        }
    }

    async fn apply_locale(&self, locale: &Locale) {
        ::log::debug!("Applying locale for market {}", locale.market);
        self.best_effort(
            "Network.setUserAgentOverride",
            json!({ "userAgent": USER_AGENT, "acceptLanguage": locale.accept_language }),
        )
        .await;
        self.best_effort(
            "Emulation.setTimezoneOverride",
            json!({ "timezoneId": locale.timezone }),
        )
        .await;

        if let Some(geo) = locale.geolocation {
            self.best_effort(
                "Emulation.setGeolocationOverride",
                json!({
                    "latitude": geo.latitude,
                    "longitude": geo.longitude,
                    "accuracy": geo.accuracy,
                }),
            )
            .await;
            self.best_effort(
                "Browser.grantPermissions",
                json!({ "permissions": ["geolocation"] }),
            )
            .await;
        }
    }

    async fn block_resources(&self, filter: &CaptureFilter) {
        let patterns = filter.blocked_url_patterns();
        ::log::info!("Blocking {} resource patterns", patterns.len());
        if self.best_effort("Network.enable", json!({})).await {
            self.best_effort("Network.setBlockedURLs", json!({ "urls": patterns }))
                .await;
        }
    }

    async fn preinstall_capture(&self) -> bool {
        let installed = self
            .best_effort(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": self.capture_script }),
            )
            .await;
        if !installed {
            ::log::info!("Network capture will be injected after navigation");
        }
        installed
    }

    /// Injects the capture hook into the current document when it could not be
    /// registered for new documents
    pub async fn ensure_capture(&self) {
        if self.capture_preinstalled {
            return;
        }
        if let Err(e) = self.client.execute(&self.capture_script, Vec::new()).await {
            ::log::debug!("Could not inject network capture: {}", e);
        }
    }

    /// Ends the WebDriver session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportPreset;
    use crate::locale::infer_locale;

    #[test]
    fn test_cdp_endpoint_and_body() {
        let cmd = CdpCommand::new("Emulation.setTimezoneOverride", json!({"timezoneId": "Europe/Berlin"}));
        let base = Url::parse("http://localhost:9515/").unwrap();
        let endpoint = cmd.endpoint(&base, Some("abc123")).unwrap();
        assert_eq!(
            endpoint.as_str(),
            "http://localhost:9515/session/abc123/goog/cdp/execute"
        );

        let (method, body) = cmd.method_and_body(&endpoint);
        assert_eq!(method, http::Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body["cmd"], "Emulation.setTimezoneOverride");
        assert_eq!(body["params"]["timezoneId"], "Europe/Berlin");
    }

    #[test]
    fn test_capabilities_carry_viewport_and_locale() {
        let options = RunOptions {
            viewport: ViewportPreset::Mobile390,
            ..RunOptions::default()
        };
        let locale = infer_locale("https://www.lg.com/de/tv/");
        let caps = capabilities(&options, &locale);

        assert_eq!(caps["pageLoadStrategy"], "eager");
        assert_eq!(caps["acceptInsecureCerts"], true);
        let chrome = &caps["goog:chromeOptions"];
        let args: Vec<&str> = chrome["args"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(args.contains(&"--window-size=390,844"));
        assert!(args.contains(&"--lang=de-DE"));
        assert!(args.contains(&"--headless=new"));
        assert_eq!(chrome["prefs"]["intl.accept_languages"], locale.accept_language);
    }

    #[test]
    fn test_headful_run_omits_headless_flag() {
        let options = RunOptions {
            headless: false,
            ..RunOptions::default()
        };
        let caps = capabilities(&options, &infer_locale("https://www.lg.com/uk/tvs/"));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a.as_str() == Some("--headless=new")));
    }
}
