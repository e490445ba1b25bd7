use super::capture;
use super::session::BrowserSession;
use crate::classify;
use crate::config::RunOptions;
use crate::error::{CompareError, Fault};
use crate::filter::CaptureFilter;
use crate::locale::infer_locale;
use crate::parsers::json::extract_models;
use crate::parsers::{dom, merge_candidates};
use crate::results::{CandidateSource, ModelCandidate, PageExtractionResult};
use fantoccini::{Client, Locator};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

/// How long the network must stay idle to count as settled
const QUIET_WINDOW: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Bound on each consent or "show more" click
const CLICK_TIMEOUT: Duration = Duration::from_millis(1200);

const SCROLL_PAUSE: Duration = Duration::from_millis(600);
const SCROLL_STEPS: usize = 6;
const SCROLL_STEPS_BLOCKED: usize = 3;

const CONSENT_SELECTORS: [&str; 3] = [
    "button[id*='accept' i]",
    "button[aria-label*='accept' i]",
    "#onetrust-accept-btn-handler, .onetrust-accept-btn-handler",
];

const CONSENT_TEXTS: [&str; 5] = [
    "Accept all",
    "Accept All",
    "Alle akzeptieren",
    "Aceptar todo",
    "Aceptar todas",
];

const SHOW_MORE_TEXTS: [&str; 8] = [
    "Show more",
    "더보기",
    "Load more",
    "See more",
    "Mehr anzeigen",
    "Voir plus",
    "Ver más",
    "Mostra altro",
];

const READINESS_SCRIPT: &str = "return { inflight: window.__plpInflight || 0, \
    resources: performance.getEntriesByType('resource').length, \
    readyState: document.readyState };";

const EMBEDDED_STATE_SCRIPT: &str = r#"
try {
  const state = window.__NEXT_DATA__ || window.__APOLLO_STATE__
    || window.__INITIAL_STATE__ || window.__PRELOADED_STATE__;
  return state ? JSON.parse(JSON.stringify(state)) : null;
} catch (e) {
  return null;
}
"#;

/// Detects a settled network from successive samples.
///
/// Settled means no request in flight and an unchanged resource count for the
/// whole quiet window.
#[derive(Debug)]
pub struct QuietTracker {
    window: Duration,
    last_resources: Option<u64>,
    quiet_since: Option<Instant>,
}

impl QuietTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_resources: None,
            quiet_since: None,
        }
    }

    /// Records a sample and reports whether the network has settled
    pub fn observe(&mut self, inflight: u64, resources: u64, now: Instant) -> bool {
        if inflight > 0 || self.last_resources != Some(resources) {
            self.last_resources = Some(resources);
            self.quiet_since = (inflight == 0).then_some(now);
            return false;
        }
        let since = *self.quiet_since.get_or_insert(now);
        now.duration_since(since) >= self.window
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReadinessSample {
    inflight: u64,
    resources: u64,
    ready_state: String,
}

/// Loads one listing page and extracts its models and CTA styling.
///
/// The browser session lives for this call only and is closed on every path.
pub async fn fetch_page(
    url: &str,
    options: &RunOptions,
    filter: &CaptureFilter,
) -> Result<PageExtractionResult, CompareError> {
    let locale = infer_locale(url);
    ::log::info!("Fetching {} (market {})", url, locale.market);

    let session = BrowserSession::open(options, &locale, filter).await?;
    let result = extract(&session, url, &locale.market, options, filter).await;
    session.close().await;
    result
}

async fn extract(
    session: &BrowserSession,
    url: &str,
    market: &str,
    options: &RunOptions,
    filter: &CaptureFilter,
) -> Result<PageExtractionResult, CompareError> {
    let client = session.client();
    let ready = navigate(session, url, options).await?;

    dismiss_consent(client).await;
    expand_more(client).await;
    scroll(client, options.block_resources).await;

    let html = match client.source().await {
        Ok(html) => html,
        Err(e) => {
            ::log::warn!("Could not read page source of {}: {}", url, e);
            String::new()
        }
    };

    let mut structured = network_models(client, filter).await;
    structured.extend(embedded_models(client, &html).await);
    let dom_models = dom::scan_cards(&html, dom::MAX_CARDS);
    ::log::info!(
        "Found {} structured and {} DOM candidates on {}",
        structured.len(),
        dom_models.len(),
        url
    );
    let candidates = merge_candidates(structured, dom_models, options.max_models);

    let card = match client.find_all(Locator::Css(dom::CARD_SELECTOR)).await {
        Ok(cards) => cards.into_iter().next(),
        Err(e) => {
            ::log::debug!("Card lookup failed: {}", e);
            None
        }
    };
    let classification = classify::classify_sample(client, card.as_ref()).await;

    Ok(PageExtractionResult {
        url: url.to_string(),
        market: market.to_string(),
        ready,
        candidates,
        classification,
    })
}

/// Navigates with retries and waits for readiness.
///
/// Only fails when no attempt reached the page; an attempt that navigated but
/// never looked ready is still usable.
async fn navigate(
    session: &BrowserSession,
    url: &str,
    options: &RunOptions,
) -> Result<bool, CompareError> {
    let client = session.client();
    let attempts = usize::from(options.retries) + 1;
    let mut navigated = false;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        ::log::debug!("Navigating to {} (attempt {}/{})", url, attempt, attempts);
        match timeout(options.navigation_timeout(), client.goto(url)).await {
            Ok(Ok(())) => navigated = true,
            Ok(Err(e)) => {
                handle_navigation_error(&e, url);
                last_error = e.to_string();
                continue;
            }
            Err(_) => {
                ::log::warn!("Timeout navigating to {}", url);
                last_error = format!("timed out after {:?}", options.navigation_timeout());
                continue;
            }
        }

        session.ensure_capture().await;
        if await_ready(client, options).await {
            return Ok(true);
        }
        ::log::warn!("{} did not become ready on attempt {}", url, attempt);
    }

    if !navigated {
        return Err(CompareError::Navigation {
            url: url.to_string(),
            attempts,
            reason: last_error,
        });
    }
    Ok(false)
}

fn handle_navigation_error(error: &fantoccini::error::CmdError, url: &str) {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost session while navigating to {}", url);
    } else {
        ::log::error!("Failed to navigate to {}: {}", url, error);
    }
}

async fn readiness_sample(client: &Client) -> Result<ReadinessSample, Fault> {
    let raw = client.execute(READINESS_SCRIPT, Vec::new()).await?;
    Ok(serde_json::from_value(raw)?)
}

/// Waits for a settled network, then falls back to document state and cards
async fn await_ready(client: &Client, options: &RunOptions) -> bool {
    let idle = options.idle_timeout();
    let deadline = Instant::now() + idle;
    let mut tracker = QuietTracker::new(QUIET_WINDOW);
    let mut last_state = String::new();

    while Instant::now() < deadline {
        match readiness_sample(client).await {
            Ok(sample) => {
                if tracker.observe(sample.inflight, sample.resources, Instant::now()) {
                    ::log::debug!("Network settled");
                    return true;
                }
                last_state = sample.ready_state;
            }
            Err(e) => ::log::debug!("Readiness probe failed: {}", e),
        }
        sleep(POLL_INTERVAL).await;
    }

    if let Ok(sample) = readiness_sample(client).await {
        last_state = sample.ready_state;
    }
    if last_state == "complete" || last_state == "interactive" {
        ::log::debug!("Network never settled; document is {}", last_state);
        return true;
    }

    let card_wait = (idle / 2).max(Duration::from_secs(2));
    client
        .wait()
        .at_most(card_wait)
        .for_element(Locator::Css(dom::CARD_SELECTOR))
        .await
        .is_ok()
}

/// Clicks the first element `locator` finds, within [`CLICK_TIMEOUT`]
async fn click_first(client: &Client, locator: Locator<'_>) -> bool {
    let attempt = async {
        let element = client.find(locator).await?;
        element.click().await?;
        Ok::<_, Fault>(())
    };
    matches!(timeout(CLICK_TIMEOUT, attempt).await, Ok(Ok(())))
}

fn text_xpath(tags: &str, text: &str) -> String {
    format!("//*[{tags}][contains(normalize-space(.),'{text}')]")
}

async fn dismiss_consent(client: &Client) {
    for selector in CONSENT_SELECTORS {
        if click_first(client, Locator::Css(selector)).await {
            ::log::debug!("Dismissed consent banner via {}", selector);
            return;
        }
    }
    for text in CONSENT_TEXTS {
        let xpath = text_xpath("self::button", text);
        if click_first(client, Locator::XPath(&xpath)).await {
            ::log::debug!("Dismissed consent banner via '{}'", text);
            return;
        }
    }
}

async fn expand_more(client: &Client) {
    for text in SHOW_MORE_TEXTS {
        let xpath = text_xpath("self::button or self::a", text);
        if click_first(client, Locator::XPath(&xpath)).await {
            ::log::debug!("Clicked '{}'", text);
        }
    }
}

async fn scroll(client: &Client, blocking: bool) {
    let steps = if blocking {
        SCROLL_STEPS_BLOCKED
    } else {
        SCROLL_STEPS
    };
    for _ in 0..steps {
        if let Err(e) = client
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await
        {
            ::log::debug!("Scroll failed: {}", e);
            return;
        }
        sleep(SCROLL_PAUSE).await;
    }
    if let Err(e) = client.execute("window.scrollTo(0, 0);", Vec::new()).await {
        ::log::debug!("Scroll to top failed: {}", e);
    }
}

async fn embedded_models(client: &Client, html: &str) -> Vec<ModelCandidate> {
    let mut documents = dom::embedded_state_documents(html);
    match client.execute(EMBEDDED_STATE_SCRIPT, Vec::new()).await {
        Ok(Value::Null) => {}
        Ok(state) => documents.push(state),
        Err(e) => ::log::debug!("Reading window state failed: {}", e),
    }
    documents
        .iter()
        .flat_map(|doc| extract_models(doc, CandidateSource::EmbeddedJson))
        .collect()
}

async fn network_models(client: &Client, filter: &CaptureFilter) -> Vec<ModelCandidate> {
    match capture::drain(client).await {
        Ok(responses) => {
            ::log::debug!("Drained {} captured responses", responses.len());
            capture::network_candidates(&responses, filter)
        }
        Err(e) => {
            ::log::debug!("Draining network captures failed: {}", e);
            Vec::new()
        }
    }
}
