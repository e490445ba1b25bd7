//! In-page recording of fetch/XHR responses.
//!
//! The hook keeps a bounded list of eligible responses on
//! `window.__plpCaptures` and a count of unfinished requests on
//! `window.__plpInflight`, which the readiness check reads.

use crate::error::Fault;
use crate::filter::CaptureFilter;
use crate::parsers::json::extract_models;
use crate::results::{CandidateSource, ModelCandidate};
use crate::utils::truncate_for_log;
use fantoccini::Client;
use serde::Deserialize;
use serde_json::Value;

/// Largest body parsed without a JSON content type
pub const MAX_TEXT_PAYLOAD: usize = 2_000_000;

/// Hook body; called with the [`CaptureRules`] of the run.
///
/// Every request counts toward `__plpInflight`, but only responses whose URL
/// passes the rules are read and stored.
const CAPTURE_HOOK: &str = r#"
(function (rules) {
  if (window.__plpHooked) return;
  window.__plpHooked = true;
  window.__plpCaptures = window.__plpCaptures || [];
  window.__plpInflight = 0;
  const MAX_ENTRIES = 400;
  const MAX_TEXT = 2000000;
  const clip = (t) => (typeof t === 'string' ? t.slice(0, MAX_TEXT) : null);
  const eligible = (url) => {
    const u = String(url || '').toLowerCase();
    if (rules.deny.some((d) => u.includes(d))) return false;
    return rules.keepAll || rules.allow.some((f) => u.includes(f));
  };
  const keep = (entry) => {
    if (window.__plpCaptures.length < MAX_ENTRIES) window.__plpCaptures.push(entry);
  };
  const done = () => { window.__plpInflight = Math.max(0, window.__plpInflight - 1); };

  const origFetch = window.fetch;
  if (origFetch) {
    window.fetch = function (input, init) {
      const url = typeof input === 'string' ? input : (input && input.url) || String(input);
      const method = String((init && init.method) || (input && input.method) || 'GET').toUpperCase();
      const requestBody = init && typeof init.body === 'string' ? clip(init.body) : null;
      window.__plpInflight++;
      return origFetch.apply(this, arguments).then((resp) => {
        const finalUrl = resp.url || url;
        if (!eligible(finalUrl)) { done(); return resp; }
        try {
          const contentType = resp.headers.get('content-type') || '';
          resp.clone().text().then(
            (text) => { keep({ url: finalUrl, contentType, method, text: clip(text), requestBody }); done(); },
            () => done()
          );
        } catch (e) { done(); }
        return resp;
      }, (err) => { done(); throw err; });
    };
  }

  const XHR = window.XMLHttpRequest;
  if (XHR) {
    const open = XHR.prototype.open;
    const send = XHR.prototype.send;
    XHR.prototype.open = function (method, url) {
      this.__plpMethod = String(method || 'GET').toUpperCase();
      this.__plpUrl = String(url);
      return open.apply(this, arguments);
    };
    XHR.prototype.send = function (body) {
      const xhr = this;
      const requestBody = typeof body === 'string' ? clip(body) : null;
      window.__plpInflight++;
      xhr.addEventListener('loadend', function () {
        done();
        try {
          const url = xhr.responseURL || xhr.__plpUrl || '';
          if (!eligible(url)) return;
          let text = null;
          if (xhr.responseType === '' || xhr.responseType === 'text') text = xhr.responseText;
          else if (xhr.responseType === 'json') text = JSON.stringify(xhr.response);
          keep({
            url,
            contentType: xhr.getResponseHeader('content-type') || '',
            method: xhr.__plpMethod || 'GET',
            text: clip(text),
            requestBody
          });
        } catch (e) {}
      });
      return send.apply(this, arguments);
    };
  }
})"#;

/// The capture hook bound to the substring rules of `filter`
pub fn capture_script(filter: &CaptureFilter) -> String {
    let rules = serde_json::to_string(&filter.capture_rules()).unwrap_or_else(|e| {
        ::log::warn!("Could not encode capture rules, keeping all responses: {}", e);
        r#"{"allow":[],"deny":[],"keepAll":true}"#.to_string()
    });
    format!("{CAPTURE_HOOK}({rules});")
}

const DRAIN_SCRIPT: &str =
    "const c = window.__plpCaptures || []; window.__plpCaptures = []; return c;";

/// One recorded response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedResponse {
    pub url: String,
    pub content_type: String,
    pub method: String,
    pub text: Option<String>,
    pub request_body: Option<String>,
}

/// Parses the JSON carried by a response, if any.
///
/// Tried in order: the body when the content type says JSON, the body when it
/// looks like JSON and is small enough, then the request body of a POST.
pub fn parse_payload(response: &CapturedResponse) -> Option<Value> {
    let text = response.text.as_deref().unwrap_or_default();

    if response.content_type.to_lowercase().contains("json") {
        if let Ok(value) = serde_json::from_str(text) {
            return Some(value);
        }
    }
    if let Some(value) = parse_loose(text) {
        return Some(value);
    }
    if response.method.eq_ignore_ascii_case("POST") {
        return response.request_body.as_deref().and_then(parse_loose);
    }
    None
}

fn parse_loose(text: &str) -> Option<Value> {
    if !text.contains('{') || text.len() >= MAX_TEXT_PAYLOAD {
        return None;
    }
    serde_json::from_str(text.trim()).ok()
}

/// Takes everything recorded so far, leaving the page's buffer empty
pub async fn drain(client: &Client) -> Result<Vec<CapturedResponse>, Fault> {
    let raw = client.execute(DRAIN_SCRIPT, Vec::new()).await?;
    Ok(serde_json::from_value(raw)?)
}

/// Model candidates from the eligible recorded responses
pub fn network_candidates(
    responses: &[CapturedResponse],
    filter: &CaptureFilter,
) -> Vec<ModelCandidate> {
    let mut found = Vec::new();
    for response in responses.iter().filter(|r| filter.is_eligible(&r.url)) {
        let url = truncate_for_log(&response.url, 160);
        match parse_payload(response) {
            Some(value) => {
                let models = extract_models(&value, CandidateSource::NetworkJson);
                ::log::debug!("{} model(s) in {}", models.len(), url);
                found.extend(models);
            }
            None => ::log::debug!("No JSON payload in {}", url),
        }
    }
    found
}
