use crate::normalizer::MODEL_PATTERNS;
use crate::results::{CandidateSource, ModelCandidate};
use serde_json::{Map, Value};

/// Keys holding the primary model code, checked in order
const PRIMARY_KEYS: [&str; 3] = ["modelCode", "model", "code"];

/// Key holding a SKU, used as a secondary code
const SKU_KEY: &str = "sku";

/// Default cap on candidates emitted from one JSON document
pub const DEFAULT_MAX_EMITTED: usize = 2000;

/// Extracts model candidates from arbitrary JSON
pub struct JsonWalker {
    source: CandidateSource,
    max_emitted: usize,
    found: Vec<ModelCandidate>,
}

impl JsonWalker {
    /// Create a walker tagging its candidates with `source`
    pub fn new(source: CandidateSource) -> Self {
        Self {
            source,
            max_emitted: DEFAULT_MAX_EMITTED,
            found: Vec::new(),
        }
    }

    /// Set the maximum number of candidates kept from one document
    pub fn with_max_emitted(mut self, max_emitted: usize) -> Self {
        self.max_emitted = max_emitted;
        self
    }

    /// Walks `value` and returns what was found, in discovery order
    pub fn walk(mut self, value: &Value) -> Vec<ModelCandidate> {
        self.visit(value);
        self.found
    }

    fn is_full(&self) -> bool {
        self.found.len() >= self.max_emitted
    }

    fn emit(&mut self, raw: &str, title: &str) {
        if self.is_full() {
            return;
        }
        if let Some(candidate) = ModelCandidate::from_raw(raw, title, self.source) {
            self.found.push(candidate);
        }
    }

    fn visit(&mut self, value: &Value) {
        if self.is_full() {
            return;
        }
        match value {
            Value::Object(map) => self.visit_object(map),
            Value::Array(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            _ => {}
        }
    }

    fn visit_object(&mut self, map: &Map<String, Value>) {
        let title = ["name", "title"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .unwrap_or_default();

        let primary = PRIMARY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(scalar_text));
        if let Some(code) = primary {
            self.emit(&code, title);
        }
        if let Some(sku) = map.get(SKU_KEY).and_then(scalar_text) {
            self.emit(&sku, title);
        }

        for (key, child) in map {
            match child {
                Value::String(text) if !is_code_key(key) => {
                    if let Some(hit) = MODEL_PATTERNS.iter().find_map(|re| re.find(text)) {
                        let raw = hit.as_str().to_uppercase();
                        self.emit(&raw, title);
                    }
                }
                Value::Object(_) | Value::Array(_) => self.visit(child),
                _ => {}
            }
        }
    }
}

fn is_code_key(key: &str) -> bool {
    key == SKU_KEY || PRIMARY_KEYS.contains(&key)
}

/// Text of a non-empty string or number value
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Walks `value` with the default cap
pub fn extract_models(value: &Value, source: CandidateSource) -> Vec<ModelCandidate> {
    JsonWalker::new(source).walk(value)
}
