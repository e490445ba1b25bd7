//! Learn-more and buy-now button styling.

use super::Scope;
use crate::error::Fault;
use crate::results::{CtaType, Shape};
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use serde::Deserialize;

pub const BUY_NOW_SELECTOR: &str = ".c-button--primary, .c-btn--primary, \
    button[class*='buy' i], a[class*='buy' i], [aria-label*='buy' i], [data-cta*='buy' i]";

pub const LEARN_MORE_SELECTOR: &str = ".c-button--secondary, .c-btn--secondary, \
    a[class*='learn' i], [aria-label*='learn' i], [data-cta*='learn' i], \
    a.c-button, a.btn, button.c-button, button.btn, a[href*='/p/'], a[href*='/product']";

const LEARN_MORE_XPATH: &str = ".//*[self::a or self::button]\
    [contains(normalize-space(.),'Learn more') or contains(normalize-space(.),'Find out more')]";

/// Ancestors inspected above the promoted element
pub const MAX_ANCESTOR_DEPTH: usize = 3;

const ROUNDED_CLASS_HINTS: [&str; 8] = [
    "c-button--primary",
    "c-btn--primary",
    "c-button--secondary",
    "c-btn--secondary",
    "c-button",
    "c-btn",
    "pill",
    "rounded",
];

/// Collects [`StyleMetrics`] for `arguments[0]` promoted to its nearest link or
/// button, plus up to `arguments[1]` ancestors.
const STYLE_CHAIN_SCRIPT: &str = r#"
const start = arguments[0];
const depth = arguments[1];
const px = (v) => parseFloat(v) || 0;
const alpha = (color) => {
  const m = /rgba?\(([^)]+)\)/.exec(color || '');
  if (!m) return 0;
  const parts = m[1].split(/[ ,\/]+/).filter(Boolean).map(parseFloat);
  return parts.length > 3 ? parts[3] : 1;
};
const measure = (node) => {
  const cs = getComputedStyle(node);
  return {
    tag: node.tagName.toLowerCase(),
    classNames: node.getAttribute('class') || '',
    horizontalPadding: px(cs.paddingLeft) + px(cs.paddingRight),
    averageCornerRadius: (px(cs.borderTopLeftRadius) + px(cs.borderTopRightRadius)
      + px(cs.borderBottomLeftRadius) + px(cs.borderBottomRightRadius)) / 4,
    backgroundAlpha: alpha(cs.backgroundColor),
    averageBorderWidth: (px(cs.borderTopWidth) + px(cs.borderRightWidth)
      + px(cs.borderBottomWidth) + px(cs.borderLeftWidth)) / 4,
    hasIconDescendant: !!node.querySelector("svg,i,[class*='icon'],[class*='ico'],[class*='chevron']")
  };
};
const chain = [];
let node = start.closest('a,button') || start;
for (let i = 0; node && node.nodeType === 1 && i <= depth; i++) {
  chain.push(measure(node));
  node = node.parentElement;
}
return chain;
"#;

/// Measures corner radii of the promoted element, its pseudo-elements and up
/// to 12 children per level, two levels deep. `maxR` is the largest single
/// corner seen.
const RADIUS_PROBE_SCRIPT: &str = r#"
const el = arguments[0].closest('a,button') || arguments[0];
const px = (v) => parseFloat(v) || 0;
const corners = (cs) => [cs.borderTopLeftRadius, cs.borderTopRightRadius,
  cs.borderBottomLeftRadius, cs.borderBottomRightRadius].map(px);
let sum = 0, n = 0, maxR = 0, h = 0;
const visit = (cs) => {
  const rs = corners(cs);
  sum += rs.reduce((a, b) => a + b, 0) / 4; n += 1;
  maxR = Math.max(maxR, ...rs);
};
const walk = (node, level) => {
  visit(getComputedStyle(node));
  for (const pseudo of ['::before', '::after']) {
    const ps = getComputedStyle(node, pseudo);
    if (ps && ps.content && ps.content !== 'none') visit(ps);
  }
  const rect = node.getBoundingClientRect();
  if (rect.height > h) h = rect.height;
  if (level >= 2) return;
  Array.from(node.children).slice(0, 12).forEach((c) => walk(c, level + 1));
};
walk(el, 0);
return { avg: n ? sum / n : 0, h: h, maxR: maxR };
"#;

/// Computed style of one element in the chain
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleMetrics {
    pub tag: String,
    pub class_names: String,
    pub horizontal_padding: f64,
    pub average_corner_radius: f64,
    pub background_alpha: f64,
    pub average_border_width: f64,
    pub has_icon_descendant: bool,
}

impl StyleMetrics {
    /// Number of button-like signals present
    pub fn button_score(&self) -> u8 {
        let class = self.class_names.to_lowercase();
        [
            self.horizontal_padding > 0.0,
            self.background_alpha > 0.05,
            self.average_border_width >= 1.0,
            self.average_corner_radius >= 6.0,
            class.contains("btn") || class.contains("cta"),
        ]
        .into_iter()
        .filter(|signal| *signal)
        .count() as u8
    }

    pub fn is_button_like(&self) -> bool {
        let class = self.class_names.to_lowercase();
        if ["btn", "button", "cta"].iter().any(|t| class.contains(t)) {
            return true;
        }
        if self.tag.eq_ignore_ascii_case("button") {
            return true;
        }
        self.horizontal_padding >= 10.0
            && (self.background_alpha > 0.02
                || self.average_border_width >= 1.0
                || self.average_corner_radius >= 6.0)
    }
}

/// Picks the most button-like entry among the first `max_depth + 1` of
/// `chain`. Ties keep the nearer element.
pub fn best_ancestor_metrics(chain: &[StyleMetrics], max_depth: usize) -> Option<&StyleMetrics> {
    let mut best: Option<(&StyleMetrics, u8)> = None;
    for metrics in chain.iter().take(max_depth + 1) {
        let score = metrics.button_score();
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((metrics, score));
        }
    }
    best.map(|(metrics, _)| metrics)
}

pub fn shape_from_radius(radius: f64) -> Shape {
    if radius >= 10.0 {
        Shape::Rounded
    } else if radius >= 1.0 {
        Shape::Squared
    } else {
        Shape::Unknown
    }
}

/// Type and direct shape of a control from its chosen metrics
pub fn classify_metrics(metrics: &StyleMetrics) -> (CtaType, Shape) {
    let shape = shape_from_radius(metrics.average_corner_radius);
    let kind = match (metrics.is_button_like(), metrics.has_icon_descendant) {
        (true, true) => CtaType::ButtonWithIcon,
        (true, false) => CtaType::Button,
        (false, _) => CtaType::Text,
    };
    (kind, shape)
}

/// Rounded when the class list names a known rounded component
pub fn class_hint(class_names: &str) -> Option<Shape> {
    let class = class_names.to_lowercase();
    ROUNDED_CLASS_HINTS
        .iter()
        .any(|hint| class.contains(hint))
        .then_some(Shape::Rounded)
}

/// Shape settled without the radius probe, or `None` when the probe decides.
///
/// Only the promoted element's own classes (the head of `chain`) count as a
/// hint; ancestors such as button groups or rounded card wrappers do not.
pub fn shape_before_probe(chain: &[StyleMetrics], shape: Shape) -> Option<Shape> {
    if shape == Shape::Rounded {
        return Some(shape);
    }
    if let Some(hint) = chain.first().and_then(|m| class_hint(&m.class_names)) {
        return Some(hint);
    }
    (shape != Shape::Unknown).then_some(shape)
}

/// Result of [`RADIUS_PROBE_SCRIPT`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadiusProbe {
    pub avg: f64,
    pub h: f64,
    pub max_r: f64,
}

impl RadiusProbe {
    pub fn shape(&self) -> Shape {
        let r = self.avg.max(self.max_r);
        if !r.is_finite() {
            return Shape::Unknown;
        }
        if r >= 12.0 || (self.h > 0.0 && r / self.h >= 0.25) {
            Shape::Rounded
        } else if r >= 1.0 {
            Shape::Squared
        } else {
            Shape::Unknown
        }
    }
}

/// First learn-more control in scope, by selector then by visible text
pub async fn find_learn_more(scope: Scope<'_>) -> Option<Element> {
    match scope.first(Locator::Css(LEARN_MORE_SELECTOR)).await {
        Ok(Some(element)) => return Some(element),
        Ok(None) => {}
        Err(e) => ::log::debug!("Learn-more selector failed on {}: {}", scope.label(), e),
    }
    match scope.first(Locator::XPath(LEARN_MORE_XPATH)).await {
        Ok(found) => found,
        Err(e) => {
            ::log::debug!("Learn-more text search failed on {}: {}", scope.label(), e);
            None
        }
    }
}

pub async fn find_buy_now(scope: Scope<'_>) -> Option<Element> {
    scope
        .first(Locator::Css(BUY_NOW_SELECTOR))
        .await
        .unwrap_or_else(|e| {
            ::log::debug!("Buy-now selector failed on {}: {}", scope.label(), e);
            None
        })
}

/// Classifies a located control. Any failure yields `(Text, Unknown)`.
pub async fn classify_cta(client: &Client, element: &Element) -> (CtaType, Shape) {
    match try_classify(client, element).await {
        Ok(result) => result,
        Err(e) => {
            ::log::debug!("CTA classification failed: {}", e);
            (CtaType::Text, Shape::Unknown)
        }
    }
}

async fn try_classify(client: &Client, element: &Element) -> Result<(CtaType, Shape), Fault> {
    let target = serde_json::to_value(element)?;
    let raw = client
        .execute(
            STYLE_CHAIN_SCRIPT,
            vec![target.clone(), MAX_ANCESTOR_DEPTH.into()],
        )
        .await?;
    let chain: Vec<StyleMetrics> = serde_json::from_value(raw)?;
    let best = best_ancestor_metrics(&chain, MAX_ANCESTOR_DEPTH)
        .ok_or(Fault::Missing("empty style chain"))?;

    let (kind, shape) = classify_metrics(best);
    let shape = refine_shape(client, &target, &chain, shape).await;
    Ok((kind, shape))
}

/// Secondary heuristics for controls whose direct radius is inconclusive
async fn refine_shape(
    client: &Client,
    target: &serde_json::Value,
    chain: &[StyleMetrics],
    shape: Shape,
) -> Shape {
    if let Some(settled) = shape_before_probe(chain, shape) {
        return settled;
    }

    let probe = match client.execute(RADIUS_PROBE_SCRIPT, vec![target.clone()]).await {
        Ok(raw) => serde_json::from_value::<RadiusProbe>(raw),
        Err(e) => {
            ::log::debug!("Radius probe failed: {}", e);
            return shape;
        }
    };
    match probe {
        Ok(probe) => probe.shape(),
        Err(e) => {
            ::log::debug!("Radius probe returned unexpected data: {}", e);
            shape
        }
    }
}
