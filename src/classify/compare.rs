//! Locating the "compare" control and placing it within its card.

use super::Scope;
use crate::error::Fault;
use crate::results::{ComparePosition, HorizontalZone, VerticalZone};
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use serde::Deserialize;

/// Words for "compare" across the supported markets
pub const COMPARE_LEXICON: [&str; 11] = [
    "compare",
    "비교",
    "vergleich",
    "comparer",
    "comparar",
    "confronta",
    "比較",
    "비교하기",
    "비교함",
    "vergelijk",
    "comparação",
];

const COMPARE_CHECKBOX: &str =
    "input[type='checkbox'][name*='compare' i], input[type='checkbox'][id*='compare' i]";
const COMPARE_MARKERS: &str = "[data-compare], [data-testid*='compare' i], \
    [data-test*='compare' i], [role='switch'][aria-label*='compare' i], \
    [role='checkbox'][aria-label*='compare' i]";
const CLICKABLES: &str = "a, button, label, [role='button']";
const ANY_TOGGLE: &str = "input[type='checkbox'], [role='switch'], [role='checkbox']";

const MAX_CLICKABLES: usize = 50;

/// Minimum size of an ancestor accepted as the card
const MIN_CARD_WIDTH: f64 = 160.0;
const MIN_CARD_HEIGHT: f64 = 80.0;

/// Controls at most this size count as tiny
const TINY_WIDTH: f64 = 96.0;
const TINY_HEIGHT: f64 = 48.0;

/// Measures the lifted target, an optional supplied card (`arguments[1]`),
/// up to 10 ancestors, and the target's parent as a fallback card.
const POSITION_PROBE_SCRIPT: &str = r#"
const raw = arguments[0];
const supplied = arguments[1];
const cardSelector = arguments[2];
let target = raw;
if (raw.tagName === 'INPUT') {
  const byFor = raw.id ? document.querySelector("label[for='" + CSS.escape(raw.id) + "']") : null;
  target = byFor || raw.closest('label') || raw.parentElement || raw;
} else {
  target = raw.closest("a,button,label,[role='button'],[role='checkbox']") || raw;
}
const box = (node) => {
  const r = node.getBoundingClientRect();
  const cs = getComputedStyle(node);
  const cls = (node.getAttribute('class') || '').toLowerCase();
  let cardLike = /product|card|grid|tile|list/.test(cls);
  try { cardLike = cardLike || node.matches(cardSelector); } catch (e) {}
  return {
    left: r.left, top: r.top, width: r.width, height: r.height,
    paddingLeft: parseFloat(cs.paddingLeft) || 0,
    paddingRight: parseFloat(cs.paddingRight) || 0,
    paddingTop: parseFloat(cs.paddingTop) || 0,
    paddingBottom: parseFloat(cs.paddingBottom) || 0,
    cardLike: cardLike
  };
};
const tr = target.getBoundingClientRect();
const ancestors = [];
let node = target.parentElement;
for (let i = 0; node && node.nodeType === 1 && i < 10; i++) {
  ancestors.push(box(node));
  node = node.parentElement;
}
const parent = target.parentElement || target;
return {
  target: {
    left: tr.left, top: tr.top, width: tr.width, height: tr.height,
    text: (target.innerText || target.textContent || '').trim().slice(0, 200),
    ariaLabel: target.getAttribute('aria-label') || '',
    className: target.getAttribute('class') || '',
    isCheckbox: raw.type === 'checkbox' || target.getAttribute('role') === 'checkbox'
      || !!target.querySelector("input[type='checkbox']")
  },
  hint: supplied ? box(supplied) : null,
  ancestors: ancestors,
  fallback: box(parent)
};
"#;

/// Whether `text` contains a compare keyword, ignoring case
pub fn contains_compare_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    COMPARE_LEXICON.iter().any(|word| lower.contains(word))
}

/// Finds the compare control in scope using progressively looser rules
pub async fn locate_compare(scope: Scope<'_>) -> Option<Element> {
    match try_locate(scope).await {
        Ok(found) => found,
        Err(e) => {
            ::log::debug!("Compare lookup failed on {}: {}", scope.label(), e);
            None
        }
    }
}

async fn try_locate(scope: Scope<'_>) -> Result<Option<Element>, Fault> {
    if let Some(checkbox) = scope.first(Locator::Css(COMPARE_CHECKBOX)).await? {
        return Ok(Some(promote_to_label(scope, checkbox).await));
    }

    if let Some(marker) = scope.first(Locator::Css(COMPARE_MARKERS)).await? {
        return Ok(Some(marker));
    }

    let clickables = scope.find_all(Locator::Css(CLICKABLES)).await?;
    for element in clickables.into_iter().take(MAX_CLICKABLES) {
        if labelled_compare(&element).await {
            return Ok(Some(element));
        }
    }

    let toggle = scope.first(Locator::Css(ANY_TOGGLE)).await?;
    Ok(toggle)
}

async fn promote_to_label(scope: Scope<'_>, checkbox: Element) -> Element {
    let id = match checkbox.attr("id").await {
        Ok(Some(id)) if !id.is_empty() => id,
        _ => return checkbox,
    };
    let selector = format!("label[for='{}']", id.replace('\'', "\\'"));
    match scope.first(Locator::Css(&selector)).await {
        Ok(Some(label)) => label,
        _ => checkbox,
    }
}

async fn labelled_compare(element: &Element) -> bool {
    if let Ok(text) = element.text().await {
        if contains_compare_keyword(&text) {
            return true;
        }
    }
    for attribute in ["aria-label", "class"] {
        if let Ok(Some(value)) = element.attr(attribute).await {
            if contains_compare_keyword(&value) {
                return true;
            }
        }
    }
    false
}

/// Bounding box and padding of a candidate card
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub card_like: bool,
}

impl BoxGeometry {
    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The lifted compare control
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub aria_label: String,
    pub class_name: String,
    pub is_checkbox: bool,
}

impl TargetGeometry {
    pub fn looks_compare(&self) -> bool {
        [&self.text, &self.aria_label, &self.class_name]
            .iter()
            .any(|s| contains_compare_keyword(s))
    }

    fn is_tiny(&self) -> bool {
        self.width <= TINY_WIDTH && self.height <= TINY_HEIGHT
    }
}

/// Everything the position probe reports
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionProbe {
    pub target: TargetGeometry,
    pub hint: Option<BoxGeometry>,
    pub ancestors: Vec<BoxGeometry>,
    pub fallback: BoxGeometry,
}

/// The box the control is positioned against.
///
/// A supplied card wins; otherwise the smallest card-like ancestor large
/// enough to be a card; otherwise the target's parent.
pub fn effective_card(probe: &PositionProbe) -> BoxGeometry {
    if let Some(hint) = probe.hint {
        return hint;
    }
    probe
        .ancestors
        .iter()
        .filter(|b| b.card_like && b.width >= MIN_CARD_WIDTH && b.height >= MIN_CARD_HEIGHT)
        .min_by(|a, b| a.area().total_cmp(&b.area()))
        .copied()
        .unwrap_or(probe.fallback)
}

/// Zone of `target` inside the inner box of `card`
pub fn classify_position(target: &TargetGeometry, card: &BoxGeometry) -> ComparePosition {
    let numbers = [
        target.left,
        target.top,
        target.width,
        target.height,
        card.left,
        card.top,
        card.width,
        card.height,
        card.padding_left,
        card.padding_right,
        card.padding_top,
        card.padding_bottom,
    ];
    if numbers.iter().any(|n| !n.is_finite()) {
        return ComparePosition::Unknown;
    }

    let x0 = card.left + card.padding_left;
    let y0 = card.top + card.padding_top;
    let w = (card.width - card.padding_left - card.padding_right).max(1.0);
    let h = (card.height - card.padding_top - card.padding_bottom).max(1.0);
    let xc = target.left + target.width / 2.0 - x0;
    let yc = target.top + target.height / 2.0 - y0;

    let anchors = [
        (HorizontalZone::Left, 0.0),
        (HorizontalZone::Center, w / 2.0),
        (HorizontalZone::Right, w),
    ];
    let mut horizontal = HorizontalZone::Left;
    let mut nearest = f64::INFINITY;
    for (zone, anchor) in anchors {
        let distance = (xc - anchor).abs();
        if distance < nearest {
            nearest = distance;
            horizontal = zone;
        }
    }

    let looks_compare = target.looks_compare();
    if (looks_compare || target.is_checkbox) && xc <= 0.55 * w {
        horizontal = HorizontalZone::Left;
    } else if target.is_tiny() && xc <= 0.58 * w {
        horizontal = HorizontalZone::Left;
    } else if looks_compare && horizontal == HorizontalZone::Center && xc <= 0.6 * w {
        horizontal = HorizontalZone::Left;
    }

    let vertical = if yc < 0.33 * h {
        VerticalZone::Top
    } else if yc > 0.67 * h {
        VerticalZone::Bottom
    } else {
        VerticalZone::Middle
    };

    ComparePosition::At(vertical, horizontal)
}

/// Position of a located compare control; `Unknown` on any failure
pub async fn compare_position(
    client: &Client,
    target: &Element,
    card: Option<&Element>,
) -> ComparePosition {
    match probe_position(client, target, card).await {
        Ok(probe) => classify_position(&probe.target, &effective_card(&probe)),
        Err(e) => {
            ::log::debug!("Compare position probe failed: {}", e);
            ComparePosition::Unknown
        }
    }
}

async fn probe_position(
    client: &Client,
    target: &Element,
    card: Option<&Element>,
) -> Result<PositionProbe, Fault> {
    let card = match card {
        Some(card) => serde_json::to_value(card)?,
        None => serde_json::Value::Null,
    };
    let args = vec![
        serde_json::to_value(target)?,
        card,
        crate::parsers::dom::CARD_SELECTOR.into(),
    ];
    let raw = client.execute(POSITION_PROBE_SCRIPT, args).await?;
    Ok(serde_json::from_value(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(width: f64, height: f64) -> BoxGeometry {
        BoxGeometry {
            width,
            height,
            card_like: true,
            ..BoxGeometry::default()
        }
    }

    fn target_at(left: f64, top: f64, width: f64, height: f64) -> TargetGeometry {
        TargetGeometry {
            left,
            top,
            width,
            height,
            ..TargetGeometry::default()
        }
    }

    fn label(pos: ComparePosition) -> String {
        pos.to_string()
    }

    #[test]
    fn test_keyword_lexicon() {
        assert!(contains_compare_keyword("Add to Compare"));
        assert!(contains_compare_keyword("비교하기"));
        assert!(contains_compare_keyword("Zum VERGLEICH hinzufügen"));
        assert!(contains_compare_keyword("product-card__compare-toggle"));
        assert!(!contains_compare_keyword("Buy now"));
        assert!(!contains_compare_keyword(""));
    }

    #[test]
    fn test_checkbox_bottom_left() {
        let mut target = target_at(20.0, 420.0, 120.0, 24.0);
        target.is_checkbox = true;
        let pos = classify_position(&target, &card(300.0, 480.0));
        assert_eq!(label(pos), "Bottom-Left");
    }

    #[test]
    fn test_wide_compare_label_near_center_is_left() {
        // Centre at x=160 of 300: nearest anchor is Center, but within 0.55w.
        let mut target = target_at(100.0, 10.0, 120.0, 30.0);
        target.text = "Compare".to_string();
        let pos = classify_position(&target, &card(300.0, 480.0));
        assert_eq!(label(pos), "Top-Left");
    }

    #[test]
    fn test_plain_control_uses_nearest_anchor() {
        let target = target_at(120.0, 220.0, 60.0, 60.0);
        assert_eq!(label(classify_position(&target, &card(300.0, 480.0))), "Middle-Center");

        let right = target_at(240.0, 460.0, 50.0, 20.0);
        assert_eq!(label(classify_position(&right, &card(300.0, 480.0))), "Bottom-Right");
    }

    #[test]
    fn test_tiny_control_left_of_058() {
        // Centre at x=170 of 300 (0.567w), tiny and unlabelled.
        let target = target_at(160.0, 200.0, 20.0, 20.0);
        assert_eq!(label(classify_position(&target, &card(300.0, 480.0))), "Middle-Left");
    }

    #[test]
    fn test_padding_shifts_inner_box() {
        let mut padded = card(340.0, 520.0);
        padded.padding_left = 20.0;
        padded.padding_right = 20.0;
        padded.padding_top = 20.0;
        padded.padding_bottom = 20.0;
        let target = target_at(20.0, 20.0, 40.0, 40.0);
        assert_eq!(label(classify_position(&target, &padded)), "Top-Left");
    }

    #[test]
    fn test_non_finite_geometry_is_unknown() {
        let target = target_at(f64::NAN, 0.0, 10.0, 10.0);
        assert_eq!(classify_position(&target, &card(300.0, 480.0)), ComparePosition::Unknown);
    }

    #[test]
    fn test_effective_card_prefers_smallest_card_like() {
        let mut small_plain = card(200.0, 100.0);
        small_plain.card_like = false;
        let probe = PositionProbe {
            ancestors: vec![small_plain, card(100.0, 60.0), card(300.0, 480.0), card(1200.0, 900.0)],
            fallback: card(50.0, 20.0),
            ..PositionProbe::default()
        };
        assert_eq!(effective_card(&probe).width, 300.0);

        let supplied = PositionProbe {
            hint: Some(card(10.0, 10.0)),
            ..probe.clone()
        };
        assert_eq!(effective_card(&supplied).width, 10.0);

        let none = PositionProbe {
            fallback: card(50.0, 20.0),
            ..PositionProbe::default()
        };
        assert_eq!(effective_card(&none).width, 50.0);
    }

    #[test]
    fn test_probe_deserializes() {
        let raw = serde_json::json!({
            "target": {"left": 1, "top": 2, "width": 3, "height": 4,
                       "text": "Compare", "ariaLabel": "", "className": "x", "isCheckbox": false},
            "hint": null,
            "ancestors": [{"left": 0, "top": 0, "width": 320, "height": 500,
                           "paddingLeft": 8, "paddingRight": 8, "paddingTop": 0,
                           "paddingBottom": 0, "cardLike": true}],
            "fallback": {"width": 10, "height": 10}
        });
        let probe: PositionProbe = serde_json::from_value(raw).unwrap();
        assert!(probe.hint.is_none());
        assert!(probe.target.looks_compare());
        assert_eq!(effective_card(&probe).padding_left, 8.0);
    }
}
