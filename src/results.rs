use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Where a model candidate was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    NetworkJson,
    EmbeddedJson,
    DomText,
    DomAttribute,
    LinkSlug,
}

/// A model identifier found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Text as it was found
    pub raw: String,

    /// Accepted model token (text before any `.` suffix, uppercased)
    pub base: String,

    /// Comparable form of `base`
    pub normalized: String,

    /// Product title seen next to the code, if any
    pub title: String,

    pub source: CandidateSource,
}

/// Visual type of the "learn more" control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CtaType {
    Text,
    Button,
    ButtonWithIcon,
    Unknown,
}

impl fmt::Display for CtaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CtaType::Text => "Text",
            CtaType::Button => "Button",
            CtaType::ButtonWithIcon => "Button+Icon",
            CtaType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Corner shape of a button-like control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Rounded,
    Squared,
    Unknown,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Shape::Rounded => "Rounded",
            Shape::Squared => "Squared",
            Shape::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalZone {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalZone {
    Left,
    Center,
    Right,
}

/// Position of the compare control inside its card.
///
/// Rendered as `"<Vertical>-<Horizontal>"` or `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparePosition {
    At(VerticalZone, HorizontalZone),
    Unknown,
}

impl fmt::Display for ComparePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparePosition::Unknown => f.write_str("Unknown"),
            ComparePosition::At(v, h) => write!(f, "{v:?}-{h:?}"),
        }
    }
}

impl FromStr for ComparePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Unknown" {
            return Ok(ComparePosition::Unknown);
        }
        let (v, h) = s
            .split_once('-')
            .ok_or_else(|| format!("not a compare position: {s}"))?;
        let vertical = match v {
            "Top" => VerticalZone::Top,
            "Middle" => VerticalZone::Middle,
            "Bottom" => VerticalZone::Bottom,
            _ => return Err(format!("unknown vertical zone: {v}")),
        };
        let horizontal = match h {
            "Left" => HorizontalZone::Left,
            "Center" => HorizontalZone::Center,
            "Right" => HorizontalZone::Right,
            _ => return Err(format!("unknown horizontal zone: {h}")),
        };
        Ok(ComparePosition::At(vertical, horizontal))
    }
}

impl Serialize for ComparePosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComparePosition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Classification as observed, before defaults are applied.
///
/// `None` means no signal was found for the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedCta {
    pub learn_more_type: Option<CtaType>,
    pub learn_more_shape: Option<Shape>,
    pub buy_now_shape: Option<Shape>,
    pub compare_position: Option<ComparePosition>,
}

impl ObservedCta {
    /// Whether a second, page-wide pass is worth running
    pub fn needs_page_pass(&self) -> bool {
        is_unresolved(self.learn_more_type, CtaType::Unknown)
            || is_unresolved(self.buy_now_shape, Shape::Unknown)
    }

    /// Fills fields still unresolved here from `other`
    pub fn fill_from(&mut self, other: ObservedCta) {
        fill(&mut self.learn_more_type, other.learn_more_type, CtaType::Unknown);
        fill(&mut self.learn_more_shape, other.learn_more_shape, Shape::Unknown);
        fill(&mut self.buy_now_shape, other.buy_now_shape, Shape::Unknown);
        fill(
            &mut self.compare_position,
            other.compare_position,
            ComparePosition::Unknown,
        );
    }
}

fn is_unresolved<T: PartialEq>(value: Option<T>, unknown: T) -> bool {
    value.is_none_or(|v| v == unknown)
}

fn fill<T: PartialEq + Copy>(slot: &mut Option<T>, other: Option<T>, unknown: T) {
    if is_unresolved(*slot, unknown) && other.is_some() {
        *slot = other;
    }
}

/// Final CTA classification of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaClassification {
    pub learn_more_type: CtaType,
    pub learn_more_shape: Shape,
    pub buy_now_shape: Shape,
    pub compare_position: ComparePosition,
}

impl CtaClassification {
    /// Applies the fallback defaults to every field left without a signal
    pub fn resolve(observed: ObservedCta) -> Self {
        let defaults = Self::default();
        Self {
            learn_more_type: resolved(
                observed.learn_more_type,
                CtaType::Unknown,
                defaults.learn_more_type,
            ),
            learn_more_shape: observed.learn_more_shape.unwrap_or(defaults.learn_more_shape),
            buy_now_shape: resolved(observed.buy_now_shape, Shape::Unknown, defaults.buy_now_shape),
            compare_position: resolved(
                observed.compare_position,
                ComparePosition::Unknown,
                defaults.compare_position,
            ),
        }
    }

    /// Learn-more cell as shown in a match row
    pub fn learn_more(&self) -> LearnMoreStyle {
        LearnMoreStyle {
            kind: self.learn_more_type,
            shape: self.learn_more_shape,
        }
    }
}

fn resolved<T: PartialEq>(value: Option<T>, unknown: T, default: T) -> T {
    match value {
        Some(v) if v != unknown => v,
        _ => default,
    }
}

impl Default for CtaClassification {
    fn default() -> Self {
        Self {
            learn_more_type: CtaType::Text,
            learn_more_shape: Shape::Unknown,
            buy_now_shape: Shape::Squared,
            compare_position: ComparePosition::At(VerticalZone::Bottom, HorizontalZone::Left),
        }
    }
}

/// Type and shape of a learn-more control, e.g. `Button (Rounded)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnMoreStyle {
    pub kind: CtaType,
    pub shape: Shape,
}

impl fmt::Display for LearnMoreStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            Shape::Unknown => write!(f, "{}", self.kind),
            shape => write!(f, "{} ({})", self.kind, shape),
        }
    }
}

/// Everything extracted from one listing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtractionResult {
    pub url: String,
    pub market: String,

    /// Whether a readiness signal was seen (diagnostic only)
    pub ready: bool,

    pub candidates: Vec<ModelCandidate>,
    pub classification: CtaClassification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Matched,
    FirstInCategory,
}

/// One compared pair of models across the two pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRow {
    pub model_as_is: String,
    pub model_to_be: String,
    pub learn_more_as_is: LearnMoreStyle,
    pub learn_more_to_be: LearnMoreStyle,
    pub buy_now_as_is: Shape,
    pub buy_now_to_be: Shape,
    pub compare_pos_as_is: ComparePosition,
    pub compare_pos_to_be: ComparePosition,
    pub match_kind: MatchKind,
}

/// Output of a full AS-IS / TO-BE run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub as_is: PageExtractionResult,
    pub to_be: PageExtractionResult,
    pub rows: Vec<MatchRow>,
}
