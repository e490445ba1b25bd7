//! Model code canonicalization, equivalence and noise filtering.

use regex::Regex;
use std::sync::LazyLock;

/// Model-shape patterns in priority order.
///
/// 1. TV family token, 2-3 digit size, then alphanumerics with optional
///    dot/hyphen groups (`OLED65G4B`, `QNED80RUK.AEK`).
/// 2. Terse two-letter-prefixed codes (`UR78006LK`, `US60T`).
/// 3. Generic letters-then-digits fallback.
pub static MODEL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:OLED|QNED|NANO)\d{2,3}[A-Z0-9]+(?:[.\-][A-Z0-9]+)*")
            .expect("valid family pattern"),
        Regex::new(r"(?i)[LU][A-Z]{1,2}\d{2,3}[A-Z0-9]{1,4}").expect("valid terse pattern"),
        Regex::new(r"(?i)\b[A-Z]{2,}\d{2,}\b").expect("valid generic pattern"),
    ]
});

static SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.\-_/]+").expect("valid separator regex"));
static TRAILING_LETTERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,3}$").expect("valid suffix regex"));
static REVIEW_WIDGET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^MD\d+$").expect("valid widget id regex"));

const FAMILY_SUFFIXES: [(&str, &str); 3] =
    [("OLEDTV", "OLED"), ("QNEDTV", "QNED"), ("NANOTV", "NANO")];

/// Canonical comparable form of a model code.
pub fn normalize(raw: &str) -> String {
    let mut out = SEPARATORS_RE.replace_all(&raw.to_uppercase(), "").into_owned();
    // Collapsing can expose another variant ("OLEDTVTV"), so run to a fixpoint.
    loop {
        let collapsed = FAMILY_SUFFIXES
            .iter()
            .fold(out.clone(), |acc, (variant, family)| acc.replace(variant, family));
        if collapsed == out {
            return out;
        }
        out = collapsed;
    }
}

/// Whether two raw codes refer to the same model.
///
/// Falls back to comparing with one trailing 2-3 letter run removed from each
/// side, which absorbs finish and colour suffixes (`OLED65G4BAEU` vs
/// `OLED65G4B`). This can also pair different generations that share a base.
pub fn same_model(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb {
        return true;
    }
    let ra = TRAILING_LETTERS_RE.replace(&na, "");
    let rb = TRAILING_LETTERS_RE.replace(&nb, "");
    !ra.is_empty() && !rb.is_empty() && ra == rb
}

/// First model-shape hit in `text`, uppercased.
pub fn find_model(text: &str) -> Option<String> {
    MODEL_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().to_uppercase())
}

/// Applies the noise filter to a raw candidate and returns its base model.
///
/// The base is the uppercased text before the first `.`. Pure numbers, short
/// tokens and review-widget ids are rejected. A base missing either letters or
/// digits is replaced by a pattern hit from the full raw string when there is
/// one.
pub fn accept_model(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let mut base = raw.split('.').next().unwrap_or_default().to_uppercase();

    if !base.is_empty() && base.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if base.chars().filter(char::is_ascii_alphanumeric).count() < 4 {
        return None;
    }

    let has_letter = base.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = base.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        base = find_model(raw)?;
    }

    if REVIEW_WIDGET_ID_RE.is_match(&base) {
        return None;
    }
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators_and_uppercases() {
        assert_eq!(normalize(" oled65-g4_b/x.y "), "OLED65G4BXY");
        assert_eq!(normalize("OLED TV 65C4"), "OLED65C4");
        assert_eq!(normalize("nano tv75"), "NANO75");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "OLED65G4B.AEU",
            "oled tv 55",
            "QNED-TV-80",
            "OLEDTVTV",
            "a.b-c_d/e f",
            "NANOTVNANO",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_same_model_exact_and_suffix() {
        assert!(same_model("OLED65G4B", "oled65g4b"));
        assert!(same_model("OLED65G4B", "OLED65G4B.AEU"));
        assert!(same_model("QNED80RUK", "QNED80RAA"));
        assert!(!same_model("QNED80RUK", "NANO75"));
        assert!(!same_model("", "OLED65G4B"));
        assert!(!same_model("ABC", "ABD"));
    }

    #[test]
    fn test_same_model_is_symmetric() {
        let codes = ["OLED65G4B", "OLED65G4B.AEU", "QNED80RUK", "NANO75", "ABCD", "AB"];
        for a in codes {
            for b in codes {
                assert_eq!(same_model(a, b), same_model(b, a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_accept_model_rejects_noise() {
        assert_eq!(accept_model("12345"), None);
        assert_eq!(accept_model("ab"), None);
        assert_eq!(accept_model("MD0012345"), None);
        assert_eq!(accept_model("A1"), None);
        assert_eq!(accept_model("television"), None);
    }

    #[test]
    fn test_accept_model_takes_base_before_dot() {
        assert_eq!(accept_model("OLED65G4B.AEU").as_deref(), Some("OLED65G4B"));
        assert_eq!(accept_model(" qned80ruk ").as_deref(), Some("QNED80RUK"));
    }

    #[test]
    fn test_accept_model_recovers_family_pattern() {
        // The base has no digit, but the full string contains a model.
        assert_eq!(
            accept_model("OLED.evo OLED65C46LA range").as_deref(),
            Some("OLED65C46LA")
        );
    }

    #[test]
    fn test_find_model_priority() {
        assert_eq!(find_model("LG OLED65C4 evo").as_deref(), Some("OLED65C4"));
        assert_eq!(find_model("soundbar us60t").as_deref(), Some("US60T"));
        assert_eq!(find_model("no model here"), None);
    }
}
