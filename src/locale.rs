//! Market and locale hints derived from a listing page URL.

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_MARKET: &str = "uk";

/// Coordinates reported to the page when it asks for a location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// Locale settings applied to the browser before loading a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    pub market: String,
    pub accept_language: String,
    pub timezone: String,
    pub geolocation: Option<Geolocation>,
}

impl Locale {
    /// Primary language tag, e.g. `en-GB`
    pub fn language_tag(&self) -> &str {
        self.accept_language
            .split(',')
            .next()
            .unwrap_or(&self.accept_language)
    }
}

/// Infers the market of `url` and the locale that goes with it.
///
/// The market is a 2-3 letter first path segment (`/uk/tvs/`), else the
/// country TLD of the host, else `uk`.
pub fn infer_locale(url: &str) -> Locale {
    let market = Url::parse(url)
        .ok()
        .and_then(|parsed| market_from_url(&parsed))
        .unwrap_or_else(|| DEFAULT_MARKET.to_string());
    locale_for_market(&market)
}

fn market_from_url(url: &Url) -> Option<String> {
    let first = url
        .path_segments()
        .and_then(|mut segments| segments.next())
        .unwrap_or_default()
        .to_lowercase();
    if matches!(first.len(), 2 | 3) {
        return Some(first);
    }

    let host = url.host_str()?.to_lowercase();
    let market = if host.ends_with(".sg") {
        "sg"
    } else if host.ends_with(".uk") {
        "uk"
    } else if host.ends_with(".de") {
        "de"
    } else if host.ends_with(".fr") {
        "fr"
    } else if host.ends_with(".it") {
        "it"
    } else if host.ends_with(".es") {
        "es"
    } else {
        return None;
    };
    Some(market.to_string())
}

fn locale_for_market(market: &str) -> Locale {
    let accept_language = match market {
        "sg" => "en-SG,en;q=0.8",
        "de" => "de-DE,de;q=0.9,en;q=0.7",
        "fr" => "fr-FR,fr;q=0.9,en;q=0.7",
        "it" => "it-IT,it;q=0.9,en;q=0.7",
        "es" => "es-ES,es;q=0.9,en;q=0.7",
        _ => "en-GB,en;q=0.8",
    };
    let timezone = match market {
        "sg" => "Asia/Singapore",
        "de" => "Europe/Berlin",
        "fr" => "Europe/Paris",
        "it" => "Europe/Rome",
        "es" => "Europe/Madrid",
        _ => "Europe/London",
    };
    let coordinates = match market {
        "uk" => Some((51.5074, -0.1278)),
        "sg" => Some((1.3521, 103.8198)),
        "de" => Some((52.52, 13.405)),
        "fr" => Some((48.8566, 2.3522)),
        "it" => Some((41.9028, 12.4964)),
        "es" => Some((40.4168, -3.7038)),
        _ => None,
    };

    Locale {
        market: market.to_string(),
        accept_language: accept_language.to_string(),
        timezone: timezone.to_string(),
        geolocation: coordinates.map(|(latitude, longitude)| Geolocation {
            latitude,
            longitude,
            accuracy: 50.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_from_path_segment() {
        let locale = infer_locale("https://www.lg.com/sg/tvs-soundbars/oled-evo/");
        assert_eq!(locale.market, "sg");
        assert_eq!(locale.accept_language, "en-SG,en;q=0.8");
        assert_eq!(locale.timezone, "Asia/Singapore");
        assert_eq!(locale.language_tag(), "en-SG");
        assert!(locale.geolocation.is_some());
    }

    #[test]
    fn test_market_from_host_tld() {
        let locale = infer_locale("https://shop.example.de/fernseher/oled");
        assert_eq!(locale.market, "de");
        assert_eq!(locale.timezone, "Europe/Berlin");
        assert_eq!(locale.language_tag(), "de-DE");

        let locale = infer_locale("https://shop.example.co.uk/televisions");
        assert_eq!(locale.market, "uk");
    }

    #[test]
    fn test_unknown_market_falls_back_to_uk_language() {
        let locale = infer_locale("https://www.example.com/br/tvs/");
        assert_eq!(locale.market, "br");
        assert_eq!(locale.accept_language, "en-GB,en;q=0.8");
        assert_eq!(locale.timezone, "Europe/London");
        assert!(locale.geolocation.is_none());
    }

    #[test]
    fn test_unparseable_url_is_uk() {
        let locale = infer_locale("not a url");
        assert_eq!(locale.market, "uk");
        assert_eq!(locale.geolocation.map(|g| g.accuracy), Some(50.0));
    }

    #[test]
    fn test_no_market_hint_defaults_to_uk() {
        let locale = infer_locale("https://www.example.com/televisions/");
        assert_eq!(locale.market, "uk");
    }
}
