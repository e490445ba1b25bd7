use crate::parsers::dom::{self, MAX_CARDS};
use crate::results::CandidateSource;

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <ul class="product-grid">
            <li class="product-grid__item">
              <h3 class="product-title">LG OLED evo G4 65 inch OLED65G46LA</h3>
              <a href="/uk/tvs/oled65g46la/">Learn more</a>
            </li>
            <li class="product-grid__item">
              <h3>LG QNED 55 inch</h3>
              <img alt="front view" src="/img/qned55qned86t6a.png">
              <a href="/uk/tvs/">All TVs</a>
            </li>
            <li class="product-grid__item">
              <h3>Soundbar</h3>
              <a href="/uk/audio/us60t?cmp=plp#reviews">Details</a>
            </li>
            <li class="product-grid__item" hidden>
              <h3>OLED83C4</h3>
            </li>
            <li class="product-grid__item">
              <h3>Gift card</h3>
            </li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_scan_cards_takes_first_hit_per_card() {
        let found = dom::scan_cards(LISTING, MAX_CARDS);
        let bases: Vec<&str> = found.iter().map(|c| c.base.as_str()).collect();

        assert_eq!(bases, vec!["OLED65G46LA", "QNED55QNED86T6A", "US60T"]);
    }

    #[test]
    fn test_scan_cards_reports_segment_source() {
        let found = dom::scan_cards(LISTING, MAX_CARDS);

        assert_eq!(found[0].source, CandidateSource::DomText);
        assert_eq!(found[0].title, "LG OLED evo G4 65 inch OLED65G46LA");
        assert_eq!(found[1].source, CandidateSource::DomAttribute);
        // The link href is also an attribute, so the slug channel is not needed here.
        assert_eq!(found[2].source, CandidateSource::DomAttribute);
    }

    #[test]
    fn test_link_slug_beyond_attribute_window() {
        let html = format!(
            r#"<div class="product-card">{}<a href="/uk/tvs/oled42c44la/">Shop</a></div>"#,
            "<span></span>".repeat(30)
        );
        let found = dom::scan_cards(&html, MAX_CARDS);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].base, "OLED42C44LA");
        assert_eq!(found[0].source, CandidateSource::LinkSlug);
    }

    #[test]
    fn test_scan_cards_respects_card_limit() {
        let found = dom::scan_cards(LISTING, 1);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_script_text_is_ignored() {
        let html = r#"<div class="product-card"><script>var m = "OLED42C4";</script>
            <p>No code here</p></div>"#;
        assert!(dom::scan_cards(html, MAX_CARDS).is_empty());
    }

    #[test]
    fn test_data_attributes_are_read() {
        let html = r#"<div data-sku="" class="tile"><div data-model="UR78006LK.AEU"></div>
            <span>Speaker</span></div>"#;
        let found = dom::scan_cards(html, MAX_CARDS);

        assert_eq!(found[0].base, "UR78006LK");
        assert_eq!(found[0].raw, "UR78006LK");
    }

    #[test]
    fn test_inline_display_none_is_hidden() {
        let html = r#"<div class="product-card" style="display: none">OLED48C4</div>"#;
        assert!(dom::scan_cards(html, MAX_CARDS).is_empty());
    }

    #[test]
    fn test_embedded_state_documents() {
        let html = r#"<html><head>
            <script id="__NEXT_DATA__" type="application/json">
              {"props":{"pageProps":{"modelCode":"OLED65G4B"}}}
            </script>
            <script type="application/ld+json">{"@type":"Product","sku":"QNED80RUK"}</script>
            <script type="application/ld+json">{ broken</script>
            </head><body></body></html>"#;
        let docs = dom::embedded_state_documents(html);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["props"]["pageProps"]["modelCode"], "OLED65G4B");
        assert_eq!(docs[1]["sku"], "QNED80RUK");
    }
}
