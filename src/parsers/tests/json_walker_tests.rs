use crate::parsers::json::{JsonWalker, extract_models};
use crate::results::CandidateSource;
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_code_with_regional_suffix() {
        let value = json!({"modelCode": "OLED65G4B.AEU", "name": "OLED TV"});
        let found = extract_models(&value, CandidateSource::NetworkJson);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw, "OLED65G4B.AEU");
        assert_eq!(found[0].base, "OLED65G4B");
        assert_eq!(found[0].normalized, "OLED65G4B");
        assert_eq!(found[0].title, "OLED TV");
        assert_eq!(found[0].source, CandidateSource::NetworkJson);
    }

    #[test]
    fn test_first_priority_key_wins() {
        let value = json!({"model": "QNED80RUK", "code": "NANO75UR", "modelCode": ""});
        let found = extract_models(&value, CandidateSource::EmbeddedJson);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].base, "QNED80RUK");
    }

    #[test]
    fn test_sku_is_secondary_candidate() {
        let value = json!({"modelCode": "OLED55C4", "sku": "OLED55C46LA.AEK", "title": "C4"});
        let found = extract_models(&value, CandidateSource::NetworkJson);
        let bases: Vec<&str> = found.iter().map(|c| c.base.as_str()).collect();

        assert_eq!(bases, vec!["OLED55C4", "OLED55C46LA"]);
        assert!(found.iter().all(|c| c.title == "C4"));
    }

    #[test]
    fn test_numeric_and_widget_codes_rejected() {
        let value = json!([
            {"code": 12345},
            {"sku": "MD07123456"},
            {"model": "ab"}
        ]);
        assert!(extract_models(&value, CandidateSource::NetworkJson).is_empty());
    }

    #[test]
    fn test_scans_other_string_fields() {
        let value = json!({
            "id": 991,
            "url": "/uk/tvs/oled65b46la",
            "description": "Meet the new LG OLED evo"
        });
        let found = extract_models(&value, CandidateSource::NetworkJson);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].base, "OLED65B46LA");
    }

    #[test]
    fn test_recurses_into_nested_structures() {
        let value = json!({
            "props": {
                "pageProps": {
                    "products": [
                        {"modelCode": "OLED65G4B", "name": "G4"},
                        {"modelCode": "QNED80RUK", "name": "QNED 80"},
                        {"variants": [{"sku": "NANO75UR.AEK"}]}
                    ]
                }
            }
        });
        let found = extract_models(&value, CandidateSource::EmbeddedJson);
        let bases: Vec<&str> = found.iter().map(|c| c.base.as_str()).collect();

        assert_eq!(bases, vec!["OLED65G4B", "QNED80RUK", "NANO75UR"]);
    }

    #[test]
    fn test_object_under_model_key_is_visited() {
        let value = json!({"model": {"modelCode": "OLED77M4"}});
        let found = extract_models(&value, CandidateSource::NetworkJson);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].base, "OLED77M4");
    }

    #[test]
    fn test_emission_cap() {
        let items: Vec<_> = (0..50)
            .map(|i| json!({"modelCode": format!("OLED{:02}C4", 10 + i)}))
            .collect();
        let found = JsonWalker::new(CandidateSource::NetworkJson)
            .with_max_emitted(5)
            .walk(&json!(items));

        assert_eq!(found.len(), 5);
        assert_eq!(found[0].base, "OLED10C4");
    }

    #[test]
    fn test_scalars_yield_nothing() {
        assert!(extract_models(&json!("OLED65G4B"), CandidateSource::NetworkJson).is_empty());
        assert!(extract_models(&json!(null), CandidateSource::NetworkJson).is_empty());
    }
}
