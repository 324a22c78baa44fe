//! Locale handling for the persona widget.

/// Map a host locale to the language code the persona widget accepts.
///
/// The widget only ships a base French translation, so `fr-CA` is sent as
/// `fr`. Every other locale is passed through unchanged.
pub fn persona_language_alias(locale: &str) -> String {
    match locale {
        "fr-CA" => "fr".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canadian_french_maps_to_base_language() {
        assert_eq!(persona_language_alias("fr-CA"), "fr");
    }

    #[test]
    fn other_locales_pass_through() {
        assert_eq!(persona_language_alias("en-US"), "en-US");
        assert_eq!(persona_language_alias("fr"), "fr");
    }
}
