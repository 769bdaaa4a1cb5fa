use serde::{Deserialize, Serialize};

/// A resolved language/region pair used to parameterize TMDB requests
///
/// `language` is the full tag sent as TMDB's `language` parameter (e.g.
/// "fr-FR"); `region` is the ISO 3166-1 alpha-2 code used for `region` and
/// `watch_region` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub language: String,
    pub region: String,
}

impl Locale {
    pub fn new(language: &str, region: &str) -> Self {
        let region = region.to_ascii_uppercase();
        Self {
            language: format!("{}-{}", language.to_ascii_lowercase(), region),
            region,
        }
    }

    /// Parses a locale tag like "fr-FR", "fr_FR" or "fr"
    ///
    /// A tag without a region part falls back to `default_region`. Returns
    /// `None` for tags whose language subtag is not plausibly ISO 639-1/2.
    pub fn from_tag(tag: &str, default_region: &str) -> Option<Self> {
        let mut parts = tag.trim().splitn(2, ['-', '_']);
        let language = parts.next()?.trim();
        if !(2..=3).contains(&language.len())
            || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }

        let region = parts
            .next()
            .map(str::trim)
            .filter(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()))
            .unwrap_or(default_region);

        Some(Self::new(language, region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_full() {
        let locale = Locale::from_tag("fr-FR", "US").unwrap();
        assert_eq!(locale.language, "fr-FR");
        assert_eq!(locale.region, "FR");
    }

    #[test]
    fn test_from_tag_underscore_separator() {
        let locale = Locale::from_tag("pt_BR", "US").unwrap();
        assert_eq!(locale.language, "pt-BR");
        assert_eq!(locale.region, "BR");
    }

    #[test]
    fn test_from_tag_language_only_uses_default_region() {
        let locale = Locale::from_tag("de", "US").unwrap();
        assert_eq!(locale.language, "de-US");
        assert_eq!(locale.region, "US");
    }

    #[test]
    fn test_from_tag_normalizes_case() {
        let locale = Locale::from_tag("EN-gb", "US").unwrap();
        assert_eq!(locale.language, "en-GB");
        assert_eq!(locale.region, "GB");
    }

    #[test]
    fn test_from_tag_rejects_garbage() {
        assert_eq!(Locale::from_tag("", "US"), None);
        assert_eq!(Locale::from_tag("*", "US"), None);
        assert_eq!(Locale::from_tag("e1-US", "US"), None);
        assert_eq!(Locale::from_tag("english-US", "US"), None);
    }

    #[test]
    fn test_from_tag_bad_region_falls_back() {
        let locale = Locale::from_tag("fr-FRA", "US").unwrap();
        assert_eq!(locale.region, "US");
    }
}
