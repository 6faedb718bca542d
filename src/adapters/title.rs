//! Catalog-assisted listing-title parsing.
//!
//! Marketplace titles follow a loose "2023 Chevrolet Bolt EUV LT" shape.
//! The year and make come off the front; the remainder is split into model
//! and trim with the catalog's help, falling back to a positional guess for
//! vehicles the catalog does not know. Titles that do not open with a year
//! (dealer prefixes, ad copy) parse to an all-empty result rather than a
//! wrong one.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s+(\w+)\s+(.+)").expect("valid title pattern"));

/// Parsed pieces of a listing title. `year` 0 with empty strings means the
/// title did not look like a vehicle title at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleParts {
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: String,
}

pub fn parse_title(title: &str) -> TitleParts {
    let Some(caps) = TITLE_RE.captures(title) else {
        return TitleParts::default();
    };
    let year: i32 = caps[1].parse().unwrap_or(0);
    let make = &caps[2];
    let rest = &caps[3];

    // Catalog split: the text after the matched model name is the trim.
    if let Some(matched) = catalog::find_vehicle_match(make, rest)
        && let Some(model) = matched.model
    {
        let rest_lower = rest.to_ascii_lowercase();
        let trim = match rest_lower.find(&model.to_ascii_lowercase()) {
            Some(start) => rest[start + model.len()..].trim().to_string(),
            // The model only matched the short way around ("Bolt" against
            // "Bolt EV"), so the title has nothing left over.
            None => String::new(),
        };
        return TitleParts {
            year,
            make: matched.make.to_string(),
            model: model.to_string(),
            trim,
        };
    }

    // Unknown vehicle: first two words are the model, the rest is the trim.
    let words: Vec<&str> = rest.split(' ').collect();
    let model = words.iter().take(2).copied().collect::<Vec<_>>().join(" ");
    let trim = words.iter().skip(2).copied().collect::<Vec<_>>().join(" ");
    TitleParts {
        year,
        make: make.to_string(),
        model,
        trim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_known_vehicle_with_trim() {
        let parts = parse_title("2023 Chevrolet Bolt EUV LT");
        assert_eq!(parts.year, 2023);
        assert_eq!(parts.make, "Chevrolet");
        assert_eq!(parts.model, "Bolt EUV");
        assert_eq!(parts.trim, "LT");
    }

    #[test]
    fn multi_word_trim_survives() {
        let parts = parse_title("2022 Tesla Model 3 Long Range");
        assert_eq!(parts.model, "Model 3");
        assert_eq!(parts.trim, "Long Range");
    }

    #[test]
    fn prefixed_titles_degrade_to_empty() {
        let parts = parse_title("Used 2021 Nissan Leaf");
        assert_eq!(parts, TitleParts::default());
        assert_eq!(parse_title("Great deal!"), TitleParts::default());
        assert_eq!(parse_title(""), TitleParts::default());
    }

    #[test]
    fn hyphenated_make_never_matches_the_pattern() {
        // "\w+" cannot span the hyphen, so the whole title is rejected.
        let parts = parse_title("2023 Mercedes-Benz EQE 350+");
        assert_eq!(parts, TitleParts::default());
    }

    #[test]
    fn catalog_canonicalizes_casing() {
        let parts = parse_title("2023 CHEVROLET bolt euv premier");
        assert_eq!(parts.make, "Chevrolet");
        assert_eq!(parts.model, "Bolt EUV");
        assert_eq!(parts.trim, "premier");
    }

    #[test]
    fn short_title_matches_catalog_model_with_no_trim() {
        // "Bolt" is a substring of the catalog's "Bolt EV".
        let parts = parse_title("2023 Chevrolet Bolt");
        assert_eq!(parts.model, "Bolt EV");
        assert_eq!(parts.trim, "");
    }

    #[test]
    fn unknown_vehicle_takes_positional_guess() {
        let parts = parse_title("2019 Toyota Corolla LE Premium Package");
        assert_eq!(parts.year, 2019);
        assert_eq!(parts.make, "Toyota");
        assert_eq!(parts.model, "Corolla LE");
        assert_eq!(parts.trim, "Premium Package");

        let parts = parse_title("2024 Honda Civic");
        assert_eq!(parts.model, "Civic");
        assert_eq!(parts.trim, "");
    }
}
