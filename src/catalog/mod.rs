//! Static EV reference catalog.
//!
//! Canadian-market EVs with the spec values the scoring engine cares about
//! (range, length, heat pump) and the trim ladder used to grade trim levels.
//! Declaration order matters: `find_vehicle_match` resolves ambiguous text to
//! the first entry that matches, so the tables are ordered slices rather than
//! maps.

/// Reference data for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleSpecs {
    /// Rated range in kilometres.
    pub range_km: u32,
    /// Overall length in inches.
    pub length_in: u32,
    /// Whether the model ships with a heat pump.
    pub heat_pump: bool,
    /// Trim names from base to top.
    pub trims: &'static [&'static str],
}

pub struct ModelEntry {
    pub name: &'static str,
    pub specs: VehicleSpecs,
}

pub struct MakeEntry {
    pub name: &'static str,
    pub models: &'static [ModelEntry],
}

macro_rules! model {
    ($name:literal, $range:literal, $length:literal, $heat_pump:literal, [$($trim:literal),*]) => {
        ModelEntry {
            name: $name,
            specs: VehicleSpecs {
                range_km: $range,
                length_in: $length,
                heat_pump: $heat_pump,
                trims: &[$($trim),*],
            },
        }
    };
}

pub static CATALOG: &[MakeEntry] = &[
    MakeEntry {
        name: "Chevrolet",
        models: &[
            model!("Bolt EV", 417, 163, false, ["1LT", "2LT", "Premier"]),
            model!("Bolt EUV", 397, 169, false, ["LT", "Premier"]),
            model!("Equinox EV", 513, 184, true, ["1LT", "2LT", "2RS", "3RS"]),
        ],
    },
    MakeEntry {
        name: "Hyundai",
        models: &[
            model!("Kona Electric", 415, 164, true, ["Essential", "Preferred", "Ultimate"]),
            model!("Ioniq 5", 488, 182, true, ["Essential", "Preferred", "Ultimate"]),
            model!("Ioniq 6", 581, 191, true, ["Essential", "Preferred", "Ultimate"]),
        ],
    },
    MakeEntry {
        name: "Kia",
        models: &[
            model!("Niro EV", 407, 171, true, ["EX", "EX+", "SX Touring", "Wind", "Wave"]),
            model!("Soul EV", 391, 165, true, ["Premium", "Limited"]),
            model!("EV6", 499, 184, true, ["Standard", "Long Range", "GT-Line", "GT"]),
        ],
    },
    MakeEntry {
        name: "Nissan",
        models: &[
            model!("Leaf", 342, 176, true, ["S", "SV", "SV Plus", "SL Plus"]),
            model!("Ariya", 482, 182, true, ["Engage", "Venture+", "Evolve+", "Platinum+"]),
        ],
    },
    MakeEntry {
        name: "Tesla",
        models: &[
            model!("Model 3", 438, 185, true, ["Standard Range", "Long Range", "Performance"]),
            model!("Model Y", 455, 187, true, ["Standard Range", "Long Range", "Performance"]),
            model!("Model S", 560, 196, true, ["Long Range", "Plaid"]),
            model!("Model X", 543, 199, true, ["Long Range", "Plaid"]),
        ],
    },
    MakeEntry {
        name: "Ford",
        models: &[
            model!("Mustang Mach-E", 490, 186, true, ["Select", "Premium", "California Route 1", "GT"]),
            model!("F-150 Lightning", 483, 233, true, ["Pro", "XLT", "Lariat", "Platinum"]),
        ],
    },
    MakeEntry {
        name: "Volkswagen",
        models: &[
            model!("ID.4", 443, 181, true, ["Standard", "Pro", "Pro S", "Pro S Plus"]),
            model!("ID.Buzz", 411, 185, true, ["Pro S", "Pro S Plus"]),
        ],
    },
    MakeEntry {
        name: "BMW",
        models: &[
            model!("iX", 520, 195, true, ["xDrive40", "xDrive50", "M60"]),
            model!("i4", 484, 188, true, ["eDrive35", "eDrive40", "M50"]),
            model!("i5", 475, 195, true, ["eDrive40", "M60"]),
        ],
    },
    MakeEntry {
        name: "Mercedes-Benz",
        models: &[
            model!("EQE", 495, 195, true, ["350+", "500 4MATIC"]),
            model!("EQS", 547, 207, true, ["450+", "580 4MATIC"]),
        ],
    },
    MakeEntry {
        name: "Polestar",
        models: &[
            model!("Polestar 2", 435, 181, true, ["Single Motor", "Long Range", "Dual Motor"]),
        ],
    },
    MakeEntry {
        name: "Rivian",
        models: &[
            model!("R1T", 505, 217, true, ["Adventure", "Launch Edition"]),
            model!("R1S", 505, 200, true, ["Adventure", "Launch Edition"]),
        ],
    },
];

/// Substrings that flag a listing as probably electric. Checked lowercase;
/// short entries like "ev" and "ix" do produce occasional false positives on
/// marketing copy, which downstream callers tolerate.
pub static EV_KEYWORDS: &[&str] = &[
    "electric",
    "ev",
    "bev",
    "battery",
    "zero emission",
    "bolt",
    "leaf",
    "model 3",
    "model y",
    "model s",
    "model x",
    "ioniq",
    "kona electric",
    "niro ev",
    "ev6",
    "id.4",
    "id.buzz",
    "mach-e",
    "mustang mach-e",
    "f-150 lightning",
    "lightning",
    "polestar",
    "rivian",
    "r1t",
    "r1s",
    "ariya",
    "eqe",
    "eqs",
    "i4",
    "ix",
    "i5",
    "equinox ev",
];

/// True when any EV keyword occurs in `text`, case-insensitively.
pub fn is_likely_ev(text: &str) -> bool {
    let lower = text.to_lowercase();
    EV_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Result of fuzzy-matching free text against the catalog. A recognized make
/// with no recognizable model still yields a match, with `model` and `specs`
/// left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub make: &'static str,
    pub model: Option<&'static str>,
    pub specs: Option<&'static VehicleSpecs>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(needle.to_lowercase().as_str())
}

/// Case-insensitive bidirectional substring match: either side containing the
/// other counts, so "Bolt" finds "Bolt EV" and "Bolt EUV Premier" finds
/// "Bolt EUV".
fn fuzzy_eq(catalog_name: &str, text: &str) -> bool {
    contains_ci(text, catalog_name) || contains_ci(catalog_name, text)
}

/// Resolve free-form make/model text against the catalog. First match in
/// declaration order wins on both levels.
pub fn find_vehicle_match(make_text: &str, model_text: &str) -> Option<CatalogMatch> {
    let entry = CATALOG.iter().find(|m| fuzzy_eq(m.name, make_text))?;
    match entry.models.iter().find(|m| fuzzy_eq(m.name, model_text)) {
        Some(model) => Some(CatalogMatch {
            make: entry.name,
            model: Some(model.name),
            specs: Some(&model.specs),
        }),
        None => Some(CatalogMatch {
            make: entry.name,
            model: None,
            specs: None,
        }),
    }
}

/// Exact-name spec lookup.
pub fn vehicle_specs(make: &str, model: &str) -> Option<&'static VehicleSpecs> {
    CATALOG
        .iter()
        .find(|m| m.name == make)?
        .models
        .iter()
        .find(|m| m.name == model)
        .map(|m| &m.specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection_is_case_insensitive() {
        assert!(is_likely_ev("2023 Chevrolet BOLT EUV"));
        assert!(is_likely_ev("Nissan Leaf SV Plus"));
        assert!(is_likely_ev("zero emission vehicle"));
        assert!(!is_likely_ev("2019 Honda Civic LX"));
    }

    #[test]
    fn keyword_detection_accepts_known_false_positives() {
        // "ev" is matched as a bare substring.
        assert!(is_likely_ev("Range Rover Evoque"));
        assert!(is_likely_ev("great deal on evaluation units"));
    }

    #[test]
    fn exact_match_resolves_specs() {
        let m = find_vehicle_match("Chevrolet", "Bolt EUV").unwrap();
        assert_eq!(m.make, "Chevrolet");
        assert_eq!(m.model, Some("Bolt EUV"));
        assert_eq!(m.specs.unwrap().range_km, 397);
    }

    #[test]
    fn match_is_bidirectional() {
        // Text shorter than the catalog name.
        let m = find_vehicle_match("Chev", "Bolt").unwrap();
        assert_eq!(m.make, "Chevrolet");
        assert_eq!(m.model, Some("Bolt EV"));
        // Text longer than the catalog name.
        let m = find_vehicle_match("Tesla Motors", "Model 3 Long Range").unwrap();
        assert_eq!(m.model, Some("Model 3"));
    }

    #[test]
    fn ambiguous_text_takes_first_catalog_entry() {
        // "Ioniq" is contained in both "Ioniq 5" and "Ioniq 6".
        let m = find_vehicle_match("Hyundai", "Ioniq").unwrap();
        assert_eq!(m.model, Some("Ioniq 5"));
    }

    #[test]
    fn unknown_model_still_reports_make() {
        let m = find_vehicle_match("Kia", "Sportage").unwrap();
        assert_eq!(m.make, "Kia");
        assert_eq!(m.model, None);
        assert!(m.specs.is_none());
    }

    #[test]
    fn unknown_make_yields_nothing() {
        assert!(find_vehicle_match("Toyota", "Prius").is_none());
    }

    #[test]
    fn spec_lookup_is_exact() {
        assert_eq!(vehicle_specs("Tesla", "Model Y").unwrap().length_in, 187);
        assert!(vehicle_specs("tesla", "Model Y").is_none());
        assert!(vehicle_specs("Tesla", "Model Z").is_none());
    }
}
