//! Canonical listing record shared by the adapters, the scoring engine and
//! the store.
//!
//! Serialization uses the legacy camelCase document shape so existing data
//! files and exports round-trip unchanged. Every optional field tolerates
//! absence; the `*_or_default` accessors centralize the fallback values the
//! scoring engine assumes, so defaulting happens in exactly one place.

use serde::{Deserialize, Deserializer, Serialize};

/// Remote-start capability as marketplaces and owners describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStart {
    Fob,
    App,
    #[serde(rename = "Fob, App")]
    FobAndApp,
}

impl RemoteStart {
    /// Parse the exact legacy strings; anything else is treated as absent.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Fob" => Some(Self::Fob),
            "App" => Some(Self::App),
            "Fob, App" => Some(Self::FobAndApp),
            _ => None,
        }
    }
}

// Unrecognized remote-start strings in old data files degrade to absent
// instead of failing the whole document.
pub(crate) fn de_remote_start<'de, D>(de: D) -> Result<Option<RemoteStart>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(RemoteStart::parse))
}

/// One vehicle listing in canonical form, however it was extracted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    /// Model year; 0 when the source page never said.
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: String,
    /// Asking price in dollars; 0 when unknown.
    pub price: u32,
    /// Odometer reading in kilometres.
    pub odo: u32,
    /// Rated range in kilometres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<u32>,
    /// Overall length in inches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Trim grade on a 1 (base) to 5 (top) scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_level: Option<u8>,
    /// Proximity grade, 1 (next door) to 10 (far away).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u8>,
    /// Reported damage on a 0 (none) to 5 (severe) scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_pump: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_remote_start"
    )]
    pub remote_start: Option<RemoteStart>,
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    pub dealer: String,
    pub location: String,
    pub url: String,
    /// Hostname-ish tag of the site the listing came from.
    pub source: String,
    #[serde(rename = "isEV")]
    pub is_ev: bool,
}

impl Listing {
    /// Range with the unknown-EV fallback; 0 counts as unknown.
    pub fn range_or_default(&self) -> u32 {
        match self.range {
            Some(r) if r > 0 => r,
            _ => 400,
        }
    }

    /// Length with the compact-car fallback; 0 counts as unknown.
    pub fn length_or_default(&self) -> u32 {
        match self.length {
            Some(l) if l > 0 => l,
            _ => 170,
        }
    }

    /// Trim grade, defaulting to a low-mid 2 and bounded to the 1..=5 scale.
    pub fn trim_level_or_default(&self) -> u8 {
        match self.trim_level {
            Some(t) if t > 0 => t.clamp(1, 5),
            _ => 2,
        }
    }

    /// Proximity grade, defaulting to the middle of the 1..=10 scale.
    pub fn distance_or_default(&self) -> u8 {
        match self.distance {
            Some(d) if d > 0 => d.clamp(1, 10),
            _ => 5,
        }
    }

    /// Damage grade, absent meaning none, bounded to the 0..=5 scale.
    pub fn damage_or_default(&self) -> u8 {
        self.damage.unwrap_or(0).min(5)
    }

    /// Heat pump presence, assumed present unless stated otherwise.
    pub fn heat_pump_or_default(&self) -> bool {
        self.heat_pump.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_absent_and_zero() {
        let mut listing = Listing::default();
        assert_eq!(listing.range_or_default(), 400);
        assert_eq!(listing.length_or_default(), 170);
        assert_eq!(listing.trim_level_or_default(), 2);
        assert_eq!(listing.distance_or_default(), 5);
        assert_eq!(listing.damage_or_default(), 0);
        assert!(listing.heat_pump_or_default());

        listing.range = Some(0);
        listing.length = Some(0);
        assert_eq!(listing.range_or_default(), 400);
        assert_eq!(listing.length_or_default(), 170);

        listing.range = Some(513);
        listing.heat_pump = Some(false);
        assert_eq!(listing.range_or_default(), 513);
        assert!(!listing.heat_pump_or_default());
    }

    #[test]
    fn out_of_scale_grades_are_bounded() {
        let listing = Listing {
            trim_level: Some(9),
            distance: Some(40),
            damage: Some(12),
            ..Listing::default()
        };
        assert_eq!(listing.trim_level_or_default(), 5);
        assert_eq!(listing.distance_or_default(), 10);
        assert_eq!(listing.damage_or_default(), 5);
    }

    #[test]
    fn serializes_with_legacy_field_names() {
        let listing = Listing {
            year: 2023,
            make: "Chevrolet".into(),
            model: "Bolt EUV".into(),
            trim_level: Some(3),
            heat_pump: Some(false),
            remote_start: Some(RemoteStart::FobAndApp),
            is_ev: true,
            ..Listing::default()
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["trimLevel"], 3);
        assert_eq!(json["heatPump"], false);
        assert_eq!(json["remoteStart"], "Fob, App");
        assert_eq!(json["isEV"], true);
        assert!(json.get("range").is_none());
    }

    #[test]
    fn deserializes_partial_documents() {
        let listing: Listing =
            serde_json::from_str(r#"{"year":2022,"make":"Tesla","price":39000}"#).unwrap();
        assert_eq!(listing.year, 2022);
        assert_eq!(listing.price, 39000);
        assert_eq!(listing.model, "");
        assert!(listing.remote_start.is_none());
    }

    #[test]
    fn unknown_remote_start_degrades_to_absent() {
        let listing: Listing = serde_json::from_str(r#"{"remoteStart":"maybe"}"#).unwrap();
        assert!(listing.remote_start.is_none());
        let listing: Listing = serde_json::from_str(r#"{"remoteStart":"App"}"#).unwrap();
        assert_eq!(listing.remote_start, Some(RemoteStart::App));
    }
}
