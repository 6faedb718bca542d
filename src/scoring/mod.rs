//! Weighted multi-criteria scoring over a saved collection.
//!
//! Every car is scored relative to the rest of the collection: the
//! continuous criteria (price, odometer, range, year, length) are min-max
//! normalized against the values present across all saved cars, graded
//! criteria sit on fixed scales, and the boolean-ish ones map to direct
//! factors. The weighted average of the normalized criteria, scaled to
//! 0..=100, is the score. Scores therefore shift whenever the collection
//! does; that is the point, not a bug.
//!
//! The module is pure: no I/O, no clocks, and identical inputs always
//! produce identical output.

use serde::{Deserialize, Serialize};

use crate::listing::{Listing, RemoteStart};

/// Relative importance of each criterion. Absent fields deserialize to 0 so
/// a stored weight set that predates a criterion simply leaves it out of the
/// blend. Only the ratios matter; scaling every weight by the same factor
/// leaves scores unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weights {
    pub price: f64,
    pub odo: f64,
    pub range: f64,
    pub year: f64,
    pub trim_level: f64,
    pub distance: f64,
    pub remote_start: f64,
    pub length: f64,
    pub damage: f64,
    pub heat_pump: f64,
}

impl Weights {
    /// The stock weight set: price dominates, comfort features trail.
    pub fn standard() -> Self {
        Self {
            price: 35.0,
            odo: 16.0,
            range: 12.0,
            year: 10.0,
            trim_level: 10.0,
            distance: 10.0,
            remote_start: 10.0,
            length: 10.0,
            damage: 5.0,
            heat_pump: 5.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.price
            + self.odo
            + self.range
            + self.year
            + self.trim_level
            + self.distance
            + self.remote_start
            + self.length
            + self.damage
            + self.heat_pump
    }
}

/// Running min/max of the values a criterion actually has in the collection.
/// Stays empty when no car contributed a usable value.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    bounds: Option<(f64, f64)>,
}

impl Extent {
    fn push(&mut self, value: f64) {
        self.bounds = match self.bounds {
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            None => Some((value, value)),
        };
    }

    /// Position of `value` within the observed spread. A collection where
    /// every car agrees (or where no car had a usable value) gives the best
    /// mark for inverted criteria and the midpoint otherwise, since there is
    /// no spread to place the car on.
    fn normalize(&self, value: f64, invert: bool) -> f64 {
        match self.bounds {
            Some((min, max)) if max > min => {
                let norm = (value - min) / (max - min);
                let norm = if invert { 1.0 - norm } else { norm };
                norm.clamp(0.0, 1.0)
            }
            _ => {
                if invert {
                    1.0
                } else {
                    0.5
                }
            }
        }
    }
}

/// Collection-wide normalization bounds. Non-positive prices and years are
/// placeholders for "unknown" and never widen the spread.
#[derive(Debug, Clone, Copy, Default)]
struct Pools {
    price: Extent,
    odo: Extent,
    range: Extent,
    year: Extent,
    length: Extent,
}

impl Pools {
    fn add(&mut self, car: &Listing) {
        if car.price > 0 {
            self.price.push(f64::from(car.price));
        }
        self.odo.push(f64::from(car.odo));
        self.range.push(f64::from(car.range_or_default()));
        if car.year > 0 {
            self.year.push(f64::from(car.year));
        }
        self.length.push(f64::from(car.length_or_default()));
    }
}

fn normalize_fixed(value: f64, min: f64, max: f64, invert: bool) -> f64 {
    let norm = (value - min) / (max - min);
    let norm = if invert { 1.0 - norm } else { norm };
    norm.clamp(0.0, 1.0)
}

fn remote_start_factor(remote_start: Option<RemoteStart>) -> f64 {
    match remote_start {
        Some(RemoteStart::FobAndApp) => 1.0,
        Some(RemoteStart::App) => 0.7,
        Some(RemoteStart::Fob) => 0.5,
        None => 0.0,
    }
}

fn score_against(pools: &Pools, weights: &Weights, car: &Listing) -> u8 {
    let total = weights.total();
    if total <= 0.0 {
        return 0;
    }

    let price = pools.price.normalize(f64::from(car.price), true);
    let odo = pools.odo.normalize(f64::from(car.odo), true);
    let range = pools.range.normalize(f64::from(car.range_or_default()), false);
    let year = pools.year.normalize(f64::from(car.year), false);
    let length = pools.length.normalize(f64::from(car.length_or_default()), true);
    let trim_level = normalize_fixed(f64::from(car.trim_level_or_default()), 1.0, 5.0, false);
    let distance = normalize_fixed(f64::from(car.distance_or_default()), 1.0, 10.0, true);
    let damage = normalize_fixed(f64::from(car.damage_or_default()), 0.0, 5.0, true);
    let heat_pump = if car.heat_pump_or_default() { 1.0 } else { 0.0 };
    let remote_start = remote_start_factor(car.remote_start);

    let weighted = price * weights.price
        + odo * weights.odo
        + range * weights.range
        + year * weights.year
        + trim_level * weights.trim_level
        + distance * weights.distance
        + remote_start * weights.remote_start
        + length * weights.length
        + damage * weights.damage
        + heat_pump * weights.heat_pump;

    ((weighted / total).clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Score one car against a collection. An empty collection (or a weight set
/// summing to nothing) scores 0.
pub fn score<'a, C>(collection: C, weights: &Weights, target: &Listing) -> u8
where
    C: IntoIterator<Item = &'a Listing>,
{
    let mut pools = Pools::default();
    let mut any = false;
    for car in collection {
        pools.add(car);
        any = true;
    }
    if !any {
        return 0;
    }
    score_against(&pools, weights, target)
}

/// Score every car in the collection and return `(index, score)` pairs in
/// descending score order. The sort is stable, so equal scores keep their
/// collection order.
pub fn rank(collection: &[Listing], weights: &Weights) -> Vec<(usize, u8)> {
    if collection.is_empty() {
        return Vec::new();
    }
    let mut pools = Pools::default();
    for car in collection {
        pools.add(car);
    }
    let mut ranked: Vec<(usize, u8)> = collection
        .iter()
        .enumerate()
        .map(|(i, car)| (i, score_against(&pools, weights, car)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(price: u32, odo: u32, year: i32) -> Listing {
        Listing {
            price,
            odo,
            year,
            ..Listing::default()
        }
    }

    #[test]
    fn empty_collection_scores_zero() {
        let empty: Vec<Listing> = Vec::new();
        let weights = Weights::standard();
        assert_eq!(score(&empty, &weights, &Listing::default()), 0);
    }

    #[test]
    fn zero_total_weight_scores_zero() {
        let cars = vec![car(20000, 50000, 2021)];
        assert_eq!(score(&cars, &Weights::default(), &cars[0]), 0);
    }

    #[test]
    fn lone_default_listing_scores_73() {
        // One car, every field at its fallback: price and year pools are
        // empty, range/odo/length collapse to a single value, heat pump is
        // assumed present, remote start is absent.
        let cars = vec![Listing::default()];
        assert_eq!(score(&cars, &Weights::standard(), &cars[0]), 73);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let cars = vec![
            car(0, 0, 0),
            car(5000, 250000, 2015),
            car(62000, 10, 2024),
            Listing {
                price: 30000,
                odo: 40000,
                year: 2022,
                range: Some(488),
                length: Some(182),
                trim_level: Some(5),
                distance: Some(1),
                damage: Some(5),
                heat_pump: Some(false),
                remote_start: Some(RemoteStart::FobAndApp),
                ..Listing::default()
            },
        ];
        let weights = Weights::standard();
        for target in &cars {
            let s = score(&cars, &weights, target);
            assert!(s <= 100, "score {s} out of range");
        }
    }

    #[test]
    fn out_of_pool_target_is_clamped() {
        // The target's unknown price sits below the collection minimum; the
        // inverted criterion saturates at 1 instead of overshooting.
        let cars = vec![car(20000, 0, 2021), car(30000, 0, 2021)];
        let weights = Weights {
            price: 10.0,
            ..Weights::default()
        };
        let target = car(0, 0, 2021);
        assert_eq!(score(&cars, &weights, &target), 100);
    }

    #[test]
    fn scaling_all_weights_changes_nothing() {
        let cars = vec![
            car(18000, 80000, 2019),
            car(35000, 20000, 2023),
            car(27000, 45000, 2021),
        ];
        let standard = Weights::standard();
        let mut tripled = standard;
        tripled.price *= 3.0;
        tripled.odo *= 3.0;
        tripled.range *= 3.0;
        tripled.year *= 3.0;
        tripled.trim_level *= 3.0;
        tripled.distance *= 3.0;
        tripled.remote_start *= 3.0;
        tripled.length *= 3.0;
        tripled.damage *= 3.0;
        tripled.heat_pump *= 3.0;
        for target in &cars {
            assert_eq!(
                score(&cars, &standard, target),
                score(&cars, &tripled, target)
            );
        }
    }

    #[test]
    fn cheaper_car_wins_on_price() {
        let cars = vec![car(20000, 50000, 2021), car(30000, 50000, 2021)];
        let weights = Weights::standard();
        assert!(score(&cars, &weights, &cars[0]) > score(&cars, &weights, &cars[1]));
    }

    #[test]
    fn higher_odometer_loses() {
        let cars = vec![car(25000, 20000, 2021), car(25000, 120000, 2021)];
        let weights = Weights::standard();
        assert!(score(&cars, &weights, &cars[0]) > score(&cars, &weights, &cars[1]));
    }

    #[test]
    fn year_spread_normalizes_linearly() {
        let cars = vec![car(0, 0, 2020), car(0, 0, 2021), car(0, 0, 2022)];
        let weights = Weights {
            year: 10.0,
            ..Weights::default()
        };
        assert_eq!(score(&cars, &weights, &cars[0]), 0);
        assert_eq!(score(&cars, &weights, &cars[1]), 50);
        assert_eq!(score(&cars, &weights, &cars[2]), 100);
    }

    #[test]
    fn unknown_year_never_widens_the_pool() {
        // The degraded year 0 must not stretch normalization down to zero.
        let cars = vec![car(0, 0, 2020), car(0, 0, 2022), car(0, 0, 0)];
        let weights = Weights {
            year: 10.0,
            ..Weights::default()
        };
        assert_eq!(score(&cars, &weights, &cars[0]), 0);
        assert_eq!(score(&cars, &weights, &cars[1]), 100);
        assert_eq!(score(&cars, &weights, &cars[2]), 0);
    }

    #[test]
    fn remote_start_factors_are_graded() {
        let base = Listing::default();
        let with = |rs: Option<RemoteStart>| Listing {
            remote_start: rs,
            ..base.clone()
        };
        let cars = vec![
            with(Some(RemoteStart::FobAndApp)),
            with(Some(RemoteStart::App)),
            with(Some(RemoteStart::Fob)),
            with(None),
        ];
        let weights = Weights {
            remote_start: 10.0,
            ..Weights::default()
        };
        let scores: Vec<u8> = cars.iter().map(|c| score(&cars, &weights, c)).collect();
        assert_eq!(scores, vec![100, 70, 50, 0]);
    }

    #[test]
    fn identical_cars_tie() {
        let cars = vec![car(25000, 30000, 2022), car(25000, 30000, 2022)];
        let weights = Weights::standard();
        assert_eq!(
            score(&cars, &weights, &cars[0]),
            score(&cars, &weights, &cars[1])
        );
    }

    #[test]
    fn rank_sorts_descending_and_keeps_ties_stable() {
        let cars = vec![
            car(30000, 50000, 2021),
            car(20000, 50000, 2021),
            car(30000, 50000, 2021),
        ];
        let ranked = rank(&cars, &Weights::standard());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 1);
        // The two identical cars tie and keep collection order.
        assert_eq!(ranked[1].0, 0);
        assert_eq!(ranked[2].0, 2);
        assert!(ranked[0].1 >= ranked[1].1);
        assert_eq!(rank(&[], &Weights::standard()), Vec::new());
    }

    #[test]
    fn weights_deserialize_with_gaps_and_strays() {
        let weights: Weights = serde_json::from_str(r#"{"price":50,"turboBoost":99}"#).unwrap();
        assert_eq!(weights.price, 50.0);
        assert_eq!(weights.odo, 0.0);
        assert_eq!(weights.total(), 50.0);
    }

    #[test]
    fn weights_serialize_camel_case() {
        let json = serde_json::to_value(Weights::standard()).unwrap();
        assert_eq!(json["trimLevel"], 10.0);
        assert_eq!(json["remoteStart"], 10.0);
        assert_eq!(json["heatPump"], 5.0);
    }
}
