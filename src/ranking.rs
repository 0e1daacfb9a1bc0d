// Candidate ranking for scraped flights and hotels.
//
// Every selection is the same shape: drop candidates that break a business
// rule, stable-sort the rest, take the head. An empty result means "not
// found" and is never an error.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FlightRules, HotelRules};
use crate::parsing::{
    format_duration, is_direct_flight, parse_clock_time, parse_duration_minutes, parse_price,
};

/// Candidates that passed the filter, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    items: Vec<T>,
}

impl<T> Ranked<T> {
    pub fn best(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_best(self) -> Option<T> {
        self.items.into_iter().next()
    }

    pub fn runner_ups(&self) -> &[T] {
        self.items.get(1..).unwrap_or(&[])
    }

    pub fn top(&self, n: usize) -> &[T] {
        &self.items[..n.min(self.items.len())]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Filters with `keep`, then sorts stably by `order`. Candidates that
/// compare equal stay in input order.
pub fn rank<T, I, P, C>(candidates: I, mut keep: P, order: C) -> Ranked<T>
where
    I: IntoIterator<Item = T>,
    P: FnMut(&T) -> bool,
    C: FnMut(&T, &T) -> Ordering,
{
    let mut items: Vec<T> = candidates.into_iter().filter(|c| keep(c)).collect();
    items.sort_by(order);
    Ranked { items }
}

// One scraped row from the flight results page, as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFlightListing {
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub price: String,
    pub flight_type: String,
    pub card_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightCandidate {
    pub airline: String,
    pub departure_time_raw: String,
    pub arrival_time_raw: String,
    pub departure_time: NaiveTime,
    pub duration_minutes: u32,
    pub price_raw: String,
    pub price_numeric: u64,
    pub is_direct: bool,
}

impl FlightCandidate {
    /// Normalizes a scraped row. Rows whose departure time cannot be read
    /// are skipped (`None`); every other field falls back to a sentinel.
    pub fn from_listing(listing: &RawFlightListing) -> Option<Self> {
        let departure_time = parse_clock_time(&listing.departure_time)?;
        Some(Self {
            airline: listing.airline.trim().to_string(),
            departure_time_raw: listing.departure_time.clone(),
            arrival_time_raw: listing.arrival_time.clone(),
            departure_time,
            duration_minutes: parse_duration_minutes(&listing.duration),
            price_raw: listing.price.clone(),
            price_numeric: parse_price(&listing.price),
            is_direct: is_direct_flight(&listing.flight_type, &listing.card_text),
        })
    }

    pub fn departure_hour(&self) -> u32 {
        self.departure_time.hour()
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_minutes)
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_direct {
            "Directo"
        } else {
            "Con escala"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightLeg {
    Outbound,
    Return,
}

impl FlightLeg {
    pub fn departs_in_window(&self, departure: NaiveTime, rules: &FlightRules) -> bool {
        let hour = departure.hour();
        match self {
            FlightLeg::Outbound => {
                hour >= rules.outbound_earliest_hour && hour < rules.outbound_latest_hour
            }
            FlightLeg::Return => hour >= rules.return_earliest_hour,
        }
    }

    pub fn accepts(&self, candidate: &FlightCandidate, rules: &FlightRules) -> bool {
        self.departs_in_window(candidate.departure_time, rules)
            && candidate.duration_minutes <= rules.max_duration_minutes
    }
}

// Cheapest first, then shortest
pub fn flight_order(a: &FlightCandidate, b: &FlightCandidate) -> Ordering {
    a.price_numeric
        .cmp(&b.price_numeric)
        .then(a.duration_minutes.cmp(&b.duration_minutes))
}

pub fn candidates_from_listings(listings: &[RawFlightListing]) -> Vec<FlightCandidate> {
    listings
        .iter()
        .filter_map(|listing| {
            let candidate = FlightCandidate::from_listing(listing);
            if candidate.is_none() {
                debug!(
                    airline = %listing.airline,
                    departure = %listing.departure_time,
                    "skipping flight with unreadable departure time"
                );
            }
            candidate
        })
        .collect()
}

pub fn rank_flight_candidates(
    candidates: Vec<FlightCandidate>,
    leg: FlightLeg,
    rules: &FlightRules,
) -> Ranked<FlightCandidate> {
    let total = candidates.len();
    let ranked = rank(candidates, |c| leg.accepts(c, rules), flight_order);
    debug!(?leg, total, kept = ranked.len(), "flights ranked");
    ranked
}

pub fn rank_flights(
    listings: &[RawFlightListing],
    leg: FlightLeg,
    rules: &FlightRules,
) -> Ranked<FlightCandidate> {
    rank_flight_candidates(candidates_from_listings(listings), leg, rules)
}

/// Best flight for the leg, or `None` when nothing passes the filters.
pub fn select_flight(
    listings: &[RawFlightListing],
    leg: FlightLeg,
    rules: &FlightRules,
) -> Option<FlightCandidate> {
    rank_flights(listings, leg, rules).into_best()
}

const UNSPECIFIED_CANCELLATION: &str = "No especificada";

fn default_cancellation() -> String {
    UNSPECIFIED_CANCELLATION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRoomOffer {
    pub room_name: String,
    pub meal_plan: String,
    pub price_numeric: f64,
    #[serde(default = "default_cancellation")]
    pub cancellation_policy: String,
}

impl HotelRoomOffer {
    pub fn from_scraped(
        room_name: &str,
        meal_plan: &str,
        price_text: &str,
        cancellation: Option<&str>,
    ) -> Self {
        Self {
            room_name: room_name.trim().to_string(),
            meal_plan: meal_plan.trim().to_string(),
            price_numeric: parse_price(price_text) as f64,
            cancellation_policy: cancellation
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_cancellation),
        }
    }
}

// A property from the results page with the room offers read from its detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelListing {
    pub name: String,
    #[serde(default)]
    pub offers: Vec<HotelRoomOffer>,
}

impl HotelListing {
    pub fn new(name: impl Into<String>, offers: Vec<HotelRoomOffer>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            offers,
        }
    }

    pub fn first_offer(&self) -> Option<&HotelRoomOffer> {
        self.offers.first()
    }

    pub fn is_adults_only(&self, marker: &str) -> bool {
        self.name.to_lowercase().contains(&marker.to_lowercase())
    }

    fn first_price(&self) -> f64 {
        self.first_offer().map_or(f64::INFINITY, |o| o.price_numeric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelTier {
    /// Breakfast-included search: a primary hotel plus a few alternatives.
    Base,
    /// All-inclusive search: a price-ordered list, one offer per hotel.
    AllInclusive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelSelection {
    pub tier: HotelTier,
    pub hotels: Vec<HotelListing>,
}

impl HotelSelection {
    pub fn primary(&self) -> Option<&HotelListing> {
        self.hotels.first()
    }

    pub fn alternatives(&self) -> &[HotelListing] {
        self.hotels.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }
}

pub fn hotel_order(a: &HotelListing, b: &HotelListing) -> Ordering {
    a.first_price().total_cmp(&b.first_price())
}

/// Ranks hotels for a tier.
///
/// Properties without offers are dropped, and so are adults-only properties
/// when the party travels with children.
pub fn select_hotels(
    listings: Vec<HotelListing>,
    tier: HotelTier,
    party_has_children: bool,
    rules: &HotelRules,
) -> HotelSelection {
    let total = listings.len();
    let listings = match tier {
        HotelTier::Base => listings,
        HotelTier::AllInclusive => dedupe_by_name(listings),
    };

    let ranked = rank(
        listings,
        |h| {
            if h.offers.is_empty() {
                return false;
            }
            if party_has_children && h.is_adults_only(&rules.adults_only_marker) {
                debug!(hotel = %h.name, "excluded adults-only hotel");
                return false;
            }
            true
        },
        hotel_order,
    );

    let hotels: Vec<HotelListing> = match tier {
        HotelTier::Base => ranked
            .into_vec()
            .into_iter()
            .take(1 + rules.additional_hotels)
            .collect(),
        HotelTier::AllInclusive => ranked
            .into_vec()
            .into_iter()
            .take(rules.all_inclusive_limit)
            .map(|mut h| {
                h.offers.truncate(1);
                h
            })
            .collect(),
    };

    debug!(?tier, total, selected = hotels.len(), "hotels ranked");
    HotelSelection { tier, hotels }
}

// Keeps the first listing seen for each name, compared case-insensitively
fn dedupe_by_name(listings: Vec<HotelListing>) -> Vec<HotelListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|h| seen.insert(h.name.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(airline: &str, departure: &str, duration: &str, price: &str) -> RawFlightListing {
        RawFlightListing {
            airline: airline.to_string(),
            departure_time: departure.to_string(),
            arrival_time: "1:00 p.m.".to_string(),
            duration: duration.to_string(),
            price: price.to_string(),
            flight_type: "Directo".to_string(),
            card_text: String::new(),
        }
    }

    fn offer(price: f64) -> HotelRoomOffer {
        HotelRoomOffer {
            room_name: "Doble".to_string(),
            meal_plan: "Todo incluido".to_string(),
            price_numeric: price,
            cancellation_policy: "Cancelacion gratis".to_string(),
        }
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')], |_| true, |x, y| {
            x.0.cmp(&y.0)
        });
        let order: Vec<char> = ranked.iter().map(|x| x.1).collect();
        assert_eq!(order, vec!['b', 'd', 'a', 'c']);
        assert_eq!(ranked.runner_ups().len(), 3);
        assert_eq!(ranked.top(10).len(), 4);
    }

    #[test]
    fn test_empty_ranking_has_no_best() {
        let ranked = rank(Vec::<u32>::new(), |_| true, |a, b| a.cmp(b));
        assert!(ranked.best().is_none());
        assert!(ranked.runner_ups().is_empty());
    }

    #[test]
    fn test_outbound_window() {
        let rules = FlightRules::default();
        let listings = vec![
            listing("Early", "4:59 a.m.", "1 h", "$100"),
            listing("Dawn", "5:00 a.m.", "1 h", "$300"),
            listing("Late", "11:59 a.m.", "1 h", "$200"),
            listing("Noon", "12:00 p.m.", "1 h", "$50"),
        ];
        let ranked = rank_flights(&listings, FlightLeg::Outbound, &rules);
        let names: Vec<&str> = ranked.iter().map(|c| c.airline.as_str()).collect();
        assert_eq!(names, vec!["Late", "Dawn"]);
    }

    #[test]
    fn test_return_window() {
        let rules = FlightRules::default();
        let listings = vec![
            listing("Morning", "11:30 a.m.", "1 h", "$10"),
            listing("Noon", "12:00 p.m.", "1 h", "$30"),
            listing("Night", "9:15 p.m.", "1 h", "$20"),
        ];
        let ranked = rank_flights(&listings, FlightLeg::Return, &rules);
        let names: Vec<&str> = ranked.iter().map(|c| c.airline.as_str()).collect();
        assert_eq!(names, vec!["Night", "Noon"]);
        assert_eq!(ranked.best().unwrap().departure_hour(), 21);
        assert_eq!(ranked.runner_ups()[0].departure_hour(), 12);

        let best = select_flight(&listings, FlightLeg::Return, &rules).unwrap();
        assert_eq!(best.airline, "Night");
    }

    #[test]
    fn test_duration_limit_and_sentinel() {
        let rules = FlightRules::default();
        let listings = vec![
            listing("Long", "8:00 a.m.", "10 h 1 min", "$1"),
            listing("Unknown", "8:00 a.m.", "??", "$2"),
            listing("Limit", "8:00 a.m.", "10 h", "$3"),
        ];
        let ranked = rank_flights(&listings, FlightLeg::Outbound, &rules);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked.best().unwrap().airline, "Limit");
    }

    #[test]
    fn test_price_then_duration_tie_break() {
        let rules = FlightRules::default();
        let listings = vec![
            listing("Slow", "7:00 a.m.", "3 h", "$500.000"),
            listing("Fast", "8:00 a.m.", "1 h 10 min", "$500.000"),
            listing("Pricey", "9:00 a.m.", "1 h", "$650.000"),
        ];
        let ranked = rank_flights(&listings, FlightLeg::Outbound, &rules);
        let names: Vec<&str> = ranked.iter().map(|c| c.airline.as_str()).collect();
        assert_eq!(names, vec!["Fast", "Slow", "Pricey"]);
    }

    #[test]
    fn test_unreadable_departure_is_skipped() {
        let rules = FlightRules::default();
        let listings = vec![listing("Ghost", "--", "1 h", "$1")];
        assert!(candidates_from_listings(&listings).is_empty());
        assert!(select_flight(&listings, FlightLeg::Outbound, &rules).is_none());
    }

    #[test]
    fn test_candidate_normalization() {
        let mut raw = listing(" Avianca ", "6:10 a.m.", "2 h 5 min", "$1.234.567 COP");
        raw.flight_type = "1 escala".to_string();
        let c = FlightCandidate::from_listing(&raw).unwrap();
        assert_eq!(c.airline, "Avianca");
        assert_eq!(c.price_numeric, 1_234_567);
        assert_eq!(c.duration_minutes, 125);
        assert!(!c.is_direct);
        assert_eq!(c.kind_label(), "Con escala");
        assert_eq!(c.formatted_duration(), "2 horas y 5 minutos");
    }

    #[test]
    fn test_base_tier_excludes_adults_only_with_children() {
        let rules = HotelRules::default();
        let listings = vec![
            HotelListing::new("Breathless Resort Adults Only", vec![offer(100.0)]),
            HotelListing::new("Family Beach", vec![offer(300.0)]),
            HotelListing::new("No Rooms", vec![]),
            HotelListing::new("City Inn", vec![offer(200.0)]),
        ];

        let with_kids = select_hotels(listings.clone(), HotelTier::Base, true, &rules);
        assert_eq!(with_kids.primary().unwrap().name, "City Inn");
        assert_eq!(with_kids.alternatives().len(), 1);

        let adults = select_hotels(listings, HotelTier::Base, false, &rules);
        assert_eq!(adults.primary().unwrap().name, "Breathless Resort Adults Only");
        assert_eq!(adults.hotels.len(), 3);
    }

    #[test]
    fn test_all_inclusive_tier_dedupes_and_limits() {
        let rules = HotelRules::default();
        let mut listings: Vec<HotelListing> = (0..12)
            .map(|i| HotelListing::new(format!("Hotel {}", i), vec![offer(1000.0 - i as f64), offer(1.0)]))
            .collect();
        listings.push(HotelListing::new("HOTEL 11", vec![offer(5.0)]));

        let selection = select_hotels(listings, HotelTier::AllInclusive, false, &rules);
        assert_eq!(selection.hotels.len(), 10);
        assert_eq!(selection.primary().unwrap().name, "Hotel 11");
        assert!(selection.hotels.iter().all(|h| h.offers.len() == 1));
        assert_eq!(selection.hotels[9].name, "Hotel 2");
    }

    #[test]
    fn test_offer_from_scraped_text() {
        let o = HotelRoomOffer::from_scraped(" Suite ", "Todo incluido", "$2.345.000 COP", None);
        assert_eq!(o.room_name, "Suite");
        assert_eq!(o.price_numeric, 2_345_000.0);
        assert_eq!(o.cancellation_policy, "No especificada");
    }
}
