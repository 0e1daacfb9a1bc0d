// Flight search payload and quote assembly.
//
// The flight half of the pipeline writes a `FlightSearchPayload` to disk; the
// hotel half reads it back and combines it with the ranked hotels into a
// `Quote` whose field names match the PDF template.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PricingRules;
use crate::parsing::{format_cop, format_cop_amount, parse_price};
use crate::ranking::{FlightCandidate, HotelListing, HotelSelection};
use crate::rooms::PartyComposition;

pub const OUTBOUND_LABEL: &str = "Vuelo de ida";
pub const RETURN_LABEL: &str = "Vuelo de regreso";

const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";
const SITE_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("No hotel available for the base quote")]
    NoBaseHotel,
}

impl From<serde_json::Error> for QuoteError {
    fn from(e: serde_json::Error) -> Self {
        QuoteError::JsonParseError(e.to_string())
    }
}

// One flight leg as the template shows it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLegSummary {
    pub fecha: String,
    pub aerolinea: String,
    pub salida: String,
    pub llegada: String,
    pub duracion: String,
    pub tipo: String,
}

impl FlightLegSummary {
    pub fn from_candidate(date: &str, flight: &FlightCandidate) -> Self {
        Self {
            fecha: date.to_string(),
            aerolinea: flight.airline.clone(),
            salida: flight.departure_time_raw.clone(),
            llegada: flight.arrival_time_raw.clone(),
            duracion: flight.formatted_duration(),
            tipo: flight.kind_label().to_string(),
        }
    }

    pub fn summary_line(&self, label: &str) -> String {
        format!(
            "{}: {} - Aerolínea: {} - Salida: {} Llegada: {} - Duración: {} - Tipo: {}\n",
            label, self.fecha, self.aerolinea, self.salida, self.llegada, self.duracion, self.tipo
        )
    }

    /// Reads a leg back out of a summary text. A missing line gives an
    /// empty leg.
    pub fn from_summary(text: &str, label: &str) -> Self {
        let pattern = format!(
            r"(?i){}:\s*(.*?)\s+-\s+Aerolínea:\s*(.*?)\s+-\s+Salida:\s*(.*?)\s+Llegada:\s*(.*?)\s+-\s+Duración:\s*(.*?)\s+-\s+Tipo:\s*([^\n]*)",
            regex::escape(label)
        );
        let Ok(re) = Regex::new(&pattern) else {
            return Self::default();
        };
        let Some(caps) = re.captures(text) else {
            return Self::default();
        };
        let field = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };

        Self {
            fecha: field(1),
            aerolinea: field(2),
            salida: field(3),
            llegada: field(4),
            duracion: field(5),
            tipo: field(6),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Interchange file written after the flight search.
///
/// Field names and order are part of the contract with the quote step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSearchPayload {
    pub resumen: String,
    pub precio: Option<String>,
    pub ida: Option<FlightLegSummary>,
    pub regreso: Option<FlightLegSummary>,
}

static PRICE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Precio:\s*(.*)$").expect("price line pattern"));

impl FlightSearchPayload {
    /// The return fare is the round-trip price shown by the flight site, so
    /// `precio` is only set when a return flight was chosen.
    pub fn from_selection(
        outbound: Option<&FlightCandidate>,
        inbound: Option<&FlightCandidate>,
        departure_date: &str,
        return_date: &str,
    ) -> Self {
        let ida = outbound.map(|f| FlightLegSummary::from_candidate(departure_date, f));
        let regreso = inbound.map(|f| FlightLegSummary::from_candidate(return_date, f));
        let precio = inbound
            .map(|f| f.price_raw.trim().to_string())
            .filter(|p| !p.is_empty());

        let mut resumen = String::new();
        if let Some(leg) = &ida {
            resumen.push_str(&leg.summary_line(OUTBOUND_LABEL));
        }
        if let Some(leg) = &regreso {
            resumen.push_str(&leg.summary_line(RETURN_LABEL));
        }
        if let Some(p) = &precio {
            resumen.push_str(&format!("Precio: {}", p));
        }

        Self {
            resumen,
            precio,
            ida,
            regreso,
        }
    }

    pub fn to_json(&self) -> Result<String, QuoteError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, QuoteError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), QuoteError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "flight payload written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuoteError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Numeric fare; falls back to the `Precio:` summary line, then to 0.
    pub fn flight_price(&self) -> u64 {
        match &self.precio {
            Some(p) => parse_price(p),
            None => PRICE_LINE_RE
                .captures(&self.resumen)
                .and_then(|c| c.get(1))
                .map_or(0, |m| parse_price(m.as_str())),
        }
    }

    pub fn outbound_leg(&self) -> FlightLegSummary {
        FlightLegSummary::from_summary(&self.resumen, OUTBOUND_LABEL)
    }

    pub fn return_leg(&self) -> FlightLegSummary {
        FlightLegSummary::from_summary(&self.resumen, RETURN_LABEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayDates {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayDates {
    /// Parses `YYYY-MM-DD` dates. Check-out must fall after check-in.
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, QuoteError> {
        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw.trim(), INPUT_DATE_FORMAT)
                .map_err(|e| QuoteError::InvalidDate(format!("{raw}: {e}")))
        };
        let stay = Self {
            check_in: parse(check_in)?,
            check_out: parse(check_out)?,
        };
        if stay.check_out <= stay.check_in {
            return Err(QuoteError::InvalidDate(format!(
                "check-out {} is not after check-in {}",
                check_out, check_in
            )));
        }
        Ok(stay)
    }

    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }

    pub fn check_in_site(&self) -> String {
        self.check_in.format(SITE_DATE_FORMAT).to_string()
    }

    pub fn check_out_site(&self) -> String {
        self.check_out.format(SITE_DATE_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceBreakdown {
    pub per_person: f64,
    pub total: f64,
    pub assistance: f64,
    pub total_with_assistance: f64,
}

impl PriceBreakdown {
    pub fn compute(
        per_person: f64,
        persons: u32,
        nights: u32,
        trm: f64,
        rules: &PricingRules,
    ) -> Self {
        let total = per_person * persons as f64;
        let assistance =
            rules.assistance_daily_usd * persons as f64 * nights as f64 * trm * rules.assistance_markup;
        Self {
            per_person,
            total,
            assistance,
            total_with_assistance: total + assistance,
        }
    }
}

// Search inputs the quote is built for
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub party: PartyComposition,
    pub origin: String,
    pub destination: String,
    pub stay: StayDates,
    pub trm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomQuote {
    #[serde(rename = "habitacion")]
    pub room: String,
    #[serde(rename = "plan")]
    pub meal_plan: String,
    #[serde(rename = "precio_num")]
    pub price: u64,
    #[serde(rename = "precio_str")]
    pub price_text: String,
    #[serde(rename = "cancelacion")]
    pub cancellation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelQuote {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "habitaciones")]
    pub rooms: Vec<RoomQuote>,
}

impl From<&HotelListing> for HotelQuote {
    fn from(hotel: &HotelListing) -> Self {
        Self {
            name: hotel.name.clone(),
            rooms: hotel
                .offers
                .iter()
                .map(|o| {
                    let price = o.price_numeric.trunc().max(0.0) as u64;
                    RoomQuote {
                        room: o.room_name.clone(),
                        meal_plan: o.meal_plan.clone(),
                        price,
                        price_text: format_cop(price),
                        cancellation: o.cancellation_policy.clone(),
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteFlights {
    pub ida: FlightLegSummary,
    pub regreso: FlightLegSummary,
    pub precio: String,
}

/// Everything the PDF template needs, under the template's field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    #[serde(rename = "origen")]
    pub origin: String,
    #[serde(rename = "destino")]
    pub destination: String,
    pub checkin: String,
    pub checkout: String,
    #[serde(rename = "adultos")]
    pub adults: u32,
    #[serde(rename = "ninos")]
    pub children: u32,
    #[serde(rename = "noches")]
    pub nights: u32,
    #[serde(rename = "TRM")]
    pub trm: f64,
    pub hotel_base: HotelQuote,
    #[serde(rename = "hoteles_adicionales")]
    pub additional_hotels: Vec<HotelQuote>,
    #[serde(rename = "hoteles_todo_incluido")]
    pub all_inclusive_hotels: Vec<HotelQuote>,
    #[serde(rename = "valor_persona")]
    pub per_person: String,
    #[serde(rename = "valor_total")]
    pub total: String,
    #[serde(rename = "asistencia")]
    pub assistance: String,
    #[serde(rename = "valor_total_con_asistencia")]
    pub total_with_assistance: String,
    #[serde(rename = "contenido_salida")]
    pub flight_summary: String,
    #[serde(rename = "precio_vuelo")]
    pub flight_price: u64,
    #[serde(rename = "precio_vuelo_str")]
    pub flight_price_text: String,
    #[serde(rename = "vuelos")]
    pub flights: QuoteFlights,
    #[serde(skip)]
    pub breakdown: PriceBreakdown,
}

impl Quote {
    /// Combines the saved flight search with the ranked hotels.
    ///
    /// Fails only when the base tier found no hotel; an empty
    /// all-inclusive tier just leaves that section empty.
    pub fn build(
        request: &QuoteRequest,
        flights: &FlightSearchPayload,
        base: &HotelSelection,
        all_inclusive: &HotelSelection,
        pricing: &PricingRules,
    ) -> Result<Self, QuoteError> {
        let primary = base.primary().ok_or(QuoteError::NoBaseHotel)?;
        let per_person = primary
            .first_offer()
            .map(|o| o.price_numeric)
            .ok_or(QuoteError::NoBaseHotel)?;

        let party = &request.party;
        let nights = request.stay.nights();
        let breakdown = PriceBreakdown::compute(
            per_person,
            party.total_guests(),
            nights,
            request.trm,
            pricing,
        );
        debug!(?breakdown, nights, guests = party.total_guests(), "price breakdown");

        let flight_price = flights.flight_price();
        let flight_price_text = format_cop(flight_price);

        Ok(Self {
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            checkin: request.stay.check_in_site(),
            checkout: request.stay.check_out_site(),
            adults: party.adults,
            children: party.children,
            nights,
            trm: request.trm,
            hotel_base: HotelQuote::from(primary),
            additional_hotels: base.alternatives().iter().map(HotelQuote::from).collect(),
            all_inclusive_hotels: all_inclusive.hotels.iter().map(HotelQuote::from).collect(),
            per_person: format_cop_amount(breakdown.per_person),
            total: format_cop_amount(breakdown.total),
            assistance: format_cop_amount(breakdown.assistance),
            total_with_assistance: format_cop_amount(breakdown.total_with_assistance),
            flight_summary: flights.resumen.clone(),
            flight_price,
            flight_price_text: flight_price_text.clone(),
            flights: QuoteFlights {
                ida: flights.outbound_leg(),
                regreso: flights.return_leg(),
                precio: flight_price_text,
            },
            breakdown,
        })
    }
}
