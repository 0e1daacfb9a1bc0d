// Main library file for the travel quote core

// Export modules for each stage of the quote
pub mod config;
pub mod exchange;
pub mod itinerary;
pub mod parsing;
pub mod places;
pub mod ranking;
pub mod rooms;

// Re-export key types for convenience
pub use config::{ConfigError, FlightRules, HotelRules, PricingRules, QuoteConfig, RoomLimits};
pub use exchange::{ExchangeError, ExchangeRateSource, FixedRate, TrmClient};
pub use itinerary::{FlightLegSummary, FlightSearchPayload, Quote, QuoteError, QuoteRequest, StayDates};
pub use ranking::{
    rank, select_flight, select_hotels, FlightCandidate, FlightLeg, HotelListing, HotelRoomOffer,
    HotelSelection, HotelTier, Ranked, RawFlightListing,
};
pub use rooms::{
    allocate_rooms, AdultsOnlyPolicy, AllocationPolicy, MixedPolicy, PartyComposition,
    RoomAllocation, RoomAllocationStrategy, RoomAssignment, Shortfall,
};
