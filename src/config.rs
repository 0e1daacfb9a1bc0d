// Quote configuration: room limits, flight and hotel rules, pricing constants

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    InvalidFormat(String),
}

// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub rooms: RoomLimits,
    pub flights: FlightRules,
    pub hotels: HotelRules,
    pub pricing: PricingRules,
    pub exchange: ExchangeConfig,
}

impl QuoteConfig {
    /// Loads a JSON config file. Missing sections and fields keep their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: QuoteConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rooms = &self.rooms;
        if rooms.room_capacity == 0 || rooms.max_rooms == 0 {
            return Err(ConfigError::InvalidFormat(
                "room_capacity and max_rooms must be positive".to_string(),
            ));
        }
        if rooms.max_adults_per_room == 0 || rooms.max_adults_per_room >= rooms.room_capacity {
            return Err(ConfigError::InvalidFormat(format!(
                "max_adults_per_room must be in 1..{}",
                rooms.room_capacity
            )));
        }
        if self.hotels.adults_only_marker.trim().is_empty() {
            return Err(ConfigError::InvalidFormat(
                "adults_only_marker must not be empty".to_string(),
            ));
        }
        if self.flights.outbound_earliest_hour >= self.flights.outbound_latest_hour {
            return Err(ConfigError::InvalidFormat(
                "outbound departure window is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capacity limits used by both room allocation policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomLimits {
    /// Adults per room for an even party; an odd party gets one more.
    pub max_adults_per_room: u32,
    pub max_children_per_room: u32,
    pub room_capacity: u32,
    pub max_rooms: usize,
    /// Age used when fewer ages than children were supplied.
    pub default_child_age: u8,
    /// Oldest age that still travels as a child; older ones count as adults.
    pub max_child_age: u8,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            max_adults_per_room: 2,
            max_children_per_room: 3,
            room_capacity: 4,
            max_rooms: 4,
            default_child_age: 5,
            max_child_age: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightRules {
    pub outbound_earliest_hour: u32,
    /// Exclusive upper bound of the outbound window.
    pub outbound_latest_hour: u32,
    /// Return flights depart at or after this hour.
    pub return_earliest_hour: u32,
    pub max_duration_minutes: u32,
}

impl Default for FlightRules {
    fn default() -> Self {
        Self {
            outbound_earliest_hour: 5,
            outbound_latest_hour: 12,
            return_earliest_hour: 12,
            max_duration_minutes: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelRules {
    pub all_inclusive_limit: usize,
    pub additional_hotels: usize,
    pub adults_only_marker: String,
}

impl Default for HotelRules {
    fn default() -> Self {
        Self {
            all_inclusive_limit: 10,
            additional_hotels: 2,
            adults_only_marker: "adults only".to_string(),
        }
    }
}

// Assistance insurance: daily_usd * persons * nights * trm * markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingRules {
    pub assistance_daily_usd: f64,
    pub assistance_markup: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            assistance_daily_usd: 1.2,
            assistance_markup: 1.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub trm_endpoint: String,
    pub fallback_rate: f64,
    pub timeout_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            trm_endpoint: "https://trm-colombia.vercel.app/".to_string(),
            fallback_rate: 1.0,
            timeout_ms: 5000,
        }
    }
}
