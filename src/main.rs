//! travel-quote - command-line driver for the quote core.
//!
//! The scraping side hands over its results as JSON files; this binary runs
//! room allocation, flight and hotel ranking, and quote assembly on them.
//! Results go to stdout as JSON, logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::{info, warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use travel_quote_core::exchange::rate_or_fallback;
use travel_quote_core::ranking::rank_flights;
use travel_quote_core::{
    allocate_rooms, select_hotels, AllocationPolicy, FlightLeg, FlightSearchPayload, HotelListing,
    HotelTier, PartyComposition, Quote, QuoteConfig, QuoteRequest, RawFlightListing, RoomLimits,
    StayDates, TrmClient,
};

#[derive(Parser)]
#[command(name = "travel-quote")]
#[command(about = "Room allocation, flight/hotel ranking and quote assembly")]
#[command(version)]
struct Cli {
    /// JSON config file; built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Distribute a party into hotel rooms
    Rooms {
        #[command(flatten)]
        party: PartyArgs,

        /// Force a policy instead of choosing by number of children
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
    /// Pick the outbound and return flights and write the flight payload
    Flights {
        /// JSON file with `outbound` and `return` listing arrays
        #[arg(long)]
        listings: PathBuf,

        #[arg(long)]
        departure_date: String,

        #[arg(long)]
        return_date: String,

        #[arg(long, default_value = "payload.json")]
        out: PathBuf,
    },
    /// Build the quote from a flight payload and scraped hotels
    Quote {
        #[arg(long, default_value = "payload.json")]
        payload: PathBuf,

        /// JSON file with `base` and `all_inclusive` hotel arrays
        #[arg(long)]
        hotels: PathBuf,

        /// Check-in date, YYYY-MM-DD
        #[arg(long)]
        check_in: String,

        /// Check-out date, YYYY-MM-DD
        #[arg(long)]
        check_out: String,

        #[command(flatten)]
        party: PartyArgs,

        /// Origin city as typed; it is shown as-is in the quote
        #[arg(long, default_value = "")]
        origin: String,

        #[arg(long)]
        destination: String,

        /// Use this exchange rate instead of fetching the TRM
        #[arg(long)]
        trm: Option<f64>,

        /// Write the quote here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct PartyArgs {
    #[arg(long)]
    adults: u32,

    /// Children entered without an age; they keep the default child age
    #[arg(long, default_value_t = 0)]
    children: u32,

    /// Comma-separated ages, one per child; anyone over the child age limit
    /// is counted as an adult
    #[arg(long, value_delimiter = ',')]
    child_ages: Vec<u8>,

    /// Comma-separated ages of infants
    #[arg(long, value_delimiter = ',')]
    infant_ages: Vec<u8>,
}

impl PartyArgs {
    fn to_party(&self, limits: &RoomLimits) -> PartyComposition {
        let mut party = PartyComposition::from_ages(
            self.adults,
            self.child_ages.clone(),
            self.infant_ages.clone(),
            limits.max_child_age,
        );
        party.children += self.children.saturating_sub(self.child_ages.len() as u32);
        party
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    AdultsOnly,
    Mixed,
}

impl From<PolicyArg> for AllocationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::AdultsOnly => AllocationPolicy::AdultsOnly,
            PolicyArg::Mixed => AllocationPolicy::Mixed,
        }
    }
}

#[derive(Deserialize)]
struct FlightListingsFile {
    #[serde(default)]
    outbound: Vec<RawFlightListing>,
    #[serde(default, rename = "return")]
    inbound: Vec<RawFlightListing>,
}

#[derive(Deserialize)]
struct HotelListingsFile {
    #[serde(default)]
    base: Vec<HotelListing>,
    #[serde(default)]
    all_inclusive: Vec<HotelListing>,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn quote_from_listings(
    request: &QuoteRequest,
    flights: &FlightSearchPayload,
    hotels: HotelListingsFile,
    config: &QuoteConfig,
) -> Result<Quote> {
    let has_children = request.party.has_children();
    let base = select_hotels(hotels.base, HotelTier::Base, has_children, &config.hotels);
    let all_inclusive = select_hotels(
        hotels.all_inclusive,
        HotelTier::AllInclusive,
        has_children,
        &config.hotels,
    );
    Ok(Quote::build(
        request,
        flights,
        &base,
        &all_inclusive,
        &config.pricing,
    )?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => QuoteConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => QuoteConfig::default(),
    };

    match cli.command {
        Commands::Rooms { party, policy } => {
            let party = party.to_party(&config.rooms);
            let allocation = match policy {
                Some(p) => AllocationPolicy::from(p).allocate(&party, &config.rooms),
                None => allocate_rooms(&party, &config.rooms),
            };
            println!("{}", serde_json::to_string_pretty(&allocation)?);
            if !allocation.is_complete() {
                bail!(
                    "party of {} guests does not fit in {} rooms",
                    party.total_guests(),
                    config.rooms.max_rooms
                );
            }
        }

        Commands::Flights {
            listings,
            departure_date,
            return_date,
            out,
        } => {
            let listings: FlightListingsFile = read_json(&listings)?;
            let outbound = rank_flights(&listings.outbound, FlightLeg::Outbound, &config.flights)
                .into_best();

            // the site only offers return flights once an outbound one is picked
            let inbound = match &outbound {
                Some(_) => {
                    rank_flights(&listings.inbound, FlightLeg::Return, &config.flights).into_best()
                }
                None => {
                    warn!("no outbound flight matched the departure window");
                    None
                }
            };
            if outbound.is_some() && inbound.is_none() {
                warn!(
                    max_minutes = config.flights.max_duration_minutes,
                    "no return flight within the duration limit"
                );
            }

            let payload = FlightSearchPayload::from_selection(
                outbound.as_ref(),
                inbound.as_ref(),
                &departure_date,
                &return_date,
            );
            payload.save(&out)?;
            println!("{}", payload.resumen);
        }

        Commands::Quote {
            payload,
            hotels,
            check_in,
            check_out,
            party,
            origin,
            destination,
            trm,
            out,
        } => {
            let flights = FlightSearchPayload::load(&payload)
                .with_context(|| format!("reading flight payload {}", payload.display()))?;
            let hotels: HotelListingsFile = read_json(&hotels)?;
            let party = party.to_party(&config.rooms);
            let stay = StayDates::parse(&check_in, &check_out)?;

            let trm = match trm {
                Some(rate) => rate,
                None => {
                    let client = TrmClient::new(&config.exchange)?;
                    let today = chrono::Local::now().date_naive();
                    rate_or_fallback(&client, today, config.exchange.fallback_rate).await
                }
            };

            let request = QuoteRequest {
                party,
                origin,
                destination,
                stay,
                trm,
            };
            let quote = quote_from_listings(&request, &flights, hotels, &config)?;
            let json = serde_json::to_string_pretty(&quote)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), total = %quote.total_with_assistance, "quote written");
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
