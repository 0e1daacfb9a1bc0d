// Lenient parsers for scraped listing text, plus the formatters used when
// the normalized values are handed to the quote template.
//
// Nothing here fails: unparseable input degrades to a documented fallback.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

/// Sentinel for durations that could not be read; sorts after any real flight.
pub const UNKNOWN_DURATION_MINUTES: u32 = 9999;

pub const DIRECT_KEYWORDS: [&str; 2] = ["directo", "sin escalas"];
pub const STOP_KEYWORDS: [&str; 5] = ["escala", "escalas", "parada", "paradas", "boletos separados"];

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})(am|pm)?").expect("clock pattern"));
static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*h").expect("hours pattern"));
static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*min").expect("minutes pattern"));

/// Lowercases and drops dots and whitespace, so "6:45 a. m." becomes "6:45am".
pub fn normalize_clock_text(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect()
}

/// Reads a localized departure/arrival time as a 24-hour clock time.
///
/// Accepts 12-hour text with an am/pm marker ("7:05 p. m.") and bare
/// 24-hour text ("19:05"). Returns `None` when no time can be found.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let normalized = normalize_clock_text(raw);
    let caps = CLOCK_RE.captures(&normalized)?;

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    let hour = match caps.get(3).map(|m| m.as_str()) {
        Some("am") => hour % 12,
        Some(_) => hour % 12 + 12,
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Total minutes from free text such as "2 h 30 min", "45 min" or "3 h".
///
/// Text with neither component, or a zero total, yields
/// [`UNKNOWN_DURATION_MINUTES`].
pub fn parse_duration_minutes(raw: &str) -> u32 {
    let capture = |re: &Regex| -> u32 {
        re.captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };

    let total = capture(&HOURS_RE)
        .saturating_mul(60)
        .saturating_add(capture(&MINUTES_RE));

    if total == 0 {
        UNKNOWN_DURATION_MINUTES
    } else {
        total
    }
}

/// Keeps only the digits of a localized price ("$1.234.567 COP" -> 1234567).
/// No digits, or more than fit in a u64, reads as 0.
pub fn parse_price(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// A flight counts as direct unless its texts mention a stop and no direct
/// marker. Both texts are searched case-insensitively.
pub fn is_direct_flight(flight_type: &str, card_text: &str) -> bool {
    let texts = [flight_type.to_lowercase(), card_text.to_lowercase()];
    let mentions = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|k| texts.iter().any(|t| t.contains(k)))
    };

    if mentions(&DIRECT_KEYWORDS) {
        return true;
    }
    !mentions(&STOP_KEYWORDS)
}

/// Human-readable duration for the quote ("2 horas y 5 minutos").
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{} minutos", minutes);
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    let plural = if hours > 1 { "s" } else { "" };
    if mins == 0 {
        format!("{} hora{}", hours, plural)
    } else {
        format!("{} hora{} y {} minutos", hours, plural, mins)
    }
}

/// Groups thousands with dots, the es-CO convention (1234567 -> "1.234.567").
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub fn format_cop(value: u64) -> String {
    format!("${} COP", group_thousands(value))
}

/// Truncates toward zero before formatting; negative amounts read as 0.
pub fn format_cop_amount(amount: f64) -> String {
    format_cop(amount.trunc().max(0.0) as u64)
}
