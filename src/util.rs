use crate::error::{Result, TcImpactErr};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

/// Set up logging to stderr for the command line tools. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Only fails if a subscriber is already installed, which is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse a UTC timestamp given on the command line.
///
/// Accepts `YYYY-MM-DD-HH`, `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM[:SS]` and RFC 3339 with an
/// offset.
pub fn parse_timestamp(dt_str: &str) -> Result<DateTime<Utc>> {
    let dt_str = dt_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(dt_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(dt_str, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let bad = || TcImpactErr::InvalidTimestamp(dt_str.to_owned());

    // YYYY-MM-DD-HH
    if dt_str.len() != 13 || !dt_str.is_char_boundary(10) {
        return Err(bad());
    }
    let date = NaiveDate::parse_from_str(&dt_str[..10], "%Y-%m-%d").map_err(|_| bad())?;
    let hour: u32 = dt_str[11..].parse().map_err(|_| bad())?;
    if &dt_str[10..11] != "-" {
        return Err(bad());
    }
    let naive = date.and_hms_opt(hour, 0, 0).ok_or_else(bad)?;

    Ok(Utc.from_utc_datetime(&naive))
}
