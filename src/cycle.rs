//! Synoptic forecast cycles.
//!
//! The ensemble is issued twice a day, at 00Z and 12Z. Every artifact the pipeline produces is
//! stamped with the cycle it belongs to, so the cycle string doubles as a file name component.
use crate::error::{Result, TcImpactErr};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::{fmt, str::FromStr};

/// Hours between two consecutive cycles.
pub const HOURS_BETWEEN_CYCLES: i64 = 12;

const CYCLE_FORMAT: &str = "%Y-%m-%d_%HUTC";

/// A forecast cycle, always 00:00 or 12:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastCycle(DateTime<Utc>);

impl ForecastCycle {
    /// The cycle that was most recently issued at `timestamp`.
    ///
    /// The timestamp is converted to UTC and floored to the hour, then snapped back to 00Z before
    /// noon and to 12Z after.
    pub fn containing<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        let utc = timestamp.with_timezone(&Utc);

        // Unix time has no leap seconds, so every UTC day is a whole number of cycles.
        let into_cycle = utc.timestamp().rem_euclid(HOURS_BETWEEN_CYCLES * 3600);
        let snapped = utc
            - Duration::seconds(into_cycle)
            - Duration::nanoseconds(i64::from(utc.timestamp_subsec_nanos()));

        ForecastCycle(snapped)
    }

    /// Resolve the cycle for `now` and the one before it, which is where to look when the current
    /// cycle has not produced anything yet.
    pub fn resolve<Tz: TimeZone>(now: &DateTime<Tz>) -> (Self, Self) {
        let cycle = Self::containing(now);
        (cycle, cycle.previous())
    }

    pub fn previous(&self) -> Self {
        ForecastCycle(self.0 - Duration::hours(HOURS_BETWEEN_CYCLES))
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format(CYCLE_FORMAT))
    }
}

impl FromStr for ForecastCycle {
    type Err = TcImpactErr;

    /// Parse the canonical `YYYY-MM-DD_HHUTC` form.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || TcImpactErr::InvalidCycle(s.to_owned());

        let rest = s.strip_suffix("UTC").ok_or_else(bad)?;
        let (date, hour) = rest.split_once('_').ok_or_else(bad)?;

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| bad())?;
        let hour: u32 = hour.parse().map_err(|_| bad())?;
        if hour != 0 && hour != 12 {
            return Err(bad());
        }

        let time = date.and_hms_opt(hour, 0, 0).ok_or_else(bad)?;

        Ok(ForecastCycle(Utc.from_utc_datetime(&time)))
    }
}
