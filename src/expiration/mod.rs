//! Expiration classification for stored products.
//!
//! Everything here is pure: the current time is always passed in by the
//! caller, so the same inputs always give the same status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AlacenaError, AlacenaResult};
use crate::models::Product;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Last day count (inclusive) that is still critical
const CRITICAL_MAX_DAYS: i64 = 2;
/// Last day count (inclusive) that is still a priority
const PRIORITY_MAX_DAYS: i64 = 5;

/// Colour used for anything that is not a known status
pub const DEFAULT_STATUS_COLOR: &str = "#000000";
/// Unit used for unknown product types
pub const DEFAULT_UNIT_LABEL: &str = "unidades";

/// A UTC calendar date, parsed from `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateStamp(NaiveDate);

impl DateStamp {
    /// Parse a calendar date.
    ///
    /// Accepts `YYYY-MM-DD`, and also a full RFC 3339 timestamp, in which
    /// case the UTC calendar date of that instant is kept.
    pub fn parse(input: &str) -> AlacenaResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AlacenaError::invalid_date(input, "empty input"));
        }

        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => Ok(Self(date)),
            Err(date_err) => DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| Self(dt.with_timezone(&Utc).date_naive()))
                .map_err(|_| AlacenaError::invalid_date(input, date_err)),
        }
    }

    /// Build a date from its calendar fields
    pub fn from_ymd(year: i32, month: u32, day: u32) -> AlacenaResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                AlacenaError::invalid_date(
                    format!("{year:04}-{month:02}-{day:02}"),
                    "not a calendar date",
                )
            })
    }

    /// The underlying calendar date
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Midnight UTC at the start of this date
    pub fn start_of_day(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    /// Render as `DD/MM/YYYY`
    pub fn to_display(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateStamp {
    type Err = AlacenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateStamp {
    type Error = AlacenaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateStamp> for String {
    fn from(value: DateStamp) -> Self {
        value.to_string()
    }
}

/// Urgency category of a product, derived from its expiration date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationStatus {
    /// Expires in two days or less, or already expired
    Critical,
    /// Expires in three to five days
    Priority,
    /// More than five days left
    Stable,
}

impl ExpirationStatus {
    pub const ALL: [ExpirationStatus; 3] = [Self::Critical, Self::Priority, Self::Stable];

    /// Label shown in the app
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "crítico",
            Self::Priority => "prioritario",
            Self::Stable => "estable",
        }
    }

    /// Colour token for this status
    pub fn color(&self) -> &'static str {
        status_color(*self)
    }
}

impl fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpirationStatus {
    type Err = AlacenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| AlacenaError::unknown_status(s))
    }
}

/// Render a `YYYY-MM-DD` date as `DD/MM/YYYY` without any timezone shift.
pub fn format_date(input: &str) -> AlacenaResult<String> {
    DateStamp::parse(input).map(|date| date.to_display())
}

/// Whole days from `reference_now` until the start of `expiration`, rounded up.
pub fn days_until(expiration: &DateStamp, reference_now: DateTime<Utc>) -> i64 {
    let diff_ms = (expiration.start_of_day() - reference_now).num_milliseconds();
    diff_ms.div_euclid(MILLIS_PER_DAY) + i64::from(diff_ms.rem_euclid(MILLIS_PER_DAY) != 0)
}

/// Classify how urgently a product has to be used.
pub fn classify_expiration(expiration: &DateStamp, reference_now: DateTime<Utc>) -> ExpirationStatus {
    match days_until(expiration, reference_now) {
        days if days <= CRITICAL_MAX_DAYS => ExpirationStatus::Critical,
        days if days <= PRIORITY_MAX_DAYS => ExpirationStatus::Priority,
        _ => ExpirationStatus::Stable,
    }
}

pub fn status_color(status: ExpirationStatus) -> &'static str {
    match status {
        ExpirationStatus::Critical => "#FF4D4F",
        ExpirationStatus::Priority => "#FFC107",
        ExpirationStatus::Stable => "#52C41A",
    }
}

/// Colour for a raw status label; unknown labels get [`DEFAULT_STATUS_COLOR`].
pub fn status_color_for_label(label: &str) -> &'static str {
    label
        .parse::<ExpirationStatus>()
        .map(status_color)
        .unwrap_or(DEFAULT_STATUS_COLOR)
}

/// Unit a quantity of this product type is counted in
pub fn unit_label(product_type: &str) -> &'static str {
    match product_type {
        "fruit" => "unidades",
        "canned_food" => "latas",
        "bottle" => "botellas",
        "grain" => "kilogramos",
        "dairy" => "litros",
        "snack" => "paquetes",
        "jar" => "frasco",
        _ => DEFAULT_UNIT_LABEL,
    }
}

/// Number of products in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub critical: usize,
    pub priority: usize,
    pub stable: usize,
}

impl StatusTally {
    pub fn add(&mut self, status: ExpirationStatus) {
        match status {
            ExpirationStatus::Critical => self.critical += 1,
            ExpirationStatus::Priority => self.priority += 1,
            ExpirationStatus::Stable => self.stable += 1,
        }
    }

    pub fn count(&self, status: ExpirationStatus) -> usize {
        match status {
            ExpirationStatus::Critical => self.critical,
            ExpirationStatus::Priority => self.priority,
            ExpirationStatus::Stable => self.stable,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.priority + self.stable
    }

    /// Counts in dashboard bar order: `[stable, priority, critical]`
    pub fn as_bars(&self) -> [usize; 3] {
        [self.stable, self.priority, self.critical]
    }
}

/// Count products by status. Products with an unreadable date are skipped.
pub fn tally<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    reference_now: DateTime<Utc>,
) -> StatusTally {
    products
        .into_iter()
        .fold(StatusTally::default(), |mut tally, product| {
            match product.status(reference_now) {
                Ok(status) => tally.add(status),
                Err(e) => warn!(
                    product_id = %product.product_id,
                    error = %e,
                    "Skipping product with unreadable expiration date"
                ),
            }
            tally
        })
}
