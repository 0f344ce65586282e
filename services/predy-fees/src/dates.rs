//! Calendar date helpers for subgraph entity ids

use chrono::{DateTime, Utc};

use crate::types::{FeeAdapterError, Result};

pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or(FeeAdapterError::InvalidTimestamp(timestamp))
}

/// `DD/MM/YYYY` in UTC
pub fn format_timestamp_as_date(timestamp: i64) -> Result<String> {
    Ok(to_utc(timestamp)?.format("%d/%m/%Y").to_string())
}

/// `YYYY-MM-DD` in UTC, the ordering used by daily entity ids
pub fn format_timestamp_as_iso_date(timestamp: i64) -> Result<String> {
    Ok(to_utc(timestamp)?.format("%Y-%m-%d").to_string())
}

/// Date strings for the requested day and the day before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayKeys {
    pub today: String,
    pub yesterday: String,
}

impl DayKeys {
    pub fn for_timestamp(timestamp: i64) -> Result<Self> {
        Ok(Self {
            today: format_timestamp_as_iso_date(timestamp)?,
            yesterday: format_timestamp_as_iso_date(timestamp - SECONDS_PER_DAY)?,
        })
    }
}
