//! Typed environment variable lookups
//!
//! Unset variables are `None`; set-but-unparseable variables are an error
//! rather than being silently replaced by a default.

use crate::error::{CommonError, Result};
use std::str::FromStr;

/// Read an environment variable as a raw string, treating empty values as unset
pub fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an environment variable
pub fn parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CommonError::invalid_value(key, raw.clone(), e.to_string())),
        None => Ok(None),
    }
}

/// Read a comma-separated list, trimming entries and dropping empty ones
pub fn list(key: &str) -> Option<Vec<String>> {
    var(key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}
